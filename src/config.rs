//! Flag-token configuration.
//!
//! Config files hold the same `--flag value` tokens the command line
//! accepts, one or more per line, with `#` comments. Global, local and
//! command-line flags are merged in that order; later options win.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{
    BracketPairHighlight, ConfigurationSnapshot, EdgeInsets, Font, IndentOption, Language, Rgb,
    Theme,
};

/// Color used by bordered/underline bracket highlights when none is given.
const DEFAULT_BRACKET_COLOR: Rgb = Rgb::new(0xff, 0xd7, 0x00);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub theme: Option<String>,
    pub tab_width: Option<usize>,
    pub indent: Option<IndentOption>,
    pub line_height: Option<f64>,
    pub wrap_lines: Option<bool>,
    pub overscroll: Option<f64>,
    /// `Some(None)` clears the insets.
    pub insets: Option<Option<EdgeInsets>>,
    pub editable: Option<bool>,
    pub selectable: Option<bool>,
    pub letter_spacing: Option<f64>,
    /// `Some(None)` turns bracket highlighting off.
    pub bracket_highlight: Option<Option<BracketPairHighlight>>,
    pub system_cursor: Option<bool>,
    pub language: Option<String>,
    pub theme_background: Option<bool>,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            font_family: other.font_family.clone().or_else(|| self.font_family.clone()),
            font_size: other.font_size.or(self.font_size),
            theme: other.theme.clone().or_else(|| self.theme.clone()),
            tab_width: other.tab_width.or(self.tab_width),
            indent: other.indent.or(self.indent),
            line_height: other.line_height.or(self.line_height),
            wrap_lines: other.wrap_lines.or(self.wrap_lines),
            overscroll: other.overscroll.or(self.overscroll),
            insets: other.insets.or(self.insets),
            editable: other.editable.or(self.editable),
            selectable: other.selectable.or(self.selectable),
            letter_spacing: other.letter_spacing.or(self.letter_spacing),
            bracket_highlight: other.bracket_highlight.or(self.bracket_highlight),
            system_cursor: other.system_cursor.or(self.system_cursor),
            language: other.language.clone().or_else(|| self.language.clone()),
            theme_background: other.theme_background.or(self.theme_background),
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    /// Overwrite the snapshot fields these flags mention.
    pub fn apply_to(&self, snapshot: &mut ConfigurationSnapshot) {
        if self.font_family.is_some() || self.font_size.is_some() {
            snapshot.font = Font::new(
                self.font_family
                    .clone()
                    .unwrap_or_else(|| snapshot.font.family.clone()),
                self.font_size.unwrap_or(snapshot.font.size),
            );
        }
        if let Some(theme) = &self.theme {
            snapshot.theme = Theme::named(theme.clone());
        }
        if let Some(width) = self.tab_width {
            snapshot.tab_width = width;
        }
        if let Some(indent) = self.indent {
            snapshot.indent_option = indent;
        }
        if let Some(height) = self.line_height {
            snapshot.line_height = height;
        }
        if let Some(wrap) = self.wrap_lines {
            snapshot.wrap_lines = wrap;
        }
        if let Some(overscroll) = self.overscroll {
            snapshot.editor_overscroll = overscroll;
        }
        if let Some(insets) = self.insets {
            snapshot.content_insets = insets;
        }
        if let Some(editable) = self.editable {
            snapshot.is_editable = editable;
        }
        if let Some(selectable) = self.selectable {
            snapshot.is_selectable = selectable;
        }
        if let Some(spacing) = self.letter_spacing {
            snapshot.letter_spacing = spacing;
        }
        if let Some(highlight) = self.bracket_highlight {
            snapshot.bracket_pair_highlight = highlight;
        }
        if let Some(system_cursor) = self.system_cursor {
            snapshot.use_system_cursor = system_cursor;
        }
        if let Some(language) = &self.language {
            snapshot.language = Language::new(language.clone());
        }
        if let Some(theme_background) = self.theme_background {
            snapshot.use_theme_background = theme_background;
        }
    }

    /// The snapshot obtained by applying these flags to the defaults.
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        let mut snapshot = ConfigurationSnapshot::default();
        self.apply_to(&mut snapshot);
        snapshot
    }

    /// Render back into tokens [`parse_flag_tokens`] accepts.
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            tokens.push(match value {
                Some(value) => format!("--{name}={value}"),
                None => format!("--{name}"),
            });
        };
        if let Some(family) = &self.font_family {
            push("font", Some(family.clone()));
        }
        if let Some(size) = self.font_size {
            push("font-size", Some(size.to_string()));
        }
        if let Some(theme) = &self.theme {
            push("theme", Some(theme.clone()));
        }
        if let Some(width) = self.tab_width {
            push("tab-width", Some(width.to_string()));
        }
        if let Some(indent) = self.indent {
            push("indent", Some(format_indent(indent)));
        }
        if let Some(height) = self.line_height {
            push("line-height", Some(height.to_string()));
        }
        if let Some(wrap) = self.wrap_lines {
            push(if wrap { "wrap-lines" } else { "no-wrap-lines" }, None);
        }
        if let Some(overscroll) = self.overscroll {
            push("overscroll", Some(overscroll.to_string()));
        }
        if let Some(insets) = self.insets {
            push("insets", Some(insets.map_or_else(|| "none".to_string(), format_insets)));
        }
        if let Some(editable) = self.editable {
            push(if editable { "editable" } else { "read-only" }, None);
        }
        if let Some(selectable) = self.selectable {
            push(if selectable { "selectable" } else { "no-select" }, None);
        }
        if let Some(spacing) = self.letter_spacing {
            push("letter-spacing", Some(spacing.to_string()));
        }
        if let Some(highlight) = self.bracket_highlight {
            push("bracket-highlight", Some(format_bracket(highlight)));
        }
        if let Some(system_cursor) = self.system_cursor {
            push(if system_cursor { "system-cursor" } else { "no-system-cursor" }, None);
        }
        if let Some(language) = &self.language {
            push("language", Some(language.clone()));
        }
        if let Some(theme_background) = self.theme_background {
            push(
                if theme_background { "theme-background" } else { "no-theme-background" },
                None,
            );
        }
        if self.perf {
            push("perf", None);
        }
        if let Some(path) = &self.debug_log {
            push("debug-log", Some(path.display().to_string()));
        }
        tokens
    }
}

const APP_DIR: &str = "editsync";
const CONFIG_FILE: &str = "config";

/// Per-user config file, or the local override when no home is known.
pub fn global_config_path() -> PathBuf {
    config_path_from(|key| std::env::var_os(key)).unwrap_or_else(local_override_path)
}

/// Resolve the per-user config file through `env` lookups.
fn config_path_from(env: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        PathBuf::from(env("APPDATA")?)
    } else if cfg!(target_os = "macos") {
        PathBuf::from(env("HOME")?)
            .join("Library")
            .join("Application Support")
    } else {
        env("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| env("HOME").map(|home| PathBuf::from(home).join(".config")))?
    };
    Some(base.join(APP_DIR).join(CONFIG_FILE))
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".editsyncrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_config_line)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# editsync defaults (saved with --save)".to_string()];
    lines.extend(flags.to_tokens().iter().map(|token| quote_token(token)));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Split a config line on whitespace, keeping double-quoted runs whole.
fn split_config_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Quote the value of a `--flag=value` token when it holds whitespace.
fn quote_token(token: &str) -> String {
    match token.split_once('=') {
        Some((name, value)) if value.contains(char::is_whitespace) => format!("{name}=\"{value}\""),
        _ => token.to_string(),
    }
}

const VALUE_FLAGS: &[&str] = &[
    "--font",
    "--font-size",
    "--theme",
    "--tab-width",
    "--indent",
    "--line-height",
    "--overscroll",
    "--insets",
    "--letter-spacing",
    "--bracket-highlight",
    "--language",
    "--debug-log",
];

/// Extract known flags from `tokens`, ignoring anything else.
///
/// Value flags accept both `--flag value` and `--flag=value`. A value
/// that does not parse leaves the option unset.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let value = if VALUE_FLAGS.contains(&name) && inline.is_none() {
            i += 1;
            tokens.get(i).map(String::as_str)
        } else {
            inline
        };

        match (name, value) {
            ("--font", Some(v)) => flags.font_family = Some(v.to_string()),
            ("--font-size", Some(v)) => flags.font_size = v.parse().ok().or(flags.font_size),
            ("--theme", Some(v)) => flags.theme = Some(v.to_string()),
            ("--tab-width", Some(v)) => flags.tab_width = v.parse().ok().or(flags.tab_width),
            ("--indent", Some(v)) => flags.indent = parse_indent(v).or(flags.indent),
            ("--line-height", Some(v)) => flags.line_height = v.parse().ok().or(flags.line_height),
            ("--overscroll", Some(v)) => flags.overscroll = v.parse().ok().or(flags.overscroll),
            ("--insets", Some(v)) => flags.insets = parse_insets(v).or(flags.insets),
            ("--letter-spacing", Some(v)) => {
                flags.letter_spacing = v.parse().ok().or(flags.letter_spacing);
            }
            ("--bracket-highlight", Some(v)) => {
                flags.bracket_highlight = parse_bracket(v).or(flags.bracket_highlight);
            }
            ("--language", Some(v)) => flags.language = Some(v.to_string()),
            ("--debug-log", Some(v)) => flags.debug_log = Some(PathBuf::from(v)),
            ("--wrap-lines", None) => flags.wrap_lines = Some(true),
            ("--no-wrap-lines", None) => flags.wrap_lines = Some(false),
            ("--editable", None) => flags.editable = Some(true),
            ("--read-only", None) => flags.editable = Some(false),
            ("--selectable", None) => flags.selectable = Some(true),
            ("--no-select", None) => flags.selectable = Some(false),
            ("--system-cursor", None) => flags.system_cursor = Some(true),
            ("--no-system-cursor", None) => flags.system_cursor = Some(false),
            ("--theme-background", None) => flags.theme_background = Some(true),
            ("--no-theme-background", None) => flags.theme_background = Some(false),
            ("--perf", None) => flags.perf = true,
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_indent(s: &str) -> Option<IndentOption> {
    match s {
        "tab" => Some(IndentOption::Tab),
        "spaces" => Some(IndentOption::default()),
        _ => {
            let count = s.strip_prefix("spaces:")?.parse().ok()?;
            Some(IndentOption::Spaces { count })
        }
    }
}

fn format_indent(indent: IndentOption) -> String {
    match indent {
        IndentOption::Tab => "tab".to_string(),
        IndentOption::Spaces { count } => format!("spaces:{count}"),
    }
}

fn parse_insets(s: &str) -> Option<Option<EdgeInsets>> {
    if s == "none" {
        return Some(None);
    }
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match values.as_slice() {
        [all] => Some(Some(EdgeInsets::new(*all, *all, *all, *all))),
        [top, left, bottom, right] => Some(Some(EdgeInsets::new(*top, *left, *bottom, *right))),
        _ => None,
    }
}

fn format_insets(insets: EdgeInsets) -> String {
    format!(
        "{},{},{},{}",
        insets.top, insets.left, insets.bottom, insets.right
    )
}

fn parse_bracket(s: &str) -> Option<Option<BracketPairHighlight>> {
    let (kind, color) = match s.split_once(':') {
        Some((kind, color)) => (kind, Some(parse_rgb(color)?)),
        None => (s, None),
    };
    let color = color.unwrap_or(DEFAULT_BRACKET_COLOR);
    match kind {
        "none" => Some(None),
        "flash" => Some(Some(BracketPairHighlight::Flash)),
        "bordered" => Some(Some(BracketPairHighlight::Bordered { color })),
        "underline" => Some(Some(BracketPairHighlight::Underline { color })),
        _ => None,
    }
}

fn format_bracket(highlight: Option<BracketPairHighlight>) -> String {
    match highlight {
        None => "none".to_string(),
        Some(BracketPairHighlight::Flash) => "flash".to_string(),
        Some(BracketPairHighlight::Bordered { color }) => format!("bordered:{color}"),
        Some(BracketPairHighlight::Underline { color }) => format!("underline:{color}"),
    }
}

fn parse_rgb(s: &str) -> Option<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
