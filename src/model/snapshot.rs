//! The configuration snapshot and its comparator.
//!
//! A [`ConfigurationSnapshot`] is captured once per reconciliation cycle.
//! It has no identity: two snapshots with the same field values are
//! interchangeable. Breakpoints are deliberately not part of it, they are
//! pushed to the surface every cycle instead of being diffed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Font family and point size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: f64,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("monospace", 12.0)
    }
}

/// Editor theme. Opaque to reconciliation: compared by content and
/// forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub text: Rgb,
    pub background: Rgb,
    pub selection: Rgb,
    pub line_highlight: Rgb,
}

impl Theme {
    /// A theme with the given name and the default palette.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            text: Rgb::new(0xd4, 0xd4, 0xd4),
            background: Rgb::new(0x1e, 0x1e, 0x1e),
            selection: Rgb::new(0x26, 0x4f, 0x78),
            line_highlight: Rgb::new(0x2a, 0x2d, 0x2e),
        }
    }
}

/// What a tab key press inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentOption {
    Spaces { count: usize },
    Tab,
}

impl Default for IndentOption {
    fn default() -> Self {
        Self::Spaces { count: 4 }
    }
}

/// Padding around the text content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

/// How the bracket matching the one under the cursor is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketPairHighlight {
    Flash,
    Bordered { color: Rgb },
    Underline { color: Rgb },
}

/// Language identifier handed to the highlighting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(pub String);

impl Language {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::new("plain")
    }
}

/// Every controller-visible display and behavior parameter for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationSnapshot {
    pub font: Font,
    pub theme: Theme,
    pub tab_width: usize,
    pub indent_option: IndentOption,
    /// Line height as a multiple of the font's natural line height.
    pub line_height: f64,
    pub wrap_lines: bool,
    /// Fraction of the visible height that may be scrolled past the last line.
    pub editor_overscroll: f64,
    pub content_insets: Option<EdgeInsets>,
    pub is_editable: bool,
    pub is_selectable: bool,
    pub letter_spacing: f64,
    pub bracket_pair_highlight: Option<BracketPairHighlight>,
    pub use_system_cursor: bool,
    pub language: Language,
    pub use_theme_background: bool,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        Self {
            font: Font::default(),
            theme: Theme::default(),
            tab_width: 4,
            indent_option: IndentOption::default(),
            line_height: 1.2,
            wrap_lines: true,
            editor_overscroll: 0.0,
            content_insets: None,
            is_editable: true,
            is_selectable: true,
            letter_spacing: 1.0,
            bracket_pair_highlight: None,
            use_system_cursor: false,
            language: Language::default(),
            use_theme_background: true,
        }
    }
}

/// Names one snapshot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Font,
    Theme,
    TabWidth,
    IndentOption,
    LineHeight,
    WrapLines,
    EditorOverscroll,
    ContentInsets,
    IsEditable,
    IsSelectable,
    LetterSpacing,
    BracketPairHighlight,
    UseSystemCursor,
    Language,
    UseThemeBackground,
}

impl Field {
    /// All fields, in the order deltas are written.
    pub const ALL: [Self; 15] = [
        Self::Font,
        Self::Theme,
        Self::TabWidth,
        Self::IndentOption,
        Self::LineHeight,
        Self::WrapLines,
        Self::EditorOverscroll,
        Self::ContentInsets,
        Self::IsEditable,
        Self::IsSelectable,
        Self::LetterSpacing,
        Self::BracketPairHighlight,
        Self::UseSystemCursor,
        Self::Language,
        Self::UseThemeBackground,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Font => "font",
            Self::Theme => "theme",
            Self::TabWidth => "tab_width",
            Self::IndentOption => "indent_option",
            Self::LineHeight => "line_height",
            Self::WrapLines => "wrap_lines",
            Self::EditorOverscroll => "editor_overscroll",
            Self::ContentInsets => "content_insets",
            Self::IsEditable => "is_editable",
            Self::IsSelectable => "is_selectable",
            Self::LetterSpacing => "letter_spacing",
            Self::BracketPairHighlight => "bracket_pair_highlight",
            Self::UseSystemCursor => "use_system_cursor",
            Self::Language => "language",
            Self::UseThemeBackground => "use_theme_background",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value of a single snapshot field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Font(Font),
    Theme(Theme),
    TabWidth(usize),
    IndentOption(IndentOption),
    LineHeight(f64),
    WrapLines(bool),
    EditorOverscroll(f64),
    ContentInsets(Option<EdgeInsets>),
    IsEditable(bool),
    IsSelectable(bool),
    LetterSpacing(f64),
    BracketPairHighlight(Option<BracketPairHighlight>),
    UseSystemCursor(bool),
    Language(Language),
    UseThemeBackground(bool),
}

impl FieldValue {
    /// The field this value belongs to.
    pub const fn field(&self) -> Field {
        match self {
            Self::Font(_) => Field::Font,
            Self::Theme(_) => Field::Theme,
            Self::TabWidth(_) => Field::TabWidth,
            Self::IndentOption(_) => Field::IndentOption,
            Self::LineHeight(_) => Field::LineHeight,
            Self::WrapLines(_) => Field::WrapLines,
            Self::EditorOverscroll(_) => Field::EditorOverscroll,
            Self::ContentInsets(_) => Field::ContentInsets,
            Self::IsEditable(_) => Field::IsEditable,
            Self::IsSelectable(_) => Field::IsSelectable,
            Self::LetterSpacing(_) => Field::LetterSpacing,
            Self::BracketPairHighlight(_) => Field::BracketPairHighlight,
            Self::UseSystemCursor(_) => Field::UseSystemCursor,
            Self::Language(_) => Field::Language,
            Self::UseThemeBackground(_) => Field::UseThemeBackground,
        }
    }
}

impl ConfigurationSnapshot {
    /// Read one field.
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Font => FieldValue::Font(self.font.clone()),
            Field::Theme => FieldValue::Theme(self.theme.clone()),
            Field::TabWidth => FieldValue::TabWidth(self.tab_width),
            Field::IndentOption => FieldValue::IndentOption(self.indent_option),
            Field::LineHeight => FieldValue::LineHeight(self.line_height),
            Field::WrapLines => FieldValue::WrapLines(self.wrap_lines),
            Field::EditorOverscroll => FieldValue::EditorOverscroll(self.editor_overscroll),
            Field::ContentInsets => FieldValue::ContentInsets(self.content_insets),
            Field::IsEditable => FieldValue::IsEditable(self.is_editable),
            Field::IsSelectable => FieldValue::IsSelectable(self.is_selectable),
            Field::LetterSpacing => FieldValue::LetterSpacing(self.letter_spacing),
            Field::BracketPairHighlight => {
                FieldValue::BracketPairHighlight(self.bracket_pair_highlight)
            }
            Field::UseSystemCursor => FieldValue::UseSystemCursor(self.use_system_cursor),
            Field::Language => FieldValue::Language(self.language.clone()),
            Field::UseThemeBackground => FieldValue::UseThemeBackground(self.use_theme_background),
        }
    }

    /// Overwrite the field `value` belongs to.
    pub fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::Font(v) => self.font = v,
            FieldValue::Theme(v) => self.theme = v,
            FieldValue::TabWidth(v) => self.tab_width = v,
            FieldValue::IndentOption(v) => self.indent_option = v,
            FieldValue::LineHeight(v) => self.line_height = v,
            FieldValue::WrapLines(v) => self.wrap_lines = v,
            FieldValue::EditorOverscroll(v) => self.editor_overscroll = v,
            FieldValue::ContentInsets(v) => self.content_insets = v,
            FieldValue::IsEditable(v) => self.is_editable = v,
            FieldValue::IsSelectable(v) => self.is_selectable = v,
            FieldValue::LetterSpacing(v) => self.letter_spacing = v,
            FieldValue::BracketPairHighlight(v) => self.bracket_pair_highlight = v,
            FieldValue::UseSystemCursor(v) => self.use_system_cursor = v,
            FieldValue::Language(v) => self.language = v,
            FieldValue::UseThemeBackground(v) => self.use_theme_background = v,
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, value: FieldValue) -> Self {
        self.set(value);
        self
    }

    /// Compare a single field without cloning either side.
    pub fn field_eq(&self, other: &Self, field: Field) -> bool {
        match field {
            Field::Font => self.font == other.font,
            Field::Theme => self.theme == other.theme,
            Field::TabWidth => self.tab_width == other.tab_width,
            Field::IndentOption => self.indent_option == other.indent_option,
            Field::LineHeight => self.line_height == other.line_height,
            Field::WrapLines => self.wrap_lines == other.wrap_lines,
            Field::EditorOverscroll => self.editor_overscroll == other.editor_overscroll,
            Field::ContentInsets => self.content_insets == other.content_insets,
            Field::IsEditable => self.is_editable == other.is_editable,
            Field::IsSelectable => self.is_selectable == other.is_selectable,
            Field::LetterSpacing => self.letter_spacing == other.letter_spacing,
            Field::BracketPairHighlight => {
                self.bracket_pair_highlight == other.bracket_pair_highlight
            }
            Field::UseSystemCursor => self.use_system_cursor == other.use_system_cursor,
            Field::Language => self.language == other.language,
            Field::UseThemeBackground => self.use_theme_background == other.use_theme_background,
        }
    }
}

/// True when every field of `previous` equals the same field of `candidate`.
pub fn params_equal(previous: &ConfigurationSnapshot, candidate: &ConfigurationSnapshot) -> bool {
    Field::ALL
        .iter()
        .all(|&field| previous.field_eq(candidate, field))
}

/// Fields whose values differ, in [`Field::ALL`] order.
pub fn changed_fields(previous: &ConfigurationSnapshot, candidate: &ConfigurationSnapshot) -> Vec<Field> {
    Field::ALL
        .iter()
        .copied()
        .filter(|&field| !previous.field_eq(candidate, field))
        .collect()
}
