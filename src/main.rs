//! editsync - replay scripted editing sessions through the reconciler.
//!
//! # Usage
//!
//! ```bash
//! editsync session.json
//! editsync --json --tab-width 2 session.json
//! editsync --theme nord --save
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use editsync::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use editsync::perf;
use editsync::script::{ReplayReport, Script, replay};

/// Replay a scripted editing session and report every reconciliation cycle
#[derive(Parser, Debug)]
#[command(name = "editsync", version, about, long_about = None)]
// Snapshot flags are declared for help and validation; their values are
// read back from the raw tokens by `parse_flag_tokens`.
#[allow(clippy::struct_excessive_bools, dead_code)]
struct Cli {
    /// Session script (JSON)
    #[arg(value_name = "SCRIPT", required_unless_present_any = ["save", "clear"])]
    script: Option<PathBuf>,

    /// Print the replay report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print timing scopes to stderr
    #[arg(long)]
    perf: bool,

    /// Write cycle events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save the snapshot flags on this command line as global defaults
    #[arg(long)]
    save: bool,

    /// Clear saved global defaults
    #[arg(long)]
    clear: bool,

    /// Font family
    #[arg(long, value_name = "NAME")]
    font: Option<String>,

    /// Font size in points
    #[arg(long, value_name = "N")]
    font_size: Option<f64>,

    /// Theme name
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    #[arg(long, value_name = "N")]
    tab_width: Option<usize>,

    /// `tab`, `spaces` or `spaces:N`
    #[arg(long, value_name = "KIND")]
    indent: Option<String>,

    /// Line height multiple
    #[arg(long, value_name = "X")]
    line_height: Option<f64>,

    #[arg(long)]
    wrap_lines: bool,

    #[arg(long, conflicts_with = "wrap_lines")]
    no_wrap_lines: bool,

    /// Overscroll fraction
    #[arg(long, value_name = "X")]
    overscroll: Option<f64>,

    /// `T,L,B,R`, a single value, or `none`
    #[arg(long, value_name = "INSETS")]
    insets: Option<String>,

    #[arg(long)]
    editable: bool,

    #[arg(long, conflicts_with = "editable")]
    read_only: bool,

    #[arg(long)]
    selectable: bool,

    #[arg(long, conflicts_with = "selectable")]
    no_select: bool,

    #[arg(long, value_name = "X")]
    letter_spacing: Option<f64>,

    /// `flash`, `bordered[:#rrggbb]`, `underline[:#rrggbb]` or `none`
    #[arg(long, value_name = "STYLE")]
    bracket_highlight: Option<String>,

    #[arg(long)]
    system_cursor: bool,

    #[arg(long, conflicts_with = "system_cursor")]
    no_system_cursor: bool,

    /// Language identifier
    #[arg(long, value_name = "ID")]
    language: Option<String>,

    #[arg(long)]
    theme_background: bool,

    #[arg(long, conflicts_with = "theme_background")]
    no_theme_background: bool,
}

fn print_report(report: &ReplayReport) {
    for step in &report.steps {
        match &step.cycle {
            Some(cycle) => {
                let fields = cycle
                    .fields_written
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "#{:<3} cycle {:<3} {:<9?} cursors={:<10?} breakpoints={} fields=[{}]{}",
                    step.index,
                    cycle.cycle,
                    cycle.outcome,
                    cycle.cursor_sync,
                    cycle.breakpoints_pushed,
                    fields,
                    cycle
                        .scrolled_to
                        .map_or_else(String::new, |line| format!(" scrolled={line}")),
                );
            }
            None => {
                let cursors = step
                    .cursors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                let refused = if step.accepted == Some(false) {
                    " (refused)"
                } else {
                    ""
                };
                println!("#{:<3} {}{} cursors=[{}]", step.index, step.action, refused, cursors);
            }
        }
    }
    println!(
        "writes={} reloads={} breakpoint_pushes={} cursor_pushes={}",
        report.stats.field_writes.len(),
        report.stats.reloads,
        report.stats.breakpoint_pushes,
        report.stats.cursor_pushes
    );
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(raw_args.get(1..).unwrap_or_default());

    if cli.clear {
        clear_config_flags(&global_path)?;
        eprintln!("Cleared saved defaults in {}", global_path.display());
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
        eprintln!("Saved defaults to {}", global_path.display());
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os(perf::DEBUG_LOG_ENV).map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize debug log {}: {}",
            debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let Some(script_path) = cli.script else {
        return Ok(());
    };
    let script = Script::load(&script_path)
        .with_context(|| format!("Failed to load {}", script_path.display()))?;
    let report = replay(&script, &effective);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    if perf::is_enabled() {
        for (name, total) in perf::summary() {
            eprintln!(
                "[perf] {name}: {} calls, mean {:.3} ms, max {:.3} ms",
                total.calls,
                total.mean().as_secs_f64() * 1000.0,
                total.max.as_secs_f64() * 1000.0
            );
        }
    }
    Ok(())
}
