//! Scripted sessions.
//!
//! A script plays the part of the external state owner: it holds the
//! text source, the snapshot and the bound cursor positions, runs
//! reconciliation cycles and simulates user input on the surface in
//! between. Replaying one yields a report of every step.
//!
//! ```json
//! {
//!   "text": { "binding": "fn main() {}\n" },
//!   "flags": ["--language", "rust"],
//!   "steps": [
//!     { "step": "cycle", "breakpoints": [{ "line": 1 }] },
//!     { "step": "move_to", "line": 1, "column": 4 },
//!     { "step": "type", "text": "x" },
//!     { "step": "cycle", "flags": ["--font-size=16"], "scroll_to": 1 }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigFlags, parse_flag_tokens};
use crate::model::{
    Binding, ConfigurationSnapshot, CursorPosition, ExternalBreakpoint, SharedBuffer, TextSource,
};
use crate::surface::{Direction, EditingSurface, SurfaceStats};
use crate::sync::{CycleReport, ExternalState, SourceEditor};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the script's text lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptText {
    /// A string binding that edits are written back to.
    Binding(String),
    /// A shared buffer edited in place.
    Buffer(String),
}

impl Default for ScriptText {
    fn default() -> Self {
        Self::Binding(String::new())
    }
}

impl ScriptText {
    fn to_source(&self) -> TextSource {
        match self {
            Self::Binding(text) => TextSource::Binding(Binding::new(text.clone())),
            Self::Buffer(text) => TextSource::ExternalBuffer(SharedBuffer::from_text(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Update the external state, then run one cycle.
    ///
    /// `flags` patch the running snapshot. `breakpoints` and `cursors`
    /// replace the state's values when present. `scroll_to` applies to
    /// this cycle only.
    Cycle {
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        breakpoints: Option<Vec<ExternalBreakpoint>>,
        #[serde(default)]
        cursors: Option<Vec<CursorPosition>>,
        #[serde(default)]
        scroll_to: Option<i64>,
    },
    MoveTo {
        line: i64,
        column: i64,
    },
    Move {
        direction: Direction,
    },
    Type {
        text: String,
    },
    Backspace,
}

impl Step {
    const fn action(&self) -> &'static str {
        match self {
            Self::Cycle { .. } => "cycle",
            Self::MoveTo { .. } => "move_to",
            Self::Move { .. } => "move",
            Self::Type { .. } => "type",
            Self::Backspace => "backspace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub text: ScriptText,
    /// Starting snapshot; defaults apply to anything left out.
    #[serde(default)]
    pub snapshot: ConfigurationSnapshot,
    /// Flag tokens applied over `snapshot`.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Initial bound cursor positions.
    #[serde(default)]
    pub cursors: Option<Vec<CursorPosition>>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleReport>,
    /// Whether a user edit was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    /// The bound cursor positions after the step.
    pub cursors: Vec<CursorPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub text: String,
    pub cursors: Vec<CursorPosition>,
    /// What the surface ended up applying.
    pub snapshot: ConfigurationSnapshot,
    pub stats: SurfaceStats,
}

impl ReplayReport {
    pub fn cycles(&self) -> impl Iterator<Item = &CycleReport> {
        self.steps.iter().filter_map(|step| step.cycle.as_ref())
    }
}

/// Replay `script` against a fresh [`TextSurface`](crate::surface::TextSurface).
///
/// `overrides` are applied over the script's starting snapshot, so
/// config files and the command line win over the script.
pub fn replay(script: &Script, overrides: &ConfigFlags) -> ReplayReport {
    let mut state = ExternalState::new(script.text.to_source());
    state.snapshot = script.snapshot.clone();
    parse_flag_tokens(&script.flags).apply_to(&mut state.snapshot);
    overrides.apply_to(&mut state.snapshot);
    if let Some(cursors) = &script.cursors {
        state.cursor_positions = Binding::new(cursors.clone());
    }

    let mut editor = SourceEditor::new(&state);
    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let _scope = crate::perf::scope("script.step");
        tracing::debug!(index, action = step.action(), "replaying step");
        let mut cycle = None;
        let mut accepted = None;
        match step {
            Step::Cycle {
                flags,
                breakpoints,
                cursors,
                scroll_to,
            } => {
                parse_flag_tokens(flags).apply_to(&mut state.snapshot);
                if let Some(breakpoints) = breakpoints {
                    state.breakpoints.clone_from(breakpoints);
                }
                if let Some(cursors) = cursors {
                    state.cursor_positions.set(cursors.clone());
                }
                state.scroll_target = *scroll_to;
                cycle = Some(editor.update(&state));
            }
            Step::MoveTo { line, column } => {
                editor.interact(|surface| surface.move_to(CursorPosition::new(*line, *column)));
            }
            Step::Move { direction } => {
                editor.interact(|surface| surface.move_cursor(*direction));
            }
            Step::Type { text } => {
                accepted = Some(editor.interact(|surface| surface.insert_str(text)));
            }
            Step::Backspace => {
                accepted = Some(editor.interact(|surface| surface.delete_back()));
            }
        }
        steps.push(StepReport {
            index,
            action: step.action(),
            cycle,
            accepted,
            cursors: state.cursor_positions.get(),
        });
    }

    let surface = editor.controller().borrow();
    let report = ReplayReport {
        steps,
        text: state.text.text(),
        cursors: state.cursor_positions.get(),
        snapshot: surface.live_snapshot(),
        stats: surface.stats().clone(),
    };
    drop(surface);
    editor.teardown();
    report
}
