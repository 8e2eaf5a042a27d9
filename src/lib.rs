// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. surface::SurfaceEvent)
    clippy::module_name_repetitions
)]

//! # editsync
//!
//! Keeps a long-lived, stateful editing surface in step with a
//! declarative description of what it should look like.
//!
//! Each time the external state owner re-evaluates, it hands over a
//! complete [`ConfigurationSnapshot`](model::ConfigurationSnapshot),
//! the bound cursor positions and the breakpoint list. A reconciliation
//! cycle writes only the fields that differ from what the surface has
//! applied, pushes the breakpoints, and falls back to a full reload if
//! the surface did not converge. Surface-originated cursor moves flow
//! back into the binding without bouncing straight back in.
//!
//! ## Modules
//!
//! - [`model`]: snapshots, breakpoints, cursor positions, text sources
//! - [`surface`]: the editing-surface contract and a rope-backed surface
//! - [`sync`]: the reconciler and the feedback-suppressing coordinator
//! - [`config`]: flag-token config files
//! - [`script`]: scripted sessions for the `editsync` binary
//! - [`perf`]: timing scopes and the debug event log

pub mod config;
pub mod model;
pub mod perf;
pub mod script;
pub mod surface;
pub mod sync;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::model::{
        Breakpoint, ConfigurationSnapshot, CursorPosition, ExternalBreakpoint, Field, FieldValue,
        TextSource,
    };
    pub use crate::surface::{EditingSurface, SurfaceEvent, TextSurface};
    pub use crate::sync::{CycleOutcome, CycleReport, ExternalState, Reconciler, SourceEditor};
}
