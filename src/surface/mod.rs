//! The editing-surface controller contract.
//!
//! The reconciliation layer only ever talks to a surface through
//! [`EditingSurface`]: per-field reads and writes, a breakpoint setter,
//! cursor pushes, a full reload, scroll-and-select, and a synchronous
//! notification queue. [`TextSurface`] is a rope-backed implementation.

mod text_surface;

pub use text_surface::{Direction, SurfaceStats, TextSurface};

use serde::{Deserialize, Serialize};

use crate::model::{Breakpoint, ConfigurationSnapshot, CursorPosition, Field, FieldValue};

/// A notification emitted by a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// The cursor set changed. Positions are 1-based.
    CursorsMoved(Vec<CursorPosition>),
    /// The text content changed.
    TextChanged,
}

/// A long-lived, stateful editing surface.
///
/// Writes must not fail. A surface may coerce a written value, in which
/// case a later [`read_field`](Self::read_field) returns the coerced value.
pub trait EditingSurface {
    /// The value of `field` as currently applied.
    fn read_field(&self, field: Field) -> FieldValue;

    /// Apply a single field.
    fn write_field(&mut self, value: FieldValue);

    /// All currently applied fields as one snapshot.
    fn live_snapshot(&self) -> ConfigurationSnapshot {
        let mut snapshot = ConfigurationSnapshot::default();
        for field in Field::ALL {
            snapshot.set(self.read_field(field));
        }
        snapshot
    }

    /// Replace the breakpoint list. Lines are 0-based.
    fn set_breakpoints(&mut self, breakpoints: Vec<Breakpoint>);

    /// Replace the cursor set. Positions are 1-based.
    fn set_cursor_positions(&mut self, positions: &[CursorPosition]);

    fn cursor_positions(&self) -> Vec<CursorPosition>;

    /// Rebuild layout and rendering state.
    fn reload_ui(&mut self);

    /// Scroll so that 1-based `line` is visible and select it.
    fn scroll_to_line_and_select(&mut self, line: i64);

    fn text(&self) -> String;

    /// Drain pending notifications.
    fn take_events(&mut self) -> Vec<SurfaceEvent>;
}
