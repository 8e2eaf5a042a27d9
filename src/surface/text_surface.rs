use ropey::Rope;
use serde::{Deserialize, Serialize};

use crate::model::{
    Binding, Breakpoint, ConfigurationSnapshot, CursorPosition, Field, FieldValue, SharedBuffer,
    TextSource,
};

use super::{EditingSurface, SurfaceEvent};

/// Smallest line height multiple the surface will lay out.
pub const MIN_LINE_HEIGHT: f64 = 0.75;

/// Cursor position inside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// Zero-based line index.
    line: usize,
    /// Zero-based column, in chars.
    col: usize,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
}

impl Cursor {
    const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Counters describing what has been done to a surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceStats {
    /// Every field write, in order.
    pub field_writes: Vec<Field>,
    pub reloads: usize,
    pub breakpoint_pushes: usize,
    pub cursor_pushes: usize,
    /// 1-based lines passed to scroll-and-select.
    pub scrolls: Vec<i64>,
}

enum Storage {
    Owned(Rope),
    Shared(SharedBuffer),
}

/// A rope-backed editing surface.
///
/// Text comes from a [`TextSource`] chosen at construction: a binding
/// is copied into a rope the surface owns, an external buffer is edited
/// in place.
pub struct TextSurface {
    storage: Storage,
    config: ConfigurationSnapshot,
    /// Never empty; the first entry is the primary cursor.
    cursors: Vec<Cursor>,
    breakpoints: Vec<Breakpoint>,
    scroll_line: usize,
    selected_line: Option<usize>,
    layout_generation: u64,
    events: Vec<SurfaceEvent>,
    stats: SurfaceStats,
}

impl TextSurface {
    /// Create a surface over `source` with `config` applied.
    pub fn new(source: &TextSource, config: ConfigurationSnapshot) -> Self {
        let storage = match source {
            TextSource::Binding(binding) => Storage::Owned(Rope::from_str(&binding.borrow())),
            TextSource::ExternalBuffer(buffer) => Storage::Shared(buffer.clone()),
        };
        let mut surface = Self {
            storage,
            config: ConfigurationSnapshot::default(),
            cursors: vec![Cursor::at(0, 0)],
            breakpoints: Vec::new(),
            scroll_line: 0,
            selected_line: None,
            layout_generation: 0,
            events: Vec::new(),
            stats: SurfaceStats::default(),
        };
        for field in Field::ALL {
            surface.apply(config.get(field));
        }
        surface
    }

    /// Convenience constructor over an owned copy of `text`.
    pub fn from_text(text: &str) -> Self {
        let source = TextSource::Binding(Binding::new(text.to_string()));
        Self::new(&source, ConfigurationSnapshot::default())
    }

    pub const fn config(&self) -> &ConfigurationSnapshot {
        &self.config
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub const fn stats(&self) -> &SurfaceStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SurfaceStats::default();
    }

    /// Bumped by every [`reload_ui`](EditingSurface::reload_ui).
    pub const fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    /// First visible line (0-based).
    pub const fn scroll_line(&self) -> usize {
        self.scroll_line
    }

    /// Line selected by the last scroll-and-select (0-based).
    pub const fn selected_line(&self) -> Option<usize> {
        self.selected_line
    }

    /// Whether edits land in an externally-owned buffer.
    pub const fn edits_in_place(&self) -> bool {
        matches!(self.storage, Storage::Shared(_))
    }

    pub fn line_count(&self) -> usize {
        self.with_rope(Rope::len_lines)
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        self.with_rope(|rope| {
            if line_idx >= rope.len_lines() {
                return None;
            }
            let s = rope.line(line_idx).to_string();
            Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
        })
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.with_rope(|rope| line_len_in(rope, line_idx))
    }

    // --- User interaction ---

    /// Insert `s` at the primary cursor. Other cursors are dropped.
    ///
    /// Returns `false` when the surface is read-only or `s` is empty.
    pub fn insert_str(&mut self, s: &str) -> bool {
        if !self.config.is_editable || s.is_empty() {
            return false;
        }
        self.collapse_cursors();
        let cursor = self.cursors[0];
        let char_idx = self.with_rope(|rope| rope.line_to_char(cursor.line) + cursor.col);
        self.with_rope_mut(|rope| rope.insert(char_idx, s));

        let end = char_idx + s.chars().count();
        let (line, col) = self.with_rope(|rope| {
            let line = rope.char_to_line(end);
            (line, end - rope.line_to_char(line))
        });
        self.cursors[0] = Cursor::at(line, col);
        self.events.push(SurfaceEvent::TextChanged);
        self.notify_cursors();
        true
    }

    /// Delete the character before the primary cursor (Backspace).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        if !self.config.is_editable {
            return false;
        }
        self.collapse_cursors();
        let cursor = self.cursors[0];
        if cursor.line == 0 && cursor.col == 0 {
            return false;
        }

        let char_idx = self.with_rope(|rope| rope.line_to_char(cursor.line) + cursor.col);
        // A CRLF pair is removed as one line break
        let width = self.with_rope(|rope| {
            if cursor.col == 0 && char_idx >= 2 && rope.slice(char_idx - 2..char_idx) == "\r\n" {
                2
            } else {
                1
            }
        });
        let new_col = if cursor.col == 0 {
            self.line_len(cursor.line - 1)
        } else {
            cursor.col - 1
        };
        self.with_rope_mut(|rope| rope.remove(char_idx - width..char_idx));
        self.cursors[0] = if cursor.col == 0 {
            Cursor::at(cursor.line - 1, new_col)
        } else {
            Cursor::at(cursor.line, new_col)
        };
        self.events.push(SurfaceEvent::TextChanged);
        self.notify_cursors();
        true
    }

    /// Move every cursor in the given direction.
    pub fn move_cursor(&mut self, direction: Direction) {
        let before = self.cursors.clone();
        let moved: Vec<Cursor> = self
            .cursors
            .iter()
            .map(|&cursor| self.with_rope(|rope| step(rope, cursor, direction)))
            .collect();
        self.cursors = dedup_cursors(moved);
        if self.cursors != before {
            self.notify_cursors();
        }
    }

    /// Place a single cursor at a 1-based position, clamped to the text.
    pub fn move_to(&mut self, position: CursorPosition) {
        let target = self.with_rope(|rope| clamp_position(rope, position));
        if self.cursors != [target] {
            self.cursors = vec![target];
            self.notify_cursors();
        }
    }

    // --- Private helpers ---

    fn with_rope<R>(&self, f: impl FnOnce(&Rope) -> R) -> R {
        match &self.storage {
            Storage::Owned(rope) => f(rope),
            Storage::Shared(buffer) => f(&buffer.borrow()),
        }
    }

    fn with_rope_mut<R>(&mut self, f: impl FnOnce(&mut Rope) -> R) -> R {
        match &mut self.storage {
            Storage::Owned(rope) => f(rope),
            Storage::Shared(buffer) => f(&mut buffer.borrow_mut()),
        }
    }

    fn collapse_cursors(&mut self) {
        self.cursors.truncate(1);
        // The shared buffer may have been edited behind our back
        let clamped = self.with_rope(|rope| {
            let c = self.cursors[0];
            let line = c.line.min(rope.len_lines().saturating_sub(1));
            Cursor::at(line, c.col.min(line_len_in(rope, line)))
        });
        self.cursors[0] = clamped;
    }

    fn notify_cursors(&mut self) {
        let positions = self.cursor_positions();
        self.events.push(SurfaceEvent::CursorsMoved(positions));
    }

    /// Store a field value, coercing the ones the surface cannot lay out.
    fn apply(&mut self, value: FieldValue) {
        let value = match value {
            FieldValue::TabWidth(width) => FieldValue::TabWidth(width.max(1)),
            FieldValue::LineHeight(height) if height.is_nan() || height < MIN_LINE_HEIGHT => {
                FieldValue::LineHeight(MIN_LINE_HEIGHT)
            }
            other => other,
        };
        self.config.set(value);
    }
}

impl EditingSurface for TextSurface {
    fn read_field(&self, field: Field) -> FieldValue {
        self.config.get(field)
    }

    fn write_field(&mut self, value: FieldValue) {
        let field = value.field();
        tracing::trace!(%field, "surface field write");
        self.stats.field_writes.push(field);
        self.apply(value);
    }

    fn live_snapshot(&self) -> ConfigurationSnapshot {
        self.config.clone()
    }

    fn set_breakpoints(&mut self, breakpoints: Vec<Breakpoint>) {
        self.stats.breakpoint_pushes += 1;
        self.breakpoints = breakpoints;
    }

    fn set_cursor_positions(&mut self, positions: &[CursorPosition]) {
        self.stats.cursor_pushes += 1;
        if positions.is_empty() {
            return;
        }
        let cursors = self.with_rope(|rope| {
            positions
                .iter()
                .map(|&position| clamp_position(rope, position))
                .collect::<Vec<_>>()
        });
        self.cursors = dedup_cursors(cursors);
        self.notify_cursors();
    }

    fn cursor_positions(&self) -> Vec<CursorPosition> {
        self.cursors
            .iter()
            .map(|c| CursorPosition::new(to_i64(c.line) + 1, to_i64(c.col) + 1))
            .collect()
    }

    fn reload_ui(&mut self) {
        self.stats.reloads += 1;
        self.layout_generation += 1;
        tracing::debug!(generation = self.layout_generation, "surface reloaded");
    }

    fn scroll_to_line_and_select(&mut self, line: i64) {
        self.stats.scrolls.push(line);
        let target = self.with_rope(|rope| clamp_position(rope, CursorPosition::new(line, 1)));
        self.scroll_line = target.line;
        self.selected_line = Some(target.line);
        self.cursors = vec![target];
        self.notify_cursors();
    }

    fn text(&self) -> String {
        self.with_rope(Rope::to_string)
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for TextSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSurface")
            .field("lines", &self.line_count())
            .field("in_place", &self.edits_in_place())
            .field("cursors", &self.cursors)
            .field("breakpoints", &self.breakpoints.len())
            .field("layout_generation", &self.layout_generation)
            .finish_non_exhaustive()
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn line_len_in(rope: &Rope, line_idx: usize) -> usize {
    if line_idx >= rope.len_lines() {
        return 0;
    }
    let line = rope.line(line_idx);
    let mut len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}

/// Convert a 1-based position to a 0-based cursor inside the text.
fn clamp_position(rope: &Rope, position: CursorPosition) -> Cursor {
    let max_line = rope.len_lines().saturating_sub(1);
    let line = usize::try_from(position.line.saturating_sub(1).max(0))
        .unwrap_or(usize::MAX)
        .min(max_line);
    let col = usize::try_from(position.column.saturating_sub(1).max(0))
        .unwrap_or(usize::MAX)
        .min(line_len_in(rope, line));
    Cursor::at(line, col)
}

fn step(rope: &Rope, mut cursor: Cursor, direction: Direction) -> Cursor {
    let last_line = rope.len_lines().saturating_sub(1);
    match direction {
        Direction::Left => {
            if cursor.col > 0 {
                cursor.set_col(cursor.col - 1);
            } else if cursor.line > 0 {
                cursor.line -= 1;
                cursor.set_col(line_len_in(rope, cursor.line));
            }
        }
        Direction::Right => {
            if cursor.col < line_len_in(rope, cursor.line) {
                cursor.set_col(cursor.col + 1);
            } else if cursor.line < last_line {
                cursor.line += 1;
                cursor.set_col(0);
            }
        }
        Direction::Up => {
            if cursor.line > 0 {
                cursor.line -= 1;
                cursor.col = cursor.col_memory.min(line_len_in(rope, cursor.line));
            }
        }
        Direction::Down => {
            if cursor.line < last_line {
                cursor.line += 1;
                cursor.col = cursor.col_memory.min(line_len_in(rope, cursor.line));
            }
        }
    }
    cursor
}

/// Drop cursors that landed on the same spot, keeping first occurrences.
fn dedup_cursors(cursors: Vec<Cursor>) -> Vec<Cursor> {
    let mut out: Vec<Cursor> = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        if !out
            .iter()
            .any(|c| c.line == cursor.line && c.col == cursor.col)
        {
            out.push(cursor);
        }
    }
    out
}
