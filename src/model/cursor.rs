use std::fmt;

use serde::{Deserialize, Serialize};

/// A cursor position in the external, 1-based representation.
///
/// Surfaces convert to their own base at their boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: i64,
    pub column: i64,
}

impl CursorPosition {
    pub const fn new(line: i64, column: i64) -> Self {
        Self { line, column }
    }

    /// The first character of the document.
    pub const fn start() -> Self {
        Self::new(1, 1)
    }
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<(i64, i64)> for CursorPosition {
    fn from((line, column): (i64, i64)) -> Self {
        Self::new(line, column)
    }
}
