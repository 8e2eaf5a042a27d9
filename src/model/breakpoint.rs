use serde::{Deserialize, Serialize};

/// A breakpoint as the editing surface sees it.
///
/// `line` is 0-based. It is signed because the conversion from the
/// external 1-based form is unchecked: an external line of 0 arrives
/// here as -1 and is forwarded as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Breakpoint {
    pub line: i64,
    pub enabled: bool,
}

impl Breakpoint {
    pub const fn new(line: i64, enabled: bool) -> Self {
        Self { line, enabled }
    }

    /// Returns a copy with the enabled flag replaced.
    #[must_use]
    pub const fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }
}

/// A breakpoint as the external state owner supplies it (1-based line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalBreakpoint {
    pub line: i64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

impl ExternalBreakpoint {
    pub const fn new(line: i64, enabled: bool) -> Self {
        Self { line, enabled }
    }

    /// Convert to the surface's 0-based form.
    pub const fn to_internal(self) -> Breakpoint {
        Breakpoint {
            line: self.line.wrapping_sub(1),
            enabled: self.enabled,
        }
    }
}

impl From<ExternalBreakpoint> for Breakpoint {
    fn from(value: ExternalBreakpoint) -> Self {
        value.to_internal()
    }
}
