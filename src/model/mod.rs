//! Value types exchanged between the external state owner and the
//! editing surface.
//!
//! Everything here is plain data: equality is field-wise and nothing
//! carries identity. The one exception is [`TextSource`], whose payloads
//! are shared handles into externally-owned text.

mod breakpoint;
mod cursor;
mod snapshot;
mod text_source;

pub use breakpoint::{Breakpoint, ExternalBreakpoint};
pub use cursor::CursorPosition;
pub use snapshot::{
    BracketPairHighlight, ConfigurationSnapshot, EdgeInsets, Field, FieldValue, Font,
    IndentOption, Language, Rgb, Theme, changed_fields, params_equal,
};
pub use text_source::{Binding, SharedBuffer, TextSource};
