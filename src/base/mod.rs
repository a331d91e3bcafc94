//! Foundation types shared across the lexer, parser, schema compiler and
//! XPath engine: file identifiers, source positions, and string interning.
//!
//! This module has no dependency on any other module in the crate.

mod file_id;
mod interner;
mod position;

pub use file_id::{FileId, FileTable};
pub use interner::{IStr, Interner};
pub use position::{LineCol, LineIndex, Span};
