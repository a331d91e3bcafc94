//! A YANG (RFC 6020/7950) compiler front end and evaluation engine.
//!
//! Module layout, leaves first:
//!
//!   - [`base`]    — file ids, source spans, string interning.
//!   - [`errors`]  — the layered error taxonomy and source-positioned rendering.
//!   - [`lexer`]   — the hand-written YANG token stream.
//!   - [`ast`]     — typed statement arena, argument parsers, cardinality table, scopes.
//!   - [`parser`]  — tokens → [`ast::Tree`].
//!   - [`schema`]  — linkage resolution, `uses`/`augment`/`deviation`, the compiled [`schema::ModelSet`].
//!   - [`types`]   — the YANG type system and value validation.
//!   - [`xpath`]   — the shared lexer, three grammars, bytecode, and stack VM.
//!   - [`validator`] — walks a data tree against a compiled schema.
//!   - [`options`] — compile/validate option structs.
//!   - [`pretty`]  — diagnostic pretty-printer for the AST and compiled schema tree.

pub mod ast;
pub mod base;
pub mod errors;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod pretty;
pub mod schema;
pub mod types;
pub mod validator;
pub mod xpath;

pub use base::{FileId, FileTable, IStr, Interner};
pub use errors::{Error, ErrorTag, SourceError};

use ast::cardinality::{CardinalityTable, ExtensionEntry};
use ast::Tree;

/// Parse one module's source text into a checked AST, using a fresh
/// cardinality table with no extension entries. For compiling several
/// modules together (so imports resolve against each other), build a
/// [`CardinalityTable`] once and call [`parser::Parser::new`] directly
/// per file, sharing one [`Interner`].
pub fn parse_module(
    source: &str,
    file_name: &str,
) -> Result<(Tree, FileTable, Interner), Error> {
    parse_module_with_extensions(source, file_name, &[])
}

pub fn parse_module_with_extensions(
    source: &str,
    file_name: &str,
    extensions: &[ExtensionEntry],
) -> Result<(Tree, FileTable, Interner), Error> {
    let mut interner = Interner::new();
    let mut files = FileTable::new();
    let file = files.intern(&mut interner, file_name);
    let table = CardinalityTable::build(extensions);
    let parser = parser::Parser::new(source, file, &mut interner, &table);
    let mut tree = parser.parse_module(source.to_string()).map_err(Error::Parse)?;
    ast::resolve::resolve(&mut tree).map_err(Error::Parse)?;
    Ok((tree, files, interner))
}
