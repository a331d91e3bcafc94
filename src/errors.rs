//! Error taxonomy shared by every layer of the compiler.
//!
//! Each layer (lexer, parser, schema compiler, XPath engine, validator)
//! defines its own `thiserror`-derived enum carrying a [`Span`]; a
//! top-level [`Error`] wraps all of them with `#[from]` so callers can
//! `?`-propagate across layer boundaries without manual conversion,
//! the same shape the teacher's `InterchangeError` uses for one layer
//! generalized to the whole crate. Validation errors are the exception:
//! they never propagate via `?` because `spec.md` requires every
//! violation to be collected and returned together (see
//! [`crate::validator::ValidationError`]).

use crate::base::{FileTable, LineIndex, Span};
use thiserror::Error;

/// The fixed error-tag vocabulary from `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorTag {
    CardinalityMismatch,
    InvalidIdentifier,
    InvalidDate,
    DuplicatedRevision,
    RevisionBlockOutOfOrder,
    UnexpectedHeaderStatement,
    UnexpectedLinkageStatement,
    UnexpectedMetaStatement,
    UnexpectedBodyStatement,
    UnknownImport,
    UnknownModule,
    Shadowing,
    EmptyXPath,
    UnterminatedString,
    UnclosedComment,
    PatternViolation,
    LengthViolation,
    RangeViolation,
    MustViolation,
    MissingElement,
    TooFewElements,
    TooManyElements,
    UnknownElement,
    DataMissing,
    DataExists,
    InvalidValue,
    OperationFailed,
}

impl ErrorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTag::CardinalityMismatch => "cardinality-mismatch",
            ErrorTag::InvalidIdentifier => "invalid-identifier",
            ErrorTag::InvalidDate => "invalid-date",
            ErrorTag::DuplicatedRevision => "duplicated-revision",
            ErrorTag::RevisionBlockOutOfOrder => "revision-block-out-of-order",
            ErrorTag::UnexpectedHeaderStatement => "unexpected-header-statement",
            ErrorTag::UnexpectedLinkageStatement => "unexpected-linkage-statement",
            ErrorTag::UnexpectedMetaStatement => "unexpected-meta-statement",
            ErrorTag::UnexpectedBodyStatement => "unexpected-body-statement",
            ErrorTag::UnknownImport => "unknown-import",
            ErrorTag::UnknownModule => "unknown-module",
            ErrorTag::Shadowing => "shadowing",
            ErrorTag::EmptyXPath => "empty-xpath",
            ErrorTag::UnterminatedString => "unterminated-string",
            ErrorTag::UnclosedComment => "unclosed-comment",
            ErrorTag::PatternViolation => "pattern-violation",
            ErrorTag::LengthViolation => "length-violation",
            ErrorTag::RangeViolation => "range-violation",
            ErrorTag::MustViolation => "must-violation",
            ErrorTag::MissingElement => "missing-element",
            ErrorTag::TooFewElements => "too-few-elements",
            ErrorTag::TooManyElements => "too-many-elements",
            ErrorTag::UnknownElement => "unknown-element",
            ErrorTag::DataMissing => "data-missing",
            ErrorTag::DataExists => "data-exists",
            ErrorTag::InvalidValue => "invalid-value",
            ErrorTag::OperationFailed => "operation-failed",
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered, source-positioned error ready to show a user.
///
/// Produced from a raw layer error plus the source text via
/// [`render`]. `snippet` is truncated to 20 characters with an
/// ellipsis, per `spec.md` §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub snippet: String,
    pub tag: ErrorTag,
    pub message: String,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {} (near \"{}\")",
            self.file, self.line, self.column, self.tag, self.message, self.snippet
        )
    }
}

const SNIPPET_MAX: usize = 20;

fn truncate_snippet(source: &str, span: Span) -> String {
    let raw = source
        .get(span.start as usize..span.end.max(span.start + 1).min(source.len() as u32) as usize)
        .unwrap_or("");
    let mut out: String = raw.chars().take(SNIPPET_MAX).collect();
    if raw.chars().count() > SNIPPET_MAX {
        out.push('\u{2026}');
    }
    out
}

/// Resolve a `(tag, message, span)` triple into a [`SourceError`] against
/// the owning file's source text.
pub fn render(
    files: &FileTable,
    source: &str,
    line_index: &LineIndex,
    span: Span,
    tag: ErrorTag,
    message: impl Into<String>,
) -> SourceError {
    let lc = line_index.line_col(source, span.start);
    SourceError {
        file: files.name(span.file).to_string(),
        line: lc.line,
        column: lc.column,
        snippet: truncate_snippet(source, span),
        tag,
        message: message.into(),
    }
}

/// Lexer-level errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unclosed block comment")]
    UnclosedComment { span: Span },
    #[error("expected quoted string after '+'")]
    DanglingConcatenation { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnclosedComment { span }
            | LexError::DanglingConcatenation { span } => *span,
        }
    }

    pub fn tag(&self) -> ErrorTag {
        match self {
            LexError::UnterminatedString { .. } => ErrorTag::UnterminatedString,
            LexError::UnclosedComment { .. } => ErrorTag::UnclosedComment,
            LexError::DanglingConcatenation { .. } => ErrorTag::UnterminatedString,
        }
    }
}

/// Parser/semantic errors produced while building the AST.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{message}")]
    Lex { span: Span, message: String },
    #[error("unexpected token")]
    UnexpectedToken { span: Span, found: String, expected: String },
    #[error("cardinality violation: {message}")]
    Cardinality { span: Span, message: String },
    #[error("invalid identifier, not allowed to start with xml: {name}")]
    InvalidIdentifier { span: Span, name: String },
    #[error("invalid date: {text}")]
    InvalidDate { span: Span, text: String },
    #[error("duplicated revision date {date}")]
    DuplicatedRevision { span: Span, date: String },
    #[error("revision block out of order {date}")]
    RevisionOutOfOrder { span: Span, date: String },
    #[error("unexpected header statement: {keyword}")]
    UnexpectedHeaderStatement { span: Span, keyword: String },
    #[error("unexpected linkage statement: {keyword}")]
    UnexpectedLinkageStatement { span: Span, keyword: String },
    #[error("unexpected meta statement: {keyword}")]
    UnexpectedMetaStatement { span: Span, keyword: String },
    #[error("unexpected body statement: {keyword}")]
    UnexpectedBodyStatement { span: Span, keyword: String },
    #[error("shadowing: '{name}' already declared in this scope")]
    Shadowing { span: Span, name: String },
    #[error("{message}")]
    InvalidArgument { span: Span, message: String },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::Cardinality { span, .. }
            | ParseError::InvalidIdentifier { span, .. }
            | ParseError::InvalidDate { span, .. }
            | ParseError::DuplicatedRevision { span, .. }
            | ParseError::RevisionOutOfOrder { span, .. }
            | ParseError::UnexpectedHeaderStatement { span, .. }
            | ParseError::UnexpectedLinkageStatement { span, .. }
            | ParseError::UnexpectedMetaStatement { span, .. }
            | ParseError::UnexpectedBodyStatement { span, .. }
            | ParseError::Shadowing { span, .. }
            | ParseError::InvalidArgument { span, .. } => *span,
        }
    }

    pub fn tag(&self) -> ErrorTag {
        match self {
            ParseError::Lex { .. } => ErrorTag::UnterminatedString,
            ParseError::UnexpectedToken { .. } => ErrorTag::UnknownElement,
            ParseError::Cardinality { .. } => ErrorTag::CardinalityMismatch,
            ParseError::InvalidIdentifier { .. } => ErrorTag::InvalidIdentifier,
            ParseError::InvalidDate { .. } => ErrorTag::InvalidDate,
            ParseError::DuplicatedRevision { .. } => ErrorTag::DuplicatedRevision,
            ParseError::RevisionOutOfOrder { .. } => ErrorTag::RevisionBlockOutOfOrder,
            ParseError::UnexpectedHeaderStatement { .. } => ErrorTag::UnexpectedHeaderStatement,
            ParseError::UnexpectedLinkageStatement { .. } => ErrorTag::UnexpectedLinkageStatement,
            ParseError::UnexpectedMetaStatement { .. } => ErrorTag::UnexpectedMetaStatement,
            ParseError::UnexpectedBodyStatement { .. } => ErrorTag::UnexpectedBodyStatement,
            ParseError::Shadowing { .. } => ErrorTag::Shadowing,
            ParseError::InvalidArgument { .. } => ErrorTag::InvalidValue,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex {
            span: e.span(),
            message: e.to_string(),
        }
    }
}

/// Schema-compilation errors: linkage, grouping/augment/deviation
/// application, type derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("unknown module: {name}")]
    UnknownModule { span: Span, name: String },
    #[error("unknown import: {name}")]
    UnknownImport { span: Span, name: String },
    #[error("{message}")]
    InvalidType { span: Span, message: String },
    #[error("{message}")]
    InvalidAugmentTarget { span: Span, message: String },
    #[error("{message}")]
    InvalidDeviationTarget { span: Span, message: String },
    #[error("{message}")]
    XPath { span: Span, message: String },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnknownModule { span, .. }
            | CompileError::UnknownImport { span, .. }
            | CompileError::InvalidType { span, .. }
            | CompileError::InvalidAugmentTarget { span, .. }
            | CompileError::InvalidDeviationTarget { span, .. }
            | CompileError::XPath { span, .. } => *span,
        }
    }

    pub fn tag(&self) -> ErrorTag {
        match self {
            CompileError::UnknownModule { .. } => ErrorTag::UnknownModule,
            CompileError::UnknownImport { .. } => ErrorTag::UnknownImport,
            CompileError::InvalidType { .. } => ErrorTag::InvalidValue,
            CompileError::InvalidAugmentTarget { .. } => ErrorTag::UnknownElement,
            CompileError::InvalidDeviationTarget { .. } => ErrorTag::UnknownElement,
            CompileError::XPath { .. } => ErrorTag::EmptyXPath,
        }
    }
}

/// XPath compile/runtime errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XPathError {
    #[error("empty XPath expression")]
    EmptyExpression { span: Span },
    #[error("unexpected token in XPath expression: {found}")]
    UnexpectedToken { span: Span, found: String },
    #[error("unknown function: {name}")]
    UnknownFunction { span: Span, name: String },
    #[error("wrong number of arguments to {name}: expected {expected}, got {got}")]
    ArityMismatch {
        span: Span,
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type error: {message}")]
    TypeError { span: Span, message: String },
    #[error("unknown namespace prefix: {prefix}")]
    UnknownPrefix { span: Span, prefix: String },
}

impl XPathError {
    pub fn span(&self) -> Span {
        match self {
            XPathError::EmptyExpression { span }
            | XPathError::UnexpectedToken { span, .. }
            | XPathError::UnknownFunction { span, .. }
            | XPathError::ArityMismatch { span, .. }
            | XPathError::TypeError { span, .. }
            | XPathError::UnknownPrefix { span, .. } => *span,
        }
    }

    pub fn tag(&self) -> ErrorTag {
        match self {
            XPathError::EmptyExpression { .. } => ErrorTag::EmptyXPath,
            _ => ErrorTag::OperationFailed,
        }
    }
}

/// Top-level error wrapping every layer, so a driver can `?`-propagate
/// through lex → parse → compile without manual conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    XPath(#[from] XPathError),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Lex(e) => e.span(),
            Error::Parse(e) => e.span(),
            Error::Compile(e) => e.span(),
            Error::XPath(e) => e.span(),
        }
    }

    pub fn tag(&self) -> ErrorTag {
        match self {
            Error::Lex(e) => e.tag(),
            Error::Parse(e) => e.tag(),
            Error::Compile(e) => e.tag(),
            Error::XPath(e) => e.tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;

    #[test]
    fn truncates_long_snippets_with_ellipsis() {
        let source = "this is a rather long unquoted string value";
        let span = Span::new(FileId(0), 0, source.len() as u32);
        let snippet = truncate_snippet(source, span);
        assert!(snippet.chars().count() <= SNIPPET_MAX + 1);
        assert!(snippet.ends_with('\u{2026}'));
    }

    #[test]
    fn short_snippets_are_not_truncated() {
        let source = "leaf";
        let span = Span::new(FileId(0), 0, source.len() as u32);
        assert_eq!(truncate_snippet(source, span), "leaf");
    }
}
