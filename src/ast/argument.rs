//! Typed statement arguments.
//!
//! `spec.md` §9 Design Notes calls out the source's "stringly-typed
//! arguments" (a raw string re-parsed by accessor methods on every
//! read) as a pattern to replace with a sum type. [`Argument`] is that
//! sum type: each statement's raw argument text is parsed exactly once
//! by its kind-specific constructor in [`parse`], producing a value
//! that needs no further validation at the point of use.

use crate::ast::kind::StatementKind;
use crate::base::{IStr, Interner};
use crate::errors::ParseError;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    None,
    Identifier(IStr),
    IdentifierRef { prefix: Option<IStr>, name: IStr },
    Uri(IStr),
    Boolean(bool),
    Integer(i64),
    Unsigned(u64),
    Date { year: u16, month: u8, day: u8 },
    KeyList(Vec<IStr>),
    Pattern { raw: IStr, invert_match: bool },
    RangePart(Vec<RangeBound>),
    LengthPart(Vec<RangeBound>),
    FractionDigits(u8),
    UniquePathList(Vec<Vec<IStr>>),
    SchemaPath { absolute: bool, segments: Vec<Argument> },
    ParentStep,
    DeviateVerb(DeviateVerb),
    YangVersion,
    MaxValueOrUnbounded(Option<u64>),
    StatusEnum(Status),
    OrderedByEnum(OrderedBy),
    Text(IStr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviateVerb {
    NotSupported,
    Add,
    Delete,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Current,
    Deprecated,
    Obsolete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedBy {
    System,
    User,
}

/// One endpoint of a range/length bound: either a literal value or the
/// `min`/`max` keyword (which resolves against the base type later).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    Value(i128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBound {
    pub lo: Bound,
    pub hi: Bound,
}

fn make_err(span: crate::base::Span, message: impl Into<String>) -> ParseError {
    ParseError::InvalidArgument { span, message: message.into() }
}

pub fn parse_identifier(
    raw: &str,
    span: crate::base::Span,
    interner: &mut Interner,
) -> Result<IStr, ParseError> {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => {
            return Err(make_err(span, format!("invalid identifier: {raw}")));
        }
    }
    if !raw.chars().skip(1).all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(make_err(span, format!("invalid identifier: {raw}")));
    }
    if raw.len() >= 3 && raw[..3].eq_ignore_ascii_case("xml") {
        return Err(ParseError::InvalidIdentifier { span, name: raw.to_string() });
    }
    Ok(interner.intern(raw))
}

pub fn parse_identifier_ref(
    raw: &str,
    span: crate::base::Span,
    interner: &mut Interner,
) -> Result<(Option<IStr>, IStr), ParseError> {
    match raw.split_once(':') {
        Some((prefix, name)) => {
            let prefix = parse_identifier(prefix, span, interner)?;
            let name = parse_identifier(name, span, interner)?;
            Ok((Some(prefix), name))
        }
        None => Ok((None, parse_identifier(raw, span, interner)?)),
    }
}

pub fn parse_date(raw: &str, span: crate::base::Span) -> Result<(u16, u8, u8), ParseError> {
    let bad = || ParseError::InvalidDate { span, text: raw.to_string() };
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return Err(bad());
    }
    let year: u16 = parts[0].parse().map_err(|_| bad())?;
    let month: u8 = parts[1].parse().map_err(|_| bad())?;
    let day: u8 = parts[2].parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(bad());
    }
    Ok((year, month, day))
}

pub fn parse_key_list(
    raw: &str,
    span: crate::base::Span,
    interner: &mut Interner,
) -> Result<Vec<IStr>, ParseError> {
    raw.split_whitespace()
        .map(|s| parse_identifier(s, span, interner))
        .collect()
}

fn parse_bound(tok: &str, span: crate::base::Span) -> Result<Bound, ParseError> {
    match tok {
        "min" => Ok(Bound::Min),
        "max" => Ok(Bound::Max),
        other => other
            .parse::<i128>()
            .map(Bound::Value)
            .map_err(|_| make_err(span, format!("invalid numeric bound: {other}"))),
    }
}

/// Shared parser for `range` and `length` argument syntax:
/// `|`-separated alternatives, each `value` or `min..max`.
pub fn parse_range_like(raw: &str, span: crate::base::Span) -> Result<Vec<RangeBound>, ParseError> {
    raw.split('|')
        .map(|part| {
            let part = part.trim();
            if let Some((lo, hi)) = part.split_once("..") {
                Ok(RangeBound {
                    lo: parse_bound(lo.trim(), span)?,
                    hi: parse_bound(hi.trim(), span)?,
                })
            } else {
                let v = parse_bound(part, span)?;
                Ok(RangeBound { lo: v, hi: v })
            }
        })
        .collect()
}

pub fn parse_fraction_digits(raw: &str, span: crate::base::Span) -> Result<u8, ParseError> {
    let v: u8 = raw
        .parse()
        .map_err(|_| make_err(span, format!("invalid fraction-digits: {raw}")))?;
    if !(1..=18).contains(&v) {
        return Err(make_err(span, "fraction-digits must be in range 1..18"));
    }
    Ok(v)
}

pub fn parse_max_value(raw: &str, span: crate::base::Span) -> Result<Option<u64>, ParseError> {
    if raw == "unbounded" {
        Ok(None)
    } else {
        raw.parse::<u64>()
            .map(Some)
            .map_err(|_| make_err(span, format!("invalid max-elements value: {raw}")))
    }
}

pub fn parse_yang_version(raw: &str, span: crate::base::Span) -> Result<(), ParseError> {
    if raw == "1" {
        Ok(())
    } else {
        Err(make_err(span, format!("unsupported yang-version: {raw}")))
    }
}

pub fn parse_boolean(raw: &str, span: crate::base::Span) -> Result<bool, ParseError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(make_err(span, format!("expected true/false, got {other}"))),
    }
}

pub fn parse_status(raw: &str, span: crate::base::Span) -> Result<Status, ParseError> {
    match raw {
        "current" => Ok(Status::Current),
        "deprecated" => Ok(Status::Deprecated),
        "obsolete" => Ok(Status::Obsolete),
        other => Err(make_err(span, format!("invalid status: {other}"))),
    }
}

pub fn parse_ordered_by(raw: &str, span: crate::base::Span) -> Result<OrderedBy, ParseError> {
    match raw {
        "system" => Ok(OrderedBy::System),
        "user" => Ok(OrderedBy::User),
        other => Err(make_err(span, format!("invalid ordered-by: {other}"))),
    }
}

pub fn parse_deviate_verb(raw: &str, span: crate::base::Span) -> Result<DeviateVerb, ParseError> {
    match raw {
        "not-supported" => Ok(DeviateVerb::NotSupported),
        "add" => Ok(DeviateVerb::Add),
        "delete" => Ok(DeviateVerb::Delete),
        "replace" => Ok(DeviateVerb::Replace),
        other => Err(make_err(span, format!("invalid deviate verb: {other}"))),
    }
}

/// XSD pattern syntax normalised to Rust `regex` syntax: `\p{IsBasicLatin}`
/// is replaced by `[\x00-\x7F]` and the whole pattern anchored.
pub fn normalize_pattern(raw: &str) -> String {
    let body = raw.replace(r"\p{IsBasicLatin}", r"[\x00-\x7F]");
    format!("^(?:{body})$")
}

pub fn compile_pattern(raw: &str, span: crate::base::Span) -> Result<regex::Regex, ParseError> {
    regex::Regex::new(&normalize_pattern(raw))
        .map_err(|e| make_err(span, format!("invalid pattern: {e}")))
}

/// A schema path: `/`-separated identifier-refs, or (for a relative
/// leafref path) `..` parent-step tokens; a leading `/` marks an
/// absolute path, its absence a relative one.
pub fn parse_schema_path(
    raw: &str,
    span: crate::base::Span,
    interner: &mut Interner,
) -> Result<(bool, Vec<Argument>), ParseError> {
    let absolute = raw.starts_with('/');
    let segments = raw
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s == ".." {
                Ok(Argument::ParentStep)
            } else {
                let (prefix, name) = parse_identifier_ref(s, span, interner)?;
                Ok(Argument::IdentifierRef { prefix, name })
            }
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok((absolute, segments))
}

/// Dedupe interned argument payloads by `(kind-tag, raw-string)`, per
/// `spec.md` §4.3.
#[derive(Default)]
pub struct ArgumentInterner {
    seen: FxHashMap<(StatementKind, String), ()>,
}

impl ArgumentInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, kind: StatementKind, raw: &str) -> bool {
        self.seen.insert((kind, raw.to_string()), ()).is_none()
    }
}
