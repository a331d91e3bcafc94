//! The YANG type system: built-in types, derived-type restrictions,
//! and value validation, per `spec.md` §3 (Type) and §4.6.

use crate::ast::argument::{Bound, RangeBound};
use crate::base::IStr;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: IStr,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitValue {
    pub name: IStr,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternGroup {
    /// Patterns given side by side within one type-derivation step:
    /// any one matching satisfies this group (OR-within-one-ancestor).
    pub alternatives: Vec<(IStr, bool)>, // (raw pattern, invert_match)
}

/// A compiled leafref path: resolved at schema-compile time to the
/// XPath program used to compute legal values, per `spec.md` §4.9.
#[derive(Debug, Clone)]
pub struct LeafrefPath {
    pub raw: IStr,
    pub program: crate::xpath::bytecode::ProgramId,
    pub require_instance: bool,
}

#[derive(Debug, Clone)]
pub enum Type {
    Binary { length: Vec<RangeBound> },
    Boolean,
    Decimal64 { fraction_digits: u8, range: Vec<RangeBound> },
    Empty,
    Enumeration { values: Vec<EnumValue> },
    Integer { bit_width: u8, range: Vec<RangeBound> },
    UnsignedInteger { bit_width: u8, range: Vec<RangeBound> },
    StringT { length: Vec<RangeBound>, patterns: Vec<PatternGroup> },
    Union { members: Vec<Type> },
    Identityref { bases: Vec<IStr> },
    InstanceIdentifier { require_instance: bool },
    Leafref(LeafrefPath),
    Bits { values: Vec<BitValue> },
}

#[derive(Debug, Clone, Default)]
pub struct TypeMeta {
    pub default: Option<IStr>,
    pub error_message: Option<IStr>,
    pub error_app_tag: Option<IStr>,
}

fn bound_value(b: Bound, default: i128) -> i128 {
    match b {
        Bound::Value(v) => v,
        Bound::Min | Bound::Max => default,
    }
}

/// Resolve `min`/`max` tokens in `ranges` against `(floor, ceiling)`
/// and check `value` falls within at least one alternative.
pub fn in_range(ranges: &[RangeBound], floor: i128, ceiling: i128, value: i128) -> bool {
    if ranges.is_empty() {
        return (floor..=ceiling).contains(&value);
    }
    ranges.iter().any(|r| {
        let lo = bound_value(r.lo, floor);
        let hi = bound_value(r.hi, ceiling);
        (lo..=hi).contains(&value)
    })
}

pub fn integer_bounds(bit_width: u8) -> (i128, i128) {
    match bit_width {
        8 => (i8::MIN as i128, i8::MAX as i128),
        16 => (i16::MIN as i128, i16::MAX as i128),
        32 => (i32::MIN as i128, i32::MAX as i128),
        64 => (i64::MIN as i128, i64::MAX as i128),
        _ => (i64::MIN as i128, i64::MAX as i128),
    }
}

pub fn unsigned_bounds(bit_width: u8) -> (i128, i128) {
    match bit_width {
        8 => (0, u8::MAX as i128),
        16 => (0, u16::MAX as i128),
        32 => (0, u32::MAX as i128),
        64 => (0, u64::MAX as i128),
        _ => (0, u64::MAX as i128),
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("value {value} out of range")]
    RangeViolation { value: String },
    #[error("value has length {length}, violates length restriction")]
    LengthViolation { length: usize },
    #[error("value does not match pattern")]
    PatternViolation,
    #[error("value does not match any union member")]
    UnionViolation,
    #[error("{value} is not a member of enumeration")]
    EnumViolation { value: String },
    #[error("{value} is not a known bit")]
    BitViolation { value: String },
    #[error("{value} is not a known identity")]
    IdentityViolation { value: String },
    #[error("invalid decimal64 literal: {value}")]
    Decimal64Syntax { value: String },
}

impl Type {
    /// Validate a raw lexical value against this type. Does not
    /// resolve leafref/identityref cross-references — those require
    /// tree context and are handled by the validator.
    pub fn validate(&self, value: &str) -> Result<(), ValueError> {
        match self {
            Type::Boolean => {
                if value == "true" || value == "false" {
                    Ok(())
                } else {
                    Err(ValueError::RangeViolation { value: value.to_string() })
                }
            }
            Type::Empty => Ok(()),
            Type::Binary { length } => {
                let decoded_len = (value.len() / 4) * 3; // rough base64 estimate
                if in_range(length, 0, i64::MAX as i128, decoded_len as i128) {
                    Ok(())
                } else {
                    Err(ValueError::LengthViolation { length: decoded_len })
                }
            }
            Type::Integer { bit_width, range } => {
                let (floor, ceiling) = integer_bounds(*bit_width);
                let v: i128 = value
                    .parse()
                    .map_err(|_| ValueError::RangeViolation { value: value.to_string() })?;
                if in_range(range, floor, ceiling, v) {
                    Ok(())
                } else {
                    Err(ValueError::RangeViolation { value: value.to_string() })
                }
            }
            Type::UnsignedInteger { bit_width, range } => {
                let (floor, ceiling) = unsigned_bounds(*bit_width);
                let v: i128 = value
                    .parse()
                    .map_err(|_| ValueError::RangeViolation { value: value.to_string() })?;
                if in_range(range, floor, ceiling, v) {
                    Ok(())
                } else {
                    Err(ValueError::RangeViolation { value: value.to_string() })
                }
            }
            Type::Decimal64 { fraction_digits, range } => {
                let scaled = parse_decimal64(value, *fraction_digits)
                    .ok_or_else(|| ValueError::Decimal64Syntax { value: value.to_string() })?;
                let ceiling = (2i128.pow(63) - 1) / 10i128.pow(0); // scaled-int ceiling is ±(2^63-1)
                if in_range(range, -(2i128.pow(63) - 1), ceiling, scaled) {
                    Ok(())
                } else {
                    Err(ValueError::RangeViolation { value: value.to_string() })
                }
            }
            Type::StringT { length, patterns } => {
                let len = value.chars().count();
                if !in_range(length, 0, i64::MAX as i128, len as i128) {
                    return Err(ValueError::LengthViolation { length: len });
                }
                for group in patterns {
                    let matched = group.alternatives.iter().any(|(raw, invert)| {
                        let re = crate::ast::argument::compile_pattern(
                            raw,
                            crate::base::Span::empty(crate::base::FileId(0), 0),
                        );
                        match re {
                            Ok(re) => re.is_match(value) != *invert,
                            Err(_) => false,
                        }
                    });
                    if !matched {
                        return Err(ValueError::PatternViolation);
                    }
                }
                Ok(())
            }
            Type::Enumeration { values } => {
                if values.iter().any(|e| &*e.name == value) {
                    Ok(())
                } else {
                    Err(ValueError::EnumViolation { value: value.to_string() })
                }
            }
            Type::Bits { values } => {
                for name in value.split_whitespace() {
                    if !values.iter().any(|b| &*b.name == name) {
                        return Err(ValueError::BitViolation { value: name.to_string() });
                    }
                }
                Ok(())
            }
            Type::Union { members } => {
                if members.iter().any(|m| m.validate(value).is_ok()) {
                    Ok(())
                } else {
                    Err(ValueError::UnionViolation)
                }
            }
            Type::Identityref { .. } => Ok(()), // resolved with identity registry by the validator
            Type::InstanceIdentifier { .. } => Ok(()),
            Type::Leafref(_) => Ok(()), // resolved against the data tree by the validator
        }
    }
}

/// Parse a decimal64 literal into its scaled-integer representation
/// (value × 10^fraction_digits), per `spec.md` §4.6.
pub fn parse_decimal64(raw: &str, fraction_digits: u8) -> Option<i128> {
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(r) => (-1i128, r),
        None => (1i128, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > fraction_digits as usize {
        return None;
    }
    let int_val: i128 = int_part.parse().ok()?;
    let mut frac_val: i128 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };
    let pad = fraction_digits as u32 - frac_part.len() as u32;
    frac_val *= 10i128.pow(pad);
    Some(sign * (int_val * 10i128.pow(fraction_digits as u32) + frac_val))
}

/// Compare two decimal64 scaled integers for equality/ordering — this
/// *is* the comparison, since both sides are already normalized to the
/// same fraction-digits scale at parse time (`spec.md` §4.6).
pub fn decimal64_cmp(a: i128, b: i128) -> std::cmp::Ordering {
    a.cmp(&b)
}

/// The fixed built-in type-name vocabulary (`spec.md` §6).
pub fn builtin_type(name: &str) -> Option<Type> {
    match name {
        "binary" => Some(Type::Binary { length: Vec::new() }),
        "bits" => Some(Type::Bits { values: Vec::new() }),
        "boolean" => Some(Type::Boolean),
        "decimal64" => Some(Type::Decimal64 { fraction_digits: 2, range: Vec::new() }),
        "empty" => Some(Type::Empty),
        "enumeration" => Some(Type::Enumeration { values: Vec::new() }),
        "identityref" => Some(Type::Identityref { bases: Vec::new() }),
        "instance-identifier" => Some(Type::InstanceIdentifier { require_instance: true }),
        "int8" => Some(Type::Integer { bit_width: 8, range: Vec::new() }),
        "int16" => Some(Type::Integer { bit_width: 16, range: Vec::new() }),
        "int32" => Some(Type::Integer { bit_width: 32, range: Vec::new() }),
        "int64" => Some(Type::Integer { bit_width: 64, range: Vec::new() }),
        "uint8" => Some(Type::UnsignedInteger { bit_width: 8, range: Vec::new() }),
        "uint16" => Some(Type::UnsignedInteger { bit_width: 16, range: Vec::new() }),
        "uint32" => Some(Type::UnsignedInteger { bit_width: 32, range: Vec::new() }),
        "uint64" => Some(Type::UnsignedInteger { bit_width: 64, range: Vec::new() }),
        "string" => Some(Type::StringT { length: Vec::new(), patterns: Vec::new() }),
        "union" => Some(Type::Union { members: Vec::new() }),
        _ => None,
    }
}

pub fn builtin_type_table() -> FxHashMap<&'static str, ()> {
    const NAMES: &[&str] = &[
        "binary",
        "bits",
        "boolean",
        "decimal64",
        "empty",
        "enumeration",
        "identityref",
        "instance-identifier",
        "int8",
        "int16",
        "int32",
        "int64",
        "uint8",
        "uint16",
        "uint32",
        "uint64",
        "leafref",
        "string",
        "union",
    ];
    NAMES.iter().map(|n| (*n, ())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal64_scales_fraction() {
        assert_eq!(parse_decimal64("1.5", 2), Some(150));
        assert_eq!(parse_decimal64("-1.5", 2), Some(-150));
        assert_eq!(parse_decimal64("3", 2), Some(300));
        assert_eq!(parse_decimal64("1.999", 2), None);
    }

    #[test]
    fn integer_range_respects_bit_width() {
        let t = Type::Integer { bit_width: 8, range: Vec::new() };
        assert!(t.validate("127").is_ok());
        assert!(t.validate("128").is_err());
    }

    #[test]
    fn union_first_match_wins() {
        let t = Type::Union {
            members: vec![
                Type::Integer { bit_width: 8, range: Vec::new() },
                Type::StringT { length: Vec::new(), patterns: Vec::new() },
            ],
        };
        assert!(t.validate("42").is_ok());
        assert!(t.validate("hello").is_ok());
    }

    #[test]
    fn string_length_is_code_point_count() {
        let t = Type::StringT { length: vec![RangeBound { lo: Bound::Value(0), hi: Bound::Value(2) }], patterns: Vec::new() };
        assert!(t.validate("ab").is_ok());
        assert!(t.validate("abc").is_err());
    }
}
