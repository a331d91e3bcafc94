//! The built-in XPath function table, per `spec.md` §4.9.
//!
//! Each entry is looked up by name at VM runtime; [`intern_name`]
//! converts a dynamically parsed function name to a `&'static str` key
//! (avoiding a `String` on every `Builtin` opcode) by matching against
//! the fixed vocabulary, falling back to a registry of user-registered
//! names supplied at `Vm::run` time.

use super::vm::{Datum, VmError};

const BUILTIN_NAMES: &[&str] = &[
    "boolean",
    "ceiling",
    "floor",
    "round",
    "concat",
    "contains",
    "count",
    "current",
    "last",
    "position",
    "local-name",
    "normalize-space",
    "not",
    "number",
    "starts-with",
    "string",
    "string-length",
    "substring",
    "substring-before",
    "substring-after",
    "sum",
    "translate",
    "true",
    "false",
];

/// Resolve a parsed function name to the `&'static str` used as the
/// `Builtin` opcode key, falling back to a leaked copy for
/// user-registered functions not in the fixed vocabulary — leaking is
/// acceptable here since distinct custom function names are bounded by
/// the number of expressions compiled in a process lifetime, not by
/// evaluation volume.
pub fn intern_name(name: &str) -> &'static str {
    if let Some(n) = BUILTIN_NAMES.iter().find(|n| **n == name) {
        return n;
    }
    Box::leak(name.to_string().into_boxed_str())
}

pub fn arity_ok(name: &str, arity: u8) -> bool {
    match name {
        "boolean" | "ceiling" | "floor" | "round" | "count" | "local-name" | "normalize-space"
        | "not" | "number" | "string" | "string-length" | "sum" => arity <= 1,
        "current" | "last" | "position" | "true" | "false" => arity == 0,
        "contains" | "starts-with" | "substring-before" | "substring-after" => arity == 2,
        "concat" => arity >= 2,
        "translate" => arity == 3,
        "substring" => arity == 2 || arity == 3,
        _ => true,
    }
}

pub fn call(name: &str, args: Vec<Datum>) -> Result<Datum, VmError> {
    match name {
        "true" => Ok(Datum::Bool(true)),
        "false" => Ok(Datum::Bool(false)),
        "not" => Ok(Datum::Bool(!as_bool(&args[0]))),
        "boolean" => Ok(Datum::Bool(as_bool(&args[0]))),
        "number" => Ok(Datum::Number(as_number(&args[0]))),
        "string" => Ok(Datum::Literal(as_string(&args[0]).into())),
        "string-length" => {
            let s = if args.is_empty() { String::new() } else { as_string(&args[0]) };
            Ok(Datum::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = if args.is_empty() { String::new() } else { as_string(&args[0]) };
            Ok(Datum::Literal(s.split_whitespace().collect::<Vec<_>>().join(" ").into()))
        }
        "concat" => {
            let mut out = String::new();
            for a in &args {
                out.push_str(&as_string(a));
            }
            Ok(Datum::Literal(out.into()))
        }
        "contains" => Ok(Datum::Bool(as_string(&args[0]).contains(&as_string(&args[1])))),
        "starts-with" => Ok(Datum::Bool(as_string(&args[0]).starts_with(&as_string(&args[1])))),
        "substring-before" => {
            let (h, n) = (as_string(&args[0]), as_string(&args[1]));
            Ok(Datum::Literal(h.split_once(&n).map(|(a, _)| a.to_string()).unwrap_or_default().into()))
        }
        "substring-after" => {
            let (h, n) = (as_string(&args[0]), as_string(&args[1]));
            Ok(Datum::Literal(h.split_once(&n).map(|(_, b)| b.to_string()).unwrap_or_default().into()))
        }
        "substring" => {
            let s: Vec<char> = as_string(&args[0]).chars().collect();
            let start = as_number(&args[1]).round();
            let len = if args.len() > 2 { as_number(&args[2]).round() } else { f64::INFINITY };
            let begin = (start - 1.0).max(0.0) as usize;
            let end_f = (start - 1.0 + len).max(0.0);
            let end = if end_f.is_infinite() { s.len() } else { (end_f as usize).min(s.len()) };
            let begin = begin.min(s.len());
            let end = end.max(begin);
            Ok(Datum::Literal(s[begin..end].iter().collect::<String>().into()))
        }
        "translate" => {
            let (s, from, to) = (as_string(&args[0]), as_string(&args[1]), as_string(&args[2]));
            let from_chars: Vec<char> = from.chars().collect();
            let to_chars: Vec<char> = to.chars().collect();
            let out: String = s
                .chars()
                .filter_map(|c| match from_chars.iter().position(|f| *f == c) {
                    Some(i) => to_chars.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(Datum::Literal(out.into()))
        }
        "ceiling" => Ok(Datum::Number(as_number(&args[0]).ceil())),
        "floor" => Ok(Datum::Number(as_number(&args[0]).floor())),
        "round" => Ok(Datum::Number(as_number(&args[0]).round())),
        "count" => match &args[0] {
            Datum::NodeSet(ns) => Ok(Datum::Number(ns.len() as f64)),
            _ => Err(VmError::TypeError("count() expects a node-set".into())),
        },
        "sum" => match &args[0] {
            Datum::NodeSet(ns) => Ok(Datum::Number(ns.iter().map(|n| n.numeric_value()).sum())),
            _ => Err(VmError::TypeError("sum() expects a node-set".into())),
        },
        "local-name" => match args.first() {
            Some(Datum::NodeSet(ns)) => Ok(Datum::Literal(
                ns.first().map(|n| n.local_name()).unwrap_or_default().into(),
            )),
            _ => Ok(Datum::Literal("".into())),
        },
        _ => Err(VmError::UnknownFunction(name.to_string())),
    }
}

pub fn as_bool(d: &Datum) -> bool {
    match d {
        Datum::Bool(b) => *b,
        Datum::Number(n) => *n != 0.0 && !n.is_nan(),
        Datum::Literal(s) => !s.is_empty(),
        Datum::NodeSet(ns) => !ns.is_empty(),
    }
}

pub fn as_number(d: &Datum) -> f64 {
    match d {
        Datum::Number(n) => *n,
        Datum::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Datum::Literal(s) => parse_xpath_number(s),
        Datum::NodeSet(ns) => {
            ns.first().map(|n| parse_xpath_number(&n.string_value())).unwrap_or(f64::NAN)
        }
    }
}

/// `number()` conversion per XPath 1.0: leading/trailing whitespace is
/// trimmed; anything else malformed (including embedded whitespace)
/// yields `NaN`. `"NaN"`, `"Infinity"`, `"-Infinity"` are recognised
/// only here, never as direct numeric literals (`spec.md` §6).
pub fn parse_xpath_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "NaN" => f64::NAN,
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

pub fn as_string(d: &Datum) -> String {
    match d {
        Datum::Literal(s) => s.to_string(),
        Datum::Number(n) => format_xpath_number(*n),
        Datum::Bool(b) => b.to_string(),
        Datum::NodeSet(ns) => ns.first().map(|n| n.string_value()).unwrap_or_default(),
    }
}

pub fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
