//! Loose conversions used by comparison, arithmetic and string operators.
//!
//! Rules arrive from JavaScript-first tooling, so `"1" == 1` and
//! `{"+": ["1", 1]}` are expected to work. These helpers pin down exactly
//! which coercions happen instead of leaning on Rust's own conversions.

use crate::value::Value;
use std::cmp::Ordering;

/// Render a number the way rule authors expect to read it: integral values
/// without a fraction, `NaN`/`Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// String form of a value; arrays join their elements with `,` and render
/// `null` elements as empty.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) | Value::Host(_) => "[object Object]".to_string(),
    }
}

/// Whole-string numeric conversion: surrounding whitespace is ignored, the
/// empty string is zero, anything else unparseable is NaN.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that rules must not.
    if trimmed
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Numeric conversion of any value.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => parse_number(s),
        Value::Array(_) => parse_number(&to_text(value)),
        Value::Object(_) | Value::Host(_) => f64::NAN,
    }
}

/// Longest numeric prefix of `text` (after leading whitespace), NaN when
/// there is none. `"12px"` is 12.
pub fn parse_float_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let mantissa = &s[digits_start..end];
    if mantissa.is_empty() || mantissa == "." {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Type-and-value equality (`===`). Containers compare structurally.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// Coercing equality (`==`).
///
/// Two arrays or two objects compare structurally. Decoded rule data has no
/// reference identity, so `{"==": [[1], [1]]}` is `true` here where a
/// JavaScript engine compares references and answers `false`. Host
/// references still compare by identity.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            *n == parse_number(s)
        }
        (Value::Bool(x), other) | (other, Value::Bool(x)) => {
            loose_eq(&Value::Number(if *x { 1.0 } else { 0.0 }), other)
        }
        (Value::Host(x), Value::Host(y)) => x.ptr_eq(y),
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => a == b,
        (container @ (Value::Array(_) | Value::Object(_) | Value::Host(_)), primitive)
        | (primitive, container @ (Value::Array(_) | Value::Object(_) | Value::Host(_))) => {
            if matches!(primitive, Value::Array(_) | Value::Object(_) | Value::Host(_)) {
                return false;
            }
            loose_eq(&Value::String(to_text(container)), primitive)
        }
    }
}

fn primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Host(_) => Value::String(to_text(value)),
        other => other.clone(),
    }
}

/// Relational ordering used by `<`, `<=`, `>`, `>=`. Two strings compare
/// lexically; any other pair compares numerically. `None` when either side
/// is NaN.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    let (a, b) = (primitive(a), primitive(b));
    if let (Value::String(x), Value::String(y)) = (&a, &b) {
        return Some(x.cmp(y));
    }
    to_number(&a).partial_cmp(&to_number(&b))
}
