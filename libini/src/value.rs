//! INI value representation.

use crate::escape;
use std::fmt;

/// The four kinds of value an INI line can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Float,
}

impl ValueType {
    /// Infer the kind of a raw value text: bool, then int, then float, then string.
    pub fn infer(text: &str) -> ValueType {
        if parse_bool(text).is_some() {
            ValueType::Bool
        } else if text.parse::<i64>().is_ok() {
            ValueType::Int
        } else if parse_float(text).is_some() {
            ValueType::Float
        } else {
            ValueType::String
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
        };
        f.write_str(name)
    }
}

/// An INI value.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Decoded string (quotes and escapes resolved).
    String(String),
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating-point number.
    Float(f64),
}

impl Value {
    /// Decode raw value text, inferring its kind.
    pub fn infer(text: &str) -> Value {
        if let Some(b) = parse_bool(text) {
            return Value::Bool(b);
        }
        if let Ok(n) = text.parse::<i64>() {
            return Value::Int(n);
        }
        if let Some(f) = parse_float(text) {
            return Value::Float(f);
        }
        Value::String(escape::decode_string(text))
    }

    /// Decode raw value text as a declared kind.
    ///
    /// On failure returns the kind the text would have been inferred as. A
    /// declared string rejects unquoted text that reads as a bool, int, or
    /// float literal.
    pub fn decode_as(text: &str, expected: ValueType) -> Result<Value, ValueType> {
        let found = ValueType::infer(text);
        let decoded = match expected {
            ValueType::String if found == ValueType::String => {
                Some(Value::String(escape::decode_string(text)))
            }
            ValueType::String => None,
            ValueType::Bool => parse_bool(text).map(Value::Bool),
            ValueType::Int => text.parse::<i64>().ok().map(Value::Int),
            ValueType::Float => parse_float(text).map(Value::Float),
        };
        decoded.ok_or(found)
    }

    /// The kind of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
        }
    }

    /// Encode as INI value text.
    pub fn encode(&self) -> String {
        match self {
            Value::String(s) => escape::encode_string(s),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
        }
    }

    /// Returns `true` if the value can be written and read back unchanged.
    pub fn is_encodable(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Returns the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Parse one of the boolean literals.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" => Some(true),
        "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a decimal float literal: optional sign, digits with at most one
/// point, optional exponent. Spellings such as `inf` and `NaN` are strings.
fn parse_float(text: &str) -> Option<f64> {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let digits = mantissa.chars().filter(|c| c.is_ascii_digit()).count();
    let points = mantissa.chars().filter(|c| *c == '.').count();
    if digits == 0 || points > 1 || digits + points != mantissa.len() {
        return None;
    }
    if let Some(exp) = exponent {
        let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp_digits.is_empty() || !exp_digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    text.parse::<f64>().ok()
}

/// Format a float so it reads back as a float, never as an int.
fn format_float(f: f64) -> String {
    let s = format!("{}", f);
    if s.contains('.') || s.contains('e') || !f.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
        }
    }
}

/// Plain rendering: strings as their decoded text, everything else encoded.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => f.write_str(&other.encode()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Rust types a stored value can be read back as.
pub trait FromValue: Sized {
    /// The kind a stored value must have.
    const VALUE_TYPE: ValueType;

    /// Extract from a value of the matching kind.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

impl FromValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(Value::infer("true"), Value::Bool(true));
        assert_eq!(Value::infer("False"), Value::Bool(false));
        assert_eq!(Value::infer("100"), Value::Int(100));
        assert_eq!(Value::infer("-10"), Value::Int(-10));
        assert_eq!(Value::infer("1.5"), Value::Float(1.5));
        assert_eq!(Value::infer("1e3"), Value::Float(1000.0));
        assert_eq!(Value::infer("TRUE"), Value::String("TRUE".into()));
        assert_eq!(Value::infer("inf"), Value::String("inf".into()));
        assert_eq!(Value::infer("NaN"), Value::String("NaN".into()));
        assert_eq!(
            Value::infer("Format48bppRgb"),
            Value::String("Format48bppRgb".into())
        );
        assert_eq!(Value::infer("\"42\""), Value::String("42".into()));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("3"), Some(3.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("-2.5e-3"), Some(-2.5e-3));
        assert_eq!(parse_float("1.2.3"), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("infinity"), None);
    }

    #[test]
    fn test_decode_as() {
        assert_eq!(Value::decode_as("70", ValueType::Int), Ok(Value::Int(70)));
        assert_eq!(Value::decode_as("7", ValueType::Float), Ok(Value::Float(7.0)));
        assert_eq!(
            Value::decode_as("abc", ValueType::Int),
            Err(ValueType::String)
        );
        assert_eq!(
            Value::decode_as("\"70\"", ValueType::String),
            Ok(Value::String("70".into()))
        );
    }

    // A declared string must not itself be a bool/int/float literal.
    #[test]
    fn test_declared_string_rejects_literals() {
        assert_eq!(Value::decode_as("70", ValueType::String), Err(ValueType::Int));
        assert_eq!(Value::decode_as("true", ValueType::String), Err(ValueType::Bool));
        assert_eq!(Value::decode_as("0.5", ValueType::String), Err(ValueType::Float));
    }

    #[test]
    fn test_encode() {
        assert_eq!(Value::Float(3.0).encode(), "3.0");
        assert_eq!(Value::Float(0.25).encode(), "0.25");
        assert_eq!(Value::Int(-7).encode(), "-7");
        assert_eq!(Value::Bool(true).encode(), "true");
        assert_eq!(Value::from("My Value").encode(), "\"My Value\"");
        assert!(!Value::Float(f64::NAN).is_encodable());
    }

    #[test]
    fn test_encode_then_infer() {
        let values = [
            Value::Float(1e300),
            Value::Float(-0.0001),
            Value::Int(i64::MIN),
            Value::from("a;b#c"),
            Value::from("\tpadded "),
            Value::from("False"),
        ];
        for v in values {
            assert_eq!(Value::infer(&v.encode()), v);
        }
    }
}
