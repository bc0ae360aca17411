//! Runtime values of the expression sandbox.
//!
//! Values borrow from the parameter namespace where they can; strings built
//! during evaluation are owned.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

/// A value produced by evaluating an expression.
#[derive(Debug, Clone)]
pub enum Value<'p> {
    /// Missing value; also the result of any failed evaluation.
    Undefined,
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (all numbers are doubles).
    Number(f64),
    /// String.
    Str(Cow<'p, str>),
    /// Array borrowed from the namespace.
    Array(&'p [JsonValue]),
    /// Object borrowed from the namespace.
    Object(&'p Map<String, JsonValue>),
}

impl<'p> Value<'p> {
    /// Wraps a namespace value without copying it.
    pub fn from_json(value: &'p JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::Str(Cow::Borrowed(s)),
            JsonValue::Array(items) => Value::Array(items),
            JsonValue::Object(map) => Value::Object(map),
        }
    }

    /// Builds an owned string value.
    pub fn string(value: impl Into<String>) -> Self {
        Value::Str(Cow::Owned(value.into()))
    }

    /// Whether the value is `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether the value is `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Truthiness; `undefined` is falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Name reported by `typeof`.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }

    /// String conversion used by `+` concatenation and token substitution.
    pub fn to_js_string(&self) -> Cow<'p, str> {
        match self {
            Value::Undefined => Cow::Borrowed("undefined"),
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::Str(s) => s.clone(),
            Value::Array(items) => Cow::Owned(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::Null => String::new(),
                        other => Value::from_json(other).to_js_string().into_owned(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Object(_) => Cow::Borrowed("[object Object]"),
        }
    }

    /// String form for output, with `null`/`undefined` rendered empty.
    pub fn to_output_string(&self) -> Cow<'p, str> {
        if self.is_nullish() {
            Cow::Borrowed("")
        } else {
            self.to_js_string()
        }
    }

    /// Numeric conversion.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => parse_numeric_string(s),
            Value::Array(_) | Value::Object(_) => parse_numeric_string(&self.to_js_string()),
        }
    }

    fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Converts arrays and objects to their string form, leaving primitives.
    pub fn to_primitive(&self) -> Value<'p> {
        if self.is_composite() {
            Value::Str(self.to_js_string())
        } else {
            self.clone()
        }
    }

    /// `===`.
    pub fn strict_equals(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => std::ptr::eq(*a, *b),
            (Value::Object(a), Value::Object(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// `==`.
    pub fn loose_equals(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (a, b) if a.is_composite() && b.is_composite() => a.strict_equals(b),
            (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                let left = Value::Number(self.to_number());
                let right = Value::Number(other.to_number());
                if matches!(self, Value::Bool(_)) {
                    left.loose_equals(other)
                } else {
                    self.loose_equals(&right)
                }
            }
            (a, b) if a.is_composite() || b.is_composite() => {
                a.to_primitive().loose_equals(&b.to_primitive())
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Number(_), Value::Str(_)) | (Value::Str(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (a, b) => a.strict_equals(b),
        }
    }

    /// Relational comparison; `None` when either side is `NaN`.
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        let left = self.to_primitive();
        let right = other.to_primitive();
        if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
            return Some(a.as_ref().cmp(b.as_ref()));
        }
        left.to_number().partial_cmp(&right.to_number())
    }

    /// Converts the value into owned JSON; `undefined` maps to `None`.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Value::Undefined => None,
            Value::Null => Some(JsonValue::Null),
            Value::Bool(b) => Some(JsonValue::Bool(*b)),
            Value::Number(n) => Some(
                serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null),
            ),
            Value::Str(s) => Some(JsonValue::String(s.to_string())),
            Value::Array(items) => Some(JsonValue::Array(items.to_vec())),
            Value::Object(map) => Some(JsonValue::Object((*map).clone())),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self.strict_equals(other),
        }
    }
}

/// Parses a string the way numeric coercion does: blank is zero, anything
/// else that is not a decimal number is `NaN`.
pub fn parse_numeric_string(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') => {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Formats a number the way script string conversion does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_numbers_like_script_strings() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::string("").truthy());
        assert!(Value::string("0").truthy());
        let empty = json!([]);
        assert!(Value::from_json(&empty).truthy());
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(Value::Number(1.0).loose_equals(&Value::string("1")));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(Value::Bool(false).loose_equals(&Value::string("")));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).loose_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn arrays_stringify_with_commas() {
        let list = json!([1, null, "a"]);
        assert_eq!(Value::from_json(&list).to_js_string(), "1,,a");
        let object = json!({"a": 1});
        assert_eq!(Value::from_json(&object).to_js_string(), "[object Object]");
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(parse_numeric_string(" 12 "), 12.0);
        assert_eq!(parse_numeric_string(""), 0.0);
        assert!(parse_numeric_string("12px").is_nan());
        assert_eq!(parse_numeric_string("1e3"), 1000.0);
    }
}
