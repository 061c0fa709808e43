/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The value carried through a filter chain.
//!
//! Filters see either a plain string or parsed JSON. Between stages, a
//! string whose content parses as a JSON array or object is transparently
//! upgraded so the next filter can inspect structure; at the end of the
//! chain the carry is flattened back to text.

use serde_json::Value;

/// A value flowing through a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Carry {
    /// Plain text.
    Str(String),

    /// Parsed JSON.
    Json(Value),
}

impl Carry {
    pub fn str(s: impl Into<String>) -> Self {
        Carry::Str(s.into())
    }

    /// Wrap a JSON value, collapsing JSON strings to plain text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Carry::Str(s),
            Value::Null => Carry::Str(String::new()),
            other => Carry::Json(other),
        }
    }

    /// Upgrade a string carry to JSON when it holds a JSON array or
    /// object. Scalars stay strings: `"42"` is text until a filter asks
    /// for a number.
    pub fn upgraded(self) -> Self {
        match self {
            Carry::Str(s) => {
                let trimmed = s.trim_start();
                if trimmed.starts_with('[') || trimmed.starts_with('{') {
                    match serde_json::from_str::<Value>(&s) {
                        Ok(value @ (Value::Array(_) | Value::Object(_))) => Carry::Json(value),
                        _ => Carry::Str(s),
                    }
                } else {
                    Carry::Str(s)
                }
            }
            json => json,
        }
    }

    /// View the carry as JSON, parsing text if possible.
    pub fn to_value(&self) -> Value {
        match self {
            Carry::Json(v) => v.clone(),
            Carry::Str(s) => {
                let trimmed = s.trim_start();
                if trimmed.starts_with('[') || trimmed.starts_with('{') {
                    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))
                } else {
                    Value::String(s.clone())
                }
            }
        }
    }

    /// The array behind this carry, when there is one.
    pub fn as_array(&self) -> Option<Vec<Value>> {
        match self.to_value() {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The number behind this carry, when there is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Carry::Json(Value::Number(n)) => n.as_f64(),
            Carry::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Flatten to the final output string.
    ///
    /// JSON strings emit bare text, null emits nothing, other JSON emits
    /// its compact serialization.
    pub fn into_output(self) -> String {
        match self {
            Carry::Str(s) => s,
            Carry::Json(Value::String(s)) => s,
            Carry::Json(Value::Null) => String::new(),
            Carry::Json(value) => serde_json::to_string(&value).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Carry::Str(s) => s.is_empty(),
            Carry::Json(Value::Null) => true,
            Carry::Json(Value::String(s)) => s.is_empty(),
            Carry::Json(Value::Array(a)) => a.is_empty(),
            Carry::Json(_) => false,
        }
    }
}

/// Render a JSON value the way it should appear in note text: strings
/// bare, null empty, everything else compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upgrade_array_string() {
        let carry = Carry::str(r#"["a","b"]"#).upgraded();
        assert_eq!(carry, Carry::Json(json!(["a", "b"])));
    }

    #[test]
    fn test_upgrade_object_string() {
        let carry = Carry::str(r#"{"k":1}"#).upgraded();
        assert_eq!(carry, Carry::Json(json!({"k": 1})));
    }

    #[test]
    fn test_scalars_stay_strings() {
        assert_eq!(Carry::str("42").upgraded(), Carry::str("42"));
        assert_eq!(Carry::str("true").upgraded(), Carry::str("true"));
        assert_eq!(Carry::str("plain").upgraded(), Carry::str("plain"));
    }

    #[test]
    fn test_invalid_json_stays_string() {
        assert_eq!(Carry::str("[not json").upgraded(), Carry::str("[not json"));
    }

    #[test]
    fn test_output_flattening() {
        assert_eq!(Carry::str("x").into_output(), "x");
        assert_eq!(Carry::Json(json!("x")).into_output(), "x");
        assert_eq!(Carry::Json(Value::Null).into_output(), "");
        assert_eq!(Carry::Json(json!([1, 2])).into_output(), "[1,2]");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Carry::str(" 3.5 ").as_number(), Some(3.5));
        assert_eq!(Carry::Json(json!(2)).as_number(), Some(2.0));
        assert_eq!(Carry::str("abc").as_number(), None);
    }

    #[test]
    fn test_from_value_collapses_strings() {
        assert_eq!(Carry::from_value(json!("s")), Carry::str("s"));
        assert_eq!(Carry::from_value(Value::Null), Carry::str(""));
    }
}
