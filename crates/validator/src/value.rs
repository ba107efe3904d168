//! Helpers for reasoning about JSON attribute values.
//!
//! Attribute values are `serde_json::Value`. An attribute that was never
//! written is `None` ("undefined"), which is distinct from `Some(Null)`.

use serde_json::Value;

/// Truthiness of an attribute value.
///
/// Absent, `null`, `false`, `0` and `""` are falsy. Everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Whether a value counts as "not provided".
///
/// Absent, `null`, whitespace-only strings, empty arrays and empty objects
/// are blank. `false` and `0` are not.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// Absent or `null`.
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Short JSON type name, for diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders scalars as plain text (strings unquoted). Containers and `null`
/// have no textual form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Interprets a value as a number. Numeric strings are accepted.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(0.0), false)]
    #[case(json!(""), false)]
    #[case(json!("a"), true)]
    #[case(json!(-1), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    fn truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_truthy(Some(&value)), expected);
    }

    #[test]
    fn absent_is_falsy_and_blank() {
        assert!(!is_truthy(None));
        assert!(is_blank(None));
        assert!(is_nullish(None));
    }

    #[rstest]
    #[case(json!("  "), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(" x "), false)]
    fn blankness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_blank(Some(&value)), expected);
    }

    #[test]
    fn numbers_from_strings() {
        assert_eq!(as_number(&json!("12.5")), Some(12.5));
        assert_eq!(as_number(&json!(" 3 ")), Some(3.0));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(true)), None);
    }
}
