//! Truthiness of JSON values.

use serde_json::Value;

/// Returns whether a present value is truthy.
///
/// Falsy values are `null`, `false`, `0`, `NaN` and `""`. Every array and
/// object is truthy, including empty ones.
///
/// # Examples
///
/// ```
/// use json_render_util::is_truthy_value;
/// use serde_json::json;
///
/// assert!(is_truthy_value(&json!("x")));
/// assert!(is_truthy_value(&json!([])));
/// assert!(!is_truthy_value(&json!(0)));
/// assert!(!is_truthy_value(&json!("")));
/// ```
pub fn is_truthy_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns whether a possibly-undefined value is truthy. Undefined is falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    value.map(is_truthy_value).unwrap_or(false)
}
