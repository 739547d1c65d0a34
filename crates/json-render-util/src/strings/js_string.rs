use serde_json::{Number, Value};

/// Formats a number the way JavaScript's `String(number)` does for the
/// common cases: integral floats drop the fractional part.
///
/// # Examples
///
/// ```
/// use json_render_util::js_number_string;
/// use serde_json::Number;
///
/// assert_eq!(js_number_string(&Number::from(42)), "42");
/// assert_eq!(js_number_string(&Number::from_f64(3.0).unwrap()), "3");
/// assert_eq!(js_number_string(&Number::from_f64(1.5).unwrap()), "1.5");
/// ```
pub fn js_number_string(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Stringifies a value for display inside interpolated text.
///
/// Undefined and `null` become the empty string. Strings are inserted
/// verbatim. Arrays join their members with `,`, and objects render as
/// `[object Object]`.
///
/// # Examples
///
/// ```
/// use json_render_util::js_string;
/// use serde_json::json;
///
/// assert_eq!(js_string(None), "");
/// assert_eq!(js_string(Some(&json!("Ada"))), "Ada");
/// assert_eq!(js_string(Some(&json!([1, "b"]))), "1,b");
/// ```
pub fn js_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => js_number_string(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| js_string(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(js_string(Some(&json!(true))), "true");
        assert_eq!(js_string(Some(&json!(7))), "7");
        assert_eq!(js_string(Some(&json!(7.25))), "7.25");
        assert_eq!(js_string(Some(&json!(null))), "");
    }

    #[test]
    fn test_containers() {
        assert_eq!(js_string(Some(&json!([]))), "");
        assert_eq!(js_string(Some(&json!([1, [2, 3]]))), "1,2,3");
        assert_eq!(js_string(Some(&json!({"a": 1}))), "[object Object]");
    }
}
