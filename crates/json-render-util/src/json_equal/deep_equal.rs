use serde_json::{Number, Value};

/// Compares two JSON numbers by numeric value rather than representation.
///
/// `serde_json` keeps integers and floats apart, so `json!(5) != json!(5.0)`.
/// Generated documents do not make that distinction.
///
/// # Examples
///
/// ```
/// use json_render_util::number_equal;
/// use serde_json::Number;
///
/// assert!(number_equal(&Number::from(5), &Number::from_f64(5.0).unwrap()));
/// assert!(!number_equal(&Number::from(5), &Number::from(6)));
/// ```
pub fn number_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Performs a deep equality check between two JSON values.
///
/// This function compares values recursively, checking equality for:
/// - Primitives (null, bool, number, string), numbers by value
/// - Arrays (element-by-element comparison)
/// - Objects (key-by-key comparison, order-insensitive)
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use json_render_util::json_equal::deep_equal;
///
/// let a = json!({"foo": [1, 2, 3]});
/// let b = json!({"foo": [1.0, 2, 3]});
/// let c = json!({"foo": [1, 2, 4]});
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => number_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,

        // Arrays
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            if arr_a.len() != arr_b.len() {
                return false;
            }
            arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }

        // Objects
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            for (key, val_a) in obj_a {
                match obj_b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }

        // Different types are never equal
        _ => false,
    }
}

/// Equality over possibly-undefined values.
///
/// `None` stands for an undefined value: it equals only another `None`.
/// A present `null` is a value like any other.
pub fn optional_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(deep_equal(&json!(true), &json!(true)));
        assert!(!deep_equal(&json!(true), &json!(false)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(!deep_equal(&json!("a"), &json!("b")));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(deep_equal(&json!(5), &json!(5.0)));
        assert!(deep_equal(&json!(-3), &json!(-3.0)));
        assert!(!deep_equal(&json!(5), &json!(5.5)));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn test_different_types() {
        assert!(!deep_equal(&json!(0), &json!(false)));
        assert!(!deep_equal(&json!(""), &json!(null)));
        assert!(!deep_equal(&json!([]), &json!({})));
        assert!(!deep_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_objects_ignore_key_order() {
        let a = json!({"a": 1, "b": {"c": [1, 2]}});
        let b = json!({"b": {"c": [1, 2]}, "a": 1});
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &json!({"a": 1})));
    }

    #[test]
    fn test_optional_equal() {
        assert!(optional_equal(None, None));
        assert!(!optional_equal(None, Some(&Value::Null)));
        assert!(optional_equal(Some(&json!(1)), Some(&json!(1.0))));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn deep_equal_is_reflexive(v in arb_json()) {
            prop_assert!(deep_equal(&v, &v.clone()));
        }
    }
}
