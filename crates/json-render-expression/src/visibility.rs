//! Shorthand constructors for common visibility conditions.
//!
//! ```
//! use json_render_expression::{visibility, ResolutionContext};
//! use serde_json::json;
//!
//! let state = json!({"user": {"admin": true}, "count": 3});
//! let cond = visibility::and(vec![visibility::when("/user/admin"), visibility::gt("/count", 2)]);
//! assert!(cond.evaluate(&ResolutionContext::new(&state)));
//! ```

use serde_json::Value;

use crate::condition::{Comparison, ConditionSubject, SingleCondition, VisibilityCondition};

fn compare(path: &str, comparison: Comparison) -> VisibilityCondition {
    VisibilityCondition::Single(
        SingleCondition::new(ConditionSubject::State(path.to_string())).with_comparison(comparison),
    )
}

pub fn always() -> VisibilityCondition {
    VisibilityCondition::Bool(true)
}

pub fn never() -> VisibilityCondition {
    VisibilityCondition::Bool(false)
}

/// Visible while the state value is truthy.
pub fn when(path: &str) -> VisibilityCondition {
    VisibilityCondition::Single(SingleCondition::new(ConditionSubject::State(path.to_string())))
}

/// Visible while the state value is falsy.
pub fn unless(path: &str) -> VisibilityCondition {
    VisibilityCondition::Single(
        SingleCondition::new(ConditionSubject::State(path.to_string())).negated(),
    )
}

pub fn eq(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Eq(value.into()))
}

pub fn neq(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Neq(value.into()))
}

pub fn gt(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Gt(value.into()))
}

pub fn gte(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Gte(value.into()))
}

pub fn lt(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Lt(value.into()))
}

pub fn lte(path: &str, value: impl Into<Value>) -> VisibilityCondition {
    compare(path, Comparison::Lte(value.into()))
}

pub fn and(conditions: Vec<VisibilityCondition>) -> VisibilityCondition {
    VisibilityCondition::And(conditions)
}

pub fn or(conditions: Vec<VisibilityCondition>) -> VisibilityCondition {
    VisibilityCondition::Or(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_serialize_to_wire_shapes() {
        assert_eq!(Value::from(always()), json!(true));
        assert_eq!(Value::from(unless("/busy")), json!({"$state": "/busy", "not": true}));
        assert_eq!(Value::from(lte("/n", 4)), json!({"$state": "/n", "lte": 4}));
        assert_eq!(
            Value::from(or(vec![never(), when("/a")])),
            json!({"$or": [false, {"$state": "/a"}]})
        );
    }
}
