//! Visibility conditions.
//!
//! Wire shapes:
//!
//! - `true` / `false`
//! - `{"$state": "/path", <op>?: rhs, "not"?: true}` (also `$item`, `$index`)
//! - `[single, single, ...]`, an implicit AND of single conditions
//! - `{"$and": [cond, ...]}` / `{"$or": [cond, ...]}`
//!
//! The operators are `eq`, `neq`, `gt`, `gte`, `lt` and `lte`. When several are
//! present the first in that order wins; with none the subject is tested for
//! truthiness.

use json_render_pointer::get_by_path;
use json_render_util::{is_truthy, optional_equal};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::ResolutionContext;
use crate::error::ExpressionError;
use crate::expression::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSubject {
    State(String),
    Item(String),
    Index,
}

impl ConditionSubject {
    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<Value> {
        match self {
            ConditionSubject::State(path) => get_by_path(ctx.state, path).cloned(),
            ConditionSubject::Item(path) => {
                let item = ctx.repeat_item()?;
                if path.is_empty() {
                    Some(item.clone())
                } else {
                    get_by_path(item, path).cloned()
                }
            }
            ConditionSubject::Index => ctx.repeat_index().map(Value::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
}

const OPERATORS: [&str; 6] = ["eq", "neq", "gt", "gte", "lt", "lte"];

impl Comparison {
    fn from_operator(op: &str, rhs: Value) -> Option<Self> {
        Some(match op {
            "eq" => Comparison::Eq(rhs),
            "neq" => Comparison::Neq(rhs),
            "gt" => Comparison::Gt(rhs),
            "gte" => Comparison::Gte(rhs),
            "lt" => Comparison::Lt(rhs),
            "lte" => Comparison::Lte(rhs),
            _ => return None,
        })
    }

    fn operator(&self) -> &'static str {
        match self {
            Comparison::Eq(_) => "eq",
            Comparison::Neq(_) => "neq",
            Comparison::Gt(_) => "gt",
            Comparison::Gte(_) => "gte",
            Comparison::Lt(_) => "lt",
            Comparison::Lte(_) => "lte",
        }
    }

    fn rhs(&self) -> &Value {
        match self {
            Comparison::Eq(v)
            | Comparison::Neq(v)
            | Comparison::Gt(v)
            | Comparison::Gte(v)
            | Comparison::Lt(v)
            | Comparison::Lte(v) => v,
        }
    }

    fn holds(&self, lhs: Option<&Value>, ctx: &ResolutionContext<'_>) -> bool {
        let rhs = Expression::from_value(self.rhs()).resolve(ctx);
        let ordered = |test: fn(f64, f64) -> bool| match (
            lhs.and_then(Value::as_f64),
            rhs.as_ref().and_then(Value::as_f64),
        ) {
            (Some(a), Some(b)) => test(a, b),
            _ => false,
        };
        match self {
            Comparison::Eq(_) => optional_equal(lhs, rhs.as_ref()),
            Comparison::Neq(_) => !optional_equal(lhs, rhs.as_ref()),
            Comparison::Gt(_) => ordered(|a, b| a > b),
            Comparison::Gte(_) => ordered(|a, b| a >= b),
            Comparison::Lt(_) => ordered(|a, b| a < b),
            Comparison::Lte(_) => ordered(|a, b| a <= b),
        }
    }
}

/// One subject with an optional comparison and negation.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleCondition {
    pub subject: ConditionSubject,
    pub comparison: Option<Comparison>,
    pub not: bool,
}

impl SingleCondition {
    pub fn new(subject: ConditionSubject) -> Self {
        SingleCondition {
            subject,
            comparison: None,
            not: false,
        }
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn negated(mut self) -> Self {
        self.not = true;
        self
    }

    pub fn evaluate(&self, ctx: &ResolutionContext<'_>) -> bool {
        let value = self.subject.resolve(ctx);
        let result = match &self.comparison {
            Some(comparison) => comparison.holds(value.as_ref(), ctx),
            None => is_truthy(value.as_ref()),
        };
        result != self.not
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self, ExpressionError> {
        let subject = if let Some(path) = map.get("$state").and_then(Value::as_str) {
            ConditionSubject::State(path.to_string())
        } else if let Some(path) = map.get("$item").and_then(Value::as_str) {
            ConditionSubject::Item(path.to_string())
        } else if map.get("$index") == Some(&Value::Bool(true)) {
            ConditionSubject::Index
        } else {
            return Err(ExpressionError::MissingSubject);
        };
        let comparison = OPERATORS.iter().find_map(|op| {
            map.get(*op)
                .and_then(|rhs| Comparison::from_operator(op, rhs.clone()))
        });
        Ok(SingleCondition {
            subject,
            comparison,
            not: map.get("not") == Some(&Value::Bool(true)),
        })
    }

    fn from_value(value: &Value) -> Result<Self, ExpressionError> {
        match value {
            Value::Object(map) => SingleCondition::from_map(map),
            other => Err(ExpressionError::InvalidCondition(format!(
                "expected a condition object, got {other}"
            ))),
        }
    }

    fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        match self.subject {
            ConditionSubject::State(path) => map.insert("$state".into(), Value::String(path)),
            ConditionSubject::Item(path) => map.insert("$item".into(), Value::String(path)),
            ConditionSubject::Index => map.insert("$index".into(), Value::Bool(true)),
        };
        if let Some(comparison) = self.comparison {
            let op = comparison.operator();
            map.insert(op.into(), comparison.rhs().clone());
        }
        if self.not {
            map.insert("not".into(), Value::Bool(true));
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum VisibilityCondition {
    Bool(bool),
    Single(SingleCondition),
    /// Implicit AND over a plain array of single conditions.
    All(Vec<SingleCondition>),
    And(Vec<VisibilityCondition>),
    Or(Vec<VisibilityCondition>),
}

impl VisibilityCondition {
    pub fn evaluate(&self, ctx: &ResolutionContext<'_>) -> bool {
        match self {
            VisibilityCondition::Bool(b) => *b,
            VisibilityCondition::Single(cond) => cond.evaluate(ctx),
            VisibilityCondition::All(conds) => conds.iter().all(|c| c.evaluate(ctx)),
            VisibilityCondition::And(conds) => conds.iter().all(|c| c.evaluate(ctx)),
            VisibilityCondition::Or(conds) => conds.iter().any(|c| c.evaluate(ctx)),
        }
    }
}

fn condition_list(value: &Value, key: &str) -> Result<Vec<VisibilityCondition>, ExpressionError> {
    let Value::Array(items) = value else {
        return Err(ExpressionError::InvalidCondition(format!("{key} must be an array")));
    };
    items
        .iter()
        .map(|item| VisibilityCondition::try_from(item.clone()))
        .collect()
}

impl TryFrom<Value> for VisibilityCondition {
    type Error = ExpressionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Bool(b) => Ok(VisibilityCondition::Bool(*b)),
            Value::Array(items) => items
                .iter()
                .map(SingleCondition::from_value)
                .collect::<Result<_, _>>()
                .map(VisibilityCondition::All),
            Value::Object(map) => {
                if let Some(list) = map.get("$and") {
                    return condition_list(list, "$and").map(VisibilityCondition::And);
                }
                if let Some(list) = map.get("$or") {
                    return condition_list(list, "$or").map(VisibilityCondition::Or);
                }
                SingleCondition::from_map(map).map(VisibilityCondition::Single)
            }
            other => Err(ExpressionError::InvalidCondition(format!(
                "unsupported condition {other}"
            ))),
        }
    }
}

impl From<VisibilityCondition> for Value {
    fn from(cond: VisibilityCondition) -> Self {
        let list = |key: &str, conds: Vec<VisibilityCondition>| {
            let mut map = Map::new();
            map.insert(
                key.to_string(),
                Value::Array(conds.into_iter().map(Value::from).collect()),
            );
            Value::Object(map)
        };
        match cond {
            VisibilityCondition::Bool(b) => Value::Bool(b),
            VisibilityCondition::Single(single) => Value::Object(single.into_map()),
            VisibilityCondition::All(singles) => Value::Array(
                singles
                    .into_iter()
                    .map(|s| Value::Object(s.into_map()))
                    .collect(),
            ),
            VisibilityCondition::And(conds) => list("$and", conds),
            VisibilityCondition::Or(conds) => list("$or", conds),
        }
    }
}

/// Evaluates an optional visibility condition. A missing condition is visible.
pub fn evaluate_visibility(condition: Option<&VisibilityCondition>, ctx: &ResolutionContext<'_>) -> bool {
    condition.map_or(true, |cond| cond.evaluate(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(cond: Value, state: &Value) -> bool {
        let cond = VisibilityCondition::try_from(cond).unwrap();
        cond.evaluate(&ResolutionContext::new(state))
    }

    #[test]
    fn missing_condition_is_visible() {
        assert!(evaluate_visibility(None, &ResolutionContext::new(&json!({}))));
    }

    #[test]
    fn truthiness_without_operator() {
        let state = json!({"on": 1, "off": "", "zero": 0});
        assert!(eval(json!({"$state": "/on"}), &state));
        assert!(!eval(json!({"$state": "/off"}), &state));
        assert!(!eval(json!({"$state": "/zero"}), &state));
        assert!(!eval(json!({"$state": "/missing"}), &state));
        assert!(eval(json!({"$state": "/missing", "not": true}), &state));
    }

    #[test]
    fn operator_precedence() {
        let state = json!({"n": 5});
        // eq is checked first and fails even though gt would hold
        assert!(!eval(json!({"$state": "/n", "gt": 1, "eq": 4}), &state));
        assert!(eval(json!({"$state": "/n", "lt": 1, "gte": 5}), &state));
    }

    #[test]
    fn ordering_requires_numbers() {
        let state = json!({"s": "9", "n": 2.5});
        assert!(!eval(json!({"$state": "/s", "gt": 1}), &state));
        assert!(eval(json!({"$state": "/n", "gt": 2}), &state));
        assert!(eval(json!({"$state": "/n", "lte": 2.5}), &state));
    }

    #[test]
    fn rhs_resolves_state_references() {
        let state = json!({"a": 3, "b": 3, "c": 4});
        assert!(eval(json!({"$state": "/a", "eq": {"$state": "/b"}}), &state));
        assert!(eval(json!({"$state": "/a", "lt": {"$state": "/c"}}), &state));
        assert!(eval(json!({"$state": "/a", "neq": {"$state": "/c"}}), &state));
    }

    #[test]
    fn eq_is_structural_and_numeric() {
        let state = json!({"tags": ["x"], "n": 1.0});
        assert!(eval(json!({"$state": "/tags", "eq": ["x"]}), &state));
        assert!(eval(json!({"$state": "/n", "eq": 1}), &state));
    }

    #[test]
    fn and_or_and_implicit_all() {
        let state = json!({"a": true, "b": false});
        assert!(eval(json!([{"$state": "/a"}, {"$state": "/b", "not": true}]), &state));
        assert!(!eval(json!({"$and": [{"$state": "/a"}, {"$state": "/b"}]}), &state));
        assert!(eval(json!({"$or": [false, {"$state": "/a"}]}), &state));
        assert!(eval(json!({"$and": []}), &state));
        assert!(!eval(json!({"$or": []}), &state));
    }

    #[test]
    fn item_and_index_subjects() {
        let state = json!({"todos": [{"done": true}]});
        let ctx = ResolutionContext::new(&state).with_repeat(&state["todos"][0], 0, "/todos/0");
        let done = VisibilityCondition::try_from(json!({"$item": "done"})).unwrap();
        let first = VisibilityCondition::try_from(json!({"$index": true, "eq": 0})).unwrap();
        assert!(done.evaluate(&ctx));
        assert!(first.evaluate(&ctx));
        assert!(!done.evaluate(&ResolutionContext::new(&state)));
    }

    #[test]
    fn rejects_subjectless_object() {
        assert_eq!(
            VisibilityCondition::try_from(json!({"eq": 1})),
            Err(ExpressionError::MissingSubject)
        );
        assert!(VisibilityCondition::try_from(json!("yes")).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let raw = json!({"$or": [{"$state": "/a", "gte": 2, "not": true}, [{"$index": true}]]});
        let cond: VisibilityCondition = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&cond).unwrap(), raw);
    }
}
