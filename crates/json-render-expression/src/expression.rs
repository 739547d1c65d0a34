//! The `Expression` sum type and its resolver.

use json_render_pointer::get_by_path;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::condition::VisibilityCondition;
use crate::context::ResolutionContext;
use crate::props::resolve_bind_item_path;

/// A prop value that is either a literal or a reference into the state model
/// or the active repeat scope.
///
/// Arrays and objects that are not themselves expressions are kept as
/// [`Expression::Array`] / [`Expression::Object`] so that expressions nested
/// anywhere inside literal structures are resolved too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Expression {
    Literal(Value),
    State(String),
    Item(String),
    Index,
    BindState(String),
    BindItem(String),
    Cond {
        cond: Box<VisibilityCondition>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),
}

fn str_member<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn state(path: impl Into<String>) -> Self {
        Expression::State(path.into())
    }

    pub fn item(path: impl Into<String>) -> Self {
        Expression::Item(path.into())
    }

    pub fn index() -> Self {
        Expression::Index
    }

    pub fn bind_state(path: impl Into<String>) -> Self {
        Expression::BindState(path.into())
    }

    pub fn bind_item(path: impl Into<String>) -> Self {
        Expression::BindItem(path.into())
    }

    pub fn cond(cond: VisibilityCondition, then: Expression, otherwise: Expression) -> Self {
        Expression::Cond {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Parses raw JSON into an expression. Never fails: anything that is not a
    /// recognised expression shape is a literal or a composite.
    ///
    /// Discriminants are checked in a fixed order, so an object carrying both
    /// `$state` and `$item` is a state reference.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(path) = str_member(map, "$state") {
                    return Expression::state(path);
                }
                if let Some(path) = str_member(map, "$item") {
                    return Expression::item(path);
                }
                if map.get("$index") == Some(&Value::Bool(true)) {
                    return Expression::Index;
                }
                if let Some(path) = str_member(map, "$bindState") {
                    return Expression::bind_state(path);
                }
                if let Some(path) = str_member(map, "$bindItem") {
                    return Expression::bind_item(path);
                }
                if let (Some(cond), Some(then), Some(otherwise)) =
                    (map.get("$cond"), map.get("$then"), map.get("$else"))
                {
                    let cond = VisibilityCondition::try_from(cond.clone()).unwrap_or_else(|err| {
                        tracing::warn!(%err, "unreadable $cond condition, treating it as false");
                        VisibilityCondition::Bool(false)
                    });
                    return Expression::cond(
                        cond,
                        Expression::from_value(then),
                        Expression::from_value(otherwise),
                    );
                }
                Expression::Object(
                    map.iter()
                        .map(|(key, member)| (key.clone(), Expression::from_value(member)))
                        .collect(),
                )
            }
            Value::Array(items) => Expression::Array(items.iter().map(Expression::from_value).collect()),
            other => Expression::Literal(other.clone()),
        }
    }

    /// Returns the state path a two-way binding writes to, if this is one.
    pub fn binding_path(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        match self {
            Expression::BindState(path) => Some(path.clone()),
            Expression::BindItem(path) => resolve_bind_item_path(path, ctx),
            _ => None,
        }
    }

    /// Resolves the expression. `None` means the value is undefined, e.g. a
    /// missing state path or `$item` outside a repeat scope.
    ///
    /// Undefined members of a composite object are omitted; undefined members
    /// of a composite array become `null` so positions are kept.
    pub fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<Value> {
        match self {
            Expression::Literal(value) => Some(value.clone()),
            Expression::State(path) | Expression::BindState(path) => {
                get_by_path(ctx.state, path).cloned()
            }
            Expression::Item(path) => {
                let item = ctx.repeat_item()?;
                if path.is_empty() {
                    Some(item.clone())
                } else {
                    get_by_path(item, path).cloned()
                }
            }
            Expression::Index => ctx.repeat_index().map(|index| json!(index)),
            Expression::BindItem(path) => {
                let absolute = resolve_bind_item_path(path, ctx)?;
                get_by_path(ctx.state, &absolute).cloned()
            }
            Expression::Cond { cond, then, otherwise } => {
                if cond.evaluate(ctx) {
                    then.resolve(ctx)
                } else {
                    otherwise.resolve(ctx)
                }
            }
            Expression::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.resolve(ctx).unwrap_or(Value::Null))
                    .collect(),
            )),
            Expression::Object(members) => Some(Value::Object(
                members
                    .iter()
                    .filter_map(|(key, member)| member.resolve(ctx).map(|v| (key.clone(), v)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for Expression {
    fn from(value: &Value) -> Self {
        Expression::from_value(value)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::from_value(&value)
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        match expr {
            Expression::Literal(value) => value,
            Expression::State(path) => json!({ "$state": path }),
            Expression::Item(path) => json!({ "$item": path }),
            Expression::Index => json!({ "$index": true }),
            Expression::BindState(path) => json!({ "$bindState": path }),
            Expression::BindItem(path) => json!({ "$bindItem": path }),
            Expression::Cond { cond, then, otherwise } => json!({
                "$cond": Value::from(*cond),
                "$then": Value::from(*then),
                "$else": Value::from(*otherwise),
            }),
            Expression::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Expression::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Value::from(member)))
                    .collect(),
            ),
        }
    }
}
