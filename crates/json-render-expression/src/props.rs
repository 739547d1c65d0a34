//! Prop, binding and action-parameter resolution.

use indexmap::IndexMap;
use json_render_pointer::join_pointer;
use serde_json::{Map, Value};

use crate::context::ResolutionContext;
use crate::expression::Expression;

/// Turns a repeat-relative item path into an absolute state path.
///
/// Returns `None` (with a warning) when no repeat scope is active.
pub fn resolve_bind_item_path(item_path: &str, ctx: &ResolutionContext<'_>) -> Option<String> {
    let Some(scope) = &ctx.repeat else {
        tracing::warn!(item_path, "$bindItem used outside a repeat scope");
        return None;
    };
    Some(join_pointer(&scope.base_path, item_path))
}

/// Resolves a raw prop value. `None` means undefined.
pub fn resolve_prop_value(value: &Value, ctx: &ResolutionContext<'_>) -> Option<Value> {
    Expression::from_value(value).resolve(ctx)
}

/// Resolves every prop of an element. Props that resolve to undefined are
/// left out of the result.
pub fn resolve_element_props(props: &Map<String, Value>, ctx: &ResolutionContext<'_>) -> Map<String, Value> {
    props
        .iter()
        .filter_map(|(key, value)| resolve_prop_value(value, ctx).map(|v| (key.clone(), v)))
        .collect()
}

/// Collects the two-way binding paths of an element's props.
///
/// Maps prop name to the absolute state path written when the host reports a
/// change. Returns `None` when no prop is bound.
pub fn resolve_bindings(
    props: &Map<String, Value>,
    ctx: &ResolutionContext<'_>,
) -> Option<IndexMap<String, String>> {
    let bindings: IndexMap<String, String> = props
        .iter()
        .filter_map(|(key, value)| {
            Expression::from_value(value)
                .binding_path(ctx)
                .map(|path| (key.clone(), path))
        })
        .collect();
    (!bindings.is_empty()).then_some(bindings)
}

/// Resolves an action parameter.
///
/// Action handlers write back into state, so `$item` yields the absolute
/// state path of the item field rather than its value, and `$index` yields
/// the repeat index. Everything else resolves as a prop.
///
/// ```
/// use json_render_expression::{resolve_action_param, resolve_prop_value, ResolutionContext};
/// use serde_json::json;
///
/// let state = json!({"todos": [{"done": true}]});
/// let ctx = ResolutionContext::new(&state).with_repeat(&state["todos"][0], 0, "/todos/0");
/// let param = json!({"$item": "done"});
/// assert_eq!(resolve_action_param(&param, &ctx), Some(json!("/todos/0/done")));
/// assert_eq!(resolve_prop_value(&param, &ctx), Some(json!(true)));
/// ```
pub fn resolve_action_param(value: &Value, ctx: &ResolutionContext<'_>) -> Option<Value> {
    match Expression::from_value(value) {
        Expression::Item(path) => resolve_bind_item_path(&path, ctx).map(Value::String),
        Expression::Index => ctx.repeat_index().map(Value::from),
        expr => expr.resolve(ctx),
    }
}
