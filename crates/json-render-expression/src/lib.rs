//! Data-binding expressions for json-render specs.
//!
//! # Overview
//!
//! Element props, visibility conditions and action parameters may contain
//! small declarative expressions instead of literals:
//!
//! | Shape | Meaning |
//! |---|---|
//! | `{"$state": "/path"}` | value in the state model |
//! | `{"$item": "field"}` | field of the current repeat item (`""` = whole item) |
//! | `{"$index": true}` | index of the current repeat item |
//! | `{"$bindState": "/path"}` | like `$state`, plus a two-way binding path |
//! | `{"$bindItem": "field"}` | like `$item`, plus a two-way binding path |
//! | `{"$cond": c, "$then": a, "$else": b}` | `a` if condition `c` holds, else `b` |
//!
//! Raw JSON is parsed into the closed [`Expression`] sum type once and then
//! resolved against a [`ResolutionContext`].
//!
//! # Example
//!
//! ```
//! use json_render_expression::{resolve_prop_value, ResolutionContext};
//! use serde_json::json;
//!
//! let state = json!({"a": 3, "todos": [7]});
//! let ctx = ResolutionContext::new(&state).with_repeat(&state["todos"][0], 0, "/todos/0");
//!
//! let prop = json!({"list": [{"$state": "/a"}, {"$item": ""}]});
//! assert_eq!(resolve_prop_value(&prop, &ctx), Some(json!({"list": [3, 7]})));
//! ```

pub mod condition;
pub mod context;
pub mod error;
pub mod expression;
pub mod props;
pub mod visibility;

pub use condition::{
    evaluate_visibility, Comparison, ConditionSubject, SingleCondition, VisibilityCondition,
};
pub use context::{RepeatScope, ResolutionContext};
pub use error::ExpressionError;
pub use expression::Expression;
pub use props::{
    resolve_action_param, resolve_bind_item_path, resolve_bindings, resolve_element_props,
    resolve_prop_value,
};
