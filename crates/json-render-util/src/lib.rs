//! json-render-util - value semantics shared by the json-render crates.
//!
//! Spec documents are produced by generators that think in JavaScript terms:
//! `5` and `5.0` are the same number, `""` and `0` are falsy, and template
//! interpolation stringifies values the way `String(value)` does. This crate
//! provides those semantics over `serde_json::Value` so the pointer, expression
//! and compiler crates agree on them.

pub mod json_equal;
pub mod strings;
pub mod truthy;

pub use json_equal::{deep_equal, optional_equal, number_equal};
pub use strings::{js_number_string, js_string};
pub use truthy::{is_truthy, is_truthy_value};
