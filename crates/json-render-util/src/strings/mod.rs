//! String conversion utilities.

mod js_string;

pub use js_string::{js_number_string, js_string};
