//! JSON Pointer (RFC 6901) addressing for json-render documents.
//!
//! Pointers address into the spec document (`/root`, `/elements/<key>`,
//! `/state/...`) and into the state model used by expressions. Reads are
//! forgiving: a missing or mistyped intermediate yields `None`. Writes
//! auto-vivify missing intermediates, choosing an array when the following
//! segment is numeric or `-` and an object otherwise.
//!
//! # Example
//!
//! ```
//! use json_render_pointer::{add_by_path, get_by_path, set_by_path};
//! use serde_json::json;
//!
//! let mut doc = json!({});
//! set_by_path(&mut doc, "/a/0/b", json!(1)).unwrap();
//! assert_eq!(doc, json!({"a": [{"b": 1}]}));
//!
//! add_by_path(&mut doc, "/a/0", json!("first")).unwrap();
//! assert_eq!(get_by_path(&doc, "/a/1/b"), Some(&json!(1)));
//! ```

use serde_json::Value;
use thiserror::Error;

mod mutate;

pub use mutate::{add_by_path, remove_by_path, set_by_path, MAX_ARRAY_PADDING};

/// A parsed JSON Pointer: one unescaped token per reference step.
pub type Path = Vec<String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("invalid array index {segment:?} in pointer {pointer:?}")]
    InvalidIndex { pointer: String, segment: String },
    #[error("array index {index} in pointer {pointer:?} is too far past the end of the array")]
    IndexOutOfRange { pointer: String, index: usize },
}

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use json_render_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("no-escapes"), "no-escapes");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 first, so that "~01" decodes to "~1" and not "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `~` is replaced with `~0` and `/` is replaced with `~1`.
///
/// # Example
///
/// ```
/// use json_render_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into path components.
///
/// - `""` and `"/"` both denote the document root (empty path)
/// - The leading `/` is stripped; a pointer without one is read relative to the root
/// - Each component is unescaped
///
/// # Example
///
/// ```
/// use json_render_pointer::parse_json_pointer;
///
/// assert!(parse_json_pointer("").is_empty());
/// assert!(parse_json_pointer("/").is_empty());
/// assert_eq!(parse_json_pointer("/foo/bar"), vec!["foo", "bar"]);
/// assert_eq!(parse_json_pointer("todos/0"), vec!["todos", "0"]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    if pointer.is_empty() || pointer == "/" {
        return Vec::new();
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    body.split('/').map(unescape_component).collect()
}

/// Format path components into a JSON Pointer string.
///
/// Returns an empty string for the root path.
///
/// # Example
///
/// ```
/// use json_render_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["a/b".to_string(), "0".to_string()]), "/a~1b/0");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Appends a relative, slash-separated path to a base pointer.
///
/// An empty relative path returns the base unchanged. Used to turn a repeat
/// item path such as `done` into an absolute state path like `/todos/0/done`.
///
/// # Example
///
/// ```
/// use json_render_pointer::join_pointer;
///
/// assert_eq!(join_pointer("/todos/0", "done"), "/todos/0/done");
/// assert_eq!(join_pointer("/todos/0", ""), "/todos/0");
/// ```
pub fn join_pointer(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    let relative = relative.strip_prefix('/').unwrap_or(relative);
    format!("{base}/{relative}")
}

/// Check if a segment looks like an array index (`/^\d+$/`).
///
/// Unlike strict RFC 6901 validation, leading zeros are accepted.
///
/// # Example
///
/// ```
/// use json_render_pointer::is_numeric_index;
///
/// assert!(is_numeric_index("0"));
/// assert!(is_numeric_index("007"));
/// assert!(!is_numeric_index("-"));
/// assert!(!is_numeric_index(""));
/// assert!(!is_numeric_index("1a"));
/// ```
pub fn is_numeric_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if !is_numeric_index(segment) {
        return None;
    }
    segment.parse().ok()
}

/// Get a value from a JSON document by parsed path.
///
/// Returns `None` if the path doesn't exist, crosses a scalar, or uses a
/// non-numeric index into an array.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Array(arr) => arr.get(parse_index(step)?)?,
            Value::Object(map) => map.get(step)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON document by parsed path.
pub fn get_mut<'a>(val: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Array(arr) => arr.get_mut(parse_index(step)?)?,
            Value::Object(map) => map.get_mut(step)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a value from a JSON document by pointer string.
///
/// # Example
///
/// ```
/// use json_render_pointer::get_by_path;
/// use serde_json::json;
///
/// let doc = json!({"todos": [{"title": "a"}], "n": 3});
/// assert_eq!(get_by_path(&doc, "/todos/0/title"), Some(&json!("a")));
/// assert_eq!(get_by_path(&doc, "/n/deeper"), None);
/// assert_eq!(get_by_path(&doc, "/"), Some(&doc));
/// ```
pub fn get_by_path<'a>(val: &'a Value, pointer: &str) -> Option<&'a Value> {
    get(val, &parse_json_pointer(pointer))
}

/// Mutable counterpart of [`get_by_path`].
pub fn get_by_path_mut<'a>(val: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    get_mut(val, &parse_json_pointer(pointer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unescape_component() {
        assert_eq!(unescape_component("foo"), "foo");
        assert_eq!(unescape_component("a~0b~1c"), "a~b/c");
        assert_eq!(unescape_component("~01"), "~1");
        assert_eq!(unescape_component("~1~1"), "//");
    }

    #[test]
    fn test_escape_component() {
        assert_eq!(escape_component("foo"), "foo");
        assert_eq!(escape_component("a~b/c"), "a~0b~1c");
        assert_eq!(escape_component("~~"), "~0~0");
    }

    #[test]
    fn test_parse_json_pointer() {
        assert_eq!(parse_json_pointer(""), Vec::<String>::new());
        assert_eq!(parse_json_pointer("/"), Vec::<String>::new());
        assert_eq!(parse_json_pointer("/foo/bar"), vec!["foo", "bar"]);
        assert_eq!(parse_json_pointer("/foo//"), vec!["foo", "", ""]);
        assert_eq!(parse_json_pointer("/elements/card~1main"), vec!["elements", "card/main"]);
    }

    #[test]
    fn test_format_roundtrip() {
        for pointer in ["", "/foo", "/foo/bar", "/a~0b", "/c~1d", "/arr/0", "/foo//"] {
            let path = parse_json_pointer(pointer);
            assert_eq!(format_json_pointer(&path), pointer, "roundtrip {pointer:?}");
        }
    }

    #[test]
    fn test_get_scalar_root() {
        assert_eq!(get_by_path(&json!(123), ""), Some(&json!(123)));
        assert_eq!(get_by_path(&json!("foo"), "/"), Some(&json!("foo")));
    }

    #[test]
    fn test_get_object_and_array() {
        let doc = json!({"a": {"b": [1, 2, 3]}});
        assert_eq!(get_by_path(&doc, "/a/b/1"), Some(&json!(2)));
        assert_eq!(get_by_path(&doc, "/a/b/3"), None);
        assert_eq!(get_by_path(&doc, "/a/b/-"), None);
        assert_eq!(get_by_path(&doc, "/a/b/x"), None);
        assert_eq!(get_by_path(&doc, "/missing"), None);
    }

    #[test]
    fn test_get_through_scalar_is_none() {
        let doc = json!({"a": 1, "s": "text"});
        assert_eq!(get_by_path(&doc, "/a/b"), None);
        assert_eq!(get_by_path(&doc, "/s/0"), None);
    }

    #[test]
    fn test_get_explicit_null() {
        let doc = json!({"foo": null});
        assert_eq!(get_by_path(&doc, "/foo"), Some(&Value::Null));
    }

    #[test]
    fn test_get_mut() {
        let mut doc = json!({"a": [1, 2]});
        *get_by_path_mut(&mut doc, "/a/0").unwrap() = json!(10);
        assert_eq!(doc, json!({"a": [10, 2]}));
    }

    #[test]
    fn test_join_pointer() {
        assert_eq!(join_pointer("/items/2", "/title"), "/items/2/title");
        assert_eq!(join_pointer("/items/2", "meta/id"), "/items/2/meta/id");
    }
}
