//! In-place writes: set, add (insert) and remove by pointer.
//!
//! Writes are all-or-nothing. The pointer is checked against the current
//! document before any intermediate container is created, so a write that
//! fails leaves the document untouched.

use serde_json::{Map, Value};

use crate::{is_numeric_index, parse_index, parse_json_pointer, PointerError};

/// Upper bound on how far past the end of an array a write may land.
///
/// Writing `/list/5` into a two-element array pads indices 2..5 with `null`;
/// a pointer like `/list/4000000000` is rejected instead of allocating.
pub const MAX_ARRAY_PADDING: usize = 1024;

enum Container<'a> {
    Array(&'a mut Vec<Value>),
    Object(&'a mut Map<String, Value>),
}

fn is_array_step(segment: &str) -> bool {
    segment == "-" || is_numeric_index(segment)
}

/// Makes `value` a container, replacing any scalar with an empty array or
/// object depending on the step that will index into it.
fn vivify<'a>(value: &'a mut Value, next: &str) -> Container<'a> {
    match value {
        Value::Array(arr) => Container::Array(arr),
        Value::Object(map) => Container::Object(map),
        other => {
            *other = if is_array_step(next) {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
            vivify(other, next)
        }
    }
}

/// Resolves (and pads) the array slot for an intermediate step.
fn array_slot(arr: &mut Vec<Value>, segment: &str) -> usize {
    let idx = if segment == "-" {
        arr.len()
    } else {
        parse_index(segment).unwrap_or(arr.len())
    };
    if idx >= arr.len() {
        arr.resize(idx + 1, Value::Null);
    }
    idx
}

fn check_index(pointer: &str, segment: &str, len: usize) -> Result<(), PointerError> {
    if segment == "-" {
        return Ok(());
    }
    let index = parse_index(segment).ok_or_else(|| PointerError::InvalidIndex {
        pointer: pointer.to_string(),
        segment: segment.to_string(),
    })?;
    if index > len + MAX_ARRAY_PADDING {
        return Err(PointerError::IndexOutOfRange {
            pointer: pointer.to_string(),
            index,
        });
    }
    Ok(())
}

/// Verifies that every step of `path` can be written without error.
///
/// Existing arrays must be addressed by index or `-`. Steps below a missing
/// or scalar node will be vivified with the matching container type, so only
/// their padding distance needs checking.
fn check_writable(doc: &Value, pointer: &str, path: &[String]) -> Result<(), PointerError> {
    let mut current = Some(doc);
    for step in path {
        current = match current {
            Some(Value::Array(arr)) => {
                check_index(pointer, step, arr.len())?;
                parse_index(step).and_then(|idx| arr.get(idx))
            }
            Some(Value::Object(map)) => map.get(step),
            _ => {
                if is_numeric_index(step) {
                    check_index(pointer, step, 0)?;
                }
                None
            }
        };
    }
    Ok(())
}

/// Walks to the container that will receive the last step, creating
/// intermediates on the way. `path` must be non-empty.
fn walk_to_parent<'a>(doc: &'a mut Value, path: &[String]) -> Container<'a> {
    let mut container = vivify(doc, &path[0]);
    for window in path.windows(2) {
        let (step, next) = (&window[0], &window[1]);
        let slot = match container {
            Container::Array(arr) => {
                let idx = array_slot(arr, step);
                &mut arr[idx]
            }
            Container::Object(map) => map.entry(step.clone()).or_insert(Value::Null),
        };
        container = vivify(slot, next);
    }
    container
}

/// Sets the value at `pointer`, overwriting whatever is there.
///
/// On an array the last step overwrites the element at the index, padding
/// with `null` when the index is past the end; `-` appends. The root pointer
/// (`""` or `"/"`) replaces the whole document.
///
/// # Example
///
/// ```
/// use json_render_pointer::set_by_path;
/// use serde_json::json;
///
/// let mut doc = json!({"list": [1, 2]});
/// set_by_path(&mut doc, "/list/0", json!(9)).unwrap();
/// set_by_path(&mut doc, "/meta/tags/-", json!("x")).unwrap();
/// assert_eq!(doc, json!({"list": [9, 2], "meta": {"tags": ["x"]}}));
/// ```
pub fn set_by_path(doc: &mut Value, pointer: &str, value: Value) -> Result<(), PointerError> {
    let path = parse_json_pointer(pointer);
    let Some(last) = path.last() else {
        *doc = value;
        return Ok(());
    };
    check_writable(doc, pointer, &path)?;
    match walk_to_parent(doc, &path) {
        Container::Array(arr) => match parse_index(last) {
            Some(idx) if idx < arr.len() => arr[idx] = value,
            Some(idx) => {
                arr.resize(idx, Value::Null);
                arr.push(value);
            }
            None => arr.push(value),
        },
        Container::Object(map) => {
            map.insert(last.clone(), value);
        }
    }
    Ok(())
}

/// Adds the value at `pointer` with JSON Patch `add` semantics.
///
/// On an object the member is created or replaced. On an array the value is
/// inserted before the index, shifting later elements; `-` or an index past
/// the end appends.
///
/// # Example
///
/// ```
/// use json_render_pointer::add_by_path;
/// use serde_json::json;
///
/// let mut doc = json!({"children": ["a", "c"]});
/// add_by_path(&mut doc, "/children/1", json!("b")).unwrap();
/// add_by_path(&mut doc, "/children/-", json!("d")).unwrap();
/// assert_eq!(doc, json!({"children": ["a", "b", "c", "d"]}));
/// ```
pub fn add_by_path(doc: &mut Value, pointer: &str, value: Value) -> Result<(), PointerError> {
    let path = parse_json_pointer(pointer);
    let Some(last) = path.last() else {
        *doc = value;
        return Ok(());
    };
    check_writable(doc, pointer, &path)?;
    match walk_to_parent(doc, &path) {
        Container::Array(arr) => match parse_index(last) {
            Some(idx) if idx <= arr.len() => arr.insert(idx, value),
            _ => arr.push(value),
        },
        Container::Object(map) => {
            map.insert(last.clone(), value);
        }
    }
    Ok(())
}

/// Removes the value at `pointer`, returning it.
///
/// Removal is idempotent: a missing path, an out-of-range index, or a path
/// through a scalar is a silent no-op returning `None`. The root cannot be
/// removed. Object member order is preserved for the remaining members.
///
/// # Example
///
/// ```
/// use json_render_pointer::remove_by_path;
/// use serde_json::json;
///
/// let mut doc = json!({"a": [1, 2, 3], "b": true});
/// assert_eq!(remove_by_path(&mut doc, "/a/1"), Some(json!(2)));
/// assert_eq!(remove_by_path(&mut doc, "/nope/x"), None);
/// assert_eq!(doc, json!({"a": [1, 3], "b": true}));
/// ```
pub fn remove_by_path(doc: &mut Value, pointer: &str) -> Option<Value> {
    let path = parse_json_pointer(pointer);
    let (last, parent_path) = path.split_last()?;
    match crate::get_mut(doc, parent_path)? {
        Value::Array(arr) => {
            let idx = parse_index(last)?;
            if idx < arr.len() {
                Some(arr.remove(idx))
            } else {
                None
            }
        }
        Value::Object(map) => map.shift_remove(last),
        _ => None,
    }
}
