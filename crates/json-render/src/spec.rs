//! Typed view of a compiled spec document.
//!
//! While streaming, the document is an untyped [`Value`] because it may be
//! half built. Once complete (or whenever a typed view is wanted) it decodes
//! into [`Spec`].

use indexmap::IndexMap;
use json_render_expression::VisibilityCondition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::actions::ActionBindings;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("spec document does not decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("nested spec tree must be a JSON object")]
    NotAnObject,
}

/// A flat UI tree: a root key plus elements keyed by opaque ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub elements: IndexMap<String, Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Component type; the host picks a renderer by this name.
    #[serde(rename = "type", default)]
    pub element_type: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<IndexMap<String, ActionBindings>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatDirective>,
    /// Anything else the generator attached, e.g. `validation`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Renders an element's children once per item of a state array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatDirective {
    pub state_path: String,
    /// Item field used as a stable key; the index is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Spec {
    pub fn from_value(value: &Value) -> Result<Spec, SpecError> {
        Ok(Spec::deserialize(value)?)
    }

    pub fn to_value(&self) -> Result<Value, SpecError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Converts a nested tree into a flat spec. See [`nested_to_flat`].
    pub fn from_nested(nested: &Value) -> Result<Spec, SpecError> {
        if !nested.is_object() {
            return Err(SpecError::NotAnObject);
        }
        Spec::from_value(&nested_to_flat(nested))
    }

    pub fn element(&self, key: &str) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn root_element(&self) -> Option<&Element> {
        self.elements.get(&self.root)
    }
}

impl Element {
    pub fn new(element_type: impl Into<String>) -> Self {
        Element {
            element_type: element_type.into(),
            ..Element::default()
        }
    }

    pub fn children(&self) -> &[String] {
        self.children.as_deref().unwrap_or_default()
    }
}

fn walk_nested(node: &Map<String, Value>, counter: &mut usize, elements: &mut Map<String, Value>) -> String {
    let key = format!("el-{counter}");
    *counter += 1;

    let mut child_keys = Vec::new();
    if let Some(Value::Array(children)) = node.get("children") {
        for child in children {
            if let Some(child) = child.as_object().filter(|c| c.contains_key("type")) {
                child_keys.push(Value::String(walk_nested(child, counter, elements)));
            }
        }
    }

    let mut element = Map::new();
    element.insert(
        "type".into(),
        node.get("type").cloned().unwrap_or_else(|| Value::from("unknown")),
    );
    element.insert(
        "props".into(),
        node.get("props").cloned().unwrap_or_else(|| Value::Object(Map::new())),
    );
    element.insert("children".into(), Value::Array(child_keys));
    for (field, value) in node {
        if !matches!(field.as_str(), "type" | "props" | "children" | "state") {
            element.insert(field.clone(), value.clone());
        }
    }
    elements.insert(key.clone(), Value::Object(element));
    key
}

/// Flattens a nested `{type, props, children: [...]}` tree.
///
/// Keys are `el-0`, `el-1`, ... in pre-order. Extra element fields such as
/// `visible` or `on` are kept; a `state` object on the top node becomes the
/// spec's state.
///
/// ```
/// use json_render::spec::nested_to_flat;
/// use serde_json::json;
///
/// let nested = json!({
///     "type": "Card",
///     "props": {"title": "Hi"},
///     "children": [{"type": "Text", "props": {"text": "a"}}],
///     "state": {"n": 1}
/// });
/// assert_eq!(nested_to_flat(&nested), json!({
///     "root": "el-0",
///     "elements": {
///         "el-0": {"type": "Card", "props": {"title": "Hi"}, "children": ["el-1"]},
///         "el-1": {"type": "Text", "props": {"text": "a"}, "children": []}
///     },
///     "state": {"n": 1}
/// }));
/// ```
pub fn nested_to_flat(nested: &Value) -> Value {
    let empty = Map::new();
    let node = nested.as_object().unwrap_or(&empty);
    let mut elements = Map::new();
    let mut counter = 0;
    let root = walk_nested(node, &mut counter, &mut elements);

    let mut spec = Map::new();
    spec.insert("root".into(), Value::String(root));
    spec.insert("elements".into(), Value::Object(elements));
    if let Some(state @ Value::Object(_)) = node.get("state") {
        spec.insert("state".into(), state.clone());
    }
    Value::Object(spec)
}
