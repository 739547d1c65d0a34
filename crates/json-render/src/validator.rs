//! Structural checks on a compiled spec, plus automatic repair of the most
//! common generator mistake (element-level fields nested inside `props`).

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use json_render_expression::VisibilityCondition;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::actions::ActionBindings;
use crate::spec::{RepeatDirective, Spec};

/// Element-level fields that generators sometimes emit inside `props`.
const ELEMENT_LEVEL_FIELDS: [(&str, IssueCode); 3] = [
    ("visible", IssueCode::VisibleInProps),
    ("on", IssueCode::OnInProps),
    ("repeat", IssueCode::RepeatInProps),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    MissingRoot,
    RootNotFound,
    EmptySpec,
    MissingChild,
    VisibleInProps,
    OnInProps,
    RepeatInProps,
    OrphanedElement,
    InvalidElement,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingRoot => "missing_root",
            IssueCode::RootNotFound => "root_not_found",
            IssueCode::EmptySpec => "empty_spec",
            IssueCode::MissingChild => "missing_child",
            IssueCode::VisibleInProps => "visible_in_props",
            IssueCode::OnInProps => "on_in_props",
            IssueCode::RepeatInProps => "repeat_in_props",
            IssueCode::OrphanedElement => "orphaned_element",
            IssueCode::InvalidElement => "invalid_element",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_key: Option<String>,
}

impl SpecIssue {
    fn error(code: IssueCode, message: String, element_key: Option<&str>) -> Self {
        SpecIssue {
            severity: Severity::Error,
            code,
            message,
            element_key: element_key.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecValidation {
    pub valid: bool,
    pub issues: Vec<SpecIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Also warn about elements unreachable from the root.
    pub check_orphans: bool,
}

fn finish(issues: Vec<SpecIssue>) -> SpecValidation {
    let valid = !issues.iter().any(|i| i.severity == Severity::Error);
    SpecValidation { valid, issues }
}

/// What the checks need to know about one element.
struct ElementView<'a> {
    children: Vec<&'a str>,
    props: Option<&'a Map<String, Value>>,
    /// Fields that are present but do not decode, with the reason.
    invalid: Vec<(&'static str, String)>,
}

struct SpecView<'a> {
    root: &'a str,
    elements: IndexMap<&'a str, ElementView<'a>>,
}

impl<'a> SpecView<'a> {
    fn from_spec(spec: &'a Spec) -> Self {
        let elements = spec
            .elements
            .iter()
            .map(|(key, element)| {
                let view = ElementView {
                    children: element.children().iter().map(String::as_str).collect(),
                    props: Some(&element.props),
                    invalid: Vec::new(),
                };
                (key.as_str(), view)
            })
            .collect();
        SpecView { root: &spec.root, elements }
    }

    fn from_document(doc: &'a Value) -> Self {
        let root = doc.get("root").and_then(Value::as_str).unwrap_or_default();
        let elements = doc
            .get("elements")
            .and_then(Value::as_object)
            .map(|elements| {
                elements
                    .iter()
                    .map(|(key, element)| (key.as_str(), ElementView::from_document(element)))
                    .collect()
            })
            .unwrap_or_default();
        SpecView { root, elements }
    }
}

fn decode_error<T: DeserializeOwned>(value: &Value) -> Option<String> {
    T::deserialize(value).err().map(|err| err.to_string())
}

/// Typed fields of an element and how each one decodes.
const ELEMENT_FIELDS: [(&str, fn(&Value) -> Option<String>); 6] = [
    ("type", decode_error::<String>),
    ("props", decode_error::<Map<String, Value>>),
    ("children", decode_error::<Option<Vec<String>>>),
    ("visible", decode_error::<Option<VisibilityCondition>>),
    ("on", decode_error::<Option<IndexMap<String, ActionBindings>>>),
    ("repeat", decode_error::<Option<RepeatDirective>>),
];

impl<'a> ElementView<'a> {
    fn from_document(element: &'a Value) -> Self {
        let Some(map) = element.as_object() else {
            return ElementView {
                children: Vec::new(),
                props: None,
                invalid: vec![("", "expected an object".to_string())],
            };
        };
        let invalid = ELEMENT_FIELDS
            .iter()
            .filter_map(|(field, decode)| {
                let value = map.get(*field)?;
                decode(value).map(|reason| (*field, reason))
            })
            .collect();
        let children = map
            .get("children")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        ElementView {
            children,
            props: map.get("props").and_then(Value::as_object),
            invalid,
        }
    }
}

/// Checks a spec for structural problems.
///
/// Never fails; every problem becomes an issue. `valid` is false iff at
/// least one issue is an error.
pub fn validate_spec(spec: &Spec, options: ValidateOptions) -> SpecValidation {
    validate_view(&SpecView::from_spec(spec), options)
}

/// Checks a raw spec document without decoding it first.
///
/// Fields that would not decode into a [`Spec`] are reported as
/// [`IssueCode::InvalidElement`] errors next to the structural issues, so
/// one malformed element never hides problems elsewhere.
pub fn validate_spec_value(doc: &Value, options: ValidateOptions) -> SpecValidation {
    validate_view(&SpecView::from_document(doc), options)
}

fn validate_view(spec: &SpecView<'_>, options: ValidateOptions) -> SpecValidation {
    let mut issues = Vec::new();

    if spec.root.is_empty() {
        issues.push(SpecIssue::error(
            IssueCode::MissingRoot,
            "Spec has no root element defined.".into(),
            None,
        ));
        return finish(issues);
    }
    if !spec.elements.contains_key(spec.root) {
        issues.push(SpecIssue::error(
            IssueCode::RootNotFound,
            format!("Root element \"{}\" not found in elements map.", spec.root),
            None,
        ));
    }
    if spec.elements.is_empty() {
        issues.push(SpecIssue::error(
            IssueCode::EmptySpec,
            "Spec has no elements.".into(),
            None,
        ));
        return finish(issues);
    }

    for (&key, element) in &spec.elements {
        for (field, reason) in &element.invalid {
            let message = if field.is_empty() {
                format!("Element \"{key}\" is invalid: {reason}.")
            } else {
                format!("Element \"{key}\" has an invalid \"{field}\" field: {reason}.")
            };
            issues.push(SpecIssue::error(IssueCode::InvalidElement, message, Some(key)));
        }
        for &child in &element.children {
            if !spec.elements.contains_key(child) {
                issues.push(SpecIssue::error(
                    IssueCode::MissingChild,
                    format!(
                        "Element \"{key}\" references child \"{child}\" which does not exist in the elements map."
                    ),
                    Some(key),
                ));
            }
        }
        let Some(props) = element.props else {
            continue;
        };
        for (field, code) in ELEMENT_LEVEL_FIELDS {
            if props.contains_key(field) {
                issues.push(SpecIssue::error(
                    code,
                    format!(
                        "Element \"{key}\" has \"{field}\" inside \"props\". It should be a top-level field on the element (sibling of type/props/children)."
                    ),
                    Some(key),
                ));
            }
        }
    }

    if options.check_orphans {
        let reachable = reachable_from_root(spec);
        for &key in spec.elements.keys() {
            if !reachable.contains(key) {
                issues.push(SpecIssue {
                    severity: Severity::Warning,
                    code: IssueCode::OrphanedElement,
                    message: format!("Element \"{key}\" is not reachable from root \"{}\".", spec.root),
                    element_key: Some(key.to_string()),
                });
            }
        }
    }

    finish(issues)
}

fn reachable_from_root<'a>(spec: &SpecView<'a>) -> HashSet<&'a str> {
    let mut reachable = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    if spec.elements.contains_key(spec.root) {
        stack.push(spec.root);
    }
    while let Some(key) = stack.pop() {
        if !reachable.insert(key) {
            continue;
        }
        if let Some(element) = spec.elements.get(key) {
            stack.extend(
                element
                    .children
                    .iter()
                    .copied()
                    .filter(|child| spec.elements.contains_key(child)),
            );
        }
    }
    reachable
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoFixResult {
    pub spec: Value,
    /// One human-readable line per relocated field.
    pub fixes: Vec<String>,
}

/// Moves `visible`, `on` and `repeat` out of `props` up to the element.
///
/// Works on the raw document so it can run before typed decoding. A field
/// moved up replaces any element-level value of the same name.
pub fn auto_fix_spec(spec: &Value) -> AutoFixResult {
    let mut fixed = spec.clone();
    let mut fixes = Vec::new();
    if let Some(elements) = fixed.get_mut("elements").and_then(Value::as_object_mut) {
        for (key, element) in elements.iter_mut() {
            let Some(element) = element.as_object_mut() else {
                continue;
            };
            let Some(props) = element.get_mut("props").and_then(Value::as_object_mut) else {
                continue;
            };
            let moved: Vec<(&str, Value)> = ELEMENT_LEVEL_FIELDS
                .iter()
                .filter_map(|(field, _)| props.shift_remove(*field).map(|v| (*field, v)))
                .collect();
            for (field, value) in moved {
                fixes.push(format!("Moved \"{field}\" from props to element level on \"{key}\"."));
                element.insert(field.to_string(), value);
            }
        }
    }
    AutoFixResult { spec: fixed, fixes }
}

/// Formats error-severity issues as a repair instruction for the generator.
/// Returns an empty string when there are no errors.
pub fn format_spec_issues(issues: &[SpecIssue]) -> String {
    let errors: Vec<&SpecIssue> = issues.iter().filter(|i| i.severity == Severity::Error).collect();
    if errors.is_empty() {
        return String::new();
    }
    let mut lines = vec!["The generated UI spec has the following errors:".to_string()];
    lines.extend(errors.iter().map(|issue| format!("- {}", issue.message)));
    lines.join("\n")
}
