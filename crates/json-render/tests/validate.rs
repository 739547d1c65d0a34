use json_render::{
    auto_fix_spec, format_spec_issues, validate_spec, validate_spec_value, IssueCode, SpecStreamCompiler, Spec,
    ValidateOptions,
};
use serde_json::json;

#[test]
fn misplaced_visible_is_detected_and_fixed() {
    let doc = json!({"root": "x", "elements": {"x": {"type": "X", "props": {"visible": true}}}});
    let validation = validate_spec(&Spec::from_value(&doc).unwrap(), ValidateOptions::default());
    assert!(!validation.valid);
    assert_eq!(validation.issues.len(), 1);
    assert_eq!(validation.issues[0].code, IssueCode::VisibleInProps);
    assert_eq!(validation.issues[0].element_key.as_deref(), Some("x"));

    let fixed = auto_fix_spec(&doc);
    assert_eq!(fixed.spec["elements"]["x"], json!({"type": "X", "props": {}, "visible": true}));
    assert_eq!(fixed.fixes, vec!["Moved \"visible\" from props to element level on \"x\"."]);
    assert!(validate_spec(&Spec::from_value(&fixed.spec).unwrap(), ValidateOptions::default()).valid);
}

#[test]
fn every_misplaced_field_is_moved() {
    let doc = json!({
        "root": "list",
        "elements": {
            "list": {
                "type": "List",
                "props": {
                    "title": "Todos",
                    "repeat": {"statePath": "/todos"},
                    "on": {"press": {"action": "refresh"}},
                    "visible": {"$state": "/ready"}
                },
                "children": []
            }
        }
    });
    let validation = validate_spec(&Spec::from_value(&doc).unwrap(), ValidateOptions::default());
    let codes: Vec<IssueCode> = validation.issues.iter().map(|i| i.code).collect();
    assert_eq!(codes, [IssueCode::VisibleInProps, IssueCode::OnInProps, IssueCode::RepeatInProps]);

    let fixed = auto_fix_spec(&doc);
    assert_eq!(fixed.fixes.len(), 3);
    let list = Spec::from_value(&fixed.spec).unwrap();
    let element = list.element("list").unwrap();
    assert_eq!(element.props, json!({"title": "Todos"}).as_object().cloned().unwrap());
    assert!(element.visible.is_some());
    assert!(element.on.is_some());
    assert_eq!(element.repeat.as_ref().unwrap().state_path, "/todos");
}

#[test]
fn streamed_spec_with_generator_mistakes() {
    let stream = concat!(
        "{\"op\":\"add\",\"path\":\"/root\",\"value\":\"page\"}\n",
        "{\"op\":\"add\",\"path\":\"/elements/page\",\"value\":{\"type\":\"Stack\",\"props\":{},\"children\":[\"missing\"]}}\n",
        "{\"op\":\"add\",\"path\":\"/elements/stray\",\"value\":{\"type\":\"Text\",\"props\":{}}}\n",
    );
    let mut compiler = SpecStreamCompiler::default();
    compiler.push(stream).unwrap();
    let spec = Spec::from_value(&compiler.result().unwrap()).unwrap();

    let validation = validate_spec(&spec, ValidateOptions { check_orphans: true });
    let codes: Vec<IssueCode> = validation.issues.iter().map(|i| i.code).collect();
    assert_eq!(codes, [IssueCode::MissingChild, IssueCode::OrphanedElement]);
    assert_eq!(
        format_spec_issues(&validation.issues),
        "The generated UI spec has the following errors:\n- Element \"page\" references child \"missing\" which does not exist in the elements map."
    );
}

#[test]
fn malformed_element_does_not_hide_other_issues() {
    let doc = json!({
        "root": "form",
        "elements": {
            "form": {"type": "Form", "props": {}, "children": ["submit", "footer"]},
            "submit": {"type": "Button", "props": {"label": "Send"}, "on": {"press": "submitForm"}}
        }
    });
    assert!(Spec::from_value(&doc).is_err());

    let validation = validate_spec_value(&doc, ValidateOptions::default());
    assert!(!validation.valid);
    let found: Vec<(IssueCode, Option<&str>)> =
        validation.issues.iter().map(|i| (i.code, i.element_key.as_deref())).collect();
    assert_eq!(
        found,
        [(IssueCode::MissingChild, Some("form")), (IssueCode::InvalidElement, Some("submit"))]
    );
    assert!(validation.issues[1].message.starts_with("Element \"submit\" has an invalid \"on\" field"));
}
