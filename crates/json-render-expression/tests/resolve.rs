use json_render_expression::{
    evaluate_visibility, resolve_action_param, resolve_element_props, resolve_prop_value,
    visibility, Expression, ResolutionContext, VisibilityCondition,
};
use serde_json::{json, Value};

fn todos_state() -> Value {
    json!({
        "filter": "open",
        "threshold": 2,
        "todos": [
            {"title": "write", "done": false, "priority": 3},
            {"title": "ship", "done": true, "priority": 1}
        ]
    })
}

#[test]
fn eq_wins_over_gt_when_both_present() {
    let state = json!({"n": 5});
    let ctx = ResolutionContext::new(&state);
    let cond = VisibilityCondition::try_from(json!({"$state": "/n", "eq": 5, "gt": 10})).unwrap();
    assert!(evaluate_visibility(Some(&cond), &ctx));
    let cond = VisibilityCondition::try_from(json!({"$state": "/n", "eq": 6, "gt": 1})).unwrap();
    assert!(!evaluate_visibility(Some(&cond), &ctx));
}

#[test]
fn not_inverts_comparison_result() {
    let state = json!({"n": 5});
    let ctx = ResolutionContext::new(&state);
    let cond =
        VisibilityCondition::try_from(json!({"$state": "/n", "gte": 5, "not": true})).unwrap();
    assert!(!cond.evaluate(&ctx));
}

#[test]
fn nested_expressions_resolve_in_repeat_scope() {
    let state = todos_state();
    let ctx = ResolutionContext::new(&state).with_repeat(&state["todos"][0], 0, "/todos/0");
    let props = json!({
        "label": {"$item": "title"},
        "position": {"$index": true},
        "badge": {
            "$cond": {"$item": "priority", "gt": {"$state": "/threshold"}},
            "$then": "high",
            "$else": "low"
        },
        "meta": {"filter": {"$state": "/filter"}, "pair": [{"$item": "done"}, {"$state": "/nope"}]}
    });
    let resolved = resolve_element_props(props.as_object().unwrap(), &ctx);
    assert_eq!(
        Value::Object(resolved),
        json!({
            "label": "write",
            "position": 0,
            "badge": "high",
            "meta": {"filter": "open", "pair": [false, null]}
        })
    );
}

#[test]
fn item_param_is_a_path_but_item_prop_is_a_value() {
    let state = todos_state();
    let ctx = ResolutionContext::new(&state).with_repeat(&state["todos"][1], 1, "/todos/1");
    let raw = json!({"$item": "done"});
    assert_eq!(resolve_action_param(&raw, &ctx), Some(json!("/todos/1/done")));
    assert_eq!(resolve_prop_value(&raw, &ctx), Some(json!(true)));
}

#[test]
fn builder_and_wire_forms_agree() {
    let state = todos_state();
    let ctx = ResolutionContext::new(&state);
    let built = visibility::and(vec![
        visibility::eq("/filter", "open"),
        visibility::lt("/threshold", 3),
    ]);
    let wire = VisibilityCondition::try_from(json!({
        "$and": [{"$state": "/filter", "eq": "open"}, {"$state": "/threshold", "lt": 3}]
    }))
    .unwrap();
    assert_eq!(built, wire);
    assert!(built.evaluate(&ctx));
}

#[test]
fn expression_deserializes_through_serde() {
    let expr: Expression = serde_json::from_value(json!({"$bindState": "/form/email"})).unwrap();
    assert_eq!(expr, Expression::bind_state("/form/email"));
    assert_eq!(serde_json::to_value(&expr).unwrap(), json!({"$bindState": "/form/email"}));
}
