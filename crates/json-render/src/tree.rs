//! Resolves a flat spec plus state into a concrete element tree.
//!
//! This is everything a renderer needs short of drawing: visibility is
//! applied, props are resolved, two-way bindings become absolute state paths,
//! and `repeat` children are expanded once per item.

use indexmap::IndexMap;
use json_render_expression::{
    evaluate_visibility, resolve_action_param, resolve_bindings, resolve_element_props, ResolutionContext,
};
use json_render_pointer::get_by_path;
use json_render_util::js_string;
use serde_json::{Map, Value};

use crate::actions::ActionBinding;
use crate::spec::{Element, RepeatDirective, Spec};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement {
    pub key: String,
    pub element_type: String,
    pub props: Map<String, Value>,
    /// Prop name to absolute state path, for bound props.
    pub bindings: Option<IndexMap<String, String>>,
    /// Event name to bindings, params already resolved in scope.
    pub events: IndexMap<String, Vec<ActionBinding>>,
    pub children: Vec<ResolvedElement>,
    /// Set on elements produced by a `repeat` expansion.
    pub repeat_key: Option<String>,
}

impl ResolvedElement {
    pub fn event_bindings(&self, event: &str) -> &[ActionBinding] {
        self.events.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    /// Depth-first search by element key.
    pub fn find(&self, key: &str) -> Option<&ResolvedElement> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }
}

/// Resolves the tree under `spec.root`. Returns `None` when the root is
/// missing or hidden.
pub fn resolve_tree(spec: &Spec, state: &Value) -> Option<ResolvedElement> {
    let mut walker = TreeWalker {
        spec,
        path: Vec::new(),
    };
    walker.resolve(&spec.root, &ResolutionContext::new(state), None)
}

struct TreeWalker<'s> {
    spec: &'s Spec,
    /// Keys on the current root-to-node path, to break cycles.
    path: Vec<&'s str>,
}

impl<'s> TreeWalker<'s> {
    fn resolve(
        &mut self,
        key: &'s str,
        ctx: &ResolutionContext<'_>,
        repeat_key: Option<String>,
    ) -> Option<ResolvedElement> {
        let Some(element) = self.spec.element(key) else {
            tracing::debug!(key, "skipping reference to missing element");
            return None;
        };
        if self.path.contains(&key) {
            tracing::debug!(key, "skipping cyclic element reference");
            return None;
        }
        if !evaluate_visibility(element.visible.as_ref(), ctx) {
            return None;
        }

        self.path.push(key);
        let children = match &element.repeat {
            Some(repeat) => self.resolve_repeat(element, repeat, ctx),
            None => self.resolve_children(element, ctx, None),
        };
        self.path.pop();

        Some(ResolvedElement {
            key: key.to_string(),
            element_type: element.element_type.clone(),
            props: resolve_element_props(&element.props, ctx),
            bindings: resolve_bindings(&element.props, ctx),
            events: resolve_events(element, ctx),
            children,
            repeat_key,
        })
    }

    fn resolve_children(
        &mut self,
        element: &'s Element,
        ctx: &ResolutionContext<'_>,
        repeat_key: Option<&str>,
    ) -> Vec<ResolvedElement> {
        element
            .children()
            .iter()
            .filter_map(|child| self.resolve(child, ctx, repeat_key.map(str::to_string)))
            .collect()
    }

    fn resolve_repeat(
        &mut self,
        element: &'s Element,
        repeat: &RepeatDirective,
        ctx: &ResolutionContext<'_>,
    ) -> Vec<ResolvedElement> {
        let Some(Value::Array(items)) = get_by_path(ctx.state, &repeat.state_path) else {
            tracing::debug!(state_path = %repeat.state_path, "repeat target is not an array");
            return Vec::new();
        };
        let mut children = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let item_key = repeat
                .key
                .as_deref()
                .and_then(|field| item.get(field))
                .filter(|v| !v.is_null())
                .map(|v| js_string(Some(v)))
                .unwrap_or_else(|| index.to_string());
            let scope = ResolutionContext::new(ctx.state).with_repeat(
                item,
                index,
                format!("{}/{index}", repeat.state_path),
            );
            children.extend(self.resolve_children(element, &scope, Some(&item_key)));
        }
        children
    }
}

fn resolve_events(element: &Element, ctx: &ResolutionContext<'_>) -> IndexMap<String, Vec<ActionBinding>> {
    let Some(on) = &element.on else {
        return IndexMap::new();
    };
    on.iter()
        .map(|(event, bindings)| {
            let resolved = bindings
                .as_slice()
                .iter()
                .map(|binding| ActionBinding {
                    params: binding
                        .params
                        .iter()
                        .filter_map(|(k, v)| resolve_action_param(v, ctx).map(|v| (k.clone(), v)))
                        .collect(),
                    ..binding.clone()
                })
                .collect();
            (event.clone(), resolved)
        })
        .collect()
}
