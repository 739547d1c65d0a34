//! Action bindings: resolution against state, execution with success and
//! error continuations, and a dispatcher with the built-in state actions.
//!
//! Everything here is single-threaded. Handlers return `LocalBoxFuture`s and
//! confirmation is a one-shot channel answered by the host UI.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use json_render_expression::{resolve_prop_value, ResolutionContext};
use json_render_pointer::{get_by_path, remove_by_path, set_by_path, PointerError};
use json_render_util::{is_truthy_value, js_string};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("{0}")]
    Handler(String),
    #[error("action cancelled")]
    Cancelled,
    #[error("invalid params for {action}: {reason}")]
    InvalidParams { action: String, reason: String },
    #[error(transparent)]
    State(#[from] PointerError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmVariant {
    #[default]
    Default,
    Danger,
}

/// A confirmation prompt shown before the handler runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfirm {
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ConfirmVariant>,
}

/// What to do after a handler succeeds or fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionContinuation {
    Navigate { navigate: String },
    Set { set: Map<String, Value> },
    Action { action: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionBinding {
    pub action: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<ActionConfirm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<ActionContinuation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<ActionContinuation>,
}

impl ActionBinding {
    pub fn new(action: impl Into<String>) -> Self {
        ActionBinding {
            action: action.into(),
            params: Map::new(),
            confirm: None,
            on_success: None,
            on_error: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_confirm(mut self, confirm: ActionConfirm) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn with_success(mut self, next: ActionContinuation) -> Self {
        self.on_success = Some(next);
        self
    }

    pub fn with_error(mut self, next: ActionContinuation) -> Self {
        self.on_error = Some(next);
        self
    }
}

/// The `on` value of one event: a single binding or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionBindings {
    One(ActionBinding),
    Many(Vec<ActionBinding>),
}

impl ActionBindings {
    pub fn as_slice(&self) -> &[ActionBinding] {
        match self {
            ActionBindings::One(binding) => std::slice::from_ref(binding),
            ActionBindings::Many(bindings) => bindings,
        }
    }
}

/// A binding whose params and confirm text have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction {
    pub action: String,
    pub params: Map<String, Value>,
    pub confirm: Option<ActionConfirm>,
    pub on_success: Option<ActionContinuation>,
    pub on_error: Option<ActionContinuation>,
}

fn interpolation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").ok()).as_ref()
}

/// Replaces every `${/state/path}` with the stringified state value.
/// Missing and null values become the empty string.
pub fn interpolate_string(template: &str, state: &Value) -> String {
    match interpolation_pattern() {
        Some(pattern) => pattern
            .replace_all(template, |caps: &Captures<'_>| js_string(get_by_path(state, &caps[1])))
            .into_owned(),
        None => template.to_string(),
    }
}

/// Resolves params deeply against `state` and interpolates the confirm text.
/// Params that resolve to undefined are left out.
pub fn resolve_action(binding: &ActionBinding, state: &Value) -> ResolvedAction {
    let ctx = ResolutionContext::new(state);
    let params = binding
        .params
        .iter()
        .filter_map(|(key, value)| resolve_prop_value(value, &ctx).map(|v| (key.clone(), v)))
        .collect();
    let confirm = binding.confirm.as_ref().map(|confirm| ActionConfirm {
        title: interpolate_string(&confirm.title, state),
        message: interpolate_string(&confirm.message, state),
        ..confirm.clone()
    });
    ResolvedAction {
        action: binding.action.clone(),
        params,
        confirm,
        on_success: binding.on_success.clone(),
        on_error: binding.on_error.clone(),
    }
}

pub type ActionHandler =
    Arc<dyn Fn(Map<String, Value>) -> LocalBoxFuture<'static, Result<(), ActionError>>>;

/// Wraps an async closure as an [`ActionHandler`].
pub fn action_handler<F, Fut>(handler: F) -> ActionHandler
where
    F: Fn(Map<String, Value>) -> Fut + 'static,
    Fut: Future<Output = Result<(), ActionError>> + 'static,
{
    Arc::new(move |params| handler(params).boxed_local())
}

/// The side effects an executing action may request.
pub trait ActionHost {
    fn set_state(&mut self, path: &str, value: Value) -> Result<(), ActionError>;
    fn navigate(&mut self, to: &str);
    /// Runs another action by name, as a chained continuation.
    fn execute_named<'a>(&'a mut self, action: &'a str) -> LocalBoxFuture<'a, Result<(), ActionError>>;
}

async fn run_continuation(next: &ActionContinuation, host: &mut dyn ActionHost) -> Result<(), ActionError> {
    match next {
        ActionContinuation::Navigate { navigate } => host.navigate(navigate),
        ActionContinuation::Set { set } => {
            for (path, value) in set {
                host.set_state(path, value.clone())?;
            }
        }
        ActionContinuation::Action { action } => host.execute_named(action).await?,
    }
    Ok(())
}

async fn run_with_success(
    action: &ResolvedAction,
    handler: &ActionHandler,
    host: &mut dyn ActionHost,
) -> Result<(), ActionError> {
    handler(action.params.clone()).await?;
    match &action.on_success {
        Some(next) => run_continuation(next, host).await,
        None => Ok(()),
    }
}

/// Runs the handler, then the matching continuation.
///
/// A failure (of the handler or of `onSuccess`) runs `onError` when present;
/// inside its `set` map the string `"$error.message"` is replaced by the
/// error text. Without `onError` the failure is returned.
pub async fn execute_action(
    action: &ResolvedAction,
    handler: &ActionHandler,
    host: &mut dyn ActionHost,
) -> Result<(), ActionError> {
    let Err(err) = run_with_success(action, handler, host).await else {
        return Ok(());
    };
    let Some(on_error) = &action.on_error else {
        return Err(err);
    };
    tracing::debug!(action = %action.action, error = %err, "running onError continuation");
    match on_error {
        ActionContinuation::Set { set } => {
            for (path, value) in set {
                let value = match value.as_str() {
                    Some("$error.message") => Value::String(err.to_string()),
                    _ => value.clone(),
                };
                host.set_state(path, value)?;
            }
            Ok(())
        }
        other => run_continuation(other, host).await,
    }
}

/// A state model the dispatcher can read and write by JSON Pointer.
pub trait StateStore {
    fn state(&self) -> &Value;

    fn get(&self, path: &str) -> Option<&Value> {
        get_by_path(self.state(), path)
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), PointerError>;

    fn remove(&mut self, path: &str) -> Option<Value>;
}

impl StateStore for Value {
    fn state(&self) -> &Value {
        self
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), PointerError> {
        set_by_path(self, path, value)
    }

    fn remove(&mut self, path: &str) -> Option<Value> {
        remove_by_path(self, path)
    }
}

/// Produces `<unix-millis>-<counter>` ids for the `$id` sentinel.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{millis}-{}", self.counter)
    }

    /// Replaces `"$id"` strings and `{"$id": ...}` objects with fresh ids.
    pub fn resolve_ids(&mut self, value: &Value) -> Value {
        match value {
            Value::String(s) if s == "$id" => Value::String(self.next_id()),
            Value::Object(map) if map.len() == 1 && map.contains_key("$id") => {
                Value::String(self.next_id())
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve_ids(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, v)| (key.clone(), self.resolve_ids(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// A confirmation request handed to the host. Answer it with
/// [`confirm`](Self::confirm) or [`cancel`](Self::cancel); dropping it
/// cancels.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub action: String,
    pub confirm: ActionConfirm,
    responder: oneshot::Sender<bool>,
}

impl PendingConfirmation {
    pub fn confirm(self) {
        let _ = self.responder.send(true);
    }

    pub fn cancel(self) {
        let _ = self.responder.send(false);
    }
}

pub type Navigator = Box<dyn FnMut(&str)>;
pub type Confirmer = Box<dyn FnMut(PendingConfirmation)>;

fn str_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Executes action bindings against a state store.
///
/// The built-in actions `setState`, `pushState`, `removeState`, `push` and
/// `pop` act on the store directly. Any other action name is looked up in
/// the handler registry; unknown names are logged and ignored.
pub struct ActionDispatcher<S: StateStore> {
    store: S,
    handlers: HashMap<String, ActionHandler>,
    navigator: Option<Navigator>,
    confirmer: Option<Confirmer>,
    ids: IdGenerator,
}

impl<S: StateStore> ActionDispatcher<S> {
    pub fn new(store: S) -> Self {
        ActionDispatcher {
            store,
            handlers: HashMap::new(),
            navigator: None,
            confirmer: None,
            ids: IdGenerator::new(),
        }
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: ActionHandler) -> Self {
        self.register_handler(name, handler);
        self
    }

    pub fn with_navigator(mut self, navigator: impl FnMut(&str) + 'static) -> Self {
        self.navigator = Some(Box::new(navigator));
        self
    }

    pub fn with_confirmer(mut self, confirmer: impl FnMut(PendingConfirmation) + 'static) -> Self {
        self.confirmer = Some(Box::new(confirmer));
        self
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: ActionHandler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Resolves `binding` against the current state and runs it.
    pub fn execute(&mut self, binding: &ActionBinding) -> LocalBoxFuture<'_, Result<(), ActionError>> {
        let resolved = resolve_action(binding, self.store.state());
        self.execute_resolved(resolved)
    }

    pub fn execute_resolved(&mut self, resolved: ResolvedAction) -> LocalBoxFuture<'_, Result<(), ActionError>> {
        async move {
            if self.run_builtin(&resolved)? {
                return Ok(());
            }
            let Some(handler) = self.handlers.get(&resolved.action).cloned() else {
                tracing::warn!(action = %resolved.action, "no handler registered for action");
                return Ok(());
            };
            if let Some(confirm) = &resolved.confirm {
                let answer = self.request_confirmation(&resolved.action, confirm)?;
                if !matches!(answer.await, Ok(true)) {
                    return Err(ActionError::Cancelled);
                }
            }
            tracing::debug!(action = %resolved.action, "executing action");
            execute_action(&resolved, &handler, self).await
        }
        .boxed_local()
    }

    fn request_confirmation(
        &mut self,
        action: &str,
        confirm: &ActionConfirm,
    ) -> Result<oneshot::Receiver<bool>, ActionError> {
        let Some(confirmer) = self.confirmer.as_mut() else {
            tracing::warn!(action, "action requires confirmation but no confirmer is installed");
            return Err(ActionError::Cancelled);
        };
        let (responder, answer) = oneshot::channel();
        confirmer(PendingConfirmation {
            action: action.to_string(),
            confirm: confirm.clone(),
            responder,
        });
        Ok(answer)
    }

    /// Returns `Ok(true)` when `action` was a built-in and has been handled.
    fn run_builtin(&mut self, action: &ResolvedAction) -> Result<bool, ActionError> {
        let params = &action.params;
        match action.action.as_str() {
            "setState" => {
                if let Some(path) = str_param(params, "statePath") {
                    match params.get("value") {
                        Some(value) => self.store.set(path, value.clone())?,
                        None => {
                            self.store.remove(path);
                        }
                    }
                }
            }
            "pushState" => self.push_state(params)?,
            "removeState" => self.remove_state(params)?,
            "push" => self.push_screen(params)?,
            "pop" => self.pop_screen()?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn array_at(&self, path: &str, action: &str) -> Result<Vec<Value>, ActionError> {
        match self.store.get(path) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(ActionError::InvalidParams {
                action: action.to_string(),
                reason: format!("{path} holds {other}, not an array"),
            }),
        }
    }

    fn push_state(&mut self, params: &Map<String, Value>) -> Result<(), ActionError> {
        let Some(path) = str_param(params, "statePath") else {
            return Ok(());
        };
        let value = params
            .get("value")
            .map(|v| self.ids.resolve_ids(v))
            .unwrap_or(Value::Null);
        let mut items = self.array_at(path, "pushState")?;
        items.push(value);
        self.store.set(path, Value::Array(items))?;
        if let Some(clear) = str_param(params, "clearStatePath") {
            self.store.set(clear, Value::String(String::new()))?;
        }
        Ok(())
    }

    fn remove_state(&mut self, params: &Map<String, Value>) -> Result<(), ActionError> {
        let (Some(path), Some(index)) = (str_param(params, "statePath"), params.get("index")) else {
            return Ok(());
        };
        let index = index.as_f64();
        let items: Vec<Value> = self
            .array_at(path, "removeState")?
            .into_iter()
            .enumerate()
            .filter(|(i, _)| index != Some(*i as f64))
            .map(|(_, item)| item)
            .collect();
        self.store.set(path, Value::Array(items))?;
        Ok(())
    }

    fn push_screen(&mut self, params: &Map<String, Value>) -> Result<(), ActionError> {
        let Some(screen) = str_param(params, "screen") else {
            return Ok(());
        };
        let current = self.store.get("/currentScreen").cloned();
        let mut stack = self.array_at("/navStack", "push")?;
        stack.push(current.filter(is_truthy_value).unwrap_or_else(|| Value::String(String::new())));
        self.store.set("/navStack", Value::Array(stack))?;
        self.store.set("/currentScreen", Value::String(screen.to_string()))?;
        Ok(())
    }

    fn pop_screen(&mut self) -> Result<(), ActionError> {
        let mut stack = self.array_at("/navStack", "pop")?;
        let Some(previous) = stack.pop() else {
            return Ok(());
        };
        self.store.set("/navStack", Value::Array(stack))?;
        if is_truthy_value(&previous) {
            self.store.set("/currentScreen", previous)?;
        } else {
            self.store.remove("/currentScreen");
        }
        Ok(())
    }
}

impl<S: StateStore> ActionHost for ActionDispatcher<S> {
    fn set_state(&mut self, path: &str, value: Value) -> Result<(), ActionError> {
        Ok(self.store.set(path, value)?)
    }

    fn navigate(&mut self, to: &str) {
        match self.navigator.as_mut() {
            Some(navigator) => navigator(to),
            None => tracing::warn!(to, "navigation requested but no navigator is installed"),
        }
    }

    fn execute_named<'a>(&'a mut self, action: &'a str) -> LocalBoxFuture<'a, Result<(), ActionError>> {
        self.execute(&ActionBinding::new(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    fn binding(raw: Value) -> ActionBinding {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn interpolation_uses_js_string_rules() {
        let state = json!({"user": {"name": "Ada"}, "n": 3.0, "tags": ["a", "b"], "none": null});
        assert_eq!(
            interpolate_string("Hi ${/user/name}, ${/n} ${/tags} [${/none}] [${/missing}]", &state),
            "Hi Ada, 3 a,b [] []"
        );
    }

    #[test]
    fn resolve_action_resolves_params_and_confirm() {
        let state = json!({"item": {"id": 7, "title": "Milk"}});
        let resolved = resolve_action(
            &binding(json!({
                "action": "delete",
                "params": {"id": {"$state": "/item/id"}, "gone": {"$state": "/nope"}, "raw": 1},
                "confirm": {"title": "Delete ${/item/title}?", "message": "Really delete #${/item/id}?", "variant": "danger"}
            })),
            &state,
        );
        assert_eq!(Value::Object(resolved.params), json!({"id": 7, "raw": 1}));
        let confirm = resolved.confirm.unwrap();
        assert_eq!(confirm.title, "Delete Milk?");
        assert_eq!(confirm.message, "Really delete #7?");
        assert_eq!(confirm.variant, Some(ConfirmVariant::Danger));
    }

    #[test]
    fn continuation_shapes_deserialize() {
        let b = binding(json!({
            "action": "save",
            "onSuccess": {"navigate": "/done"},
            "onError": {"set": {"/error": "$error.message"}}
        }));
        assert_eq!(b.on_success, Some(ActionContinuation::Navigate { navigate: "/done".into() }));
        assert!(matches!(b.on_error, Some(ActionContinuation::Set { .. })));
        let chained = binding(json!({"action": "a", "onSuccess": {"action": "b"}}));
        assert_eq!(chained.on_success, Some(ActionContinuation::Action { action: "b".into() }));
    }

    #[test]
    fn set_state_builtin() {
        let mut dispatcher = ActionDispatcher::new(json!({}));
        let b = binding(json!({"action": "setState", "params": {"statePath": "/form/name", "value": "x"}}));
        block_on(dispatcher.execute(&b)).unwrap();
        assert_eq!(dispatcher.store(), &json!({"form": {"name": "x"}}));
    }

    #[test]
    fn push_state_with_generated_id_and_clear() {
        let mut dispatcher = ActionDispatcher::new(json!({"draft": "milk", "todos": []}));
        let b = binding(json!({
            "action": "pushState",
            "params": {
                "statePath": "/todos",
                "value": {"id": "$id", "title": {"$state": "/draft"}},
                "clearStatePath": "/draft"
            }
        }));
        block_on(dispatcher.execute(&b)).unwrap();
        let state = dispatcher.into_store();
        assert_eq!(state["draft"], json!(""));
        assert_eq!(state["todos"][0]["title"], json!("milk"));
        let id = state["todos"][0]["id"].as_str().unwrap();
        assert!(id.ends_with("-1"), "{id}");
    }

    #[test]
    fn push_state_onto_non_array_is_rejected() {
        let mut dispatcher = ActionDispatcher::new(json!({"todos": {"a": 1}}));
        let b = binding(json!({"action": "pushState", "params": {"statePath": "/todos", "value": 1}}));
        let err = block_on(dispatcher.execute(&b)).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { .. }));
    }

    #[test]
    fn remove_state_filters_by_index() {
        let mut dispatcher = ActionDispatcher::new(json!({"todos": ["a", "b", "c"]}));
        let b = binding(json!({"action": "removeState", "params": {"statePath": "/todos", "index": 1}}));
        block_on(dispatcher.execute(&b)).unwrap();
        assert_eq!(dispatcher.store()["todos"], json!(["a", "c"]));
    }

    #[test]
    fn push_and_pop_screens() {
        let mut dispatcher = ActionDispatcher::new(json!({}));
        block_on(dispatcher.execute(&binding(json!({"action": "push", "params": {"screen": "settings"}})))).unwrap();
        assert_eq!(dispatcher.store(), &json!({"navStack": [""], "currentScreen": "settings"}));
        block_on(dispatcher.execute(&binding(json!({"action": "push", "params": {"screen": "about"}})))).unwrap();
        assert_eq!(dispatcher.store()["navStack"], json!(["", "settings"]));
        block_on(dispatcher.execute(&ActionBinding::new("pop"))).unwrap();
        assert_eq!(dispatcher.store()["currentScreen"], json!("settings"));
        block_on(dispatcher.execute(&ActionBinding::new("pop"))).unwrap();
        assert_eq!(dispatcher.store(), &json!({"navStack": []}));
        block_on(dispatcher.execute(&ActionBinding::new("pop"))).unwrap();
    }

    #[test]
    fn unknown_action_is_a_noop() {
        let mut dispatcher = ActionDispatcher::new(json!({"a": 1}));
        block_on(dispatcher.execute(&ActionBinding::new("launchRockets"))).unwrap();
        assert_eq!(dispatcher.store(), &json!({"a": 1}));
    }

    #[test]
    fn id_generator_resolves_nested_sentinels() {
        let mut ids = IdGenerator::new();
        let out = ids.resolve_ids(&json!({"a": {"$id": true}, "b": ["$id", "x"]}));
        assert!(out["a"].as_str().unwrap().ends_with("-1"));
        assert!(out["b"][0].as_str().unwrap().ends_with("-2"));
        assert_eq!(out["b"][1], json!("x"));
    }
}
