//! Field validation checks attached to input elements.
//!
//! An element's `validation` field holds a [`ValidationConfig`]: a list of
//! named checks with messages, plus an optional `enabled` condition. Check
//! args may be expressions and resolve against state before the check runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use json_render_expression::{resolve_prop_value, ResolutionContext, VisibilityCondition};
use json_render_util::{js_string, optional_equal};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A custom check: `(value, resolved args) -> valid`.
pub type CheckFn = Arc<dyn Fn(Option<&Value>, &Map<String, Value>) -> bool>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateOn {
    Change,
    Blur,
    Submit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default)]
    pub checks: Vec<ValidationCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_on: Option<ValidateOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<VisibilityCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    #[serde(rename = "type")]
    pub check_type: String,
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Messages of the failed checks, in check order.
    pub errors: Vec<String>,
    pub checks: Vec<CheckResult>,
}

/// Inputs to a validation run.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The field value; `None` when the bound path is unset.
    pub value: Option<&'a Value>,
    pub state: &'a Value,
    pub custom: Option<&'a HashMap<String, CheckFn>>,
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("value", &self.value)
            .field("state", &self.state)
            .field("custom", &self.custom.map(|c| c.keys().collect::<Vec<_>>()))
            .finish()
    }
}

impl<'a> ValidationContext<'a> {
    pub fn new(value: Option<&'a Value>, state: &'a Value) -> Self {
        ValidationContext {
            value,
            state,
            custom: None,
        }
    }

    pub fn with_custom(mut self, custom: &'a HashMap<String, CheckFn>) -> Self {
        self.custom = Some(custom);
        self
    }
}

fn number_label(n: f64) -> String {
    js_string(Some(&Value::from(n)))
}

impl ValidationCheck {
    pub fn new(check_type: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationCheck {
            check_type: check_type.into(),
            args: Map::new(),
            message: message.into(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn required() -> Self {
        Self::new("required", "This field is required")
    }

    pub fn email() -> Self {
        Self::new("email", "Invalid email address")
    }

    pub fn min_length(min: usize) -> Self {
        Self::new("minLength", format!("Must be at least {min} characters")).with_arg("min", json!(min))
    }

    pub fn max_length(max: usize) -> Self {
        Self::new("maxLength", format!("Must be at most {max} characters")).with_arg("max", json!(max))
    }

    /// Matches with the `regex` crate. Lookaround and backreferences are not
    /// supported there, so a pattern using them fails the check.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::new("pattern", "Invalid format").with_arg("pattern", Value::String(pattern.into()))
    }

    pub fn min(min: f64) -> Self {
        Self::new("min", format!("Must be at least {}", number_label(min))).with_arg("min", Value::from(min))
    }

    pub fn max(max: f64) -> Self {
        Self::new("max", format!("Must be at most {}", number_label(max))).with_arg("max", Value::from(max))
    }

    pub fn numeric() -> Self {
        Self::new("numeric", "Must be a number")
    }

    pub fn url() -> Self {
        Self::new("url", "Invalid URL")
    }

    /// Passes when the value equals the state value at `other_path`.
    pub fn matches(other_path: impl Into<String>) -> Self {
        Self::new("matches", "Fields must match").with_arg("other", json!({"$state": other_path.into()}))
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// Accepts anything with a float prefix, the way `parseFloat` does.
fn numeric_prefix_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*[+-]?(Infinity|\d+\.?\d*([eE][+-]?\d+)?|\.\d+)").ok())
        .as_ref()
}

const PATTERN_CACHE_LIMIT: usize = 256;

/// Compiled `pattern` check regexes keyed by source. A pattern that does not
/// compile is cached as `None`.
fn pattern_cache() -> &'static Mutex<HashMap<String, Option<Regex>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();
    CACHE.get_or_init(Mutex::default)
}

fn cached_pattern(pattern: &str) -> Option<Regex> {
    let Ok(mut cache) = pattern_cache().lock() else {
        return Regex::new(pattern).ok();
    };
    if let Some(compiled) = cache.get(pattern) {
        return compiled.clone();
    }
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    let compiled = Regex::new(pattern).ok();
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

fn utf16_len(s: &str) -> f64 {
    s.encode_utf16().count() as f64
}

fn number_arg(args: &Map<String, Value>, key: &str) -> Option<f64> {
    args.get(key).and_then(Value::as_f64)
}

/// Runs a built-in check. `None` means no built-in has that name.
fn run_builtin(check_type: &str, value: Option<&Value>, args: &Map<String, Value>) -> Option<bool> {
    let text = value.and_then(Value::as_str);
    let number = value.filter(|v| v.is_number()).and_then(Value::as_f64);
    let valid = match check_type {
        "required" => match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        },
        "email" => text.is_some_and(|s| email_pattern().is_some_and(|re| re.is_match(s))),
        "minLength" => matches!((text, number_arg(args, "min")), (Some(s), Some(min)) if utf16_len(s) >= min),
        "maxLength" => matches!((text, number_arg(args, "max")), (Some(s), Some(max)) if utf16_len(s) <= max),
        "pattern" => match (text, args.get("pattern").and_then(Value::as_str)) {
            (Some(s), Some(pattern)) => cached_pattern(pattern).is_some_and(|re| re.is_match(s)),
            _ => false,
        },
        "min" => matches!((number, number_arg(args, "min")), (Some(n), Some(min)) if n >= min),
        "max" => matches!((number, number_arg(args, "max")), (Some(n), Some(max)) if n <= max),
        "numeric" => match value {
            Some(Value::Number(_)) => true,
            Some(Value::String(s)) => numeric_prefix_pattern().is_some_and(|re| re.is_match(s)),
            _ => false,
        },
        "url" => text.is_some_and(|s| url::Url::parse(s).is_ok()),
        "matches" => optional_equal(value, args.get("other")),
        _ => return None,
    };
    Some(valid)
}

/// Runs one check. Unknown check types pass with a warning.
pub fn run_validation_check(check: &ValidationCheck, ctx: &ValidationContext<'_>) -> CheckResult {
    let resolution = ResolutionContext::new(ctx.state);
    let args: Map<String, Value> = check
        .args
        .iter()
        .filter_map(|(key, value)| resolve_prop_value(value, &resolution).map(|v| (key.clone(), v)))
        .collect();

    let valid = match run_builtin(&check.check_type, ctx.value, &args) {
        Some(valid) => valid,
        None => match ctx.custom.and_then(|custom| custom.get(&check.check_type)) {
            Some(custom) => custom(ctx.value, &args),
            None => {
                tracing::warn!(check = %check.check_type, "unknown validation check");
                true
            }
        },
    };
    CheckResult {
        check_type: check.check_type.clone(),
        valid,
        message: check.message.clone(),
    }
}

/// Runs every check of `config`. When `enabled` evaluates false nothing
/// runs and the result is valid.
pub fn run_validation(config: &ValidationConfig, ctx: &ValidationContext<'_>) -> ValidationResult {
    if let Some(enabled) = &config.enabled {
        if !enabled.evaluate(&ResolutionContext::new(ctx.state)) {
            return ValidationResult {
                valid: true,
                ..ValidationResult::default()
            };
        }
    }
    let checks: Vec<CheckResult> = config
        .checks
        .iter()
        .map(|check| run_validation_check(check, ctx))
        .collect();
    let errors: Vec<String> = checks
        .iter()
        .filter(|c| !c.valid)
        .map(|c| c.message.clone())
        .collect();
    ValidationResult {
        valid: errors.is_empty(),
        errors,
        checks,
    }
}
