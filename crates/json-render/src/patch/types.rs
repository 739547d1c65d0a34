use json_render_pointer::PointerError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("test failed: value at {path:?} does not match")]
    TestFailed { path: String },
    #[error("source {from:?} does not exist")]
    SourceNotFound { from: String },
    #[error("cannot move {from:?} into its own descendant {path:?}")]
    MoveIntoSelf { from: String, path: String },
    #[error("invalid patch operation: {0}")]
    InvalidOp(String),
    #[error(transparent)]
    Pointer(#[from] PointerError),
}

/// A single JSON Patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    /// `value: None` asserts the path does not exist.
    Test { path: String, value: Option<Value> },
}

impl Patch {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Patch::Add { path: path.into(), value }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Patch::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Patch::Replace { path: path.into(), value }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Patch::Move { from: from.into(), path: path.into() }
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Patch::Copy { from: from.into(), path: path.into() }
    }

    pub fn test(path: impl Into<String>, value: Value) -> Self {
        Patch::Test { path: path.into(), value: Some(value) }
    }

    pub fn test_absent(path: impl Into<String>) -> Self {
        Patch::Test { path: path.into(), value: None }
    }

    /// The RFC 6902 operation name.
    pub fn op(&self) -> &'static str {
        match self {
            Patch::Add { .. } => "add",
            Patch::Remove { .. } => "remove",
            Patch::Replace { .. } => "replace",
            Patch::Move { .. } => "move",
            Patch::Copy { .. } => "copy",
            Patch::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Patch::Add { path, .. }
            | Patch::Remove { path }
            | Patch::Replace { path, .. }
            | Patch::Move { path, .. }
            | Patch::Copy { path, .. }
            | Patch::Test { path, .. } => path,
        }
    }

    pub fn from_path(&self) -> Option<&str> {
        match self {
            Patch::Move { from, .. } | Patch::Copy { from, .. } => Some(from),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Patch::Add { value, .. } | Patch::Replace { value, .. } => Some(value),
            Patch::Test { value, .. } => value.as_ref(),
            _ => None,
        }
    }
}
