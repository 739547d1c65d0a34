//! Streaming compiler and runtime for json-render UI specs.
//!
//! A generator emits a UI as JSON Patch (RFC 6902) operations, one per line.
//! This crate turns that stream into a spec document as it arrives, checks
//! the result for structural mistakes, resolves it against state into a
//! render tree and executes the action bindings users trigger.
//!
//! - [`compiler`]: line-buffered incremental compilation with snapshots.
//! - [`mixed`] and [`transform`]: pull patches out of chat text, by line or
//!   by token delta.
//! - [`validator`]: structural diagnostics and auto-fix.
//! - [`tree`]: visibility, props, bindings and `repeat` expansion.
//! - [`actions`] and [`checks`]: action execution and field validation.
//!
//! # Example
//!
//! ```
//! use json_render::{resolve_tree, validate_spec, Spec, SpecStreamCompiler, ValidateOptions};
//! use serde_json::json;
//!
//! let stream = concat!(
//!     "{\"op\":\"add\",\"path\":\"/root\",\"value\":\"card\"}\n",
//!     "{\"op\":\"add\",\"path\":\"/elements/card\",\"value\":{\"type\":\"Card\",\"props\":{\"title\":{\"$state\":\"/user\"}},\"children\":[]}}\n",
//! );
//!
//! let mut compiler = SpecStreamCompiler::default();
//! for chunk in stream.as_bytes().chunks(7) {
//!     compiler.push_bytes(chunk).unwrap();
//! }
//! let spec = Spec::from_value(&compiler.result().unwrap()).unwrap();
//! assert!(validate_spec(&spec, ValidateOptions::default()).valid);
//!
//! let tree = resolve_tree(&spec, &json!({"user": "Ada"})).unwrap();
//! assert_eq!(tree.props["title"], json!("Ada"));
//! ```

pub mod actions;
pub mod checks;
pub mod classify;
pub mod cli;
pub mod compiler;
pub mod line_buffer;
pub mod mixed;
pub mod patch;
pub mod spec;
pub mod transform;
pub mod tree;
pub mod validator;

pub use actions::{
    action_handler, execute_action, resolve_action, ActionBinding, ActionBindings, ActionConfirm,
    ActionContinuation, ActionDispatcher, ActionError, ActionHandler, ActionHost, PendingConfirmation,
    ResolvedAction, StateStore,
};
pub use checks::{run_validation, ValidationCheck, ValidationConfig, ValidationContext, ValidationResult};
pub use classify::parse_spec_stream_line;
pub use compiler::{
    compile_spec_stream, CompileError, CompilerOptions, PatchErrorPolicy, SpecStreamCompiler, StreamUpdate,
};
pub use mixed::{FenceOptions, MixedStreamParser};
pub use patch::{apply_patch, apply_patches, Patch, PatchError};
pub use spec::{nested_to_flat, Element, RepeatDirective, Spec, SpecError};
pub use transform::{SpecStreamTransform, StreamPart};
pub use tree::{resolve_tree, ResolvedElement};
pub use validator::{
    auto_fix_spec, format_spec_issues, validate_spec, validate_spec_value, IssueCode, Severity, SpecIssue,
    SpecValidation, ValidateOptions,
};

pub use json_render_expression as expression;
pub use json_render_pointer as pointer;
