//! Incremental compilation of a JSONL patch stream into a spec document.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::classify::parse_spec_stream_line;
use crate::line_buffer::LineBuffer;
use crate::patch::{apply_patch, Patch, PatchError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("patch line {line:?} failed: {source}")]
    Patch {
        line: String,
        #[source]
        source: PatchError,
    },
    #[error("compilation was aborted by an earlier patch failure; reset the compiler to continue")]
    Aborted,
}

/// What to do when a well-formed patch line fails to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchErrorPolicy {
    /// Log a warning and keep going. The failed line has no effect.
    #[default]
    Skip,
    /// Fail the current call and refuse further input until `reset`.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Ignore a line whose trimmed text was already processed this session.
    pub dedupe_lines: bool,
    pub on_patch_error: PatchErrorPolicy,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            dedupe_lines: true,
            on_patch_error: PatchErrorPolicy::Skip,
        }
    }
}

/// Result of one [`SpecStreamCompiler::push`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamUpdate {
    /// The document after this chunk.
    pub spec: Arc<Value>,
    /// Patches applied by this chunk only.
    pub new_patches: Vec<Patch>,
}

/// A streaming compiler session.
///
/// Feed it chunks as they arrive; every complete line that classifies as a
/// patch is applied in order. Snapshots are shared `Arc`s: the working
/// document is cloned on write only while a caller still holds an earlier
/// snapshot, so a snapshot never changes after it is handed out.
///
/// ```
/// use json_render::SpecStreamCompiler;
/// use serde_json::json;
///
/// let mut compiler = SpecStreamCompiler::default();
/// compiler.push("{\"op\":\"add\",\"path\":\"/root\",\"val").unwrap();
/// let update = compiler.push("ue\":\"main\"}\n").unwrap();
/// assert_eq!(update.new_patches.len(), 1);
/// assert_eq!(*update.spec, json!({"root": "main"}));
/// ```
#[derive(Debug)]
pub struct SpecStreamCompiler {
    doc: Arc<Value>,
    lines: LineBuffer,
    seen: HashSet<String>,
    patches: Vec<Patch>,
    version: u64,
    options: CompilerOptions,
    aborted: bool,
}

impl Default for SpecStreamCompiler {
    fn default() -> Self {
        SpecStreamCompiler::new(Value::Object(Map::new()))
    }
}

impl SpecStreamCompiler {
    pub fn new(initial: Value) -> Self {
        SpecStreamCompiler::with_options(initial, CompilerOptions::default())
    }

    pub fn with_options(initial: Value, options: CompilerOptions) -> Self {
        SpecStreamCompiler {
            doc: Arc::new(initial),
            lines: LineBuffer::new(),
            seen: HashSet::new(),
            patches: Vec::new(),
            version: 0,
            options,
            aborted: false,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn push(&mut self, chunk: &str) -> Result<StreamUpdate, CompileError> {
        self.ensure_live()?;
        let lines = self.lines.push(chunk);
        self.process(lines)
    }

    /// Like [`push`](Self::push) for raw bytes. A UTF-8 sequence split across
    /// chunks is reassembled.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<StreamUpdate, CompileError> {
        self.ensure_live()?;
        let lines = self.lines.push_bytes(chunk);
        self.process(lines)
    }

    /// Treats any buffered remainder as a final line and returns the
    /// document. Safe to call repeatedly.
    pub fn result(&mut self) -> Result<Arc<Value>, CompileError> {
        self.ensure_live()?;
        if let Some(rest) = self.lines.take_rest() {
            self.process(vec![rest])?;
        }
        Ok(Arc::clone(&self.doc))
    }

    /// The current document without flushing the buffer. Available even
    /// after an abort.
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.doc)
    }

    /// Every patch applied since creation or the last reset.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Incremented by every call that applies at least one patch.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn reset(&mut self, initial: Value) {
        self.doc = Arc::new(initial);
        self.lines.clear();
        self.seen.clear();
        self.patches.clear();
        self.aborted = false;
    }

    fn ensure_live(&self) -> Result<(), CompileError> {
        if self.aborted {
            Err(CompileError::Aborted)
        } else {
            Ok(())
        }
    }

    fn process(&mut self, lines: Vec<String>) -> Result<StreamUpdate, CompileError> {
        let mut new_patches = Vec::new();
        let mut outcome = Ok(());
        for line in &lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.options.dedupe_lines && !self.seen.insert(trimmed.to_string()) {
                tracing::debug!(line = trimmed, "skipping duplicate line");
                continue;
            }
            let Some(patch) = parse_spec_stream_line(trimmed) else {
                continue;
            };
            match apply_patch(Arc::make_mut(&mut self.doc), &patch) {
                Ok(()) => new_patches.push(patch),
                Err(source) => match self.options.on_patch_error {
                    PatchErrorPolicy::Skip => {
                        tracing::warn!(error = %source, line = trimmed, "skipping patch that failed to apply");
                    }
                    PatchErrorPolicy::Abort => {
                        self.aborted = true;
                        outcome = Err(CompileError::Patch {
                            line: trimmed.to_string(),
                            source,
                        });
                        break;
                    }
                },
            }
        }
        if !new_patches.is_empty() {
            self.version += 1;
            self.patches.extend(new_patches.iter().cloned());
        }
        outcome.map(|()| StreamUpdate {
            spec: Arc::clone(&self.doc),
            new_patches,
        })
    }
}

/// Compiles a complete JSONL stream in one pass.
///
/// Unlike the streaming compiler, repeated lines are applied each time, and
/// the first patch failure is returned.
pub fn compile_spec_stream(stream: &str, initial: Value) -> Result<Value, PatchError> {
    let mut doc = initial;
    for patch in stream.split('\n').filter_map(parse_spec_stream_line) {
        apply_patch(&mut doc, &patch)?;
    }
    Ok(doc)
}
