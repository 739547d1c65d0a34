//! Token-level variant of the mixed parser for chat-style part streams.
//!
//! Text arrives as small deltas that rarely align with lines. Prose passes
//! through with minimal latency; only lines that might be patches (those
//! whose first non-blank character is `{` or a backtick, and every line
//! inside a spec fence) are held back until their newline arrives. Leading
//! spaces and tabs are held until that first character decides.

use serde_json::Value;

use crate::mixed::{FenceOptions, FenceState, LineKind};
use crate::patch::Patch;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    TextStart { id: String },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },
    /// A patch extracted from the text.
    Patch(Patch),
    /// Any other part (tool calls, metadata); passed through untouched.
    Other(Value),
}

/// Collects output for one input part, merging adjacent prose.
struct Output<'a> {
    id: &'a str,
    parts: Vec<StreamPart>,
    prose: String,
}

impl<'a> Output<'a> {
    fn new(id: &'a str) -> Self {
        Output {
            id,
            parts: Vec::new(),
            prose: String::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.prose.push_str(text);
    }

    fn part(&mut self, part: StreamPart) {
        self.flush_prose();
        self.parts.push(part);
    }

    fn flush_prose(&mut self) {
        if !self.prose.is_empty() {
            let delta = std::mem::take(&mut self.prose);
            self.parts.push(StreamPart::TextDelta {
                id: self.id.to_string(),
                delta,
            });
        }
    }

    fn finish(mut self) -> Vec<StreamPart> {
        self.flush_prose();
        self.parts
    }
}

/// Rewrites a part stream so that patch lines become [`StreamPart::Patch`].
///
/// ```
/// use json_render::transform::{SpecStreamTransform, StreamPart};
///
/// let mut transform = SpecStreamTransform::new();
/// let delta = |d: &str| StreamPart::TextDelta { id: "t".into(), delta: d.into() };
/// let mut out = transform.transform(delta("Hi!\n{\"op\":\"add\","));
/// out.extend(transform.transform(delta("\"path\":\"/root\",\"value\":\"a\"}\n")));
/// assert_eq!(out.len(), 2);
/// assert!(matches!(&out[0], StreamPart::TextDelta { delta, .. } if delta == "Hi!\n"));
/// assert!(matches!(&out[1], StreamPart::Patch(_)));
/// ```
#[derive(Debug)]
pub struct SpecStreamTransform {
    fence: FenceState,
    line: String,
    buffering: bool,
    at_line_start: bool,
    text_id: String,
}

impl Default for SpecStreamTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecStreamTransform {
    pub fn new() -> Self {
        Self::with_fence(FenceOptions::default())
    }

    pub fn with_fence(options: FenceOptions) -> Self {
        SpecStreamTransform {
            fence: FenceState::new(options),
            line: String::new(),
            buffering: false,
            at_line_start: true,
            text_id: String::new(),
        }
    }

    pub fn transform(&mut self, part: StreamPart) -> Vec<StreamPart> {
        match part {
            StreamPart::TextStart { id } => {
                self.text_id = id.clone();
                self.at_line_start = true;
                vec![StreamPart::TextStart { id }]
            }
            StreamPart::TextDelta { id, delta } => {
                self.text_id = id;
                self.process_delta(&delta)
            }
            StreamPart::TextEnd { id } => {
                let mut parts = self.flush();
                self.at_line_start = true;
                parts.push(StreamPart::TextEnd { id });
                parts
            }
            other => vec![other],
        }
    }

    /// Emits whatever partial line is still held back.
    pub fn flush(&mut self) -> Vec<StreamPart> {
        let id = self.text_id.clone();
        let mut out = Output::new(&id);
        self.flush_line(&mut out);
        out.finish()
    }

    fn process_delta(&mut self, delta: &str) -> Vec<StreamPart> {
        let id = self.text_id.clone();
        let mut out = Output::new(&id);
        let mut scratch = [0u8; 4];
        for ch in delta.chars() {
            if ch == '\n' {
                let line = std::mem::take(&mut self.line);
                if self.buffering {
                    self.buffering = false;
                    self.complete_line(&line, &mut out);
                } else if !self.fence.inside {
                    out.text(&line);
                    out.text("\n");
                }
                self.at_line_start = true;
                continue;
            }
            if self.buffering {
                self.line.push(ch);
                continue;
            }
            if !self.at_line_start {
                out.text(ch.encode_utf8(&mut scratch));
                continue;
            }
            // `line` holds the indentation seen so far.
            if ch == ' ' || ch == '\t' {
                self.line.push(ch);
                continue;
            }
            if self.fence.inside || ch == '{' || ch == '`' {
                self.buffering = true;
                self.line.push(ch);
            } else {
                out.text(&std::mem::take(&mut self.line));
                out.text(ch.encode_utf8(&mut scratch));
            }
            self.at_line_start = false;
        }
        out.finish()
    }

    fn complete_line(&mut self, line: &str, out: &mut Output<'_>) {
        match self.fence.classify(line) {
            LineKind::Patch(patch) => out.part(StreamPart::Patch(patch)),
            LineKind::Blank if !self.fence.inside => out.text("\n"),
            LineKind::Text => {
                out.text(line);
                out.text("\n");
            }
            LineKind::Fence | LineKind::Dropped | LineKind::Blank => {}
        }
    }

    fn flush_line(&mut self, out: &mut Output<'_>) {
        if self.line.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.line);
        if !std::mem::take(&mut self.buffering) {
            if !self.fence.inside {
                out.text(&line);
            }
            return;
        }
        // An opening marker with no close leaves the fence open.
        match self.fence.classify(&line) {
            LineKind::Patch(patch) => out.part(StreamPart::Patch(patch)),
            LineKind::Text => out.text(&line),
            LineKind::Fence | LineKind::Dropped | LineKind::Blank => {}
        }
    }
}
