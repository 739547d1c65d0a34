//! Separates conversational prose from patch lines in a mixed stream.

use crate::classify::parse_spec_stream_line;
use crate::line_buffer::LineBuffer;
use crate::patch::Patch;

pub const SPEC_FENCE_OPEN: &str = "```spec";
pub const SPEC_FENCE_CLOSE: &str = "```";

/// How patch lines are delimited from prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOptions {
    /// A line whose trimmed text starts with this opens a patch block.
    pub open: String,
    /// A line whose trimmed text equals this closes it.
    pub close: String,
    /// Also accept patch lines outside a fenced block.
    pub heuristic: bool,
}

impl Default for FenceOptions {
    fn default() -> Self {
        FenceOptions {
            open: SPEC_FENCE_OPEN.to_string(),
            close: SPEC_FENCE_CLOSE.to_string(),
            heuristic: true,
        }
    }
}

/// What a complete line turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineKind {
    Fence,
    Patch(Patch),
    Dropped,
    Blank,
    Text,
}

/// Fence tracking shared by the line parser and the token transform.
#[derive(Debug, Clone, Default)]
pub(crate) struct FenceState {
    pub(crate) options: FenceOptions,
    pub(crate) inside: bool,
}

impl FenceState {
    pub(crate) fn new(options: FenceOptions) -> Self {
        FenceState { options, inside: false }
    }

    pub(crate) fn classify(&mut self, line: &str) -> LineKind {
        let trimmed = line.trim();
        if !self.inside && trimmed.starts_with(self.options.open.as_str()) {
            self.inside = true;
            return LineKind::Fence;
        }
        if self.inside && trimmed == self.options.close {
            self.inside = false;
            return LineKind::Fence;
        }
        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if self.inside {
            return parse_spec_stream_line(trimmed).map_or(LineKind::Dropped, LineKind::Patch);
        }
        if self.options.heuristic {
            if let Some(patch) = parse_spec_stream_line(trimmed) {
                return LineKind::Patch(patch);
            }
        }
        LineKind::Text
    }
}

/// Line-oriented splitter for streams that mix chat text with patches.
///
/// Inside a `` ```spec `` fence every parseable line is a patch and anything
/// else is dropped. Outside it, patch-shaped lines still count as patches
/// unless [`FenceOptions::heuristic`] is off; other lines go to `on_text`
/// untrimmed. Blank lines are ignored.
///
/// ```
/// use json_render::MixedStreamParser;
///
/// let mut patches = Vec::new();
/// let mut text = Vec::new();
/// let mut parser = MixedStreamParser::new(|p| patches.push(p), |t: &str| text.push(t.to_string()));
/// parser.push("Here you go:\n```spec\n{\"op\":\"add\",\"path\":\"/root\",\"value\":\"a\"}\n");
/// parser.push("not json\n```\nEnjoy!");
/// parser.flush();
/// drop(parser);
/// assert_eq!(patches.len(), 1);
/// assert_eq!(text, vec!["Here you go:", "Enjoy!"]);
/// ```
pub struct MixedStreamParser<P, T>
where
    P: FnMut(Patch),
    T: FnMut(&str),
{
    on_patch: P,
    on_text: T,
    lines: LineBuffer,
    fence: FenceState,
}

impl<P, T> MixedStreamParser<P, T>
where
    P: FnMut(Patch),
    T: FnMut(&str),
{
    pub fn new(on_patch: P, on_text: T) -> Self {
        Self::with_fence(on_patch, on_text, FenceOptions::default())
    }

    pub fn with_fence(on_patch: P, on_text: T, options: FenceOptions) -> Self {
        MixedStreamParser {
            on_patch,
            on_text,
            lines: LineBuffer::new(),
            fence: FenceState::new(options),
        }
    }

    pub fn push(&mut self, chunk: &str) {
        for line in self.lines.push(chunk) {
            self.process_line(&line);
        }
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) {
        for line in self.lines.push_bytes(chunk) {
            self.process_line(&line);
        }
    }

    /// Processes the unterminated remainder as a final line.
    pub fn flush(&mut self) {
        if let Some(rest) = self.lines.take_rest() {
            self.process_line(&rest);
        }
    }

    pub fn in_fence(&self) -> bool {
        self.fence.inside
    }

    fn process_line(&mut self, line: &str) {
        match self.fence.classify(line) {
            LineKind::Patch(patch) => (self.on_patch)(patch),
            LineKind::Text => (self.on_text)(line),
            LineKind::Fence | LineKind::Dropped | LineKind::Blank => {}
        }
    }
}
