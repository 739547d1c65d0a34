//! Splits an incoming chunk stream into complete lines.
//!
//! Chunks may end anywhere, including inside a multi-byte UTF-8 sequence.
//! Bytes of an incomplete trailing sequence are held back until the next
//! chunk; bytes that can never form a valid sequence decode to U+FFFD.

use std::mem;

#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    pending: String,
    partial_char: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text and returns every line completed by it, without the
    /// trailing `\n`.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        self.drain_lines()
    }

    /// Byte-level [`push`](Self::push).
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut bytes = mem::take(&mut self.partial_char);
        bytes.extend_from_slice(chunk);
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.pending.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    self.pending.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(bad) => {
                            self.pending.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[bad..];
                        }
                        None => {
                            self.partial_char = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        self.drain_lines()
    }

    /// Takes the unterminated remainder, if any, leaving the buffer empty.
    pub fn take_rest(&mut self) -> Option<String> {
        if !self.partial_char.is_empty() {
            let bytes = mem::take(&mut self.partial_char);
            self.pending.push_str(&String::from_utf8_lossy(&bytes));
        }
        if self.pending.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.pending))
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.partial_char.clear();
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = mem::replace(&mut self.pending, rest);
        complete[..last_newline].split('\n').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_trailing_fragment() {
        let mut buf = LineBuffer::new();
        assert!(buf.push("ab").is_empty());
        assert_eq!(buf.push("c\nde\n\nf"), vec!["abc", "de", ""]);
        assert_eq!(buf.take_rest().as_deref(), Some("f"));
        assert_eq!(buf.take_rest(), None);
    }

    #[test]
    fn joins_split_utf8_sequences() {
        let text = "héllo → wörld\n";
        let bytes = text.as_bytes();
        let mut buf = LineBuffer::new();
        let mut lines = Vec::new();
        for byte in bytes {
            lines.extend(buf.push_bytes(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["héllo → wörld"]);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push_bytes(b"a\xffb\n"), vec!["a\u{fffd}b"]);
    }

    #[test]
    fn truncated_sequence_flushes_lossy() {
        let mut buf = LineBuffer::new();
        assert!(buf.push_bytes(&"é".as_bytes()[..1]).is_empty());
        assert_eq!(buf.take_rest().as_deref(), Some("\u{fffd}"));
    }
}
