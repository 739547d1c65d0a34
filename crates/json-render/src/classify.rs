//! Recognises JSON Patch lines inside a text stream.

use json_render_util::is_truthy;
use serde_json::Value;

use crate::patch::Patch;

/// Classifies one line of stream output.
///
/// Returns the patch when the trimmed line is a JSON object with a truthy
/// `op`, a `path` member and a known operation. Anything else (prose, partial
/// JSON, unknown operations) yields `None`; this never fails.
///
/// ```
/// use json_render::classify::parse_spec_stream_line;
/// use json_render::Patch;
/// use serde_json::json;
///
/// let line = r#"  {"op":"add","path":"/root","value":"main"}  "#;
/// assert_eq!(parse_spec_stream_line(line), Some(Patch::add("/root", json!("main"))));
/// assert_eq!(parse_spec_stream_line("Here is your dashboard:"), None);
/// assert_eq!(parse_spec_stream_line(r#"{"op":"add","path":"/ro"#), None);
/// ```
pub fn parse_spec_stream_line(line: &str) -> Option<Patch> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    let map = value.as_object()?;
    if !is_truthy(map.get("op")) || !map.contains_key("path") {
        return None;
    }
    match Patch::from_value(&value) {
        Ok(patch) => Some(patch),
        Err(err) => {
            tracing::debug!(%err, line = trimmed, "ignoring unusable patch line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_patches() {
        for line in [
            "",
            "   ",
            "text {\"op\":\"add\"}",
            "[1, 2]",
            "{}",
            r#"{"op":"","path":"/a"}"#,
            r#"{"op":"add"}"#,
            r#"{"op":"frobnicate","path":"/a"}"#,
            r#"{"op":"add","path":"/a""#,
        ] {
            assert_eq!(parse_spec_stream_line(line), None, "{line:?}");
        }
    }

    #[test]
    fn accepts_root_and_relative_paths() {
        assert_eq!(
            parse_spec_stream_line(r#"{"op":"replace","path":"","value":{}}"#),
            Some(Patch::replace("", json!({})))
        );
        assert_eq!(
            parse_spec_stream_line(r#"{"op":"add","path":"state/x","value":1}"#),
            Some(Patch::add("state/x", json!(1)))
        );
    }
}
