use json_render::{FenceOptions, MixedStreamParser, Patch, SpecStreamTransform, StreamPart};
use proptest::prelude::*;
use serde_json::json;

const FENCED: &str = "prose1\n```spec\n{\"op\":\"add\",\"path\":\"/root\",\"value\":\"x\"}\n```\nprose2\n";

fn parse_lines(input: &str, chunk: usize, options: FenceOptions) -> (Vec<Patch>, Vec<String>) {
    let mut patches = Vec::new();
    let mut text = Vec::new();
    {
        let mut parser =
            MixedStreamParser::with_fence(|p| patches.push(p), |t: &str| text.push(t.to_string()), options);
        for piece in input.as_bytes().chunks(chunk) {
            parser.push_bytes(piece);
        }
        parser.flush();
    }
    (patches, text)
}

fn transform_deltas(input: &str, chunk: usize) -> (Vec<Patch>, String) {
    let mut transform = SpecStreamTransform::new();
    let mut parts = transform.transform(StreamPart::TextStart { id: "m".into() });
    let chars: Vec<char> = input.chars().collect();
    for piece in chars.chunks(chunk) {
        parts.extend(transform.transform(StreamPart::TextDelta {
            id: "m".into(),
            delta: piece.iter().collect(),
        }));
    }
    parts.extend(transform.transform(StreamPart::TextEnd { id: "m".into() }));

    let mut patches = Vec::new();
    let mut prose = String::new();
    for part in parts {
        match part {
            StreamPart::Patch(patch) => patches.push(patch),
            StreamPart::TextDelta { delta, .. } => prose.push_str(&delta),
            _ => {}
        }
    }
    (patches, prose)
}

#[test]
fn fence_scoping() {
    let (patches, text) = parse_lines(FENCED, FENCED.len(), FenceOptions::default());
    assert_eq!(patches, vec![Patch::add("/root", json!("x"))]);
    assert_eq!(text, vec!["prose1", "prose2"]);
}

#[test]
fn transform_agrees_with_line_parser_on_fenced_reply() {
    let (patches, prose) = transform_deltas(FENCED, 5);
    assert_eq!(patches, vec![Patch::add("/root", json!("x"))]);
    assert_eq!(prose, "prose1\nprose2\n");
}

#[test]
fn custom_fence_markers() {
    let options = FenceOptions {
        open: "<patches>".into(),
        close: "</patches>".into(),
        heuristic: false,
    };
    let input = "hi\n<patches>\n{\"op\":\"remove\",\"path\":\"/a\"}\n</patches>\n```spec\n";
    let (patches, text) = parse_lines(input, 4, options);
    assert_eq!(patches, vec![Patch::remove("/a")]);
    assert_eq!(text, vec!["hi", "```spec"]);
}

#[test]
fn unterminated_fence_keeps_collecting() {
    let mut patches = Vec::new();
    let mut parser = MixedStreamParser::new(|p| patches.push(p), |_: &str| {});
    parser.push("```spec\n{\"op\":\"add\",\"path\":\"/a\",\"value\":1}\n");
    assert!(parser.in_fence());
    parser.push("{\"op\":\"add\",\"path\":\"/b\",\"value\":2}");
    parser.flush();
    drop(parser);
    assert_eq!(patches.len(), 2);
}

#[test]
fn indented_patch_and_fence_lines_agree() {
    let indented = "Here:\n  {\"op\":\"add\",\"path\":\"/root\",\"value\":\"x\"}\n";
    let fenced = "Here:\n  ```spec\n\t{\"op\":\"remove\",\"path\":\"/a\"}\n  ```\nbye\n";
    for chunk in [1, 3, 64] {
        let (line_patches, text) = parse_lines(indented, chunk, FenceOptions::default());
        let (patches, prose) = transform_deltas(indented, chunk);
        assert_eq!(patches, vec![Patch::add("/root", json!("x"))]);
        assert_eq!(patches, line_patches);
        assert_eq!(text, vec!["Here:"]);
        assert_eq!(prose, "Here:\n");

        let (line_patches, text) = parse_lines(fenced, chunk, FenceOptions::default());
        let (patches, prose) = transform_deltas(fenced, chunk);
        assert_eq!(patches, vec![Patch::remove("/a")]);
        assert_eq!(patches, line_patches);
        assert_eq!(text, vec!["Here:", "bye"]);
        assert_eq!(prose, "Here:\nbye\n");
    }
}

proptest! {
    #[test]
    fn chunking_never_changes_the_line_parser(chunk in 1usize..32) {
        let input = format!("Intro ✨\n{FENCED}{{\"op\":\"add\",\"path\":\"/n\",\"value\":1}}\ntail");
        let whole = parse_lines(&input, input.len(), FenceOptions::default());
        prop_assert_eq!(parse_lines(&input, chunk, FenceOptions::default()), whole);
    }

    #[test]
    fn chunking_never_changes_the_transform(chunk in 1usize..32) {
        let input = format!("Intro ✨\n{FENCED}{{\"op\":\"add\",\"path\":\"/n\",\"value\":1}}\ntail");
        let (patches, prose) = transform_deltas(&input, chunk);
        prop_assert_eq!(patches.len(), 2);
        prop_assert_eq!(prose, "Intro ✨\nprose1\nprose2\ntail");
    }
}
