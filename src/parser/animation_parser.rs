use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MARKER: &str = "file:";
const FENCE: &str = "```";

/// One source file recovered from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Relative path exactly as written after the `File:` marker, trimmed.
    pub path: String,
    /// Captured lines joined with `\n`.
    pub content: String,
}

impl FileRecord {
    pub fn new<P: Into<String>, C: Into<String>>(path: P, content: C) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn line_count(&self) -> usize {
        if self.content.is_empty() {
            0
        } else {
            self.content.split('\n').count()
        }
    }
}

/// Scan cursor for a single parse call.
struct ParseState<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    current_path: Option<String>,
    content_lines: Vec<&'a str>,
    finalized: HashSet<String>,
    files: Vec<FileRecord>,
}

impl<'a> ParseState<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            cursor: 0,
            current_path: None,
            content_lines: Vec::new(),
            finalized: HashSet::new(),
            files: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.cursor).copied()
    }

    fn start(&mut self, path: String) {
        self.current_path = Some(path);
        self.content_lines.clear();
    }

    fn capture(&mut self, line: &'a str) {
        self.content_lines.push(line);
    }

    fn finish(&mut self) {
        if let Some(path) = self.current_path.take() {
            let content = self.content_lines.join("\n");
            self.content_lines.clear();

            tracing::debug!(path = %path, bytes = content.len(), "Recovered animation file");

            self.finalized.insert(path.clone());
            self.files.push(FileRecord { path, content });
        }
    }
}

/// Returns the path named by a marker line, or `None` if `line` is not one.
///
/// Only the `file:` token is matched case-insensitively. The path is
/// whatever follows the first colon of the line, trimmed.
pub fn marker_path(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let is_marker = trimmed
        .get(..MARKER.len())
        .is_some_and(|token| token.eq_ignore_ascii_case(MARKER));

    if !is_marker {
        return None;
    }

    line.split_once(':').map(|(_, rest)| rest.trim())
}

fn is_opening_fence(line: &str) -> bool {
    line.trim().starts_with(FENCE)
}

fn is_closing_fence(line: &str) -> bool {
    line.trim() == FENCE
}

/// Parse a completion into the files it emits, in order of first appearance.
///
/// Each file starts at a `File: <path>` marker line. When the line right
/// after the marker opens a fence the body runs up to the closing fence,
/// which is consumed; otherwise the body starts on that line and runs up to
/// the next marker or end of input. A path seen earlier in the same call is
/// ignored along with whatever follows its marker. Text without markers
/// yields no files.
pub fn parse_animation_code(text: &str) -> Vec<FileRecord> {
    let mut state = ParseState::new(text);

    while let Some(line) = state.peek() {
        state.cursor += 1;

        let Some(path) = marker_path(line) else {
            continue;
        };

        if state.finalized.contains(path) {
            tracing::debug!(path = %path, "Skipping duplicate file marker");
            continue;
        }

        state.start(path.to_string());

        match state.peek() {
            Some(next) if is_opening_fence(next) => {
                state.cursor += 1;
                while let Some(body) = state.peek() {
                    state.cursor += 1;
                    if is_closing_fence(body) {
                        break;
                    }
                    state.capture(body);
                }
            }
            _ => {
                while let Some(body) = state.peek() {
                    if marker_path(body).is_some() {
                        break;
                    }
                    state.capture(body);
                    state.cursor += 1;
                }
            }
        }

        state.finish();
    }

    tracing::info!(files = state.files.len(), "Parsed animation code");
    state.files
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
File: pages/geometry-animation.vue
```vue
<template>
  <div class="container">
    <h1>Geometry Animation</h1>
  </div>
</template>
```

File: stores/animationStore.ts
```typescript
import { defineStore } from 'pinia';

export const useAnimationStore = defineStore('animation', {
  state: () => ({ currentStep: 0 }),
});
```

File: utils/geometry-helpers.ts
// Some utility functions
export const calculateDistance = (x1: number, y1: number, x2: number, y2: number) => {
  return Math.sqrt(Math.pow(x2 - x1, 2) + Math.pow(y2 - y1, 2));
};
"#;

    fn render_fenced(records: &[FileRecord]) -> String {
        records
            .iter()
            .map(|r| format!("File: {}\n```ts\n{}\n```", r.path, r.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_parse_mixed_completion() {
        let files = parse_animation_code(SAMPLE);

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].path, "pages/geometry-animation.vue");
        assert!(files[0].content.starts_with("<template>"));
        assert!(files[0].content.ends_with("</template>"));
        assert_eq!(files[1].path, "stores/animationStore.ts");
        assert!(files[1].content.contains("defineStore"));
        assert_eq!(files[2].path, "utils/geometry-helpers.ts");
        assert!(files[2].content.starts_with("// Some utility functions"));
        assert!(files[2].content.contains("calculateDistance"));
    }

    #[test]
    fn test_fenced_then_unfenced_scenario() {
        let text = "File: a.ts\n```ts\nconst x=1;\n```\nFile: b.ts\nplain body line";
        let files = parse_animation_code(text);

        assert_eq!(
            files,
            vec![
                FileRecord::new("a.ts", "const x=1;"),
                FileRecord::new("b.ts", "plain body line"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_animation_code("").is_empty());
    }

    #[test]
    fn test_no_file_markers() {
        let files = parse_animation_code("This is just some code without file markers\n```\nx\n```");
        assert!(files.is_empty());
    }

    #[test]
    fn test_fenced_round_trip() {
        let records = vec![
            FileRecord::new("components/Triangle.vue", "<template>\n  <svg />\n</template>"),
            FileRecord::new("stores/steps.ts", "export const steps = [];\n\n// trailing comment"),
            FileRecord::new("README.md", "  indented first line\nlast"),
        ];

        let parsed = parse_animation_code(&render_fenced(&records));
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_duplicate_path_keeps_first_occurrence() {
        let text = "File: a.ts\n```\nfirst\n```\nFile: a.ts\n```\nsecond\n```\nFile: b.ts\n```\nb\n```";
        let files = parse_animation_code(text);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0], FileRecord::new("a.ts", "first"));
        assert_eq!(files[1], FileRecord::new("b.ts", "b"));
    }

    #[test]
    fn test_duplicate_unfenced_body_is_dropped() {
        let text = "File: a.ts\nfirst\nFile: a.ts\nsecond\nmore\nFile: c.ts\nc";
        let files = parse_animation_code(text);

        assert_eq!(
            files,
            vec![FileRecord::new("a.ts", "first"), FileRecord::new("c.ts", "c")]
        );
    }

    #[test]
    fn test_fenced_and_unfenced_capture_the_same_content() {
        let body = "const a = 1;\n\nexport default a;";
        let fenced = parse_animation_code(&format!("File: x.ts\n```ts\n{}\n```", body));
        let unfenced = parse_animation_code(&format!("File: x.ts\n{}", body));

        assert_eq!(fenced[0].content, body);
        assert_eq!(unfenced[0].content, body);
        assert!(!fenced[0].content.contains("```"));
    }

    #[test]
    fn test_marker_at_end_of_input_yields_empty_record() {
        let files = parse_animation_code("File: empty.ts");
        assert_eq!(files, vec![FileRecord::new("empty.ts", "")]);
        assert!(files[0].is_empty());
    }

    #[test]
    fn test_consecutive_markers_each_produce_a_record() {
        let files = parse_animation_code("File: a.ts\nFile: b.ts\nFile: c.ts\nbody");

        assert_eq!(
            files,
            vec![
                FileRecord::new("a.ts", ""),
                FileRecord::new("b.ts", ""),
                FileRecord::new("c.ts", "body"),
            ]
        );
    }

    #[test]
    fn test_marker_token_is_case_insensitive_but_path_is_not() {
        let files = parse_animation_code("  FILE: Pages/Index.vue\nx\nfile:lib/A.ts\ny");

        assert_eq!(files[0].path, "Pages/Index.vue");
        assert_eq!(files[1].path, "lib/A.ts");
    }

    #[test]
    fn test_language_tag_is_discarded() {
        let files = parse_animation_code("File: a.vue\n```vue title=\"a\"\n<div/>\n```");
        assert_eq!(files[0].content, "<div/>");
    }

    #[test]
    fn test_stray_fence_in_unfenced_content_is_kept() {
        let text = "File: notes.md\nintro\n```\ncode\n```\noutro";
        let files = parse_animation_code(text);

        assert_eq!(files[0].content, "intro\n```\ncode\n```\noutro");
    }

    #[test]
    fn test_unterminated_fence_captures_to_end() {
        let files = parse_animation_code("File: a.ts\n```ts\nline one\nFile: b.ts\nline two");

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "line one\nFile: b.ts\nline two");
    }

    #[test]
    fn test_lines_after_closing_fence_are_discarded() {
        let files = parse_animation_code("File: a.ts\n```\na\n```\nThat's the store.\nFile: b.ts\n```\nb\n```");

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content, "a");
        assert_eq!(files[1].content, "b");
    }

    #[test]
    fn test_crlf_input() {
        let files = parse_animation_code("File: a.ts\r\n```ts\r\nconst a = 1;\r\n```\r\n");

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.ts");
        assert_eq!(files[0].content, "const a = 1;\r");
    }

    #[test]
    fn test_empty_marker_path_is_kept_for_the_writer_to_reject() {
        let files = parse_animation_code("File:\nbody");
        assert_eq!(files, vec![FileRecord::new("", "body")]);
    }

    #[test]
    fn test_marker_path() {
        assert_eq!(marker_path("File: a/b.ts"), Some("a/b.ts"));
        assert_eq!(marker_path("   file:   spaced.ts   "), Some("spaced.ts"));
        assert_eq!(marker_path("File: c:/x.ts"), Some("c:/x.ts"));
        assert_eq!(marker_path("Filename: a.ts"), None);
        assert_eq!(marker_path("// File: a.ts"), None);
        assert_eq!(marker_path("fil"), None);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(FileRecord::new("a", "").line_count(), 0);
        assert_eq!(FileRecord::new("a", "one").line_count(), 1);
        assert_eq!(FileRecord::new("a", "one\ntwo\n").line_count(), 3);
    }
}
