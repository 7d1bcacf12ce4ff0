//! Line diffs of rewritten manifests, for review before anything is written

use std::ops::Range;

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Line-by-line difference between two versions of a manifest
#[derive(Debug, Clone, Serialize)]
pub struct ManifestDiff {
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub line_type: LineType,

    /// Content without its line break
    pub content: String,

    /// 0-based line number in the old text
    pub old_line_no: Option<usize>,

    /// 0-based line number in the new text
    pub new_line_no: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Added,
    Removed,
    Context,
}

impl ManifestDiff {
    pub fn compute(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_lines(old, new);
        let lines = diff
            .iter_all_changes()
            .map(|change| DiffLine {
                line_type: match change.tag() {
                    ChangeTag::Delete => LineType::Removed,
                    ChangeTag::Insert => LineType::Added,
                    ChangeTag::Equal => LineType::Context,
                },
                content: change.value().trim_end_matches(['\n', '\r']).to_string(),
                old_line_no: change.old_index(),
                new_line_no: change.new_index(),
            })
            .collect();

        Self { lines }
    }

    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|l| l.line_type != LineType::Context)
    }

    pub fn added(&self) -> usize {
        self.count(LineType::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineType::Removed)
    }

    fn count(&self, line_type: LineType) -> usize {
        self.lines.iter().filter(|l| l.line_type == line_type).count()
    }

    /// Unified-style hunks with `context` unchanged lines around each change.
    /// Empty when nothing changed.
    pub fn render_unified(&self, context: usize) -> String {
        let mut output = String::new();

        for hunk in self.hunks(context) {
            let lines = &self.lines[hunk];
            let (old_start, old_len) = span_of(lines.iter().filter_map(|l| l.old_line_no));
            let (new_start, new_len) = span_of(lines.iter().filter_map(|l| l.new_line_no));
            output.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                old_start, old_len, new_start, new_len
            ));

            for line in lines {
                let prefix = match line.line_type {
                    LineType::Added => "+",
                    LineType::Removed => "-",
                    LineType::Context => " ",
                };
                output.push_str(prefix);
                output.push_str(&line.content);
                output.push('\n');
            }
        }

        output
    }

    /// Ranges of `lines` to show, overlapping hunks merged
    fn hunks(&self, context: usize) -> Vec<Range<usize>> {
        let mut hunks: Vec<Range<usize>> = Vec::new();

        for (idx, line) in self.lines.iter().enumerate() {
            if line.line_type == LineType::Context {
                continue;
            }
            let start = idx.saturating_sub(context);
            let end = (idx + context + 1).min(self.lines.len());
            match hunks.last_mut() {
                Some(last) if start <= last.end => last.end = last.end.max(end),
                _ => hunks.push(start..end),
            }
        }

        hunks
    }
}

/// 1-based start and length of a run of line numbers
fn span_of(mut numbers: impl Iterator<Item = usize>) -> (usize, usize) {
    match numbers.next() {
        Some(first) => (first + 1, numbers.count() + 1),
        None => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes() {
        let diff = ManifestDiff::compute("a: 1\nb: 2\n", "a: 1\nb: 2\n");
        assert!(!diff.has_changes());
        assert_eq!(diff.render_unified(3), "");
    }

    #[test]
    fn test_counts() {
        let diff = ManifestDiff::compute("a\nb\n", "a\nB\nc\n");
        assert!(diff.has_changes());
        assert_eq!(diff.added(), 2);
        assert_eq!(diff.removed(), 1);
    }

    #[test]
    fn test_render_single_hunk() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nb\nC\nd\ne\n";
        let diff = ManifestDiff::compute(old, new);

        insta::assert_snapshot!(diff.render_unified(1), @r"
        @@ -2,3 +2,3 @@
         b
        -c
        +C
         d
        ");
    }

    #[test]
    fn test_render_separate_hunks() {
        let old = "image: a:1\nx: 1\ny: 2\nz: 3\nw: 4\ntag: v1\n";
        let new = "image: a:2\nx: 1\ny: 2\nz: 3\nw: 4\ntag: v2\n";
        let diff = ManifestDiff::compute(old, new);

        insta::assert_snapshot!(diff.render_unified(1), @r"
        @@ -1,2 +1,2 @@
        -image: a:1
        +image: a:2
         x: 1
        @@ -5,2 +5,2 @@
         w: 4
        -tag: v1
        +tag: v2
        ");
    }

    #[test]
    fn test_crlf_content_is_trimmed() {
        let diff = ManifestDiff::compute("a: 1\r\n", "a: 2\r\n");
        assert_eq!(diff.lines[0].content, "a: 1");
        assert_eq!(diff.lines[1].content, "a: 2");
    }
}
