//! Byte positions of scalar values in block-style YAML
//!
//! `serde_yaml` throws positions away, so rewriting one field through it
//! would re-emit the whole document. This module indexes a document line by
//! line instead, recording where each `key: scalar` value sits so it can be
//! replaced without touching anything around it.
//!
//! Only block mappings are indexed. Values inside sequences, flow
//! collections (`{...}`, `[...]`), block scalars (`|`, `>`) and multi-line
//! quoted scalars are skipped; looking them up yields `None`.

use std::ops::Range;

/// Quoting of a scalar in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Plain,
    Single,
    Double,
}

/// Location of a scalar mapping value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarSpan {
    /// Byte range of the value, quotes included
    pub range: Range<usize>,
    pub style: QuoteStyle,
    /// Column of the key owning the value
    pub key_indent: usize,
    /// Byte offset of the end of the entry's line, before the line break
    pub line_end: usize,
    /// The key has no value (`tag:`). `range` is then empty and sits right
    /// after the colon.
    pub empty: bool,
}

#[derive(Debug)]
struct Frame {
    indent: usize,
    /// `None` for a sequence item
    key: Option<String>,
}

/// Scalar positions of one YAML document
#[derive(Debug, Default)]
pub struct SpanIndex {
    scalars: Vec<(Vec<String>, ScalarSpan)>,
    crlf: bool,
}

impl SpanIndex {
    pub fn build(doc: &str) -> Self {
        let mut index = SpanIndex {
            scalars: Vec::new(),
            crlf: doc.contains("\r\n"),
        };
        let mut stack: Vec<Frame> = Vec::new();
        // Lines indented deeper than this belong to the previous value
        let mut skip_deeper: Option<usize> = None;
        // A `key:` with nothing after it is null unless the next line nests under it
        let mut pending_empty: Option<(Vec<String>, ScalarSpan)> = None;
        let mut offset = 0;

        for raw in doc.split_inclusive('\n') {
            let line_start = offset;
            offset += raw.len();

            let line = raw.strip_suffix('\n').unwrap_or(raw);
            let line = line.strip_suffix('\r').unwrap_or(line);
            let content = line.trim_start_matches(' ');
            let indent = line.len() - content.len();

            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            if let Some((path, span)) = pending_empty.take() {
                let is_item = content == "-" || content.starts_with("- ");
                let nested = indent > span.key_indent || (indent == span.key_indent && is_item);
                if !nested {
                    index.record(path, span);
                }
            }
            if let Some(owner) = skip_deeper {
                if indent > owner {
                    continue;
                }
                skip_deeper = None;
            }
            if indent == 0 && is_document_marker(content) {
                stack.clear();
                continue;
            }

            while stack.last().is_some_and(|f| f.indent >= indent) {
                stack.pop();
            }

            if content == "-" || content.starts_with("- ") {
                stack.push(Frame { indent, key: None });
                continue;
            }

            let Some((key, after_colon)) = split_key(content) else {
                continue;
            };

            let rest = &content[after_colon..];
            let mut value = rest.trim_start_matches([' ', '\t']);
            let colon_end = line_start + indent + after_colon;
            let mut value_start = colon_end + (rest.len() - value.len());

            if value.is_empty() || value.starts_with('#') {
                if !stack.iter().any(|f| f.key.is_none()) {
                    let path = Self::path_of(&stack, &key);
                    pending_empty = Some((
                        path,
                        ScalarSpan {
                            range: colon_end..colon_end,
                            style: QuoteStyle::Plain,
                            key_indent: indent,
                            line_end: line_start + line.len(),
                            empty: true,
                        },
                    ));
                }
                stack.push(Frame {
                    indent,
                    key: Some(key),
                });
                continue;
            }

            // Anchors and tags before the value
            while value.starts_with('&') || value.starts_with('!') {
                let token_len = value.find([' ', '\t']).unwrap_or(value.len());
                let after = value[token_len..].trim_start_matches([' ', '\t']);
                value_start += value.len() - after.len();
                value = after;
            }

            // `key: &anchor` or `key: !!tag` with the value on the next lines
            if value.is_empty() || value.starts_with('#') {
                stack.push(Frame {
                    indent,
                    key: Some(key),
                });
                continue;
            }

            skip_deeper = Some(indent);

            let scalar = match value.as_bytes()[0] {
                b'*' | b'|' | b'>' | b'{' | b'[' => None,
                b'"' => closing_quote(value, b'"').map(|end| (end + 1, QuoteStyle::Double)),
                b'\'' => closing_quote(value, b'\'').map(|end| (end + 1, QuoteStyle::Single)),
                _ => Some((plain_len(value), QuoteStyle::Plain)),
            };

            let Some((len, style)) = scalar else {
                continue;
            };

            let in_sequence = stack.iter().any(|f| f.key.is_none());
            if in_sequence {
                continue;
            }

            let path = Self::path_of(&stack, &key);
            index.record(
                path,
                ScalarSpan {
                    range: value_start..value_start + len,
                    style,
                    key_indent: indent,
                    line_end: line_start + line.len(),
                    empty: false,
                },
            );
        }

        if let Some((path, span)) = pending_empty {
            index.record(path, span);
        }

        index
    }

    fn path_of(stack: &[Frame], key: &str) -> Vec<String> {
        stack
            .iter()
            .filter_map(|f| f.key.clone())
            .chain(std::iter::once(key.to_string()))
            .collect()
    }

    /// First occurrence of a path wins
    fn record(&mut self, path: Vec<String>, span: ScalarSpan) {
        if !self.scalars.iter().any(|(p, _)| *p == path) {
            self.scalars.push((path, span));
        }
    }

    /// Span of the scalar at `path`, if it is a block mapping value
    pub fn scalar<S: AsRef<str>>(&self, path: &[S]) -> Option<&ScalarSpan> {
        self.scalars
            .iter()
            .find(|(p, _)| {
                p.len() == path.len() && p.iter().zip(path).all(|(a, b)| a == b.as_ref())
            })
            .map(|(_, span)| span)
    }

    /// Line break used by the document
    pub fn line_break(&self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }
}

fn is_document_marker(content: &str) -> bool {
    ["---", "..."].iter().any(|marker| {
        content == *marker
            || content
                .strip_prefix(marker)
                .is_some_and(|rest| rest.starts_with([' ', '\t']))
    })
}

/// Split `key: value` at the colon. Returns the key and the byte offset just
/// past the colon.
fn split_key(content: &str) -> Option<(String, usize)> {
    let first = *content.as_bytes().first()?;

    if first == b'"' || first == b'\'' {
        let close = closing_quote(content, first)?;
        let key = unescape(&content[1..close], first);
        let rest = &content[close + 1..];
        let after_ws = rest.trim_start_matches([' ', '\t']);
        let colon = content.len() - after_ws.len();
        return after_ws
            .strip_prefix(':')
            .filter(|after| after.is_empty() || after.starts_with([' ', '\t']))
            .map(|_| (key, colon + 1));
    }

    if matches!(
        first,
        b'{' | b'[' | b'?' | b'&' | b'*' | b'!' | b'|' | b'>' | b'%' | b'@' | b'`' | b':'
    ) {
        return None;
    }

    let mut prev_blank = false;
    for (i, c) in content.char_indices() {
        if c == '#' && prev_blank {
            return None;
        }
        if c == ':' {
            let next = content[i + 1..].chars().next();
            if next.is_none_or(|n| n == ' ' || n == '\t') {
                let key = content[..i].trim_end();
                return Some((key.to_string(), i + 1));
            }
        }
        prev_blank = c == ' ' || c == '\t';
    }
    None
}

/// Index of the quote closing the one at `s[0]`, on the same line
fn closing_quote(s: &str, quote: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b'\'' if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Length of a plain scalar, stopping at a trailing comment
fn plain_len(value: &str) -> usize {
    let mut end = value.len();
    let bytes = value.as_bytes();
    for i in 1..bytes.len() {
        if bytes[i] == b'#' && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            end = i;
            break;
        }
    }
    value[..end].trim_end_matches([' ', '\t']).len()
}

fn unescape(raw: &str, quote: u8) -> String {
    if quote == b'\'' {
        return raw.replace("''", "'");
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Render `value` as a scalar in `style`. Plain output is only used when it
/// would read back as the same string; otherwise the value is double-quoted.
pub fn render_scalar(value: &str, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Single if !value.contains('\n') => format!("'{}'", value.replace('\'', "''")),
        QuoteStyle::Plain if is_plain_safe(value) => value.to_string(),
        _ => double_quoted(value),
    }
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_plain_safe(value: &str) -> bool {
    if value.is_empty() || value.trim() != value || value.contains(['\n', '\r', '\t']) {
        return false;
    }
    // `key: value` position is stricter than a bare document about ": " and " #"
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    matches!(
        serde_yaml::from_str::<serde_yaml::Value>(value),
        Ok(serde_yaml::Value::String(ref s)) if s == value
    )
}
