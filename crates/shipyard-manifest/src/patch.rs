//! In-place rewriting of container images
//!
//! Edits are planned against the span index of the document and then spliced
//! into the original text, so only the bytes of the changed scalars differ.

use std::ops::Range;

use shipyard_core::{Container, Image, ImageShape, Values};

use crate::span::{QuoteStyle, ScalarSpan, SpanIndex, render_scalar};

/// A replacement of `range` in the document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    /// Write `value` over the scalar at `span`, keeping its quoting
    fn replace(span: &ScalarSpan, value: &str) -> Self {
        let rendered = render_scalar(value, span.style);
        let replacement = if span.empty {
            format!(" {}", rendered)
        } else {
            rendered
        };
        Self {
            range: span.range.clone(),
            replacement,
        }
    }
}

/// Plan the edits that make `container` carry `image`.
///
/// `root` is the key path from the document root to the values mapping
/// (`spec.values` for releases). Returns the reason when the fields cannot
/// be located in the text.
pub fn plan(
    doc: &str,
    root: &[&str],
    values: &Values,
    container: &Container,
    image: &Image,
) -> std::result::Result<Vec<Edit>, String> {
    let index = SpanIndex::build(doc);
    let absolute = |relative: &[String]| -> Vec<String> {
        root.iter()
            .map(|k| k.to_string())
            .chain(relative.iter().cloned())
            .collect()
    };
    let mut edits = Vec::new();

    if container.image == *image {
        return Ok(edits);
    }

    let repository_path = container.repository_path();

    if container.shape == ImageShape::Bare {
        let span = index
            .scalar(&absolute(&repository_path))
            .ok_or_else(|| unlocatable(&repository_path))?;
        edits.push(Edit::replace(span, &image.to_string()));
        return Ok(edits);
    }

    if image.digest().is_some() {
        return Err(format!(
            "'{}' has a digest, which cannot be stored in separate repository and tag fields",
            image
        ));
    }

    if image.repository() != container.image.repository() {
        let span = index
            .scalar(&absolute(&repository_path))
            .ok_or_else(|| unlocatable(&repository_path))?;
        edits.push(Edit::replace(span, image.repository()));
    }

    if image.tag() != container.image.tag() {
        let tag_path = container
            .tag_path()
            .ok_or_else(|| format!("{:?} images have no separate tag field", container.shape))?;

        match index.scalar(&absolute(&tag_path)) {
            Some(span) => edits.push(Edit::replace(span, image.tag())),
            None if container.shape == ImageShape::Nested
                && values.get_path(&tag_path).is_none() =>
            {
                // no tag key yet: add one right below the repository
                let anchor = index
                    .scalar(&absolute(&repository_path))
                    .ok_or_else(|| unlocatable(&repository_path))?;
                let line = format!(
                    "{}{}tag: {}",
                    index.line_break(),
                    " ".repeat(anchor.key_indent),
                    render_scalar(image.tag(), QuoteStyle::Plain)
                );
                edits.push(Edit {
                    range: anchor.line_end..anchor.line_end,
                    replacement: line,
                });
            }
            None => return Err(unlocatable(&tag_path)),
        }
    }

    Ok(edits)
}

/// Apply non-overlapping edits to `doc`
pub fn apply(doc: &str, edits: &[Edit]) -> String {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(doc.len() + 32);
    let mut cursor = 0;
    for edit in sorted {
        out.push_str(&doc[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&doc[cursor..]);
    out
}

fn unlocatable(path: &[String]) -> String {
    format!(
        "field '{}' is not a single-line scalar in a block mapping",
        path.join(".")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shipyard_core::discover;

    const ROOT: &[&str] = &["values"];

    fn patch(doc: &str, name: &str, image: &str) -> std::result::Result<String, String> {
        let parsed: serde_yaml::Value = serde_yaml::from_str(doc).unwrap();
        let values = Values::from_value(parsed["values"].clone()).unwrap();
        let container = discover(&values)
            .unwrap()
            .into_iter()
            .find(|c| c.name == name)
            .unwrap();
        let edits = plan(doc, ROOT, &values, &container, &Image::parse(image).unwrap())?;
        Ok(apply(doc, &edits))
    }

    #[test]
    fn test_bare_string() {
        let doc = "values:\n  image: repo/app:1.0 # pinned\n  replicas: 2\n";
        assert_eq!(
            patch(doc, "chart-image", "repo/app:2.0").unwrap(),
            "values:\n  image: repo/app:2.0 # pinned\n  replicas: 2\n"
        );
    }

    #[test]
    fn test_with_tag_only_touches_tag() {
        let doc = "values:\n  db:\n    image: bitnami/mariadb\n    tag: \"10.1\"\n";
        assert_eq!(
            patch(doc, "db", "bitnami/mariadb:10.3").unwrap(),
            "values:\n  db:\n    image: bitnami/mariadb\n    tag: \"10.3\"\n"
        );
    }

    #[test]
    fn test_with_tag_repository_change() {
        let doc = "values:\n  image: old/repo\n  tag: v1\n";
        assert_eq!(
            patch(doc, "chart-image", "new/repo:v2").unwrap(),
            "values:\n  image: new/repo\n  tag: v2\n"
        );
    }

    #[test]
    fn test_nested_inserts_missing_tag() {
        let doc = "values:\n  web:\n    image:\n      repository: nginx\n    port: 80\n";
        assert_eq!(
            patch(doc, "web", "nginx:1.25").unwrap(),
            "values:\n  web:\n    image:\n      repository: nginx\n      tag: \"1.25\"\n    port: 80\n"
        );
    }

    #[test]
    fn test_fills_empty_tags() {
        let doc = "values:\n  db:\n    image: mariadb\n    tag:\n  web:\n    image:\n      repository: nginx\n      tag: # unset\n";
        let patched = patch(doc, "db", "mariadb:10.3").unwrap();
        assert_eq!(
            patched,
            "values:\n  db:\n    image: mariadb\n    tag: \"10.3\"\n  web:\n    image:\n      repository: nginx\n      tag: # unset\n"
        );
        assert_eq!(
            patch(&patched, "web", "nginx:stable").unwrap(),
            "values:\n  db:\n    image: mariadb\n    tag: \"10.3\"\n  web:\n    image:\n      repository: nginx\n      tag: stable # unset\n"
        );
    }

    #[test]
    fn test_unchanged_image_plans_nothing() {
        let doc = "values:\n  image: 'repo/app:1.0'\n";
        assert_eq!(patch(doc, "chart-image", "repo/app:1.0").unwrap(), doc);
    }

    #[test]
    fn test_flow_mapping_is_unlocatable() {
        let doc = "values:\n  web:\n    image: {repository: nginx, tag: '1.0'}\n";
        let err = patch(doc, "web", "nginx:2.0").unwrap_err();
        assert!(err.contains("values.web.image.tag") || err.contains("web.image.tag"));
    }

    #[test]
    fn test_digest_needs_bare_shape() {
        let doc = "values:\n  image: repo\n  tag: v1\n";
        let err = patch(doc, "chart-image", "repo:v2@sha256:abcd").unwrap_err();
        assert!(err.contains("digest"));
    }

    #[test]
    fn test_apply_orders_edits() {
        let edits = vec![
            Edit {
                range: 4..5,
                replacement: "E".to_string(),
            },
            Edit {
                range: 0..1,
                replacement: "A".to_string(),
            },
        ];
        assert_eq!(apply("abcde", &edits), "AbcdE");
    }
}
