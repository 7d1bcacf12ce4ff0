//! Multi-document manifest streams
//!
//! A stream is split on `---` / `...` marker lines, each document is decoded
//! into a [`Resource`], and the results are indexed by their
//! `namespace:kind/name` key in document order.

use std::ops::Range;

use indexmap::IndexMap;
use shipyard_core::Image;

use crate::config::ManifestConfig;
use crate::error::{ManifestError, Result};
use crate::release::HelmRelease;
use crate::resource::{Origin, Resource, ResourceId};

/// Resources of one stream, keyed by `namespace:kind/name`
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    source: String,
    resources: IndexMap<String, Resource>,
}

impl ResourceSet {
    /// Label the stream was parsed under
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Resource> {
        self.resources.get_mut(key)
    }

    pub fn get_by_id(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(&id.to_string())
    }

    /// Point `container` of the workload `id` at `image` and return `stream`,
    /// the text this set was parsed from, with that document rewritten.
    pub fn rewrite_container_image(
        &mut self,
        stream: &str,
        id: &ResourceId,
        container: &str,
        image: &Image,
    ) -> Result<String> {
        let key = id.to_string();
        let resource = self
            .resources
            .get_mut(&key)
            .ok_or_else(|| ManifestError::ResourceNotFound { id: key.clone() })?;

        let span = resource.origin().span.clone();
        let (Some(head), Some(tail)) = (stream.get(..span.start), stream.get(span.end..)) else {
            return Err(ManifestError::PatchFailed {
                container: container.to_string(),
                reason: format!("{} was not parsed from this stream", key),
            });
        };

        resource.set_container_image(container, image)?;

        let mut out = String::with_capacity(stream.len() + 16);
        out.push_str(head);
        out.push_str(resource.bytes());
        out.push_str(tail);
        Ok(out)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Resources in document order
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Resource> {
        self.resources.iter()
    }

    /// Release resources, in document order
    pub fn workloads(&self) -> impl Iterator<Item = &HelmRelease> {
        self.resources.values().filter_map(|r| match r {
            Resource::HelmRelease(release) => Some(release),
            Resource::Generic(_) => None,
        })
    }
}

impl IntoIterator for ResourceSet {
    type Item = (String, Resource);
    type IntoIter = indexmap::map::IntoIter<String, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = (&'a String, &'a Resource);
    type IntoIter = indexmap::map::Iter<'a, String, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

/// Parse a manifest stream with the default configuration
pub fn parse_multidoc(data: &[u8], source: &str) -> Result<ResourceSet> {
    parse_multidoc_with(data, source, &ManifestConfig::default())
}

/// Parse a manifest stream. Any bad document fails the whole stream.
pub fn parse_multidoc_with(
    data: &[u8],
    source: &str,
    config: &ManifestConfig,
) -> Result<ResourceSet> {
    let stream = decode_utf8(data, source)?;
    parse_stream(stream, source, config)
}

/// Point `container` of the workload `id` at `image` and return the whole
/// stream with that document rewritten. Other documents and the separators
/// between them are returned untouched.
pub fn update_container_image(
    data: &[u8],
    source: &str,
    id: &str,
    container: &str,
    image: &Image,
) -> Result<String> {
    update_container_image_with(data, source, id, container, image, &ManifestConfig::default())
}

pub fn update_container_image_with(
    data: &[u8],
    source: &str,
    id: &str,
    container: &str,
    image: &Image,
    config: &ManifestConfig,
) -> Result<String> {
    let id: ResourceId = id.parse()?;
    let stream = decode_utf8(data, source)?;
    parse_stream(stream, source, config)?.rewrite_container_image(stream, &id, container, image)
}

fn decode_utf8<'a>(data: &'a [u8], source: &str) -> Result<&'a str> {
    std::str::from_utf8(data).map_err(|e| {
        let valid = &data[..e.valid_up_to()];
        let prefix = std::str::from_utf8(valid).unwrap_or_default();
        ManifestError::MalformedManifest {
            source_name: source.to_string(),
            document: split_documents(prefix).len().max(1),
            line: prefix.matches('\n').count() + 1,
            message: format!("invalid UTF-8: {}", e),
        }
    })
}

fn parse_stream(stream: &str, source: &str, config: &ManifestConfig) -> Result<ResourceSet> {
    let mut resources = IndexMap::new();

    for raw in split_documents(stream) {
        let origin = Origin {
            source: source.to_string(),
            document: raw.index,
            line: raw.line,
            span: raw.span.clone(),
        };
        let resource = Resource::decode(&stream[raw.span.clone()], origin, config).map_err(
            |e| ManifestError::MalformedManifest {
                source_name: source.to_string(),
                document: raw.index,
                line: raw.line + e.line.map_or(0, |l| l.saturating_sub(1)),
                message: e.message,
            },
        )?;

        let key = resource.id().to_string();
        if resources.contains_key(&key) {
            return Err(ManifestError::DuplicateResource {
                id: key,
                source_name: source.to_string(),
            });
        }
        tracing::debug!(
            source,
            document = raw.index,
            resource = %key,
            workload = resource.is_workload(),
            "decoded manifest document"
        );
        resources.insert(key, resource);
    }

    Ok(ResourceSet {
        source: source.to_string(),
        resources,
    })
}

/// A document of a stream, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawDocument {
    /// 1-based among non-empty documents
    index: usize,
    /// 1-based line of the first byte
    line: usize,
    span: Range<usize>,
}

fn split_documents(stream: &str) -> Vec<RawDocument> {
    let mut docs = Vec::new();
    let mut push = |span: Range<usize>, line: usize| {
        if has_content(&stream[span.clone()]) {
            docs.push(RawDocument {
                index: docs.len() + 1,
                line,
                span,
            });
        }
    };

    let mut start = 0;
    let mut start_line = 1;
    let mut offset = 0;
    for (line_no, line) in (1..).zip(stream.split_inclusive('\n')) {
        if is_separator(line) {
            push(start..offset, start_line);
            start = offset + line.len();
            start_line = line_no + 1;
        }
        offset += line.len();
    }
    push(start..stream.len(), start_line);

    docs
}

/// `---` or `...` at column 0, optionally followed by whitespace or a comment
fn is_separator(line: &str) -> bool {
    let line = line.trim_end_matches(['\n', '\r']);
    ["---", "..."].iter().any(|marker| {
        line.strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

fn has_content(doc: &str) -> bool {
    doc.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && !line.starts_with('%')
    })
}
