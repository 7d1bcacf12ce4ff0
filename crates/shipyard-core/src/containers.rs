//! Container discovery in values documents
//!
//! Charts have no fixed place for their images, but a handful of conventions
//! cover nearly all of them. An `image` key is looked for at the top of the
//! values and directly inside each top-level mapping, in one of three shapes:
//!
//! ```yaml
//! image: bitnami/mariadb:10.1.30-r1   # bare string
//!
//! db:
//!   image: bitnami/mariadb            # string with a sibling tag
//!   tag: 10.1.30-r1
//!
//! cache:
//!   image:                            # nested object
//!     repository: redis
//!     tag: "7.2"
//! ```
//!
//! The top-level image is reported as [`RELEASE_CONTAINER_NAME`]; the others
//! are named after the key they sit under, in document order.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{CoreError, Result};
use crate::image::Image;
use crate::values::{Values, string_entries, type_name};

/// Name given to the container defined at the top of the values
pub const RELEASE_CONTAINER_NAME: &str = "chart-image";

pub const IMAGE_KEY: &str = "image";
pub const TAG_KEY: &str = "tag";
pub const REPOSITORY_KEY: &str = "repository";

/// Deepest level at which an `image` key is looked for (0 = top level)
const MAX_DEPTH: usize = 1;

/// Key path from the values root to a field
pub type FieldPath = Vec<String>;

/// How an image reference was written in the values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageShape {
    /// `image: repo:tag`
    Bare,
    /// `image: repo` next to `tag: tag`
    WithTag,
    /// `image: { repository: repo, tag: tag }`
    Nested,
}

/// Where in the values a container was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locator {
    scope: Option<String>,
}

impl Locator {
    pub fn top_level() -> Self {
        Self { scope: None }
    }

    pub fn under(key: impl Into<String>) -> Self {
        Self {
            scope: Some(key.into()),
        }
    }

    /// The outer key, `None` for the top-level container
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Path to `fields` relative to this container's scope
    pub fn path(&self, fields: &[&str]) -> FieldPath {
        self.scope
            .iter()
            .cloned()
            .chain(fields.iter().map(|f| f.to_string()))
            .collect()
    }
}

/// A container discovered in a values document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub name: String,
    pub image: Image,
    pub shape: ImageShape,
    pub locator: Locator,
}

impl Container {
    /// Path of the scalar holding the repository (or the whole reference for
    /// [`ImageShape::Bare`])
    pub fn repository_path(&self) -> FieldPath {
        match self.shape {
            ImageShape::Bare | ImageShape::WithTag => self.locator.path(&[IMAGE_KEY]),
            ImageShape::Nested => self.locator.path(&[IMAGE_KEY, REPOSITORY_KEY]),
        }
    }

    /// Path of the scalar holding the tag. `None` when the tag is part of the
    /// reference string itself.
    pub fn tag_path(&self) -> Option<FieldPath> {
        match self.shape {
            ImageShape::Bare => None,
            ImageShape::WithTag => Some(self.locator.path(&[TAG_KEY])),
            ImageShape::Nested => Some(self.locator.path(&[IMAGE_KEY, TAG_KEY])),
        }
    }
}

/// Discover the containers defined in `values`.
///
/// The top-level container comes first, then the containers found under
/// top-level keys, in document order. An `image` field that cannot be read
/// as a reference is an error; keys without one are skipped.
pub fn discover(values: &Values) -> Result<Vec<Container>> {
    let mut containers = Vec::new();
    walk(values.as_mapping(), 0, Locator::top_level(), &mut containers)?;

    tracing::debug!(count = containers.len(), "discovered containers");
    Ok(containers)
}

/// Find a single container by name
pub fn find(values: &Values, name: &str) -> Result<Option<Container>> {
    Ok(discover(values)?.into_iter().find(|c| c.name == name))
}

fn walk(map: &Mapping, depth: usize, locator: Locator, out: &mut Vec<Container>) -> Result<()> {
    if let Some((image, shape)) = probe(map)? {
        let name = locator.scope().unwrap_or(RELEASE_CONTAINER_NAME).to_string();

        if out.iter().any(|c| c.name == name) {
            tracing::debug!(container = %name, "skipping container shadowed by an earlier one");
        } else {
            tracing::trace!(container = %name, image = %image, ?shape, "found container");
            out.push(Container {
                name,
                image,
                shape,
                locator,
            });
        }
    }

    if depth >= MAX_DEPTH {
        return Ok(());
    }

    for (key, value) in string_entries(map) {
        if key == IMAGE_KEY {
            continue;
        }
        if let Value::Mapping(inner) = value {
            walk(inner, depth + 1, Locator::under(key), out)?;
        }
    }

    Ok(())
}

/// Classify the `image` field of `map`, if there is one
fn probe(map: &Mapping) -> Result<Option<(Image, ImageShape)>> {
    let Some(value) = map.get(IMAGE_KEY) else {
        return Ok(None);
    };

    match value {
        Value::String(reference) => match map.get(TAG_KEY) {
            Some(tag) => {
                // the sibling tag wins over one written into the reference
                let parsed = Image::parse(reference)?;
                let tag = tag_string(tag, reference)?;
                Ok(Some((
                    Image::from_fields(parsed.repository(), tag),
                    ImageShape::WithTag,
                )))
            }
            None => Ok(Some((Image::parse(reference)?, ImageShape::Bare))),
        },
        Value::Mapping(object) => {
            let repository = match object.get(REPOSITORY_KEY) {
                Some(Value::String(r)) if !r.trim().is_empty() => r.trim(),
                Some(other) => {
                    return Err(CoreError::malformed(
                        format!("{:?}", other),
                        "image.repository must be a non-empty string",
                    ));
                }
                None => {
                    return Err(CoreError::malformed(
                        "<mapping>",
                        "image mapping has no 'repository' field",
                    ));
                }
            };
            let tag = match object.get(TAG_KEY) {
                Some(tag) => tag_string(tag, repository)?,
                None => String::new(),
            };
            Ok(Some((Image::from_fields(repository, tag), ImageShape::Nested)))
        }
        other => Err(CoreError::malformed(
            format!("{:?}", other),
            format!("image must be a string or a mapping, found {}", type_name(other)),
        )),
    }
}

/// Read a tag field. Numbers are accepted since `tag: 5` is common in
/// hand-written values; `null` is an unset tag.
fn tag_string(value: &Value, reference: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(CoreError::malformed(
            reference,
            format!("tag must be a string, found {}", type_name(other)),
        )),
    }
}
