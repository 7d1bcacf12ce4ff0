//! Container image references.
//!
//! Parses references like `quay.io/org/app:v1.2.0` into a repository (registry
//! host and port included) and an optional tag. Unlike a registry client, no
//! defaults are filled in: `nginx` stays `nginx`, so rendering gives back what
//! the manifest said.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// An immutable `repository[:tag][@digest]` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Image {
    repository: String,
    tag: String,
    digest: Option<String>,
}

impl Image {
    /// Parse an image reference string.
    ///
    /// The tag is split on the last `:` after the last `/`, so a registry port
    /// (`registry:5000/app`) is never mistaken for a tag.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CoreError::malformed(reference, "empty image reference"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(CoreError::malformed(reference, "contains whitespace"));
        }

        let (name_tag, digest) = match reference.rsplit_once('@') {
            Some((name_tag, digest)) => {
                if !digest.contains(':') {
                    return Err(CoreError::malformed(
                        reference,
                        "digest must be of the form algorithm:hex",
                    ));
                }
                (name_tag, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        let name_start = name_tag.rfind('/').map_or(0, |slash| slash + 1);
        let (repository, tag) = match name_tag[name_start..].rfind(':') {
            Some(colon) => {
                let colon = name_start + colon;
                (&name_tag[..colon], &name_tag[colon + 1..])
            }
            None => (name_tag, ""),
        };

        if repository.is_empty() {
            return Err(CoreError::malformed(reference, "empty repository"));
        }
        if tag.is_empty() && name_tag.len() != repository.len() {
            return Err(CoreError::malformed(reference, "empty tag after ':'"));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
            digest,
        })
    }

    /// Build a reference from separately stored fields, as found in values
    /// documents that keep `repository` and `tag` apart. An empty tag means
    /// "unspecified".
    pub fn from_fields(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
            digest: None,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The tag, empty when unspecified
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Same repository, different tag. Any digest is dropped since it pinned
    /// the content of the old tag.
    pub fn with_new_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            repository: self.repository.clone(),
            tag: tag.into(),
            digest: None,
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repository)?;
        if !self.tag.is_empty() {
            write!(f, ":{}", self.tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl FromStr for Image {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Image {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
