//! Error types for shipyard-manifest

use shipyard_core::CoreError;
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors raised while parsing manifests or updating their containers
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// A document could not be decoded or lacks its identity fields
    #[error("malformed manifest in {source_name} (document {document}, line {line}): {message}")]
    MalformedManifest {
        source_name: String,
        document: usize,
        line: usize,
        message: String,
    },

    /// Two documents share the same namespace, kind and name
    #[error("duplicate resource '{id}' in {source_name}")]
    DuplicateResource { id: String, source_name: String },

    /// An `image` field is present but cannot be read as a reference
    #[error("malformed image reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("container '{container}' not found in {resource}")]
    ContainerNotFound { container: String, resource: String },

    /// Container operations on a kind that has no containers
    #[error("{resource} is a {kind}, which does not define containers")]
    UnsupportedCapability { resource: String, kind: String },

    #[error("resource '{id}' not found")]
    ResourceNotFound { id: String },

    #[error("invalid resource id '{id}': expected <namespace>:<kind>/<name>")]
    InvalidResourceId { id: String },

    /// The edit could not be located in the source text, or did not produce
    /// the requested image
    #[error("cannot update container '{container}': {reason}")]
    PatchFailed { container: String, reason: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for ManifestError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedReference { reference, reason } => {
                ManifestError::MalformedReference { reference, reason }
            }
            // Document decoding builds the values and reports these as
            // MalformedManifest, so only discovery errors get here
            other @ (CoreError::InvalidValues { .. } | CoreError::YamlParse(_)) => {
                ManifestError::MalformedReference {
                    reference: "<values>".to_string(),
                    reason: other.to_string(),
                }
            }
        }
    }
}

impl ManifestError {
    /// Check if this error means the container or resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManifestError::ContainerNotFound { .. } | ManifestError::ResourceNotFound { .. }
        )
    }
}
