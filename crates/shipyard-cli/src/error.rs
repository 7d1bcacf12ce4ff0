//! CLI error types with exit code handling
//!
//! Library errors are folded into a few user-facing categories, each with
//! its own exit code.

use std::path::Path;

use miette::Diagnostic;
use shipyard_core::CoreError;
use shipyard_manifest::ManifestError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The manifest stream could not be parsed or has bad image fields
    #[error("Manifest error: {message}")]
    #[diagnostic(code(shipyard::cli::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Resource or container does not exist
    #[error("{message}")]
    #[diagnostic(code(shipyard::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The new image could not be written into the document
    #[error("Update failed: {message}")]
    #[diagnostic(code(shipyard::cli::patch))]
    Patch {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid command line input
    #[error("Invalid input: {message}")]
    #[diagnostic(code(shipyard::cli::input))]
    Input { message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(shipyard::cli::config))]
    Config { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(shipyard::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(shipyard::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Patch { .. } => exit_codes::PATCH_ERROR,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an IO error for an operation on `path`
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<ManifestError> for CliError {
    fn from(err: ManifestError) -> Self {
        let message = err.to_string();
        match err {
            ManifestError::ResourceNotFound { .. } => CliError::NotFound {
                message,
                help: Some("Run `shipyard list <file>` to see the resources in the file".into()),
            },
            ManifestError::ContainerNotFound { .. } => CliError::NotFound {
                message,
                help: Some(
                    "Run `shipyard containers <file>` to see the containers of each release"
                        .into(),
                ),
            },
            ManifestError::UnsupportedCapability { .. } => CliError::Input { message },
            ManifestError::InvalidResourceId { .. } => CliError::Input { message },
            ManifestError::PatchFailed { .. } => CliError::Patch {
                message,
                help: Some(
                    "Only single-line scalars in block mappings can be rewritten; edit this field by hand"
                        .into(),
                ),
            },
            ManifestError::Config { .. } => CliError::Config { message },
            ManifestError::Io(_) => CliError::Io { message },
            _ => CliError::Manifest {
                message,
                help: None,
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::input(err.to_string())
    }
}

impl From<miette::Report> for CliError {
    fn from(err: miette::Report) -> Self {
        CliError::Other {
            message: format!("{:?}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let not_found: CliError = ManifestError::ResourceNotFound { id: "a:b/c".into() }.into();
        assert_eq!(not_found.exit_code(), exit_codes::NOT_FOUND);

        let patch: CliError = ManifestError::PatchFailed {
            container: "db".into(),
            reason: "flow mapping".into(),
        }
        .into();
        assert_eq!(patch.exit_code(), exit_codes::PATCH_ERROR);

        let manifest: CliError = ManifestError::DuplicateResource {
            id: "a:b/c".into(),
            source_name: "f.yaml".into(),
        }
        .into();
        assert_eq!(manifest.exit_code(), exit_codes::MANIFEST_ERROR);

        let bad_ref: CliError = shipyard_core::Image::parse("").unwrap_err().into();
        assert_eq!(bad_ref.exit_code(), exit_codes::USAGE_ERROR);
    }
}
