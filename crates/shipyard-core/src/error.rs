//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed image reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("Invalid values document: {message}")]
    InvalidValues { message: String },

    #[error("Failed to parse values: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl CoreError {
    pub(crate) fn malformed(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
