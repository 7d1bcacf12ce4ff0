//! CLI commands

pub mod containers;
pub mod list;
pub mod set_image;

use std::path::Path;

use shipyard_manifest::{ManifestConfig, ResourceSet, parse_multidoc_with};

use crate::error::{CliError, Result};

/// Read a manifest file and index its resources
pub(crate) fn load_manifest(path: &Path, config: &ManifestConfig) -> Result<(Vec<u8>, ResourceSet)> {
    let data = std::fs::read(path).map_err(|e| CliError::io(path, e))?;
    let set = parse_multidoc_with(&data, &path.display().to_string(), config)?;
    tracing::debug!(file = %path.display(), resources = set.len(), "loaded manifest");
    Ok((data, set))
}
