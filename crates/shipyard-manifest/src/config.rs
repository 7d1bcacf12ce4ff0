//! Manifest parsing configuration
//!
//! Stored in `~/.config/shipyard/config.yaml`:
//!
//! ```yaml
//! apiVersion: shipyard.io/v1
//! defaultNamespace: default
//! releaseKinds:
//!   - FluxHelmRelease
//!   - HelmRelease
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ManifestError, Result};

/// Namespace given to resources whose manifest does not set one
pub const DEFAULT_NAMESPACE: &str = "default";

/// The only config file format understood so far
pub const CONFIG_API_VERSION: &str = "shipyard.io/v1";

/// Kinds whose `spec.values` carry the release's containers
pub const DEFAULT_RELEASE_KINDS: &[&str] = &["FluxHelmRelease", "HelmRelease"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
    /// Format version of the file, must be [`CONFIG_API_VERSION`]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Namespace for resources that omit `metadata.namespace`
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Kinds parsed as releases (compared case-insensitively)
    #[serde(default = "default_release_kinds")]
    pub release_kinds: Vec<String>,
}

fn default_api_version() -> String {
    CONFIG_API_VERSION.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_release_kinds() -> Vec<String> {
    DEFAULT_RELEASE_KINDS.iter().map(|k| k.to_string()).collect()
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            default_namespace: default_namespace(),
            release_kinds: default_release_kinds(),
        }
    }
}

impl ManifestConfig {
    /// Load configuration from the default location, falling back to the
    /// built-in defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ManifestError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ManifestError::Config {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("shipyard").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            return Err(ManifestError::Config {
                message: format!(
                    "unsupported apiVersion '{}', expected '{}'",
                    self.api_version, CONFIG_API_VERSION
                ),
            });
        }
        if self.default_namespace.trim().is_empty() {
            return Err(ManifestError::Config {
                message: "defaultNamespace must not be empty".to_string(),
            });
        }
        if self.release_kinds.iter().any(|k| k.trim().is_empty()) {
            return Err(ManifestError::Config {
                message: "releaseKinds must not contain empty kinds".to_string(),
            });
        }
        Ok(())
    }

    /// Whether documents of `kind` are parsed as releases
    pub fn is_release_kind(&self, kind: &str) -> bool {
        self.release_kinds
            .iter()
            .any(|k| k.eq_ignore_ascii_case(kind))
    }
}
