//! Helm release resources
//!
//! A release names a chart and carries the values to install it with. Its
//! containers are whatever images those values configure; see
//! [`shipyard_core::containers`] for how they are found.
//!
//! ```yaml
//! apiVersion: helm.integrations.flux.weave.works/v1alpha2
//! kind: FluxHelmRelease
//! metadata:
//!   name: mariadb
//!   namespace: maria
//! spec:
//!   chartGitPath: mariadb
//!   values:
//!     image: bitnami/mariadb:10.1.30-r1
//! ```

use serde::Deserialize;
use serde_yaml::Value;
use shipyard_core::{Container, Image, Values, discover};

use crate::error::{ManifestError, Result};
use crate::patch;
use crate::resource::{ResourceBase, ResourceId, Workload};

/// Key path of the values mapping inside a release document
pub const VALUES_PATH: &[&str] = &["spec", "values"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseSpec {
    #[serde(default)]
    chart_git_path: Option<String>,
    #[serde(default)]
    release_name: Option<String>,
    #[serde(default)]
    chart: Option<Value>,
    #[serde(default)]
    values: Value,
}

/// A release resource and its values
#[derive(Debug, Clone)]
pub struct HelmRelease {
    pub(crate) base: ResourceBase,
    chart_git_path: Option<String>,
    release_name: Option<String>,
    chart: Option<Value>,
    values: Values,
}

impl HelmRelease {
    pub(crate) fn from_document(
        base: ResourceBase,
        body: &Value,
    ) -> std::result::Result<Self, String> {
        let spec = decode_spec(body)?;
        let values = release_values(&spec)?;

        Ok(Self {
            base,
            chart_git_path: spec.chart_git_path,
            release_name: spec.release_name,
            chart: spec.chart,
            values,
        })
    }

    pub fn id(&self) -> &ResourceId {
        &self.base.id
    }

    /// Path of the chart in the git repository, passed through untouched
    pub fn chart_git_path(&self) -> Option<&str> {
        self.chart_git_path.as_deref()
    }

    pub fn release_name(&self) -> Option<&str> {
        self.release_name.as_deref()
    }

    /// Chart source of newer release kinds, left undecoded
    pub fn chart(&self) -> Option<&Value> {
        self.chart.as_ref()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Current document text
    pub fn bytes(&self) -> &str {
        &self.base.bytes
    }

    fn patch_failed(container: &str, reason: impl Into<String>) -> ManifestError {
        ManifestError::PatchFailed {
            container: container.to_string(),
            reason: reason.into(),
        }
    }
}

impl Workload for HelmRelease {
    fn containers(&self) -> Result<Vec<Container>> {
        Ok(discover(&self.values)?)
    }

    fn set_container_image(&mut self, container: &str, image: &Image) -> Result<()> {
        let before = self.containers()?;
        let target = before
            .iter()
            .find(|c| c.name == container)
            .ok_or_else(|| ManifestError::ContainerNotFound {
                container: container.to_string(),
                resource: self.base.id.to_string(),
            })?;

        let edits = patch::plan(&self.base.bytes, VALUES_PATH, &self.values, target, image)
            .map_err(|reason| Self::patch_failed(container, reason))?;
        if edits.is_empty() {
            return Ok(());
        }

        let patched = patch::apply(&self.base.bytes, &edits);
        let values = decode_patched(&patched)
            .map_err(|reason| Self::patch_failed(container, reason))?;
        let after = discover(&values)?;

        // Everything but the target must read back unchanged
        let expected = before.iter().map(|c| {
            if c.name == container {
                (c.name.as_str(), image)
            } else {
                (c.name.as_str(), &c.image)
            }
        });
        let matches = after.len() == before.len()
            && expected
                .zip(&after)
                .all(|((name, image), c)| c.name == name && c.image == *image);
        if !matches {
            return Err(Self::patch_failed(
                container,
                "rewritten document does not read back as the requested image",
            ));
        }

        tracing::debug!(
            resource = %self.base.id,
            container,
            image = %image,
            edits = edits.len(),
            "updated container image"
        );
        self.base.bytes = patched;
        self.values = values;
        Ok(())
    }
}

fn decode_spec(body: &Value) -> std::result::Result<ReleaseSpec, String> {
    match body.get("spec") {
        None | Some(Value::Null) => Ok(ReleaseSpec::default()),
        Some(spec) => {
            serde_yaml::from_value(spec.clone()).map_err(|e| format!("invalid spec: {}", e))
        }
    }
}

fn release_values(spec: &ReleaseSpec) -> std::result::Result<Values, String> {
    Values::from_value(spec.values.clone()).map_err(|e| format!("spec.values: {}", e))
}

fn decode_patched(doc: &str) -> std::result::Result<Values, String> {
    let body: Value =
        serde_yaml::from_str(doc).map_err(|e| format!("rewritten document is invalid: {}", e))?;
    release_values(&decode_spec(&body)?)
}
