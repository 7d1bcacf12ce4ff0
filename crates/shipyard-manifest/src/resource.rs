//! Kubernetes resources decoded from manifest documents

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use shipyard_core::{Container, Image};

use crate::config::ManifestConfig;
use crate::error::{ManifestError, Result};
use crate::release::HelmRelease;

/// Identity of a resource: `namespace:kind/name`, kind lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    namespace: String,
    kind: String,
    name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, kind: &str, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.to_ascii_lowercase(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Lower-cased kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.namespace, self.kind, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ManifestError::InvalidResourceId { id: s.to_string() };
        let (namespace, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (kind, name) = rest.split_once('/').ok_or_else(invalid)?;
        if namespace.is_empty() || kind.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(namespace, kind, name))
    }
}

/// Where a document was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Label of the stream (usually a file path)
    pub source: String,
    /// 1-based position among the stream's non-empty documents
    pub document: usize,
    /// 1-based line the document starts on
    pub line: usize,
    /// Byte range of the document within the stream
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeMeta {
    #[serde(default)]
    pub api_version: Option<String>,
    pub kind: String,
    pub metadata: ObjectMeta,
}

/// Standard object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "string_map")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "string_map")]
    pub annotations: BTreeMap<String, String>,
}

/// Labels and annotations are strings to Kubernetes, but unquoted
/// `version: 1` is common in hand-written manifests
fn string_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(serde::de::Error::custom(format!(
                        "value of '{}' must be a string",
                        k
                    )));
                }
            };
            Ok((k, v))
        })
        .collect()
}

/// Fields shared by every resource
#[derive(Debug, Clone)]
pub(crate) struct ResourceBase {
    pub(crate) id: ResourceId,
    pub(crate) api_version: Option<String>,
    pub(crate) kind: String,
    pub(crate) meta: ObjectMeta,
    pub(crate) origin: Origin,
    /// Current document text; rewritten by image updates
    pub(crate) bytes: String,
}

/// Capability of resources that define containers
pub trait Workload {
    /// Containers in discovery order. Recomputed on every call.
    fn containers(&self) -> Result<Vec<Container>>;

    /// Point `container` at `image`, rewriting the stored document in place
    fn set_container_image(&mut self, container: &str, image: &Image) -> Result<()>;
}

/// Any kind without a special meaning to Shipyard
#[derive(Debug, Clone)]
pub struct GenericResource {
    pub(crate) base: ResourceBase,
    body: Value,
}

impl GenericResource {
    /// The decoded document
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn spec(&self) -> Option<&Value> {
        self.body.get("spec")
    }
}

/// A decoded manifest document
#[derive(Debug, Clone)]
pub enum Resource {
    HelmRelease(HelmRelease),
    Generic(GenericResource),
}

impl Resource {
    /// Decode one document. The error message is the bare reason; the caller
    /// adds source and position.
    pub(crate) fn decode(
        doc: &str,
        origin: Origin,
        config: &ManifestConfig,
    ) -> std::result::Result<Self, DecodeError> {
        let body: Value = serde_yaml::from_str(doc).map_err(DecodeError::from_yaml)?;
        if !body.is_mapping() {
            return Err(DecodeError::new("document is not a mapping"));
        }
        let type_meta: TypeMeta =
            serde_yaml::from_value(body.clone()).map_err(DecodeError::from_yaml)?;

        if type_meta.kind.trim().is_empty() {
            return Err(DecodeError::new("kind must not be empty"));
        }
        if type_meta.metadata.name.trim().is_empty() {
            return Err(DecodeError::new("metadata.name must not be empty"));
        }

        let mut meta = type_meta.metadata;
        let namespace = meta
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| config.default_namespace.clone());
        meta.namespace = Some(namespace.clone());

        let base = ResourceBase {
            id: ResourceId::new(namespace, &type_meta.kind, meta.name.clone()),
            api_version: type_meta.api_version,
            kind: type_meta.kind,
            meta,
            origin,
            bytes: doc.to_string(),
        };

        if config.is_release_kind(&base.kind) {
            let release = HelmRelease::from_document(base, &body).map_err(DecodeError::new)?;
            Ok(Resource::HelmRelease(release))
        } else {
            Ok(Resource::Generic(GenericResource { base, body }))
        }
    }

    fn base(&self) -> &ResourceBase {
        match self {
            Resource::HelmRelease(r) => &r.base,
            Resource::Generic(r) => &r.base,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.base().id
    }

    pub fn api_version(&self) -> Option<&str> {
        self.base().api_version.as_deref()
    }

    /// Kind as written in the manifest
    pub fn kind(&self) -> &str {
        &self.base().kind
    }

    pub fn name(&self) -> &str {
        &self.base().meta.name
    }

    /// Namespace, defaulted when the manifest leaves it out
    pub fn namespace(&self) -> &str {
        self.base().id.namespace()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.base().meta.labels
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.base().meta.annotations
    }

    pub fn origin(&self) -> &Origin {
        &self.base().origin
    }

    /// Current document text, including any image updates
    pub fn bytes(&self) -> &str {
        &self.base().bytes
    }

    pub fn is_workload(&self) -> bool {
        self.as_workload().is_some()
    }

    pub fn as_workload(&self) -> Option<&dyn Workload> {
        match self {
            Resource::HelmRelease(r) => Some(r),
            Resource::Generic(_) => None,
        }
    }

    pub fn as_workload_mut(&mut self) -> Option<&mut dyn Workload> {
        match self {
            Resource::HelmRelease(r) => Some(r),
            Resource::Generic(_) => None,
        }
    }

    /// Containers of a workload; `UnsupportedCapability` for other kinds
    pub fn containers(&self) -> Result<Vec<Container>> {
        match self {
            Resource::HelmRelease(r) => r.containers(),
            Resource::Generic(_) => Err(self.unsupported()),
        }
    }

    /// Update a workload container; `UnsupportedCapability` for other kinds
    pub fn set_container_image(&mut self, container: &str, image: &Image) -> Result<()> {
        match self {
            Resource::HelmRelease(r) => r.set_container_image(container, image),
            Resource::Generic(_) => Err(self.unsupported()),
        }
    }

    fn unsupported(&self) -> ManifestError {
        ManifestError::UnsupportedCapability {
            resource: self.id().to_string(),
            kind: self.kind().to_string(),
        }
    }
}

/// Why a document failed to decode, with the line inside the document when
/// the YAML parser reports one
#[derive(Debug)]
pub(crate) struct DecodeError {
    pub message: String,
    pub line: Option<usize>,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    fn from_yaml(e: serde_yaml::Error) -> Self {
        Self {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        }
    }
}
