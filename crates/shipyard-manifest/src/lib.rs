//! Shipyard Manifest - multi-document manifests and in-place image updates
//!
//! This crate turns a YAML manifest stream into typed resources and rewrites
//! container images without reformatting the documents:
//! - `multidoc`: stream splitting and the `namespace:kind/name` index
//! - `resource` / `release`: the resource model and the `Workload` capability
//! - `span` / `patch`: byte-level location and replacement of scalars
//! - `diff`: line diffs of rewritten documents

pub mod config;
pub mod diff;
pub mod error;
pub mod multidoc;
pub mod patch;
pub mod release;
pub mod resource;
pub mod span;

pub use config::{CONFIG_API_VERSION, DEFAULT_NAMESPACE, DEFAULT_RELEASE_KINDS, ManifestConfig};
pub use diff::{DiffLine, LineType, ManifestDiff};
pub use error::{ManifestError, Result};
pub use multidoc::{
    ResourceSet, parse_multidoc, parse_multidoc_with, update_container_image,
    update_container_image_with,
};
pub use release::HelmRelease;
pub use resource::{GenericResource, ObjectMeta, Origin, Resource, ResourceId, Workload};

pub use shipyard_core::{Container, Image, ImageShape, RELEASE_CONTAINER_NAME, Values};
