//! Shipyard Core - value types for reading release manifests
//!
//! This crate provides the pieces that do not depend on where a manifest came from:
//! - `Image`: container image references (`repository[:tag]`)
//! - `Values`: ordered, schema-less release values
//! - `containers`: discovery of the container images a values document defines

pub mod containers;
pub mod error;
pub mod image;
pub mod values;

pub use containers::{Container, FieldPath, ImageShape, Locator, RELEASE_CONTAINER_NAME, discover};
pub use error::{CoreError, Result};
pub use image::Image;
pub use values::Values;
