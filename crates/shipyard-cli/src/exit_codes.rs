//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Manifest error - a document could not be parsed or indexed
pub const MANIFEST_ERROR: i32 = 2;

/// Not found - the resource or container does not exist
pub const NOT_FOUND: i32 = 3;

/// Patch error - the image could not be written back into the manifest
pub const PATCH_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Config error - the configuration file is invalid
pub const CONFIG_ERROR: i32 = 78;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
