//! Set-image command - point one container at a new image

use console::style;
use shipyard_manifest::{Image, ManifestConfig, ManifestDiff, ManifestError, ResourceId};
use std::path::Path;

use crate::display::print_diff;
use crate::error::{CliError, Result};

use super::load_manifest;

/// Lines of context around each change in `--dry-run` output
const DIFF_CONTEXT: usize = 3;

/// What to change the container to
#[derive(Debug, Clone)]
pub enum Target {
    /// A complete reference
    Image(String),
    /// A new tag on the current repository
    Tag(String),
}

pub fn run(
    file: &Path,
    config: &ManifestConfig,
    resource: &str,
    container: &str,
    target: Target,
    dry_run: bool,
) -> Result<()> {
    let id: ResourceId = resource.parse()?;
    let (data, mut set) = load_manifest(file, config)?;

    let key = id.to_string();
    let current = set
        .get_by_id(&id)
        .ok_or_else(|| ManifestError::ResourceNotFound { id: key.clone() })?
        .containers()?
        .into_iter()
        .find(|c| c.name == container)
        .ok_or_else(|| ManifestError::ContainerNotFound {
            container: container.to_string(),
            resource: key.clone(),
        })?;

    let image = match target {
        Target::Image(reference) => Image::parse(&reference)?,
        Target::Tag(tag) => {
            if tag.trim().is_empty() || tag.contains([':', '@', '/']) {
                return Err(CliError::input(format!("'{}' is not a valid tag", tag)));
            }
            current.image.with_new_tag(tag.trim())
        }
    };

    if image == current.image {
        println!(
            "{} {} in {} is already {}",
            style("✓").green(),
            container,
            key,
            image
        );
        return Ok(());
    }

    // load_manifest already rejected non-UTF-8 input, so this borrows
    let original = String::from_utf8_lossy(&data);
    let updated = set.rewrite_container_image(&original, &id, container, &image)?;

    if dry_run {
        let diff = ManifestDiff::compute(&original, &updated);
        println!(
            "{} {} {} → {} (dry run, {} not written)",
            style("→").blue(),
            container,
            current.image,
            image,
            file.display()
        );
        print_diff(&diff, DIFF_CONTEXT);
        return Ok(());
    }

    std::fs::write(file, &updated).map_err(|e| CliError::io(file, e))?;
    tracing::debug!(file = %file.display(), resource = %key, container, "wrote manifest");

    println!(
        "{} {} in {}: {} → {}",
        style("✓").green(),
        container,
        key,
        current.image,
        image
    );

    Ok(())
}
