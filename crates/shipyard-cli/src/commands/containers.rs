//! Containers command - show the containers discovered in release values

use console::style;
use miette::{IntoDiagnostic, WrapErr};
use shipyard_manifest::{Container, ManifestConfig, ManifestError, Resource, ResourceId};
use std::path::Path;

use crate::display::shape_label;
use crate::error::Result;

use super::load_manifest;

pub fn run(
    file: &Path,
    config: &ManifestConfig,
    resource: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let (_, set) = load_manifest(file, config)?;

    let selected: Vec<&Resource> = match resource {
        Some(id) => {
            let id: ResourceId = id.parse()?;
            let resource = set
                .get_by_id(&id)
                .ok_or_else(|| ManifestError::ResourceNotFound { id: id.to_string() })?;
            vec![resource]
        }
        None => set.iter().map(|(_, r)| r).filter(|r| r.is_workload()).collect(),
    };

    let mut found: Vec<(&Resource, Vec<Container>)> = Vec::with_capacity(selected.len());
    for resource in selected {
        found.push((resource, resource.containers()?));
    }

    if json_output {
        let entries: Vec<_> = found
            .iter()
            .flat_map(|(resource, containers)| {
                containers.iter().map(move |c| {
                    serde_json::json!({
                        "resource": resource.id().to_string(),
                        "container": c.name,
                        "image": c.image.to_string(),
                        "repository": c.image.repository(),
                        "tag": c.image.tag(),
                        "shape": c.shape,
                    })
                })
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries)
            .into_diagnostic()
            .wrap_err("Failed to serialize containers")?;
        println!("{}", json);
        return Ok(());
    }

    if found.is_empty() {
        println!("No release resources found in {}", file.display());
        return Ok(());
    }

    for (resource, containers) in &found {
        println!("{}", style(resource.id()).bold());
        if containers.is_empty() {
            println!("  {}", style("(no images in values)").dim());
        }
        for c in containers {
            println!(
                "  {:<24} {:<50} {}",
                c.name,
                c.image,
                style(shape_label(c.shape)).dim()
            );
        }
    }

    Ok(())
}
