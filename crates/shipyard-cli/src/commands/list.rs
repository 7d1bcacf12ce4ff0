//! List command - show the resources of a manifest file

use console::style;
use miette::{IntoDiagnostic, WrapErr};
use shipyard_manifest::ManifestConfig;
use std::path::Path;

use crate::error::Result;

use super::load_manifest;

pub fn run(file: &Path, config: &ManifestConfig, json_output: bool) -> Result<()> {
    let (_, set) = load_manifest(file, config)?;

    if json_output {
        let resources: Vec<_> = set
            .iter()
            .map(|(key, resource)| {
                serde_json::json!({
                    "id": key,
                    "apiVersion": resource.api_version(),
                    "kind": resource.kind(),
                    "namespace": resource.namespace(),
                    "name": resource.name(),
                    "workload": resource.is_workload(),
                    "document": resource.origin().document,
                    "line": resource.origin().line,
                })
            })
            .collect();
        let json = serde_json::to_string_pretty(&resources)
            .into_diagnostic()
            .wrap_err("Failed to serialize resources")?;
        println!("{}", json);
        return Ok(());
    }

    if set.is_empty() {
        println!("No resources found in {}", file.display());
        return Ok(());
    }

    println!("{:<50} {:<20} {:<8} WORKLOAD", "RESOURCE", "KIND", "LINE");
    for (key, resource) in &set {
        let workload = if resource.is_workload() {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };
        println!(
            "{:<50} {:<20} {:<8} {}",
            key,
            resource.kind(),
            resource.origin().line,
            workload
        );
    }

    println!();
    println!(
        "{} resource(s), {} workload(s)",
        set.len(),
        set.workloads().count()
    );

    Ok(())
}
