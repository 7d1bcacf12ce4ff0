//! Display formatting for CLI output

use console::style;
use shipyard_manifest::{ImageShape, ManifestDiff};

/// How the image is written in the values, for the containers table
pub fn shape_label(shape: ImageShape) -> &'static str {
    match shape {
        ImageShape::Bare => "image",
        ImageShape::WithTag => "image + tag",
        ImageShape::Nested => "image.repository + image.tag",
    }
}

/// Print unified diff hunks, colored by line type
pub fn print_diff(diff: &ManifestDiff, context: usize) {
    if !diff.has_changes() {
        println!("  {}", style("(no changes)").dim());
        return;
    }

    for line in diff.render_unified(context).lines() {
        let styled = if line.starts_with("@@") {
            style(line).cyan()
        } else if line.starts_with('+') {
            style(line).green()
        } else if line.starts_with('-') {
            style(line).red()
        } else {
            style(line).dim()
        };
        println!("{}", styled);
    }

    println!(
        "{} addition(s), {} deletion(s)",
        diff.added(),
        diff.removed()
    );
}
