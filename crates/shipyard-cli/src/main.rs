//! Shipyard CLI - inspect and update container images in release manifests

use clap::{Parser, Subcommand};
use shipyard_manifest::ManifestConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(author = "Shipyard Contributors")]
#[command(version)]
#[command(about = "Inspect and update container images in GitOps release manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.config/shipyard/config.yaml)
    #[arg(long, global = true, env = "SHIPYARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resources of a manifest file
    List {
        /// Manifest file
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the containers of release resources
    Containers {
        /// Manifest file
        file: PathBuf,

        /// Only this resource (<namespace>:<kind>/<name>)
        #[arg(short, long)]
        resource: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point a container at a new image, rewriting the file in place
    SetImage {
        /// Manifest file
        file: PathBuf,

        /// Resource to update (<namespace>:<kind>/<name>)
        #[arg(short, long)]
        resource: String,

        /// Container name (`chart-image` for the top-level image)
        #[arg(short, long)]
        container: String,

        /// Full image reference
        #[arg(long, conflicts_with = "tag", required_unless_present = "tag")]
        image: Option<String>,

        /// Keep the repository, change only the tag
        #[arg(long)]
        tag: Option<String>,

        /// Print the diff instead of writing the file
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ManifestConfig> {
    let config = match path {
        Some(path) => ManifestConfig::load_from(path).map_err(|e| match e {
            shipyard_manifest::ManifestError::Io(io) => CliError::io(path, io),
            other => other.into(),
        })?,
        None => ManifestConfig::load()?,
    };
    tracing::debug!(
        namespace = %config.default_namespace,
        release_kinds = ?config.release_kinds,
        "loaded configuration"
    );
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::List { file, json } => commands::list::run(&file, &config, json),

        Commands::Containers {
            file,
            resource,
            json,
        } => commands::containers::run(&file, &config, resource.as_deref(), json),

        Commands::SetImage {
            file,
            resource,
            container,
            image,
            tag,
            dry_run,
        } => {
            let target = match (image, tag) {
                (Some(image), None) => commands::set_image::Target::Image(image),
                (None, Some(tag)) => commands::set_image::Target::Tag(tag),
                _ => return Err(CliError::input("exactly one of --image or --tag is required")),
            };
            commands::set_image::run(&file, &config, &resource, &container, target, dry_run)
        }
    }
}
