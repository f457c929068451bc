///
/// This module implements the CLI interface for modcat: command parsing, argument
/// handling and the async entrypoint shared by `main` and the integration tests.
///
/// All business logic (forge access, resolution, catalog and maintenance) lives in
/// the [`modcat-core`] crate; this module is strictly glue.
///
/// ## Commands
/// - `build`: enumerate an account's repositories and write the module catalog.
/// - `commit`: prune oversized modules, upgrade the mirror, commit the tree.
///
/// [`modcat-core`]: ../../modcat-core/
use crate::load_config::resolve_build_config;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use modcat_core::catalog::{build_catalog, write_catalog};
use modcat_core::github::GithubClient;
use modcat_core::maintenance::{SystemRunner, Workspace};
use std::path::PathBuf;

/// CLI for modcat: build module catalogs from forge repositories.
#[derive(Parser)]
#[clap(
    name = "modcat",
    version,
    about = "Aggregate module descriptors from a forge account into a module catalog"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the module catalog for a user or organization
    Build(BuildArgs),
    /// Prune oversized modules, run the mirror upgrade and commit the working tree
    Commit {
        /// Working directory of the mirror
        #[clap(short = 'D', long, default_value = ".")]
        directory: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// User or organization name
    #[clap(short, long, value_name = "NAME")]
    pub user: Option<String>,

    /// Path to write the catalog to
    #[clap(short, long, value_name = "PATH")]
    pub write: Option<PathBuf>,

    /// Forge access token (defaults to $GITHUB_TOKEN)
    #[clap(short, long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Optional YAML config file
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Repositories resolved concurrently
    #[clap(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build(args) => {
            let config = resolve_build_config(&args)?;
            tracing::info!(command = "build", account = %config.account, "Starting catalog build");
            let client = GithubClient::new(config.forge.clone(), &config.token)
                .context("Failed to construct forge client")?;
            let catalog = build_catalog(&client, &config.account, config.concurrency)
                .await
                .map_err(|e| {
                    tracing::error!(command = "build", error = %e, "Catalog build failed");
                    anyhow::Error::new(e)
                })?;
            write_catalog(&catalog, &config.output)?;
            tracing::info!(
                command = "build",
                modules = catalog.modules.len(),
                output = %config.output.display(),
                "Catalog build complete"
            );
            Ok(())
        }
        Commands::Commit { directory } => {
            tracing::info!(command = "commit", directory = %directory.display(), "Starting mirror commit");
            let message = tokio::task::spawn_blocking(move || {
                Workspace::new(directory, SystemRunner).run()
            })
            .await
            .context("Commit task panicked")?
            .map_err(|e| {
                tracing::error!(command = "commit", error = %e, "Mirror commit failed");
                anyhow::Error::new(e)
            })?;
            tracing::info!(command = "commit", message = %message, "Mirror commit complete");
            Ok(())
        }
    }
}
