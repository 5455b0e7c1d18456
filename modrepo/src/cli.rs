/// This module implements the full CLI interface for modrepo: command
/// parsing, argument validation, main entrypoints, and user-visible
/// invocations.
///
/// All core business logic (data models, validation, assembly) lives in the
/// `modrepo-core` crate. This module is strictly for CLI glue, ergonomic
/// argument exposure, and orchestration.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - Subcommand routing (e.g., `sync`) and argument validation.
/// - Async entrypoint (`run`) for programmatic invocation and integration
///   testing.
///
/// ## How To Use
/// - For command-line users: use the installed `modrepo` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modrepo_core::github::GithubClient;
use modrepo_core::pipeline;
use modrepo_core::props::RunzipProbe;

use crate::load_config::load_config;

/// CLI for modrepo: build and publish the module catalog.
#[derive(Parser)]
#[clap(
    name = "modrepo",
    version,
    about = "Ingest a module organization, validate releases and assemble the catalog"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the catalog, or update a single repository when REPO is set
    /// and a prior catalog exists
    Sync {
        /// Path to the optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Overrides the cache directory from the config file
        #[clap(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, cache_dir } => {
            let settings = load_config(config.as_deref(), cache_dir)?;
            tracing::info!(command = "sync", "Starting catalog synchronisation");

            let client =
                GithubClient::new(settings.token.clone(), settings.pipeline.organization.clone())
                    .map_err(|e| {
                        anyhow::Error::msg(format!("Failed to construct platform client: {e:?}"))
                    })?;
            let probe = RunzipProbe::new();

            match pipeline::run(
                &client,
                &probe,
                &client,
                &settings.pipeline,
                settings.target.as_deref(),
            )
            .await
            {
                Ok(report) => {
                    for skipped in &report.skipped {
                        tracing::warn!(
                            repo = %skipped.repo_name,
                            reason = skipped.skip.reason.code(),
                            "Repository skipped"
                        );
                    }
                    tracing::info!(
                        command = "sync",
                        modules = report.modules,
                        skipped = report.skipped.len(),
                        "Catalog synchronisation complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Catalog synchronisation failed");
                    Err(anyhow::anyhow!("Synchronisation failed: {e}"))
                }
            }
        }
    }
}
