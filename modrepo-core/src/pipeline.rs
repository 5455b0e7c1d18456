//! Orchestration: full rebuild and incremental single-repository update
//! over the shared on-disk catalog.
//!
//! Full mode pages the whole organization, validates repositories under the
//! outer bounded mapper and rebuilds the catalog from scratch; failures are
//! dropped silently (logged, reported, never notified). Incremental mode
//! fetches exactly one repository, merges it into the existing catalog, and
//! on failure dispatches the author notification before surfacing the error
//! to the caller.

use tracing::{error, info, warn};

use crate::catalog::{self, CatalogError};
use crate::config::PipelineConfig;
use crate::contract::{ArchiveProbe, PlatformRest, RepoSource, SourceError};
use crate::mapper::map_bounded;
use crate::models::{Module, RawRepository};
use crate::notify::notify_skip;
use crate::skip::SkipInfo;
use crate::validate::validate_repository;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("platform listing failed: {0}")]
    Source(SourceError),
    #[error("repository {0} was not found on the platform")]
    MissingRepository(String),
    #[error("module {repo} failed validation: {}", .skip.reason.message())]
    Skipped { repo: String, skip: SkipInfo },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What a run did, for the caller's logs.
#[derive(Debug)]
pub struct BuildReport {
    pub modules: usize,
    pub skipped: Vec<SkippedRepository>,
}

#[derive(Debug)]
pub struct SkippedRepository {
    pub repo_name: String,
    pub skip: SkipInfo,
}

/// Entry point shared by both modes. `target` carries the `REPO` selection
/// (`owner/name` or bare `name`); incremental mode additionally requires a
/// previously written catalog, otherwise the run falls back to a full
/// rebuild.
pub async fn run<S, P, R>(
    source: &S,
    probe: &P,
    rest: &R,
    config: &PipelineConfig,
    target: Option<&str>,
) -> Result<BuildReport, PipelineError>
where
    S: RepoSource,
    P: ArchiveProbe,
    R: PlatformRest,
{
    config.trace_loaded();
    match target {
        Some(target) if config.catalog_path().exists() => {
            let name = target.rsplit('/').next().unwrap_or(target);
            run_incremental(source, probe, rest, config, name).await
        }
        Some(target) => {
            info!(repo = target, "No existing catalog; falling back to a full rebuild");
            run_full(source, probe, config).await
        }
        None => run_full(source, probe, config).await,
    }
}

/// Full rebuild: page the listing, validate everything, write both cache
/// files. A failing repository never aborts its peers.
pub async fn run_full<S, P>(
    source: &S,
    probe: &P,
    config: &PipelineConfig,
) -> Result<BuildReport, PipelineError>
where
    S: RepoSource,
    P: ArchiveProbe,
{
    info!(organization = %config.organization, "Starting full catalog rebuild");

    let mut pages = Vec::new();
    let mut repositories: Vec<RawRepository> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = source
            .fetch_page(cursor.clone())
            .await
            .map_err(PipelineError::Source)?;
        info!(
            repositories = page.repositories.len(),
            has_next = page.has_next_page,
            "Fetched listing page"
        );
        pages.push(page.raw);
        repositories.extend(page.repositories);
        if !page.has_next_page {
            break;
        }
        cursor = page.end_cursor;
        if cursor.is_none() {
            warn!("Listing claimed another page but returned no cursor; stopping");
            break;
        }
    }

    catalog::write_snapshot(&config.graphql_path(), &pages)?;

    let outcomes = map_bounded(repositories.iter(), config.repo_concurrency, |repo| {
        async move { (repo, validate_repository(repo, probe, config).await) }
    })
    .await;

    let mut modules: Vec<Module> = Vec::new();
    let mut skipped = Vec::new();
    for (repo, outcome) in outcomes {
        let repo_name = repo.name.clone().unwrap_or_default();
        match outcome {
            Ok(module) => modules.push(module),
            Err(skip) => {
                warn!(repo = %repo_name, reason = skip.reason.code(), "Repository skipped");
                skipped.push(SkippedRepository { repo_name, skip });
            }
        }
    }

    catalog::sort_modules(&mut modules);
    catalog::write_catalog(&config.catalog_path(), &modules)?;

    Ok(BuildReport {
        modules: modules.len(),
        skipped,
    })
}

/// Incremental update: one repository in, one catalog entry replaced. A
/// validation failure is fatal here and may notify the author.
pub async fn run_incremental<S, P, R>(
    source: &S,
    probe: &P,
    rest: &R,
    config: &PipelineConfig,
    name: &str,
) -> Result<BuildReport, PipelineError>
where
    S: RepoSource,
    P: ArchiveProbe,
    R: PlatformRest,
{
    info!(repo = name, "Starting incremental catalog update");

    let raw = source
        .fetch_repository(name.to_string())
        .await
        .map_err(PipelineError::Source)?;
    let Some(raw) = raw else {
        return Err(PipelineError::MissingRepository(name.to_string()));
    };

    match validate_repository(&raw, probe, config).await {
        Ok(module) => {
            let mut modules = catalog::load_catalog(&config.catalog_path())?;
            catalog::upsert_module(&mut modules, module);
            catalog::sort_modules(&mut modules);
            catalog::write_catalog(&config.catalog_path(), &modules)?;
            Ok(BuildReport {
                modules: modules.len(),
                skipped: Vec::new(),
            })
        }
        Err(skip) => {
            error!(
                repo = name,
                reason = skip.reason.code(),
                message = %skip.reason.message(),
                "Module failed validation"
            );
            if skip.should_notify && skip.tag_name.is_some() {
                notify_skip(rest, name, &skip).await;
            }
            Err(PipelineError::Skipped {
                repo: name.to_string(),
                skip,
            })
        }
    }
}
