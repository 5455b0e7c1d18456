//! Pipeline configuration: organization, cache layout and concurrency caps.
//!
//! The binary crate assembles this from its YAML file and environment; core
//! code only ever reads it. Secrets (the platform token) never live here;
//! they stay inside the platform client.

use std::path::PathBuf;

use tracing::info;

/// Default cap on concurrently validated repositories.
pub const DEFAULT_REPO_CONCURRENCY: usize = 20;

/// Default cap on concurrently probed releases within one repository.
pub const DEFAULT_RELEASE_CONCURRENCY: usize = 100;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hosting-platform organization whose repositories are ingested.
    pub organization: String,
    /// Directory holding the pagination snapshot and the catalog file.
    pub cache_dir: PathBuf,
    pub repo_concurrency: usize,
    pub release_concurrency: usize,
    /// When set, the release pre-filter additionally requires tags shaped
    /// like `<versionCode>-<version>` (e.g. `42-v1.2`).
    pub require_versioned_tags: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            organization: "modules-repo".to_string(),
            cache_dir: PathBuf::from("cache"),
            repo_concurrency: DEFAULT_REPO_CONCURRENCY,
            release_concurrency: DEFAULT_RELEASE_CONCURRENCY,
            require_versioned_tags: false,
        }
    }
}

impl PipelineConfig {
    /// Pretty-printed snapshot of the raw pagination responses.
    pub fn graphql_path(&self) -> PathBuf {
        self.cache_dir.join("graphql.json")
    }

    /// Minified catalog consumed by the site generator.
    pub fn catalog_path(&self) -> PathBuf {
        self.cache_dir.join("modules.json")
    }

    pub fn trace_loaded(&self) {
        info!(
            organization = %self.organization,
            cache_dir = %self.cache_dir.display(),
            repo_concurrency = self.repo_concurrency,
            release_concurrency = self.release_concurrency,
            require_versioned_tags = self.require_versioned_tags,
            "Loaded PipelineConfig"
        );
    }
}
