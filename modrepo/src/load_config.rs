//! Configuration loading: a static YAML file (no secrets) merged with the
//! environment.
//!
//! The YAML file is optional and every key has a default, so a bare
//! `modrepo sync` works against the default organization. Secrets and mode
//! selection come from the environment: `GRAPHQL_TOKEN` is required and
//! checked before any network I/O, `REPO` (either `owner/name` or bare
//! `name`) selects the incremental target.
//!
//! ```yaml
//! organization: modules-repo
//! cache_dir: cache
//! repo_concurrency: 20
//! release_concurrency: 100
//! require_versioned_tags: false
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use modrepo_core::config::PipelineConfig;
use serde::Deserialize;
use tracing::{error, info};

/// Fully merged runtime settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    /// Platform API token, kept out of `PipelineConfig` on purpose.
    pub token: String,
    /// Incremental target from the `REPO` environment variable.
    pub target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StaticConfig {
    organization: Option<String>,
    cache_dir: Option<PathBuf>,
    repo_concurrency: Option<usize>,
    release_concurrency: Option<usize>,
    require_versioned_tags: Option<bool>,
}

/// Loads the optional YAML config and injects required env vars for secrets.
/// Returns fully merged settings or an error.
pub fn load_config(path: Option<&Path>, cache_dir_override: Option<PathBuf>) -> Result<Settings> {
    let static_conf = match path {
        Some(path) => {
            info!(config_path = ?path, "Loading configuration from file");
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    error!(error = ?e, config_path = ?path, "Failed to read config file");
                    return Err(anyhow::anyhow!(
                        "Failed to read config file {:?}: {}",
                        path,
                        e
                    ));
                }
            };
            match serde_yaml::from_str::<StaticConfig>(&content) {
                Ok(conf) => {
                    info!(config_path = ?path, "Parsed config YAML successfully");
                    conf
                }
                Err(e) => {
                    error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
                    return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
                }
            }
        }
        None => StaticConfig::default(),
    };

    let token = match std::env::var("GRAPHQL_TOKEN") {
        Ok(token) if !token.is_empty() => token,
        _ => {
            error!("GRAPHQL_TOKEN environment variable not set");
            anyhow::bail!("GRAPHQL_TOKEN environment variable not set");
        }
    };

    let target = std::env::var("REPO").ok().filter(|repo| !repo.is_empty());
    if let Some(target) = &target {
        info!(repo = %target, "REPO set; incremental mode selected when a catalog exists");
    }

    let mut pipeline = PipelineConfig::default();
    if let Some(organization) = static_conf.organization {
        pipeline.organization = organization;
    }
    if let Some(cache_dir) = static_conf.cache_dir {
        pipeline.cache_dir = cache_dir;
    }
    if let Some(repo_concurrency) = static_conf.repo_concurrency {
        pipeline.repo_concurrency = repo_concurrency;
    }
    if let Some(release_concurrency) = static_conf.release_concurrency {
        pipeline.release_concurrency = release_concurrency;
    }
    if let Some(require_versioned_tags) = static_conf.require_versioned_tags {
        pipeline.require_versioned_tags = require_versioned_tags;
    }
    if let Some(cache_dir) = cache_dir_override {
        pipeline.cache_dir = cache_dir;
    }

    info!(
        organization = %pipeline.organization,
        cache_dir = %pipeline.cache_dir.display(),
        "Config loaded successfully"
    );

    Ok(Settings {
        pipeline,
        token,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_token_is_rejected_before_any_network_io() {
        std::env::remove_var("GRAPHQL_TOKEN");
        let error = load_config(None, None).expect_err("token is required");
        assert!(error.to_string().contains("GRAPHQL_TOKEN"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_defaults_and_cli_overrides_yaml() {
        std::env::set_var("GRAPHQL_TOKEN", "token");
        std::env::remove_var("REPO");

        let file = tempfile::NamedTempFile::new().expect("temp config");
        std::fs::write(
            file.path(),
            "organization: my-org\ncache_dir: /tmp/somewhere\nrepo_concurrency: 5\n",
        )
        .expect("write config");

        let settings = load_config(Some(file.path()), Some(PathBuf::from("/tmp/override")))
            .expect("config loads");
        assert_eq!(settings.pipeline.organization, "my-org");
        assert_eq!(settings.pipeline.repo_concurrency, 5);
        assert_eq!(settings.pipeline.release_concurrency, 100);
        assert_eq!(settings.pipeline.cache_dir, PathBuf::from("/tmp/override"));
        assert!(settings.target.is_none());

        std::env::remove_var("GRAPHQL_TOKEN");
    }

    #[test]
    #[serial]
    fn repo_env_selects_the_incremental_target() {
        std::env::set_var("GRAPHQL_TOKEN", "token");
        std::env::set_var("REPO", "owner/foo.bar");

        let settings = load_config(None, None).expect("config loads");
        assert_eq!(settings.target.as_deref(), Some("owner/foo.bar"));

        std::env::remove_var("GRAPHQL_TOKEN");
        std::env::remove_var("REPO");
    }
}
