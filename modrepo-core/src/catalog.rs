//! The on-disk catalog: ordering, merge and atomic persistence.
//!
//! The catalog file is the only durable shared resource in the system. A
//! downstream site generator may read it while an incremental update runs,
//! so every write goes to a temp file in the target directory followed by a
//! rename.

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::models::Module;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sorts modules for publication: most recent release activity first, ties
/// keep their incoming order. Modules without any release timestamp all sit
/// at epoch zero and therefore sink to the end together.
pub fn sort_modules(modules: &mut [Module]) {
    modules.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
}

/// Replaces the entry with the same module id, or prepends when absent.
pub fn upsert_module(modules: &mut Vec<Module>, module: Module) {
    match modules
        .iter()
        .position(|existing| existing.module_id == module.module_id)
    {
        Some(index) => modules[index] = module,
        None => modules.insert(0, module),
    }
}

pub fn load_catalog(path: &Path) -> Result<Vec<Module>, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Temp-file + rename write so a concurrent reader never observes a partial
/// file. The temp file lives in the target directory to stay on the same
/// filesystem.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CatalogError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CatalogError::Io(e.error))?;
    debug!(path = %path.display(), bytes = data.len(), "Wrote file atomically");
    Ok(())
}

/// Writes the minified catalog consumed by the site generator.
pub fn write_catalog(path: &Path, modules: &[Module]) -> Result<(), CatalogError> {
    let json = serde_json::to_vec(modules)?;
    write_atomic(path, &json)?;
    info!(path = %path.display(), modules = modules.len(), "Catalog written");
    Ok(())
}

/// Writes the pretty-printed snapshot of the raw pagination responses.
pub fn write_snapshot(path: &Path, pages: &[Value]) -> Result<(), CatalogError> {
    let json = serde_json::to_vec_pretty(pages)?;
    write_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::epoch;
    use chrono::{DateTime, Utc};

    fn module(id: &str, latest: &str) -> Module {
        let time: DateTime<Utc> = latest.parse().expect("timestamp");
        Module {
            module_id: id.to_string(),
            module_name: id.to_uppercase(),
            url: String::new(),
            homepage: None,
            authors: Vec::new(),
            latest_release: None,
            latest_release_time: time,
            latest_beta_release_time: epoch(),
            latest_snapshot_release_time: epoch(),
            releases: Vec::new(),
            readme: None,
            readme_html: None,
            summary: None,
            source_url: None,
            created_at: epoch(),
            updated_at: epoch(),
            stargazer_count: 0,
            metamodule: false,
        }
    }

    #[test]
    fn sorts_descending_by_newest_pointer() {
        let mut modules = vec![
            module("old", "2023-01-01T00:00:00Z"),
            module("new", "2024-06-01T00:00:00Z"),
            module("mid", "2024-01-01T00:00:00Z"),
        ];
        sort_modules(&mut modules);
        let ids: Vec<&str> = modules.iter().map(|m| m.module_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn sort_is_stable_for_epoch_ties() {
        let mut modules = vec![
            module("first", "1970-01-01T00:00:00Z"),
            module("active", "2024-01-01T00:00:00Z"),
            module("second", "1970-01-01T00:00:00Z"),
        ];
        sort_modules(&mut modules);
        let ids: Vec<&str> = modules.iter().map(|m| m.module_id.as_str()).collect();
        assert_eq!(ids, vec!["active", "first", "second"]);
    }

    #[test]
    fn upsert_replaces_in_place_or_prepends() {
        let mut modules = vec![
            module("a", "2024-01-01T00:00:00Z"),
            module("b", "2024-02-01T00:00:00Z"),
        ];

        let mut replacement = module("a", "2024-03-01T00:00:00Z");
        replacement.module_name = "Replaced".into();
        upsert_module(&mut modules, replacement);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].module_name, "Replaced");

        upsert_module(&mut modules, module("c", "2024-04-01T00:00:00Z"));
        assert_eq!(modules.len(), 3);
        assert_eq!(modules[0].module_id, "c");
    }

    #[test]
    fn catalog_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("modules.json");
        let modules = vec![module("a", "2024-01-01T00:00:00Z")];

        write_catalog(&path, &modules).expect("write");
        let loaded = load_catalog(&path).expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].module_id, "a");
        assert_eq!(loaded[0].latest_release_time, modules[0].latest_release_time);

        // Minified output: no indentation newlines.
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("file.json");
        write_atomic(&path, b"old").expect("first write");
        write_atomic(&path, b"new").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "new");
    }
}
