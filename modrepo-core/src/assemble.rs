//! Catalog assembly: author resolution, auxiliary-manifest extraction,
//! latest-by-kind selection and module construction.
//!
//! Everything here is pure: the module validator hands over the raw record
//! and the accepted releases, and gets back the finished catalog entry.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::markdown::render_markdown;
use crate::models::{epoch, AcceptedRelease, Author, Module, RawRepository};

/// Base URL for collaborator profile links.
pub const PLATFORM_URL: &str = "https://github.com";

/// Upper bound on the summary length after ellipsization.
pub const SUMMARY_LIMIT: usize = 512;

struct ResolvedAuthor {
    name: String,
    link: String,
    login: Option<String>,
}

enum ManifestAction {
    Add,
    Remove,
    Ignore,
}

/// Collaborators first, then the manifest's `additionalAuthors` edits.
/// Survivor order is preserved; duplicate names are rejected silently with
/// the first occurrence winning.
fn resolve_authors(raw: &RawRepository, manifest: &Value) -> Vec<Author> {
    let mut authors: Vec<ResolvedAuthor> = Vec::new();
    for collaborator in &raw.collaborators {
        let Some(login) = collaborator.login.clone() else {
            continue;
        };
        let name = collaborator
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| login.clone());
        if authors.iter().any(|author| author.name == name) {
            continue;
        }
        authors.push(ResolvedAuthor {
            name,
            link: format!("{PLATFORM_URL}/{login}"),
            login: Some(login),
        });
    }

    if let Some(additional) = manifest.get("additionalAuthors").and_then(Value::as_array) {
        for entry in additional {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let action = match entry.get("type") {
                None | Some(Value::Null) => ManifestAction::Add,
                Some(Value::String(kind)) if kind == "add" => ManifestAction::Add,
                Some(Value::String(kind)) if kind == "remove" => ManifestAction::Remove,
                Some(_) => ManifestAction::Ignore,
            };
            match action {
                ManifestAction::Remove => {
                    authors.retain(|author| {
                        author.name != name && author.login.as_deref() != Some(name)
                    });
                }
                ManifestAction::Add => {
                    if authors.iter().any(|author| author.name == name) {
                        continue;
                    }
                    let link = entry
                        .get("link")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    authors.push(ResolvedAuthor {
                        name: name.to_string(),
                        link,
                        login: None,
                    });
                }
                ManifestAction::Ignore => {}
            }
        }
    }

    authors
        .into_iter()
        .map(|author| Author {
            name: author.name,
            link: author.link,
        })
        .collect()
}

/// Parses the auxiliary manifest text; anything but a JSON object yields an
/// empty extraction without failing the module.
fn parse_manifest(raw: &RawRepository) -> Value {
    let parsed = raw
        .metadata
        .as_deref()
        .and_then(|text| serde_json::from_str::<Value>(text).ok());
    match parsed {
        Some(value @ Value::Object(_)) => value,
        Some(_) => {
            debug!(
                repo = raw.name.as_deref().unwrap_or(""),
                "Auxiliary manifest is not a JSON object; ignoring"
            );
            Value::Object(Default::default())
        }
        None => Value::Object(Default::default()),
    }
}

fn ellipsize(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn extract_summary(manifest: &Value) -> Option<String> {
    let summary = manifest.get("summary").and_then(Value::as_str)?;
    Some(ellipsize(summary.trim(), SUMMARY_LIMIT).trim().to_string())
}

fn extract_source_url(manifest: &Value) -> Option<String> {
    let url = manifest.get("sourceUrl").and_then(Value::as_str)?;
    Some(url.replace(['\r', '\n'], "").trim().to_string())
}

fn extract_metamodule(manifest: &Value) -> bool {
    matches!(manifest.get("metamodule"), Some(Value::Bool(true)))
}

fn snapshot_name(name: &str) -> bool {
    Regex::new(r"(?i)^(snapshot|nightly)")
        .expect("snapshot name pattern is valid")
        .is_match(name)
}

struct LatestPointers<'a> {
    latest: Option<&'a AcceptedRelease>,
    beta: Option<&'a AcceptedRelease>,
    snapshot: Option<&'a AcceptedRelease>,
}

/// Selects the latest stable, beta and snapshot releases. `releases` is in
/// data-source order, newest first, so "first match" means "most recent".
fn select_latest(releases: &[AcceptedRelease]) -> LatestPointers<'_> {
    let latest = releases.iter().find(|release| !release.is_prerelease);
    let beta = releases
        .iter()
        .find(|release| release.is_prerelease && !snapshot_name(&release.name))
        .or(latest);
    let snapshot = releases
        .iter()
        .find(|release| release.is_prerelease && snapshot_name(&release.name))
        .or(beta);
    LatestPointers {
        latest,
        beta,
        snapshot,
    }
}

/// Builds the catalog entry for an accepted repository.
pub fn build_module(raw: &RawRepository, releases: Vec<AcceptedRelease>) -> Module {
    let manifest = parse_manifest(raw);
    let authors = resolve_authors(raw, &manifest);

    let (latest_name, latest_time, beta_time, snapshot_time) = {
        let pointers = select_latest(&releases);
        (
            pointers.latest.map(|release| release.name.clone()),
            pointers
                .latest
                .map(|release| release.published_at)
                .unwrap_or_else(epoch),
            pointers
                .beta
                .map(|release| release.published_at)
                .unwrap_or_else(epoch),
            pointers
                .snapshot
                .map(|release| release.published_at)
                .unwrap_or_else(epoch),
        )
    };

    let readme = raw
        .readme
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let readme_html = readme.as_deref().map(render_markdown);

    let name = raw.name.clone().unwrap_or_default();
    Module {
        module_id: name.clone(),
        module_name: raw.description.clone().unwrap_or_default(),
        url: raw
            .url
            .clone()
            .unwrap_or_else(|| format!("{PLATFORM_URL}/{name}")),
        homepage: raw.homepage_url.clone().filter(|url| !url.is_empty()),
        authors,
        latest_release: latest_name,
        latest_release_time: latest_time,
        latest_beta_release_time: beta_time,
        latest_snapshot_release_time: snapshot_time,
        releases,
        readme,
        readme_html,
        summary: extract_summary(&manifest),
        source_url: extract_source_url(&manifest),
        created_at: raw.created_at.unwrap_or_else(epoch),
        updated_at: raw.updated_at.unwrap_or_else(epoch),
        stargazer_count: raw.stargazer_count,
        metamodule: extract_metamodule(&manifest),
    }
}
