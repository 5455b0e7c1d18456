//! Module-level validation: repository acceptance, the release fan-out and
//! the skip decision that drives author notifications.
//!
//! The decision after release processing is the subtle part: authors are
//! notified only when the repository's *current* release is broken. A
//! historically broken release with a good replacement must neither block
//! the module nor ping anyone.

use regex::Regex;
use tracing::{debug, info};

use crate::assemble::build_module;
use crate::config::PipelineConfig;
use crate::contract::ArchiveProbe;
use crate::mapper::map_bounded;
use crate::models::{Module, RawRelease, RawRepository};
use crate::release::{is_eligible, validate_release, ReleaseSkip};
use crate::skip::{SkipInfo, SkipReason};

/// Repository names that can never become catalog modules.
pub const RESERVED_NAMES: [&str; 6] = [
    ".github",
    "submission",
    "developers",
    "modules",
    "org.kernelsu.example",
    "module_release",
];

/// A module identifier starts with a letter, continues with letters,
/// digits, dots, underscores or dashes, and has at least two characters.
fn valid_identifier(name: &str) -> bool {
    Regex::new(r"^[A-Za-z][A-Za-z0-9._-]+$")
        .expect("identifier pattern is valid")
        .is_match(name)
}

/// Validates one repository end to end and assembles its catalog entry.
pub async fn validate_repository<P>(
    raw: &RawRepository,
    probe: &P,
    config: &PipelineConfig,
) -> Result<Module, SkipInfo>
where
    P: ArchiveProbe,
{
    let name = raw.name.clone().unwrap_or_default();

    if RESERVED_NAMES.contains(&name.as_str()) {
        return Err(SkipInfo::notify(
            SkipReason::ReservedName { repo_name: name },
            None,
        ));
    }
    if !valid_identifier(&name) {
        return Err(SkipInfo::notify(
            SkipReason::InvalidName { repo_name: name },
            None,
        ));
    }
    match raw.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => {}
        _ => {
            return Err(SkipInfo::notify(
                SkipReason::NoDescription { repo_name: name },
                None,
            ))
        }
    }

    // The listing's release connection sometimes omits the declared latest
    // release from the first page; fold it back in.
    let mut releases: Vec<RawRelease> = raw.releases.clone();
    if let Some(latest) = &raw.latest_release {
        if let Some(tag) = &latest.tag_name {
            if !releases
                .iter()
                .any(|release| release.tag_name.as_ref() == Some(tag))
            {
                debug!(repo = %name, tag = %tag, "Appending declared latest release to the list");
                releases.push(latest.clone());
            }
        }
    }

    let eligible: Vec<&RawRelease> = releases
        .iter()
        .filter(|release| is_eligible(release, config.require_versioned_tags))
        .collect();
    let eligible_count = eligible.len();

    let repo_url = raw.url.clone().unwrap_or_default();
    let repo_name = name.as_str();
    let url = repo_url.as_str();
    let outcomes = map_bounded(eligible, config.release_concurrency, move |release| {
        async move { validate_release(repo_name, url, release, probe).await }
    })
    .await;

    let mut accepted = Vec::new();
    let mut skips: Vec<ReleaseSkip> = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(release) => accepted.push(release),
            Err(skip) => {
                debug!(
                    repo = %name,
                    tag = %skip.tag_name,
                    reason = skip.reason.code(),
                    "Release rejected"
                );
                skips.push(skip);
            }
        }
    }

    if !accepted.is_empty() {
        info!(repo = %name, releases = accepted.len(), "Repository accepted");
        return Ok(build_module(raw, accepted));
    }

    if eligible_count == 0 {
        // Nothing survived the pre-filter (or there were no releases at
        // all); the author has never shipped an installable release.
        return Err(SkipInfo::notify(SkipReason::NoValidReleases, None));
    }

    let latest_tag = raw
        .latest_release
        .as_ref()
        .and_then(|release| release.tag_name.clone());
    if let Some(tag) = latest_tag {
        if let Some(skip) = skips.iter().find(|skip| skip.tag_name == tag) {
            return Err(SkipInfo::notify(skip.reason.clone(), Some(tag)));
        }
    }

    // Only historical releases are broken; the author has already moved on,
    // so stay silent.
    Err(SkipInfo::silent(SkipReason::NoValidReleases))
}
