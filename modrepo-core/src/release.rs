//! Release validation: the eligibility pre-filter and deep validation of a
//! single release against the repository identity.

use regex::Regex;
use tracing::debug;

use crate::contract::ArchiveProbe;
use crate::markdown::rewrite_private_images;
use crate::models::{epoch, AcceptedRelease, Asset, RawRelease};
use crate::skip::SkipReason;

/// Content type a module archive asset must carry.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// A release-level validation failure, keyed by the offending tag. The
/// module validator matches these against the repository's declared latest
/// tag to decide whether the author gets notified.
#[derive(Debug, Clone)]
pub struct ReleaseSkip {
    pub tag_name: String,
    pub reason: SkipReason,
}

fn zip_asset(release: &RawRelease) -> Option<&Asset> {
    release
        .release_assets
        .iter()
        .find(|asset| asset.content_type.as_deref() == Some(ZIP_CONTENT_TYPE))
}

/// Pre-filter: only published immutable releases carrying a zip asset are
/// inspected further; draft and mutable releases are dropped silently. When
/// `require_versioned_tags` is set, the tag must also look like
/// `<versionCode>-<version>`.
pub fn is_eligible(release: &RawRelease, require_versioned_tags: bool) -> bool {
    if release.is_draft || !release.is_immutable {
        return false;
    }
    if zip_asset(release).is_none() {
        return false;
    }
    if require_versioned_tags {
        let versioned = Regex::new(r"^\d+-.+$").expect("versioned tag pattern is valid");
        if !versioned.is_match(release.tag_name.as_deref().unwrap_or("")) {
            return false;
        }
    }
    true
}

/// Deep validation of one release; the first failing check wins.
///
/// On success the description HTML has private image URLs rewritten and the
/// authoritative `version`/`versionCode` come from the archive's
/// `module.prop`, not from the tag.
pub async fn validate_release<P>(
    repo_name: &str,
    repo_url: &str,
    release: &RawRelease,
    probe: &P,
) -> Result<AcceptedRelease, ReleaseSkip>
where
    P: ArchiveProbe,
{
    let tag = release.tag_name.clone().unwrap_or_default();

    let Some(asset) = zip_asset(release) else {
        return Err(ReleaseSkip {
            tag_name: tag.clone(),
            reason: SkipReason::NoZipAsset { tag_name: tag },
        });
    };

    let download_url = asset.download_url.clone().unwrap_or_default();
    debug!(repo = repo_name, tag = %tag, url = %download_url, "Probing release archive");
    let props = probe.module_prop(download_url).await;
    if props.is_empty() {
        return Err(ReleaseSkip {
            tag_name: tag.clone(),
            reason: SkipReason::MissingModuleProp { tag_name: tag },
        });
    }

    let module_id = props.get("id").map(String::as_str).unwrap_or("");
    if module_id != repo_name {
        return Err(ReleaseSkip {
            tag_name: tag,
            reason: SkipReason::ModuleIdMismatch {
                repo_name: repo_name.to_string(),
                module_id: module_id.to_string(),
            },
        });
    }

    let version = props.get("version").cloned().filter(|v| !v.is_empty());
    let version_code = props.get("versionCode").cloned().filter(|v| !v.is_empty());
    let (version, version_code) = match (version, version_code) {
        (Some(version), Some(version_code)) => (version, version_code),
        (version, version_code) => {
            return Err(ReleaseSkip {
                tag_name: tag,
                reason: SkipReason::MissingVersion {
                    version,
                    version_code,
                },
            });
        }
    };

    let description_html = match (&release.description, &release.description_html) {
        (Some(markdown), Some(html)) => Some(rewrite_private_images(markdown, html)),
        (_, html) => html.clone(),
    };

    Ok(AcceptedRelease {
        name: release.name.clone().unwrap_or_else(|| tag.clone()),
        url: release
            .url
            .clone()
            .unwrap_or_else(|| format!("{repo_url}/releases/tag/{tag}")),
        tag_name: tag,
        description_html,
        created_at: release.created_at.unwrap_or_else(epoch),
        published_at: release.published_at.unwrap_or_else(epoch),
        updated_at: release.updated_at.unwrap_or_else(epoch),
        is_prerelease: release.is_prerelease,
        release_assets: release.release_assets.clone(),
        version,
        version_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockArchiveProbe;
    use crate::props::PropertyMap;

    fn zip_release(tag: &str) -> RawRelease {
        RawRelease {
            tag_name: Some(tag.to_string()),
            name: Some(format!("Release {tag}")),
            is_immutable: true,
            release_assets: vec![Asset {
                name: Some("module.zip".into()),
                content_type: Some(ZIP_CONTENT_TYPE.into()),
                download_url: Some(format!("https://dl.example/{tag}.zip")),
                ..Asset::default()
            }],
            ..RawRelease::default()
        }
    }

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn pre_filter_drops_drafts_and_mutable_releases() {
        let mut release = zip_release("1-v1");
        assert!(is_eligible(&release, false));

        release.is_draft = true;
        assert!(!is_eligible(&release, false));

        release.is_draft = false;
        release.is_immutable = false;
        assert!(!is_eligible(&release, false));
    }

    #[test]
    fn pre_filter_requires_a_zip_asset() {
        let mut release = zip_release("1-v1");
        release.release_assets[0].content_type = Some("application/gzip".into());
        assert!(!is_eligible(&release, false));
    }

    #[test]
    fn versioned_tag_requirement_is_feature_flagged() {
        let release = zip_release("v1.0");
        assert!(is_eligible(&release, false));
        assert!(!is_eligible(&release, true));
        assert!(is_eligible(&zip_release("42-v1.0"), true));
    }

    #[tokio::test]
    async fn accepts_a_minimal_property_map() {
        let mut probe = MockArchiveProbe::new();
        probe
            .expect_module_prop()
            .returning(|_| props(&[("id", "foo.bar"), ("version", "1"), ("versionCode", "1")]));

        let accepted = validate_release("foo.bar", "https://github.com/o/foo.bar", &zip_release("1-v1"), &probe)
            .await
            .expect("release accepted");
        assert_eq!(accepted.tag_name, "1-v1");
        assert_eq!(accepted.version, "1");
        assert_eq!(accepted.version_code, "1");
    }

    #[tokio::test]
    async fn empty_property_map_is_missing_module_prop() {
        let mut probe = MockArchiveProbe::new();
        probe.expect_module_prop().returning(|_| PropertyMap::new());

        let skip = validate_release("foo.bar", "", &zip_release("1-v1"), &probe)
            .await
            .expect_err("release rejected");
        assert_eq!(skip.reason.code(), "MISSING_MODULE_PROP");
        assert_eq!(skip.tag_name, "1-v1");
    }

    #[tokio::test]
    async fn mismatched_id_carries_both_values() {
        let mut probe = MockArchiveProbe::new();
        probe
            .expect_module_prop()
            .returning(|_| props(&[("id", "foo.baz"), ("version", "1"), ("versionCode", "1")]));

        let skip = validate_release("foo.bar", "", &zip_release("1-v1"), &probe)
            .await
            .expect_err("release rejected");
        assert_eq!(
            skip.reason,
            SkipReason::ModuleIdMismatch {
                repo_name: "foo.bar".into(),
                module_id: "foo.baz".into(),
            }
        );
    }

    #[tokio::test]
    async fn empty_version_code_is_missing_version() {
        let mut probe = MockArchiveProbe::new();
        probe
            .expect_module_prop()
            .returning(|_| props(&[("id", "foo.bar"), ("version", "1.0"), ("versionCode", "")]));

        let skip = validate_release("foo.bar", "", &zip_release("1-v1"), &probe)
            .await
            .expect_err("release rejected");
        assert_eq!(
            skip.reason,
            SkipReason::MissingVersion {
                version: Some("1.0".into()),
                version_code: None,
            }
        );
    }

    #[tokio::test]
    async fn description_html_gets_private_images_rewritten() {
        let mut probe = MockArchiveProbe::new();
        probe
            .expect_module_prop()
            .returning(|_| props(&[("id", "foo.bar"), ("version", "1"), ("versionCode", "1")]));

        let mut release = zip_release("1-v1");
        release.description = Some(
            "https://github.com/o/r/assets/1/aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee".into(),
        );
        release.description_html = Some(
            r#"<img src="https://private-user-images.githubusercontent.com/10/20-aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee.png?jwt=x">"#.into(),
        );

        let accepted = validate_release("foo.bar", "", &release, &probe)
            .await
            .expect("release accepted");
        let html = accepted.description_html.expect("html present");
        assert!(html.contains("github.com/o/r/assets"));
        assert!(!html.contains("private-user-images"));
    }
}
