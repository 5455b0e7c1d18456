//! The closed skip taxonomy: validation failures, their notification policy
//! and the user-visible message templates.
//!
//! Every reason is a variant of [`SkipReason`] carrying exactly the detail
//! fields its template interpolates, so template lookup is a total match and
//! a new reason cannot be added without also adding its message. Templates
//! are the only vocabulary shown to module authors; code paths refer to
//! reasons symbolically via [`SkipReason::code`].

/// A validation failure with its specific detail fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Repository name is not a usable module identifier.
    InvalidName { repo_name: String },
    /// Repository has no description to use as the module name.
    NoDescription { repo_name: String },
    /// No release survived validation (or none was eligible at all).
    NoValidReleases,
    /// Repository name is reserved for organization plumbing.
    ReservedName { repo_name: String },
    /// Release carries no `application/zip` asset.
    NoZipAsset { tag_name: String },
    /// `module.prop` declares a different id than the repository name.
    ModuleIdMismatch { repo_name: String, module_id: String },
    /// `version` or `versionCode` is missing or empty in `module.prop`.
    MissingVersion {
        version: Option<String>,
        version_code: Option<String>,
    },
    /// `module.prop` could not be extracted from the archive.
    MissingModuleProp { tag_name: String },
}

struct MessageTemplate {
    title: &'static str,
    body: &'static str,
}

const INVALID_NAME: MessageTemplate = MessageTemplate {
    title: "Invalid repository name",
    body: "The repository name `{repoName}` cannot be used as a module identifier. \
           Identifiers must start with a letter, may only contain letters, digits, \
           dots, underscores and dashes, and must be at least two characters long.",
};

const NO_DESCRIPTION: MessageTemplate = MessageTemplate {
    title: "Missing repository description",
    body: "The repository `{repoName}` has no description. The description becomes \
           the module name in the catalog, so the module cannot be listed without one.",
};

const NO_VALID_RELEASES: MessageTemplate = MessageTemplate {
    title: "No valid releases",
    body: "No published, immutable release with a zip artifact was found, so the \
           module cannot be listed in the catalog.",
};

const RESERVED_NAME: MessageTemplate = MessageTemplate {
    title: "Reserved repository name",
    body: "The repository name `{repoName}` is reserved for internal use and cannot \
           be published as a module.",
};

const NO_ZIP_ASSET: MessageTemplate = MessageTemplate {
    title: "No module archive attached",
    body: "Release `{tagName}` has no asset with content type `application/zip`. \
           Attach the module archive to make the release installable.",
};

const MODULE_ID_MISMATCH: MessageTemplate = MessageTemplate {
    title: "Module id mismatch",
    body: "The `module.prop` inside the release archive declares `id={moduleId}`, \
           but the repository is named `{repoName}`. The two must match exactly.",
};

const MISSING_VERSION: MessageTemplate = MessageTemplate {
    title: "Missing version properties",
    body: "The `module.prop` inside the release archive must declare both `version` \
           and `versionCode`. Found version={version}, versionCode={versionCode}.",
};

const MISSING_MODULE_PROP: MessageTemplate = MessageTemplate {
    title: "Unreadable module.prop",
    body: "`module.prop` could not be extracted from the zip asset of release \
           `{tagName}`. Make sure the archive contains a `module.prop` at its root.",
};

impl SkipReason {
    /// Stable symbolic code, used in logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::InvalidName { .. } => "INVALID_NAME",
            SkipReason::NoDescription { .. } => "NO_DESCRIPTION",
            SkipReason::NoValidReleases => "NO_VALID_RELEASES",
            SkipReason::ReservedName { .. } => "RESERVED_NAME",
            SkipReason::NoZipAsset { .. } => "NO_ZIP_ASSET",
            SkipReason::ModuleIdMismatch { .. } => "MODULE_ID_MISMATCH",
            SkipReason::MissingVersion { .. } => "MISSING_VERSION",
            SkipReason::MissingModuleProp { .. } => "MISSING_MODULE_PROP",
        }
    }

    /// Detail mapping used for template interpolation.
    pub fn details(&self) -> Vec<(&'static str, Option<String>)> {
        match self {
            SkipReason::InvalidName { repo_name }
            | SkipReason::NoDescription { repo_name }
            | SkipReason::ReservedName { repo_name } => {
                vec![("repoName", Some(repo_name.clone()))]
            }
            SkipReason::NoValidReleases => Vec::new(),
            SkipReason::NoZipAsset { tag_name } | SkipReason::MissingModuleProp { tag_name } => {
                vec![("tagName", Some(tag_name.clone()))]
            }
            SkipReason::ModuleIdMismatch {
                repo_name,
                module_id,
            } => vec![
                ("repoName", Some(repo_name.clone())),
                ("moduleId", Some(module_id.clone())),
            ],
            SkipReason::MissingVersion {
                version,
                version_code,
            } => vec![
                ("version", version.clone()),
                ("versionCode", version_code.clone()),
            ],
        }
    }

    fn template(&self) -> &'static MessageTemplate {
        match self {
            SkipReason::InvalidName { .. } => &INVALID_NAME,
            SkipReason::NoDescription { .. } => &NO_DESCRIPTION,
            SkipReason::NoValidReleases => &NO_VALID_RELEASES,
            SkipReason::ReservedName { .. } => &RESERVED_NAME,
            SkipReason::NoZipAsset { .. } => &NO_ZIP_ASSET,
            SkipReason::ModuleIdMismatch { .. } => &MODULE_ID_MISMATCH,
            SkipReason::MissingVersion { .. } => &MISSING_VERSION,
            SkipReason::MissingModuleProp { .. } => &MISSING_MODULE_PROP,
        }
    }

    /// Short human title for the failure.
    pub fn title(&self) -> &'static str {
        self.template().title
    }

    /// Full human message with `{placeholder}` fields filled from the
    /// details; unknown or null placeholders render as literal `N/A`.
    pub fn message(&self) -> String {
        interpolate(self.template().body, &self.details())
    }
}

fn interpolate(template: &str, details: &[(&'static str, Option<String>)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                let value = details
                    .iter()
                    .find(|(name, _)| *name == key)
                    .and_then(|(_, value)| value.as_deref());
                out.push_str(value.unwrap_or("N/A"));
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A skip with its notification policy, as surfaced by the module validator.
#[derive(Debug, Clone)]
pub struct SkipInfo {
    pub reason: SkipReason,
    pub should_notify: bool,
    /// The offending release tag, when the failure is release-scoped.
    pub tag_name: Option<String>,
}

impl SkipInfo {
    pub fn notify(reason: SkipReason, tag_name: Option<String>) -> Self {
        Self {
            reason,
            should_notify: true,
            tag_name,
        }
    }

    pub fn silent(reason: SkipReason) -> Self {
        Self {
            reason,
            should_notify: false,
            tag_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_interpolates_both_details() {
        let reason = SkipReason::ModuleIdMismatch {
            repo_name: "foo.bar".into(),
            module_id: "foo.baz".into(),
        };
        let message = reason.message();
        assert!(message.contains("id=foo.baz"));
        assert!(message.contains("named `foo.bar`"));
        assert_eq!(reason.code(), "MODULE_ID_MISMATCH");
    }

    #[test]
    fn missing_details_render_as_na() {
        let reason = SkipReason::MissingVersion {
            version: Some("1.0".into()),
            version_code: None,
        };
        let message = reason.message();
        assert!(message.contains("version=1.0"));
        assert!(message.contains("versionCode=N/A"));
    }

    #[test]
    fn unknown_placeholder_renders_as_na() {
        let rendered = interpolate("value is {nope}", &[]);
        assert_eq!(rendered, "value is N/A");
    }

    #[test]
    fn unterminated_placeholder_is_kept_verbatim() {
        let rendered = interpolate("brace { left open", &[]);
        assert_eq!(rendered, "brace { left open");
    }

    #[test]
    fn every_reason_has_a_title_and_code() {
        let reasons = [
            SkipReason::InvalidName {
                repo_name: "x".into(),
            },
            SkipReason::NoDescription {
                repo_name: "x".into(),
            },
            SkipReason::NoValidReleases,
            SkipReason::ReservedName {
                repo_name: "x".into(),
            },
            SkipReason::NoZipAsset {
                tag_name: "t".into(),
            },
            SkipReason::ModuleIdMismatch {
                repo_name: "x".into(),
                module_id: "y".into(),
            },
            SkipReason::MissingVersion {
                version: None,
                version_code: None,
            },
            SkipReason::MissingModuleProp {
                tag_name: "t".into(),
            },
        ];
        for reason in reasons {
            assert!(!reason.title().is_empty());
            assert!(!reason.message().is_empty());
            assert!(!reason.code().is_empty());
        }
    }
}
