//! Contract seams between the pipeline and its external collaborators.
//!
//! Three traits cover everything the pipeline reaches out to: the listing
//! fetcher ([`RepoSource`]), the archive probe ([`ArchiveProbe`]) and the
//! notification surface ([`PlatformRest`]). Concrete platform clients live in
//! [`crate::github`]; subprocess probing lives in [`crate::props`].
//!
//! All traits are annotated for `mockall` so integration tests can run the
//! whole pipeline deterministically without network or subprocess access.

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::models::RawRepository;
use crate::props::PropertyMap;

/// Error type for listing fetch operations (boxed, caller logs and surfaces).
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for REST notification operations.
pub type RestError = Box<dyn std::error::Error + Send + Sync>;

/// One page of the organization listing. Keeps the raw response alongside
/// the decoded records so the orchestrator can snapshot pagination verbatim.
#[derive(Debug, Clone)]
pub struct RepositoryPage {
    pub raw: Value,
    pub repositories: Vec<RawRepository>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Fetches raw repository records from the hosting platform, newest first.
#[automock]
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Fetch one page of the organization's public repositories, ordered by
    /// update time descending.
    async fn fetch_page(&self, cursor: Option<String>) -> Result<RepositoryPage, SourceError>;

    /// Fetch a single repository by name. `Ok(None)` means the repository
    /// does not exist on the platform.
    async fn fetch_repository(&self, name: String) -> Result<Option<RawRepository>, SourceError>;
}

/// Extracts the property manifest from a remote module archive.
///
/// Infallible by contract: every failure mode (unreachable archive, missing
/// entry, oversized or undecodable output) yields an empty map, which the
/// release validator classifies downstream.
#[automock]
#[async_trait]
pub trait ArchiveProbe: Send + Sync {
    async fn module_prop(&self, url: String) -> PropertyMap;
}

/// Git object behind a tag ref.
#[derive(Debug, Clone)]
pub struct TagObject {
    pub sha: String,
    /// `"commit"` for lightweight tags, `"tag"` for annotated ones.
    pub object_type: String,
}

/// REST surface used by the notification dispatcher.
#[automock]
#[async_trait]
pub trait PlatformRest: Send + Sync {
    /// Login of the user who published the release with `tag`, when known.
    async fn release_author(&self, repo: String, tag: String)
        -> Result<Option<String>, RestError>;

    /// Logins of the repository's direct collaborators.
    async fn direct_collaborators(&self, repo: String) -> Result<Vec<String>, RestError>;

    /// Resolve `tags/{tag}` to the object it points at.
    async fn tag_ref(&self, repo: String, tag: String) -> Result<Option<TagObject>, RestError>;

    /// Dereference an annotated tag object to its target commit SHA.
    async fn dereference_tag(&self, repo: String, sha: String)
        -> Result<Option<String>, RestError>;

    /// Post a comment on a commit.
    async fn create_commit_comment(
        &self,
        repo: String,
        sha: String,
        body: String,
    ) -> Result<(), RestError>;
}
