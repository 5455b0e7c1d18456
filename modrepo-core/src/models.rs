//! Data models: raw platform records and catalog output entities.
//!
//! Raw inputs mirror the shape the listing fetcher returns. Every field is
//! optional at the decode layer and leaf-field decode failures degrade to
//! `None` (or a neutral default) instead of failing the surrounding record,
//! so one malformed repository never poisons a listing page.
//!
//! Catalog outputs ([`Module`], [`AcceptedRelease`], [`Author`]) are the
//! serialized contract consumed by the static site generator. Field names
//! are fixed by that consumer; do not rename without coordinating a site
//! rebuild.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Timestamp default for absent release kinds: 1970-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Accepts either a connection object (`{"nodes": [...]}`) or a bare JSON
/// array. Nodes that are null or fail to decode are dropped.
fn connection_nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Object(mut object)) => match object.remove("nodes") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Accepts either a blob object (`{"text": "..."}`) or a bare string.
fn blob_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(mut object)) => match object.remove("text") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        },
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| text.parse::<DateTime<Utc>>().ok()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_i64).unwrap_or(0))
}

/// A repository as returned by the organization listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRepository {
    /// Repository identifier, doubling as the module id on acceptance.
    pub name: Option<String>,
    /// Human description, doubling as the module name on acceptance.
    pub description: Option<String>,
    pub url: Option<String>,
    pub homepage_url: Option<String>,
    #[serde(deserialize_with = "connection_nodes")]
    pub collaborators: Vec<Collaborator>,
    /// README text, when the default branch carries one.
    #[serde(deserialize_with = "blob_text")]
    pub readme: Option<String>,
    /// Auxiliary manifest text (`repo.json`), parsed later by the assembler.
    #[serde(deserialize_with = "blob_text")]
    pub metadata: Option<String>,
    /// The platform's declared latest release. The release connection on the
    /// first page sometimes omits it.
    pub latest_release: Option<RawRelease>,
    #[serde(deserialize_with = "connection_nodes")]
    pub releases: Vec<RawRelease>,
    #[serde(deserialize_with = "lenient_i64")]
    pub stargazer_count: i64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Collaborator {
    pub login: Option<String>,
    /// Display name; falls back to the login when absent.
    pub name: Option<String>,
}

/// A release as returned by the listing, prior to validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRelease {
    pub tag_name: Option<String>,
    pub name: Option<String>,
    /// Markdown description, used to recover stable image URLs.
    pub description: Option<String>,
    #[serde(rename = "descriptionHTML")]
    pub description_html: Option<String>,
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_draft: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_prerelease: bool,
    /// Only immutable releases are catalog-eligible; their tag and assets
    /// cannot change after publication.
    #[serde(deserialize_with = "lenient_bool")]
    pub is_immutable: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_latest: bool,
    #[serde(deserialize_with = "connection_nodes")]
    pub release_assets: Vec<Asset>,
}

/// A release asset, carried verbatim into the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub download_url: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub download_count: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub size: i64,
}

/// A catalog author entry. Exactly `{name, link}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub link: String,
}

/// A release that passed validation, as serialized into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedRelease {
    pub tag_name: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "descriptionHTML")]
    pub description_html: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_prerelease: bool,
    pub release_assets: Vec<Asset>,
    /// Human version string from `module.prop`.
    pub version: String,
    /// Monotonic version counter from `module.prop`, kept as a string.
    pub version_code: String,
}

/// A catalog entry: one validated, publishable module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub module_id: String,
    pub module_name: String,
    pub url: String,
    pub homepage: Option<String>,
    pub authors: Vec<Author>,
    /// Display name of the latest stable release, when one exists.
    pub latest_release: Option<String>,
    pub latest_release_time: DateTime<Utc>,
    pub latest_beta_release_time: DateTime<Utc>,
    pub latest_snapshot_release_time: DateTime<Utc>,
    pub releases: Vec<AcceptedRelease>,
    pub readme: Option<String>,
    #[serde(rename = "readmeHTML")]
    pub readme_html: Option<String>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stargazer_count: i64,
    pub metamodule: bool,
}

impl Module {
    /// Catalog sort key: the most recent of the three release timestamps.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.latest_release_time
            .max(self.latest_beta_release_time)
            .max(self.latest_snapshot_release_time)
    }
}
