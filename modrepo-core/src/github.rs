//! GitHub clients: the GraphQL listing source and the REST surface used for
//! notifications.
//!
//! One [`GithubClient`] implements both [`RepoSource`] and [`PlatformRest`],
//! sharing the HTTP client and token. Query shape is the platform contract:
//! ten repositories per page, public only, ordered by update time
//! descending, with the release connection nested per repository.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::contract::{
    PlatformRest, RepoSource, RepositoryPage, RestError, SourceError, TagObject,
};
use crate::models::RawRepository;

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const REST_ENDPOINT: &str = "https://api.github.com";
const REST_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("modrepo/", env!("CARGO_PKG_VERSION"));

const RELEASE_FRAGMENT: &str = r#"
fragment releaseFields on Release {
  tagName
  name
  description
  descriptionHTML
  url
  createdAt
  publishedAt
  updatedAt
  isDraft
  isPrerelease
  isImmutable
  isLatest
  releaseAssets(first: 50) {
    nodes { name contentType downloadUrl downloadCount size }
  }
}
"#;

const REPOSITORY_FRAGMENT: &str = r#"
fragment repositoryFields on Repository {
  name
  description
  url
  homepageUrl
  stargazerCount
  createdAt
  updatedAt
  collaborators(first: 100) { nodes { login name } }
  readme: object(expression: "HEAD:README.md") { ... on Blob { text } }
  metadata: object(expression: "HEAD:repo.json") { ... on Blob { text } }
  latestRelease { ...releaseFields }
  releases(first: 100, orderBy: {field: CREATED_AT, direction: DESC}) {
    nodes { ...releaseFields }
  }
}
"#;

const LIST_QUERY: &str = r#"
query ($organization: String!, $cursor: String) {
  organization(login: $organization) {
    repositories(
      first: 10
      after: $cursor
      privacy: PUBLIC
      orderBy: {field: UPDATED_AT, direction: DESC}
    ) {
      pageInfo { endCursor hasNextPage }
      nodes { ...repositoryFields }
    }
  }
}
"#;

const REPOSITORY_QUERY: &str = r#"
query ($organization: String!, $name: String!) {
  repository(owner: $organization, name: $name) { ...repositoryFields }
}
"#;

fn list_query() -> String {
    format!("{LIST_QUERY}{REPOSITORY_FRAGMENT}{RELEASE_FRAGMENT}")
}

fn repository_query() -> String {
    format!("{REPOSITORY_QUERY}{REPOSITORY_FRAGMENT}{RELEASE_FRAGMENT}")
}

pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    organization: String,
}

impl GithubClient {
    pub fn new(
        token: impl Into<String>,
        organization: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            organization: organization.into(),
        })
    }

    async fn graphql(&self, query: String, variables: Value) -> Result<Value, SourceError> {
        let response = self
            .http
            .post(GRAPHQL_ENDPOINT)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        // Partial responses (data plus errors) still carry usable records;
        // only a missing data object is fatal.
        let data_present = body.get("data").is_some_and(|data| !data.is_null());
        if !data_present {
            if let Some(errors) = body.get("errors") {
                return Err(format!("GraphQL request failed: {errors}").into());
            }
            return Err("GraphQL response carried no data".into());
        }
        Ok(body)
    }

    fn parse_repository(node: &Value) -> Option<RawRepository> {
        if node.is_null() {
            return None;
        }
        serde_json::from_value(node.clone()).ok()
    }

    fn rest_url(&self, repo: &str, tail: &str) -> String {
        format!(
            "{REST_ENDPOINT}/repos/{}/{}/{}",
            self.organization, repo, tail
        )
    }

    /// GET a REST resource; `Ok(None)` on 404.
    async fn rest_get(&self, url: &str) -> Result<Option<Value>, RestError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, REST_ACCEPT)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn fetch_page(&self, cursor: Option<String>) -> Result<RepositoryPage, SourceError> {
        debug!(organization = %self.organization, cursor = ?cursor, "Fetching listing page");
        let body = self
            .graphql(
                list_query(),
                json!({ "organization": self.organization, "cursor": cursor }),
            )
            .await?;

        let connection = body
            .pointer("/data/organization/repositories")
            .cloned()
            .unwrap_or(Value::Null);
        if connection.is_null() {
            return Err(format!(
                "organization {} not found in listing response",
                self.organization
            )
            .into());
        }

        let repositories = connection
            .get("nodes")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().filter_map(Self::parse_repository).collect())
            .unwrap_or_default();
        let end_cursor = connection
            .pointer("/pageInfo/endCursor")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let has_next_page = connection
            .pointer("/pageInfo/hasNextPage")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(RepositoryPage {
            raw: body,
            repositories,
            end_cursor,
            has_next_page,
        })
    }

    async fn fetch_repository(&self, name: String) -> Result<Option<RawRepository>, SourceError> {
        info!(organization = %self.organization, repo = %name, "Fetching single repository");
        let body = self
            .graphql(
                repository_query(),
                json!({ "organization": self.organization, "name": name }),
            )
            .await?;
        let node = body
            .pointer("/data/repository")
            .cloned()
            .unwrap_or(Value::Null);
        Ok(Self::parse_repository(&node))
    }
}

#[async_trait]
impl PlatformRest for GithubClient {
    async fn release_author(
        &self,
        repo: String,
        tag: String,
    ) -> Result<Option<String>, RestError> {
        let url = self.rest_url(&repo, &format!("releases/tags/{tag}"));
        let Some(body) = self.rest_get(&url).await? else {
            return Ok(None);
        };
        Ok(body
            .pointer("/author/login")
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    async fn direct_collaborators(&self, repo: String) -> Result<Vec<String>, RestError> {
        let url = self.rest_url(&repo, "collaborators?affiliation=direct&per_page=100");
        let Some(body) = self.rest_get(&url).await? else {
            return Ok(Vec::new());
        };
        Ok(body
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("login").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn tag_ref(&self, repo: String, tag: String) -> Result<Option<TagObject>, RestError> {
        let url = self.rest_url(&repo, &format!("git/ref/tags/{tag}"));
        let Some(body) = self.rest_get(&url).await? else {
            return Ok(None);
        };
        let sha = body.pointer("/object/sha").and_then(Value::as_str);
        let object_type = body.pointer("/object/type").and_then(Value::as_str);
        Ok(match (sha, object_type) {
            (Some(sha), Some(object_type)) => Some(TagObject {
                sha: sha.to_string(),
                object_type: object_type.to_string(),
            }),
            _ => None,
        })
    }

    async fn dereference_tag(
        &self,
        repo: String,
        sha: String,
    ) -> Result<Option<String>, RestError> {
        let url = self.rest_url(&repo, &format!("git/tags/{sha}"));
        let Some(body) = self.rest_get(&url).await? else {
            return Ok(None);
        };
        Ok(body
            .pointer("/object/sha")
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    async fn create_commit_comment(
        &self,
        repo: String,
        sha: String,
        body: String,
    ) -> Result<(), RestError> {
        let url = self.rest_url(&repo, &format!("commits/{sha}/comments"));
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, REST_ACCEPT)
            .json(&json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        info!(repo = %repo, commit = %sha, "Created commit comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_embed_both_fragments() {
        let listing = list_query();
        assert!(listing.contains("fragment repositoryFields"));
        assert!(listing.contains("fragment releaseFields"));
        assert!(listing.contains("first: 10"));
        assert!(listing.contains("privacy: PUBLIC"));

        let single = repository_query();
        assert!(single.contains("repository(owner: $organization, name: $name)"));
        assert!(single.contains("fragment releaseFields"));
    }

    #[test]
    fn parse_repository_ignores_null_and_garbage_nodes() {
        assert!(GithubClient::parse_repository(&Value::Null).is_none());
        assert!(GithubClient::parse_repository(&json!("not an object")).is_none());
        let repo = GithubClient::parse_repository(&json!({"name": "foo.bar"}))
            .expect("object decodes");
        assert_eq!(repo.name.as_deref(), Some("foo.bar"));
    }
}
