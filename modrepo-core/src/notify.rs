//! Notification dispatcher: turns a skip into a commit comment on the
//! offending release, mentioning the right addressee.
//!
//! No duplicate check is performed: immutable releases cannot be
//! republished, so each tag receives at most one comment per build attempt.
//! Every failure in here is logged and swallowed; a broken notification
//! must never take down the pipeline.

use tracing::{error, info, warn};

use crate::contract::PlatformRest;
use crate::skip::SkipInfo;

/// Logins that never receive mentions.
pub const BOT_LOGINS: [&str; 3] = [
    "github-actions[bot]",
    "dependabot[bot]",
    "renovate[bot]",
];

const FOOTER: &str = "\n\n---\n*This comment was generated automatically by the \
                      module catalog pipeline. Publish a fixed release to re-enter \
                      the catalog.*";

fn is_bot(login: &str) -> bool {
    BOT_LOGINS.contains(&login)
}

/// Who to mention: the release author when known and human, otherwise every
/// non-bot direct collaborator, otherwise nobody.
async fn resolve_mentions<R>(rest: &R, repo: &str, tag: &str) -> Vec<String>
where
    R: PlatformRest,
{
    match rest.release_author(repo.to_string(), tag.to_string()).await {
        Ok(Some(login)) if !is_bot(&login) => return vec![login],
        Ok(_) => {}
        Err(e) => warn!(error = ?e, repo, tag, "Failed to look up release author"),
    }
    match rest.direct_collaborators(repo.to_string()).await {
        Ok(logins) => logins.into_iter().filter(|login| !is_bot(login)).collect(),
        Err(e) => {
            warn!(error = ?e, repo, "Failed to list collaborators");
            Vec::new()
        }
    }
}

/// Resolves the tag to a commit SHA, dereferencing annotated tags once.
async fn resolve_commit<R>(rest: &R, repo: &str, tag: &str) -> Option<String>
where
    R: PlatformRest,
{
    let object = match rest.tag_ref(repo.to_string(), tag.to_string()).await {
        Ok(Some(object)) => object,
        Ok(None) => {
            warn!(repo, tag, "Tag ref not found");
            return None;
        }
        Err(e) => {
            warn!(error = ?e, repo, tag, "Failed to resolve tag ref");
            return None;
        }
    };
    if object.object_type == "tag" {
        return match rest.dereference_tag(repo.to_string(), object.sha).await {
            Ok(Some(sha)) => Some(sha),
            Ok(None) => {
                warn!(repo, tag, "Annotated tag does not point at a commit");
                None
            }
            Err(e) => {
                warn!(error = ?e, repo, tag, "Failed to dereference annotated tag");
                None
            }
        };
    }
    Some(object.sha)
}

/// Assembles the comment body: mentions, templated message, footer.
pub fn comment_body(mentions: &[String], skip: &SkipInfo) -> String {
    let mut body = String::new();
    if !mentions.is_empty() {
        let mentions: Vec<String> = mentions.iter().map(|login| format!("@{login}")).collect();
        body.push_str(&mentions.join(" "));
        body.push_str("\n\n");
    }
    body.push_str("### ");
    body.push_str(skip.reason.title());
    body.push_str("\n\n");
    body.push_str(&skip.reason.message());
    body.push_str(FOOTER);
    body
}

/// Publishes the notification for a release-scoped skip.
pub async fn notify_skip<R>(rest: &R, repo: &str, skip: &SkipInfo)
where
    R: PlatformRest,
{
    let Some(tag) = skip.tag_name.as_deref() else {
        warn!(
            repo,
            reason = skip.reason.code(),
            "Skip carries no tag; nothing to comment on"
        );
        return;
    };

    let mentions = resolve_mentions(rest, repo, tag).await;
    let Some(sha) = resolve_commit(rest, repo, tag).await else {
        return;
    };

    let body = comment_body(&mentions, skip);
    match rest
        .create_commit_comment(repo.to_string(), sha.clone(), body)
        .await
    {
        Ok(()) => info!(repo, tag, commit = %sha, "Posted validation comment"),
        Err(e) => error!(error = ?e, repo, tag, "Failed to post validation comment"),
    }
}
