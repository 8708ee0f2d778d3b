//! VCS provider payload converters
//!
//! Maps the provider's pull-request, commit and push-event records into
//! the service's result-set schema. These are the only functions that
//! touch the provider's native shapes; everything downstream sees
//! [`ResultSet`]/[`Revision`] only.
//!
//! All converters are deterministic and side-effect free. Malformed
//! payloads fail at the serde boundary (the required fields below are
//! not optional); the one fallible step after that, timestamp parsing,
//! returns a validation error instead of a partial record.

use chrono::DateTime;
use roost_domain::{ClientError, ResultSet, ResultSetKind, Revision};
use serde::Deserialize;

/// A commit as listed on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// A commit as carried by a push event. Same information as
/// [`CommitRecord`], different shape: `id` instead of `sha`, author at
/// the top level.
#[derive(Debug, Clone, Deserialize)]
pub struct PushCommitRecord {
    pub id: String,
    pub message: String,
    pub author: CommitAuthor,
}

/// The subset of a pull-request object the conversion reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRecord {
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub head: PullRequestHead,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestHead {
    pub sha: String,
    pub user: ProviderUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub login: String,
}

fn author_line(author: &CommitAuthor) -> String {
    format!("{} <{}>", author.name, author.email)
}

/// Canonical revision from a pull-request commit.
pub fn commit_to_revision(repository: &str, record: &CommitRecord) -> Revision {
    Revision {
        comment: record.commit.message.clone(),
        revision: record.sha.clone(),
        repository: repository.to_string(),
        author: author_line(&record.commit.author),
        files: Vec::new(),
    }
}

/// Canonical revision from a push-event commit.
pub fn push_commit_to_revision(repository: &str, record: &PushCommitRecord) -> Revision {
    Revision {
        comment: record.message.clone(),
        revision: record.id.clone(),
        repository: repository.to_string(),
        author: author_line(&record.author),
        files: Vec::new(),
    }
}

/// Revisions for every commit on a pull request.
pub fn pull_commits_to_revisions(repository: &str, commits: &[CommitRecord]) -> Vec<Revision> {
    commits.iter().map(|record| commit_to_revision(repository, record)).collect()
}

/// Revisions for every commit in a push event.
pub fn push_commits_to_revisions(repository: &str, commits: &[PushCommitRecord]) -> Vec<Revision> {
    commits.iter().map(|record| push_commit_to_revision(repository, record)).collect()
}

/// Partial result set from a single pull-request object. The caller
/// fills `revisions` (see [`pull_commits_to_revisions`]).
///
/// `push_timestamp` prefers `updated_at` and falls back to
/// `created_at`, converted to epoch seconds as a float so the source's
/// millisecond precision survives. The kind is stamped `push` because
/// that is the only value the service enum accepts, pull request or
/// not.
pub fn pull_request_to_result_set(
    _repository: &str,
    pr: &PullRequestRecord,
) -> Result<ResultSet, ClientError> {
    let stamp = pr.updated_at.as_deref().unwrap_or(&pr.created_at);
    let parsed = DateTime::parse_from_rfc3339(stamp).map_err(|e| {
        ClientError::Validation(format!("unparsable pull request timestamp {stamp:?}: {e}"))
    })?;
    let push_timestamp = parsed.timestamp_millis() as f64 / 1000.0;

    Ok(ResultSet {
        revision_hash: pr.head.sha.clone(),
        push_timestamp,
        kind: ResultSetKind::Push,
        revisions: Vec::new(),
        author: Some(pr.head.user.login.clone()),
    })
}
