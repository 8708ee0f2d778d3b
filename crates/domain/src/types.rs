//! Wire schema types for the ingestion service

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signing material for authenticated requests.
///
/// Exactly one variant is configured per client; the variant selects
/// which signing scheme every write operation uses. Holding both sets
/// of fields at once is unrepresentable by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Credentials {
    /// Hawk MAC credentials (`Authorization` header scheme).
    Hawk { id: String, key: String, algorithm: HawkAlgorithm },
    /// Two-legged OAuth 1.0 consumer credentials (query-string scheme).
    OAuth { consumer_key: String, consumer_secret: String },
}

impl Credentials {
    /// Hawk credentials with the default (and only supported) algorithm.
    pub fn hawk(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Hawk { id: id.into(), key: key.into(), algorithm: HawkAlgorithm::Sha256 }
    }

    /// Two-legged OAuth consumer credentials.
    pub fn oauth(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self::OAuth { consumer_key: consumer_key.into(), consumer_secret: consumer_secret.into() }
    }
}

/// MAC algorithm for Hawk credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HawkAlgorithm {
    Sha256,
}

/// A logical grouping of revisions submitted together (one push or
/// pull-request snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Caller-generated identifier, unique per logical push.
    pub revision_hash: String,
    /// Seconds since epoch. Fractional part carries millisecond
    /// precision from the source timestamp.
    pub push_timestamp: f64,
    #[serde(rename = "type")]
    pub kind: ResultSetKind,
    pub revisions: Vec<Revision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Result-set kind as the service defines it. Pull-request conversions
/// also stamp `Push`; the service enum has no other accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSetKind {
    Push,
}

/// A single VCS commit in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub comment: String,
    /// VCS commit id.
    pub revision: String,
    /// Must match the owning project name.
    pub repository: String,
    /// Formatted as `"Name <email>"`.
    pub author: String,
    /// Files touched by the commit, when the provider supplies them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// A CI job record associated with a result set via `revision_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub project: String,
    /// Must reference a previously or concurrently submitted result set.
    pub revision_hash: String,
    pub job: JobDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    /// Globally unique job identifier; see [`job_guid`].
    pub job_guid: String,
    pub name: String,
    pub reason: String,
    pub job_symbol: String,
    pub submit_timestamp: i64,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub state: JobState,
    #[serde(default)]
    pub log_references: Vec<LogReference>,
    /// Required by the service for every submission even when empty of
    /// meaning; omitting it gets the job rejected.
    pub option_collection: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogReference {
    pub name: String,
    pub url: String,
}

/// Mint a globally unique job GUID.
pub fn job_guid() -> String {
    Uuid::new_v4().to_string()
}

/// Retry bookkeeping threaded through successive attempts of one
/// logical write. Never persisted; dies with the operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub current_retry: u32,
}

impl RetryState {
    /// State for the next attempt.
    pub fn next(self) -> Self {
        Self { current_retry: self.current_retry + 1 }
    }
}
