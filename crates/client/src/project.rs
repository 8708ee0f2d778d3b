//! Per-project client facade
//!
//! One `Project` per project name, configured once with a base URL,
//! an optional credentials variant and a throttle policy. Reads are
//! unauthenticated; writes are signed and run under the throttle
//! retry wrapper. There is no shared mutable state, so concurrent
//! calls on one instance interleave freely.

use std::time::Duration;

use reqwest::Method;
use roost_domain::{ClientError, Credentials, Job, Result, ResultSet, ServiceError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::auth::{SignedRequest, Signer};
use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::http::Transport;
use crate::throttle::{with_throttle_retry, ThrottlePolicy};

/// Construction-time configuration for a [`Project`].
///
/// The base URL default is a plain constant; looking up environment
/// variables is the surrounding application's business.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Ingestion API root, e.g. `https://roost.allizom.org/api/`.
    pub base_url: String,
    /// Signing material; required for writes, unused by reads.
    pub credentials: Option<Credentials>,
    /// Bookkeeping user the OAuth scheme reports to the service.
    /// Defaults to the project name.
    pub user: Option<String>,
    /// Retry budget for throttled writes. Off by default.
    pub throttle: ThrottlePolicy,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            user: None,
            throttle: ThrottlePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for one project's result-set and job endpoints.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    user: String,
    project_url: String,
    credentials: Option<Credentials>,
    throttle: ThrottlePolicy,
    transport: Transport,
}

impl Project {
    /// Build a client for `name`.
    ///
    /// # Errors
    ///
    /// Returns a validation error (before any I/O) when the project
    /// name or base URL is empty, or the HTTP client cannot be built.
    pub fn new(name: impl Into<String>, config: ProjectConfig) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClientError::Validation("project name is required".into()));
        }

        let base = config.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(ClientError::Validation("base_url is required".into()));
        }

        let project_url = format!("{base}/project/{name}/");
        let transport = Transport::new(config.timeout)?;
        let user = config.user.unwrap_or_else(|| name.clone());

        Ok(Self {
            name,
            user,
            project_url,
            credentials: config.credentials,
            throttle: config.throttle,
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch all result sets for this project.
    #[instrument(skip(self), fields(project = %self.name))]
    pub async fn get_result_sets(&self) -> Result<Vec<ResultSet>> {
        self.get("resultset/").await
    }

    /// Create or update result sets.
    #[instrument(skip(self, result_sets), fields(project = %self.name, count = result_sets.len()))]
    pub async fn post_result_sets(&self, result_sets: &[ResultSet]) -> Result<serde_json::Value> {
        self.post("resultset/", result_sets).await
    }

    /// Fetch all jobs for this project.
    #[instrument(skip(self), fields(project = %self.name))]
    pub async fn get_jobs(&self) -> Result<Vec<Job>> {
        self.get("jobs/").await
    }

    /// Submit a set of jobs. Each job's `revision_hash` must reference
    /// a submitted result set.
    #[instrument(skip(self, jobs), fields(project = %self.name, count = jobs.len()))]
    pub async fn post_jobs(&self, jobs: &[Job]) -> Result<serde_json::Value> {
        self.post("jobs/", jobs).await
    }

    /// Unauthenticated project-relative GET.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.project_url, path);
        let response = self.transport.send(SignedRequest::unsigned(Method::GET, url.clone())).await?;

        let value = response.json::<T>().await.map_err(|e| {
            ServiceError::transport(format!("failed to parse response: {e}"), url.as_str())
        })?;
        Ok(value)
    }

    /// Signed project-relative POST, throttle-wrapped.
    ///
    /// Fails with a validation error, before any network call, when no
    /// credentials are configured. The body is signed afresh on every
    /// attempt so each resubmission carries a valid timestamp/nonce.
    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<serde_json::Value> {
        let signer = match &self.credentials {
            Some(credentials) => Signer::from_credentials(credentials, &self.user),
            None => {
                return Err(ClientError::Validation(
                    "cannot issue secured request without credentials".into(),
                ))
            }
        };

        let url = format!("{}{}", self.project_url, path);
        let body = serde_json::to_vec(body)
            .map_err(|e| ClientError::Validation(format!("failed to serialize body: {e}")))?;

        with_throttle_retry(self.throttle, |state| {
            let url = url.clone();
            let body = body.clone();
            let signer = &signer;
            async move {
                if state.current_retry > 0 {
                    debug!(retry = state.current_retry, %url, "resubmitting after throttle");
                }
                let signed = signer.sign(Method::POST, &url, &body)?;
                let response = self.transport.send(signed).await?;
                let value = response.json::<serde_json::Value>().await.map_err(|e| {
                    ClientError::from(ServiceError::transport(
                        format!("failed to parse response: {e}"),
                        url.as_str(),
                    ))
                })?;
                Ok(value)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_name_is_rejected() {
        let err = Project::new("", ProjectConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = Project::new("   ", ProjectConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = ProjectConfig { base_url: String::new(), ..ProjectConfig::default() };
        let err = Project::new("gaia", config).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn project_url_normalizes_trailing_slash() {
        let with_slash = Project::new(
            "gaia",
            ProjectConfig { base_url: "https://example.com/api/".into(), ..Default::default() },
        )
        .unwrap();
        let without_slash = Project::new(
            "gaia",
            ProjectConfig { base_url: "https://example.com/api".into(), ..Default::default() },
        )
        .unwrap();

        assert_eq!(with_slash.project_url, "https://example.com/api/project/gaia/");
        assert_eq!(with_slash.project_url, without_slash.project_url);
    }

    #[test]
    fn user_defaults_to_project_name() {
        let project = Project::new("gaia", ProjectConfig::default()).unwrap();
        assert_eq!(project.user, "gaia");

        let config =
            ProjectConfig { user: Some("ci-bot".into()), ..ProjectConfig::default() };
        let project = Project::new("gaia", config).unwrap();
        assert_eq!(project.user, "ci-bot");
    }
}
