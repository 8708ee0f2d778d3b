//! Error types used throughout the client

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response header carrying the server-specified throttle wait, in
/// integer seconds. Header names are stored lowercase.
pub const THROTTLE_WAIT_HEADER: &str = "x-throttle-wait-seconds";

/// Main error type for Roost operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or invalid construction/input data. Fatal, raised before
    /// any I/O happens.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any I/O failure: network errors, authentication rejections,
    /// throttling, and other non-2xx responses. See [`ServiceError`].
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias for Roost operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Uniform failure shape for every I/O error path.
///
/// Produced whether the failure was a network-level error (no status),
/// a non-2xx response carrying a structured service error body, or a
/// non-2xx response without one. Carries enough for throttle detection
/// (status + headers) and for callers to inspect the cause.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    /// HTTP status, `None` for pure transport failures.
    pub status: Option<u16>,
    /// Response headers, lowercase names. Empty when unavailable.
    pub headers: BTreeMap<String, String>,
    /// The request URL that produced the failure.
    pub path: String,
}

/// Structured error body the service returns on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ServiceError {
    /// Network-level failure with no response to inspect.
    pub fn transport(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            headers: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// Normalize a non-2xx response.
    ///
    /// Prefers the message from the service's structured error body;
    /// falls back to a transport-level description (folding in the raw
    /// body text when one exists but is not structured).
    pub fn from_response(
        status: u16,
        headers: BTreeMap<String, String>,
        body: &str,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let fallback = format!("request to {path} failed with status {status}");
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.message,
            Err(_) if !body.is_empty() => format!("{fallback}: {body}"),
            Err(_) => fallback,
        };

        Self { message, status: Some(status), headers, path }
    }

    /// True for the service's backpressure signal (HTTP 429).
    pub fn is_throttled(&self) -> bool {
        self.status == Some(429)
    }

    /// True when the service rejected the request signature (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }

    /// Server-specified wait before resubmitting, parsed from the
    /// throttle header. `None` when the header is absent or malformed.
    pub fn throttle_wait(&self) -> Option<Duration> {
        self.headers
            .get(THROTTLE_WAIT_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}
