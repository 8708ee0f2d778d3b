//! Client constants
//!
//! Centralized location for service defaults. The base URL is a plain
//! documented constant: environment lookup belongs to the surrounding
//! application, not this library.

use std::time::Duration;

/// Default ingestion API root. Override via
/// [`ProjectConfig::base_url`](crate::ProjectConfig).
pub const DEFAULT_BASE_URL: &str = "https://roost.allizom.org/api/";

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("roost-client/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONTENT_TYPE_JSON: &str = "application/json";
