//! # Roost Client
//!
//! Client library for the Roost CI-results ingestion service.
//!
//! This crate contains:
//! - Request signers for the two supported schemes (Hawk, two-legged
//!   OAuth 1.0 HMAC-SHA1), selected by credentials variant
//! - The HTTP transport and error normalization
//! - The throttle-aware retry wrapper for write operations
//! - Converters from VCS provider payloads to the service schema
//! - The per-project client facade
//!
//! ## Example
//!
//! ```no_run
//! use roost_client::{Project, ProjectConfig};
//! use roost_domain::Credentials;
//!
//! # async fn run() -> roost_domain::Result<()> {
//! let project = Project::new(
//!     "gaia",
//!     ProjectConfig {
//!         credentials: Some(Credentials::hawk("client-id", "secret")),
//!         ..ProjectConfig::default()
//!     },
//! )?;
//!
//! let result_sets = project.get_result_sets().await?;
//! # let _ = result_sets;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod constants;
pub mod convert;
pub mod http;
pub mod project;
pub mod throttle;

pub use auth::{SignedRequest, Signer};
pub use project::{Project, ProjectConfig};
pub use throttle::{with_throttle_retry, ThrottlePolicy, ThrottleSignal};
