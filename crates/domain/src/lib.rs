//! # Roost Domain
//!
//! Wire types and error taxonomy for the Roost ingestion service client.
//!
//! This crate contains:
//! - Result-set, revision and job schema types
//! - Signing credential variants
//! - The uniform `ServiceError` shape and the `ClientError` taxonomy
//!
//! ## Architecture
//! - No dependencies on other Roost crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
