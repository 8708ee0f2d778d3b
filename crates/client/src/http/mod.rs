//! HTTP transport
//!
//! Issues [`SignedRequest`](crate::SignedRequest)s and normalizes every
//! failure path into the uniform [`ServiceError`](roost_domain::ServiceError)
//! shape.

mod transport;

pub use transport::Transport;
