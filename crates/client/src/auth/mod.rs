//! Request signing
//!
//! Two interchangeable signing schemes, selected by which credentials
//! variant the client was constructed with: Hawk (single
//! `Authorization` header) and two-legged OAuth 1.0 HMAC-SHA1 (query
//! parameters appended to the URL).
//!
//! A signer must be handed the exact method, URL and body that will go
//! on the wire; any mismatch invalidates the signature and the service
//! rejects the request with a 4xx authentication error.

mod hawk;
mod oauth;

pub use hawk::HawkSigner;
pub use oauth::OAuthSigner;

use reqwest::Method;
use roost_domain::{ClientError, Credentials};

use crate::constants::CONTENT_TYPE_JSON;

/// A fully described request, ready for the transport. Produced by a
/// [`Signer`] and consumed exactly once.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Ordered key/value pairs appended to the query string. Order
    /// matters for base-string reproducibility, not for transmission.
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SignedRequest {
    /// A request that carries no authorization artifact (reads).
    pub fn unsigned(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), query: Vec::new(), body: Vec::new() }
    }
}

/// Authorization artifact producer for write requests.
#[derive(Debug, Clone)]
pub enum Signer {
    Hawk(HawkSigner),
    OAuth(OAuthSigner),
}

impl Signer {
    /// Build the signer matching the credentials variant. `user` is
    /// carried as a bookkeeping parameter by the OAuth scheme only.
    pub fn from_credentials(credentials: &Credentials, user: &str) -> Self {
        match credentials {
            Credentials::Hawk { id, key, algorithm } => {
                Self::Hawk(HawkSigner::new(id.clone(), key.clone(), *algorithm))
            }
            Credentials::OAuth { consumer_key, consumer_secret } => Self::OAuth(OAuthSigner::new(
                consumer_key.clone(),
                consumer_secret.clone(),
                user.to_string(),
            )),
        }
    }

    /// Sign a request description. A fresh timestamp and nonce are
    /// generated per call, so the output is not deterministic.
    pub fn sign(
        &self,
        method: Method,
        url: &str,
        body: &[u8],
    ) -> Result<SignedRequest, ClientError> {
        match self {
            Self::Hawk(signer) => signer.sign(method, url, body),
            Self::OAuth(signer) => signer.sign(method, url, body),
        }
    }
}

/// Fresh random nonce for a signature.
fn nonce() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect()
}

/// Shared by both schemes: signed bodies are always JSON.
fn content_type_header() -> (String, String) {
    ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())
}
