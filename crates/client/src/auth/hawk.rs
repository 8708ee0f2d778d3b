//! Hawk request signing
//!
//! Implements the minimal client half of the Hawk scheme the service
//! accepts: a SHA-256 payload hash plus an HMAC-SHA256 MAC over the
//! `hawk.1.header` normalized string, emitted as one `Authorization`
//! header. No server-authorization verification, no SNTP offsets.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Method;
use roost_domain::{ClientError, HawkAlgorithm};
use sha2::{Digest, Sha256};
use url::Url;

use super::{content_type_header, nonce, SignedRequest};
use crate::constants::CONTENT_TYPE_JSON;

type HmacSha256 = Hmac<Sha256>;

/// Signer for Hawk credentials.
#[derive(Debug, Clone)]
pub struct HawkSigner {
    id: String,
    key: String,
    algorithm: HawkAlgorithm,
}

impl HawkSigner {
    pub fn new(id: String, key: String, algorithm: HawkAlgorithm) -> Self {
        Self { id, key, algorithm }
    }

    /// Sign with a fresh timestamp and nonce.
    pub fn sign(
        &self,
        method: Method,
        url: &str,
        body: &[u8],
    ) -> Result<SignedRequest, ClientError> {
        self.sign_at(method, url, body, Utc::now().timestamp(), &nonce())
    }

    /// Deterministic signing seam: all time/nonce inputs explicit.
    fn sign_at(
        &self,
        method: Method,
        url: &str,
        body: &[u8],
        ts: i64,
        nonce: &str,
    ) -> Result<SignedRequest, ClientError> {
        let (host, port, resource) = request_resource(url)?;
        let hash = payload_hash(CONTENT_TYPE_JSON, body);
        let normalized =
            normalized_string(ts, nonce, method.as_str(), &resource, &host, port, &hash);
        let mac = self.mac(&normalized)?;

        let authorization = format!(
            "Hawk id=\"{}\", ts=\"{ts}\", nonce=\"{nonce}\", hash=\"{hash}\", mac=\"{mac}\"",
            self.id
        );

        Ok(SignedRequest {
            method,
            url: url.to_string(),
            headers: vec![("Authorization".to_string(), authorization), content_type_header()],
            query: Vec::new(),
            body: body.to_vec(),
        })
    }

    fn mac(&self, normalized: &str) -> Result<String, ClientError> {
        match self.algorithm {
            HawkAlgorithm::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
                    .map_err(|e| ClientError::Validation(format!("invalid hawk key: {e}")))?;
                mac.update(normalized.as_bytes());
                Ok(BASE64.encode(mac.finalize().into_bytes()))
            }
        }
    }
}

/// `hawk.1.header` canonical string. The extension slot is always
/// empty for this client, hence the trailing blank line.
fn normalized_string(
    ts: i64,
    nonce: &str,
    method: &str,
    resource: &str,
    host: &str,
    port: u16,
    hash: &str,
) -> String {
    format!("hawk.1.header\n{ts}\n{nonce}\n{method}\n{resource}\n{host}\n{port}\n{hash}\n\n")
}

/// Base64 SHA-256 over the `hawk.1.payload` envelope.
fn payload_hash(content_type: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"hawk.1.payload\n");
    hasher.update(content_type.as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    hasher.update(b"\n");
    BASE64.encode(hasher.finalize())
}

/// Host, port (scheme default when implicit) and path-with-query.
fn request_resource(url: &str) -> Result<(String, u16, String), ClientError> {
    let parsed = Url::parse(url)
        .map_err(|e| ClientError::Validation(format!("invalid request url {url:?}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ClientError::Validation(format!("request url {url:?} has no host")))?
        .to_string();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| ClientError::Validation(format!("request url {url:?} has no port")))?;

    let mut resource = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        resource.push('?');
        resource.push_str(query);
    }

    Ok((host, port, resource))
}
