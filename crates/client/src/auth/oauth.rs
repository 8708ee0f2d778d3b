//! Two-legged OAuth 1.0 request signing
//!
//! HMAC-SHA1 over the RFC 5849 base string with an empty token (the
//! empty `oauth_token` is what marks the request as two-legged), plus
//! an `oauth_body_hash` of the JSON payload and a `user` parameter the
//! service records for bookkeeping. The artifact is a set of query
//! parameters; no `Authorization` header is involved.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Method;
use roost_domain::ClientError;
use sha1::{Digest, Sha1};
use url::Url;

use super::{content_type_header, nonce, SignedRequest};

type HmacSha1 = Hmac<Sha1>;

/// Signer for two-legged OAuth consumer credentials.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    user: String,
}

impl OAuthSigner {
    pub fn new(consumer_key: String, consumer_secret: String, user: String) -> Self {
        Self { consumer_key, consumer_secret, user }
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
        let base_url = base_url(url)?;
        let body_hash = BASE64.encode(Sha1::digest(body));

        let mut params: Vec<(String, String)> = vec![
            ("oauth_body_hash".into(), body_hash),
            ("oauth_consumer_key".into(), self.consumer_key.clone()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), ts.to_string()),
            // Empty token: two-legged flow, RFC 5849 section 2.1.
            ("oauth_token".into(), String::new()),
            ("oauth_version".into(), "1.0".into()),
            ("user".into(), self.user.clone()),
        ];

        let base = base_string(method.as_str(), &base_url, &params);
        let signature = self.signature(&base)?;
        params.push(("oauth_signature".into(), signature));

        Ok(SignedRequest {
            method,
            url: url.to_string(),
            headers: vec![content_type_header()],
            query: params,
            body: body.to_vec(),
        })
    }

    fn signature(&self, base: &str) -> Result<String, ClientError> {
        // Token secret is empty in the two-legged flow, so the key is
        // just the encoded consumer secret and the separator.
        let key = format!("{}&", percent(&self.consumer_secret));
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| ClientError::Validation(format!("invalid oauth key: {e}")))?;
        mac.update(base.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// RFC 3986 percent-encoding with the unreserved set OAuth mandates.
fn percent(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// The request URL stripped of query and fragment, normalized the way
/// the base string wants it (lowercase scheme/host, default ports
/// dropped by the `url` parser).
fn base_url(url: &str) -> Result<String, ClientError> {
    let mut parsed = Url::parse(url)
        .map_err(|e| ClientError::Validation(format!("invalid request url {url:?}: {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// `METHOD&encoded-url&encoded-sorted-params` per RFC 5849 section
/// 3.4.1. Pairs are encoded before sorting, as the RFC specifies.
fn base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (percent(k), percent(v))).collect();
    encoded.sort();

    let param_string =
        encoded.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    format!("{}&{}&{}", method, percent(base_url), percent(&param_string))
}
