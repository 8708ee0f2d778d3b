use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Client as ReqwestClient;
use roost_domain::{ClientError, ServiceError};
use tracing::debug;

use crate::auth::SignedRequest;
use crate::constants::USER_AGENT;

/// Thin wrapper over a shared reqwest client.
///
/// On a non-2xx response it captures the status, every response header
/// (so the throttle controller can read the wait header) and the
/// service's structured error body when one is present. Network-level
/// failures come back with no status at all. Successful responses are
/// handed to the caller for deserialization.
#[derive(Debug, Clone)]
pub struct Transport {
    client: ReqwestClient,
}

impl Transport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Validation(format!("failed to build http client: {e}")))?;

        Ok(Self { client })
    }

    /// Execute a request, consuming it.
    pub async fn send(&self, request: SignedRequest) -> Result<reqwest::Response, ServiceError> {
        let SignedRequest { method, url, headers, query, body } = request;

        debug!(%method, %url, "sending request");

        let mut builder = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ServiceError::transport(e.to_string(), url.as_str()))?;

        let status = response.status();
        debug!(%method, %url, %status, "received response");

        if status.is_success() {
            return Ok(response);
        }

        let headers = header_map(response.headers());
        let path = response.url().to_string();
        let body_text = response.text().await.unwrap_or_default();

        Err(ServiceError::from_response(status.as_u16(), headers, &body_text, path))
    }
}

/// Lowercased name/value map of every readable response header.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Method;
    use roost_domain::THROTTLE_WAIT_HEADER;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport() -> Transport {
        Transport::new(Duration::from_secs(5)).expect("transport")
    }

    #[tokio::test]
    async fn success_passes_the_response_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let response = transport()
            .send(SignedRequest::unsigned(Method::GET, server.uri()))
            .await
            .expect("response");
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn error_with_structured_body_embeds_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "message": "objectstore exploded" })),
            )
            .mount(&server)
            .await;

        let err = transport()
            .send(SignedRequest::unsigned(Method::GET, server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(500));
        assert!(err.message.contains("objectstore exploded"));
    }

    #[tokio::test]
    async fn error_without_body_falls_back_to_transport_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = transport()
            .send(SignedRequest::unsigned(Method::GET, server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(500));
        assert!(err.message.contains("500"));
        assert!(err.message.contains(&server.uri()));
    }

    #[tokio::test]
    async fn throttle_headers_are_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header(THROTTLE_WAIT_HEADER, "7"))
            .mount(&server)
            .await;

        let err = transport()
            .send(SignedRequest::unsigned(Method::POST, server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_throttled());
        assert_eq!(err.throttle_wait(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        // grab a free port and release it so the connection is refused
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{}/", addr);

        let err = transport()
            .send(SignedRequest::unsigned(Method::GET, url.as_str()))
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
        assert!(err.headers.is_empty());
        assert_eq!(err.path, url);
    }
}
