//! Reqwest-based transport implementation.
//!
//! Accept-all status semantics, per-request timeout, transport-failure
//! classification, and a per-request `X-Correlation-ID` header.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{Transport, CORRELATION_ID_HEADER};
use crate::model::{TargetRequest, TargetResponse};

/// HTTP transport over a shared `reqwest::Client`.
///
/// The client is built without a global timeout; each request carries its
/// own, taken from the test configuration.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh reqwest client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Classify a reqwest error into the transport error taxonomy.
    fn classify_error(err: &reqwest::Error, timeout_ms: u64) -> String {
        if err.is_timeout() {
            return format!("request timed out after {timeout_ms}ms");
        }
        if err.is_connect() {
            let chain = error_chain(err);
            if chain.contains("dns") || chain.contains("resolve") {
                return format!("dns resolution failed: {err}");
            }
            return format!("connection failed: {err}");
        }
        format!("transport error: {err}")
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the full error chain as a lowercase string for classification.
fn error_chain(err: &reqwest::Error) -> String {
    let mut chain = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        chain.push_str(": ");
        chain.push_str(&inner.to_string());
        source = inner.source();
    }
    chain.to_lowercase()
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &TargetRequest) -> TargetResponse {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(Duration::from_millis(request.timeout_ms))
            .header(CORRELATION_ID_HEADER, &correlation_id);

        for (name, value) in &request.headers {
            // Mutated values can contain bytes hyper refuses to send (CRLF
            // injection payloads). Such headers are dropped: the wire keeps
            // the rest of the mutant intact.
            match reqwest::header::HeaderValue::from_str(value) {
                Ok(header_value) => {
                    if let Ok(header_name) =
                        reqwest::header::HeaderName::from_bytes(name.as_bytes())
                    {
                        builder = builder.header(header_name, header_value);
                    } else {
                        tracing::debug!(header = %name, "unsendable header name dropped");
                    }
                }
                Err(_) => {
                    tracing::debug!(header = %name, "unsendable header value dropped");
                }
            }
        }

        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let started = Instant::now();
        match builder.send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let headers: BTreeMap<String, String> = response
                    .headers()
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.as_str().to_string(),
                            v.to_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect();
                let text = response.text().await.unwrap_or_default();
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let body = parse_body(&text);

                tracing::debug!(
                    url = %request.url,
                    status = status_code,
                    elapsed_ms,
                    correlation_id = %correlation_id,
                    "target response"
                );

                TargetResponse {
                    status_code,
                    elapsed_ms,
                    body,
                    headers,
                    error: None,
                }
            }
            Err(err) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let classified = Self::classify_error(&err, request.timeout_ms);
                tracing::debug!(
                    url = %request.url,
                    elapsed_ms,
                    error = %classified,
                    "transport failure"
                );
                TargetResponse {
                    status_code: 0,
                    elapsed_ms,
                    body: None,
                    headers: BTreeMap::new(),
                    error: Some(classified),
                }
            }
        }
    }
}

/// Parse a response body as JSON where possible, raw string otherwise.
fn parse_body(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text.to_string())),
    }
}
