//! Target request/response types and admission-time validation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ValidationError;

/// Minimum accepted per-request timeout.
pub const TIMEOUT_MIN_MS: u64 = 1_000;

/// Maximum accepted per-request timeout.
pub const TIMEOUT_MAX_MS: u64 = 300_000;

/// Timeout applied when the caller does not specify one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Accepted pattern for header names.
const HEADER_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

fn header_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEADER_NAME_PATTERN).expect("valid header name pattern"))
}

/// HTTP methods accepted for target requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// The canonical uppercase name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// A single HTTP request against the target endpoint.
///
/// Immutable once validated at admission. Headers use a `BTreeMap` so that
/// iteration order is stable — mutation generation depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRequest {
    /// Absolute HTTP/HTTPS URL of the target endpoint.
    pub url: String,
    /// HTTP method to issue.
    pub method: HttpMethod,
    /// Request headers (name → value).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional JSON payload sent as the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// The observed outcome of one request against the target.
///
/// `status_code = 0` denotes a transport failure before any HTTP status was
/// observed; `error` then carries the classified failure description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResponse {
    /// HTTP status code, or 0 for transport failures.
    pub status_code: u16,
    /// Wall-clock time the request took, in milliseconds.
    pub elapsed_ms: u64,
    /// Response body parsed as JSON when possible, raw string otherwise.
    pub body: Option<Value>,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Classified transport error, if the request never produced a status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetResponse {
    /// True when the request reached the target and got a non-error status.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code < 400
    }
}

/// Validate a test configuration, returning all errors found (not just the
/// first). Invoked exactly once, at admission.
pub fn validate_config(request: &TargetRequest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&request.url) {
        Ok(parsed) => {
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                errors.push(ValidationError::InvalidUrl {
                    url: request.url.clone(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            } else if parsed.host_str().is_none() {
                errors.push(ValidationError::InvalidUrl {
                    url: request.url.clone(),
                    message: "missing host".to_string(),
                });
            }
        }
        Err(e) => {
            errors.push(ValidationError::InvalidUrl {
                url: request.url.clone(),
                message: e.to_string(),
            });
        }
    }

    if request.timeout_ms < TIMEOUT_MIN_MS || request.timeout_ms > TIMEOUT_MAX_MS {
        errors.push(ValidationError::TimeoutOutOfRange {
            timeout_ms: request.timeout_ms,
            min_ms: TIMEOUT_MIN_MS,
            max_ms: TIMEOUT_MAX_MS,
        });
    }

    for (name, value) in &request.headers {
        if !header_name_regex().is_match(name) {
            errors.push(ValidationError::InvalidHeaderName { name: name.clone() });
        }
        if value.is_empty() {
            errors.push(ValidationError::EmptyHeaderValue { name: name.clone() });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
