//! Vulnerability and integrity detection.
//!
//! Two pure predicates over `(mutation, mutant response, happy-path result)`
//! plus the bucket classifiers the report aggregator applies to flagged
//! results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Mutation, MutationKind, TargetRequest, TargetResponse, TestResult};
use crate::mutation::catalogs::INJECTION_SENTINELS;

/// A mutant response is a timing anomaly when it takes more than this factor
/// of the happy-path time.
pub const RESPONSE_TIME_DEVIATION_FACTOR: f64 = 5.0;

/// Absolute floor for the timing anomaly, so fast endpoints with jittery
/// sub-millisecond baselines don't false-positive.
pub const RESPONSE_TIME_MIN_DELTA_MS: u64 = 500;

/// Severity bucket for a vulnerable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilitySeverity {
    Critical,
    Warning,
    Info,
}

/// Classification bucket for an integrity issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityClass {
    ServiceUnavailable,
    UnexpectedSuccess,
    ResponseAnomaly,
}

/// True when the target responded as if it accepted input the mutation
/// intended to be rejected.
///
/// A `2xx` for an injection-class mutation is acceptance of malicious input;
/// a `5xx` is an unhandled path. `4xx` is the expected, healthy outcome.
pub fn detect_vulnerability(mutation: &Mutation, response: &TargetResponse) -> bool {
    let probing = matches!(
        mutation.kind,
        MutationKind::StringMalicious | MutationKind::SpecialCharacters | MutationKind::ExtraField
    ) || payload_contains_sentinel(&mutation.modified_request);

    if !probing {
        return false;
    }
    is_2xx(response.status_code) || is_5xx(response.status_code)
}

/// Severity of a result already flagged as vulnerable.
pub fn vulnerability_severity(result: &TestResult) -> VulnerabilitySeverity {
    if is_2xx(result.status_code) {
        VulnerabilitySeverity::Critical
    } else if result.status_code >= 500 {
        VulnerabilitySeverity::Warning
    } else {
        VulnerabilitySeverity::Info
    }
}

/// True when mutant behavior diverges from happy-path behavior in a way
/// that breaks the service contract.
pub fn detect_integrity_issue(
    mutation: &Mutation,
    response: &TargetResponse,
    happy: Option<&TestResult>,
) -> bool {
    let happy_succeeded = happy.is_some_and(TestResult::is_success);

    // Service went away for a mutant whose happy-path counterpart worked.
    if happy_succeeded && (response.error.is_some() || response.status_code >= 500) {
        return true;
    }

    // Input that clearly ought to have been rejected was accepted.
    if mutation.kind.expects_rejection() && is_2xx(response.status_code) {
        return true;
    }

    // Comparison-based anomalies against the happy path.
    if let Some(happy) = happy {
        if happy.is_success() && response.is_success() {
            if is_timing_anomaly(happy.elapsed_ms, response.elapsed_ms) {
                return true;
            }
            if body_shape(happy.body.as_ref()) != body_shape(response.body.as_ref()) {
                return true;
            }
        }
    }

    false
}

/// Bucket a result already flagged with an integrity issue.
pub fn integrity_class(result: &TestResult) -> IntegrityClass {
    if result.error.is_some() || result.status_code >= 500 {
        IntegrityClass::ServiceUnavailable
    } else if is_2xx(result.status_code) {
        IntegrityClass::UnexpectedSuccess
    } else {
        IntegrityClass::ResponseAnomaly
    }
}

fn is_2xx(status: u16) -> bool {
    (200..300).contains(&status)
}

fn is_5xx(status: u16) -> bool {
    (500..600).contains(&status)
}

fn is_timing_anomaly(happy_ms: u64, mutant_ms: u64) -> bool {
    let threshold = (happy_ms as f64 * RESPONSE_TIME_DEVIATION_FACTOR) as u64;
    mutant_ms > threshold && mutant_ms.saturating_sub(happy_ms) >= RESPONSE_TIME_MIN_DELTA_MS
}

/// Structural shape of a body for divergence comparison: the JSON type, and
/// for objects the key set.
fn body_shape(body: Option<&Value>) -> String {
    match body {
        None => "none".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(_)) => "bool".to_string(),
        Some(Value::Number(_)) => "number".to_string(),
        Some(Value::String(_)) => "string".to_string(),
        Some(Value::Array(_)) => "array".to_string(),
        Some(Value::Object(map)) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object[{}]", keys.join(","))
        }
    }
}

/// Whether the mutated request carries one of the injection catalog
/// sentinels in its payload or URL.
fn payload_contains_sentinel(request: &TargetRequest) -> bool {
    let haystack = match &request.payload {
        Some(payload) => format!("{} {payload}", request.url),
        None => request.url.clone(),
    };
    INJECTION_SENTINELS
        .iter()
        .any(|sentinel| haystack.contains(sentinel))
}
