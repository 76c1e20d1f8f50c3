//! Per-test execution state: statuses, phases, result records, and the
//! registry-owned `TestExecution`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::mutation::{Mutation, MutationKind};
use super::request::{HttpMethod, TargetRequest, TargetResponse};

/// Lifecycle status of a test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TestStatus {
    /// Terminal states accept no further mutation of results.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The phase a running test is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestPhase {
    Validation,
    HappyPath,
    Mutations,
    Report,
}

/// Request details echoed into each result for self-contained reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetails {
    /// URL the request was issued against.
    pub url: String,
    /// HTTP method used.
    pub method: HttpMethod,
    /// Headers sent.
    pub headers: BTreeMap<String, String>,
    /// JSON payload sent, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Mutation kind, absent for the happy path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_type: Option<MutationKind>,
    /// Mutation description, absent for the happy path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_description: Option<String>,
}

/// The recorded outcome of one request (happy path or mutant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Unique result id.
    pub id: String,
    /// Id of the mutation that produced this result, absent for happy path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_id: Option<String>,
    /// True for the original, unmutated request.
    pub is_happy_path: bool,
    /// HTTP status observed, or 0 for transport failures.
    pub status_code: u16,
    /// Wall-clock time of the request in milliseconds.
    pub elapsed_ms: u64,
    /// Response body, if any.
    pub body: Option<Value>,
    /// Transport error description, if the request never got a status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the response indicates a vulnerability.
    pub vulnerability_detected: bool,
    /// Whether the response diverges from happy-path behavior.
    pub integrity_issue: bool,
    /// When the result was recorded.
    pub timestamp: DateTime<Utc>,
    /// The request that produced this result.
    pub request_details: RequestDetails,
}

impl TestResult {
    /// Build a result for the happy-path request.
    pub fn happy_path(request: &TargetRequest, response: &TargetResponse) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mutation_id: None,
            is_happy_path: true,
            status_code: response.status_code,
            elapsed_ms: response.elapsed_ms,
            body: response.body.clone(),
            error: response.error.clone(),
            vulnerability_detected: false,
            integrity_issue: false,
            timestamp: Utc::now(),
            request_details: RequestDetails {
                url: request.url.clone(),
                method: request.method,
                headers: request.headers.clone(),
                payload: request.payload.clone(),
                mutation_type: None,
                mutation_description: None,
            },
        }
    }

    /// Build a result for a mutant request. Detection flags start false and
    /// are filled in by the detector.
    pub fn for_mutation(mutation: &Mutation, response: &TargetResponse) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mutation_id: Some(mutation.id.clone()),
            is_happy_path: false,
            status_code: response.status_code,
            elapsed_ms: response.elapsed_ms,
            body: response.body.clone(),
            error: response.error.clone(),
            vulnerability_detected: false,
            integrity_issue: false,
            timestamp: Utc::now(),
            request_details: RequestDetails {
                url: mutation.modified_request.url.clone(),
                method: mutation.modified_request.method,
                headers: mutation.modified_request.headers.clone(),
                payload: mutation.modified_request.payload.clone(),
                mutation_type: Some(mutation.kind),
                mutation_description: Some(mutation.description.clone()),
            },
        }
    }

    /// True when the request reached the target and got a non-error status.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code < 400
    }
}

/// The registry-owned state of one test execution.
///
/// Mutated only by the owning engine task and the cancel/force-cleanup
/// paths; all reads are snapshot clones taken under the registry lock.
#[derive(Debug, Clone, Serialize)]
pub struct TestExecution {
    /// Test id (UUID v4).
    pub id: String,
    /// The validated original request.
    pub config: TargetRequest,
    /// When the test was admitted.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: TestStatus,
    /// Current phase.
    pub phase: TestPhase,
    /// Progress in percent, monotonically non-decreasing until terminal.
    pub progress: u8,
    /// Number of mutations generated (0 until generation has run).
    pub total_mutations: usize,
    /// Number of mutations whose results have been recorded.
    pub completed_mutations: usize,
    /// When execution started.
    pub start_time: DateTime<Utc>,
    /// When the test reached a terminal state. Set exactly once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Result of the happy-path request, kept out of `mutation_results`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_path_result: Option<TestResult>,
    /// Append-only log of mutant results in completion order.
    pub mutation_results: Vec<TestResult>,
    /// Cooperative cancellation flag, observed at batch boundaries.
    pub cancelled: bool,
    /// Token cancelled alongside the flag so in-flight dispatch can bail.
    #[serde(skip)]
    pub cancel_token: CancellationToken,
}

impl TestExecution {
    /// Create a fresh execution in `Pending`/`Validation` for admission.
    pub fn new(id: String, config: TargetRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            config,
            created_at: now,
            status: TestStatus::Pending,
            phase: TestPhase::Validation,
            progress: 0,
            total_mutations: 0,
            completed_mutations: 0,
            start_time: now,
            end_time: None,
            happy_path_result: None,
            mutation_results: Vec::new(),
            cancelled: false,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Mark the execution terminal, setting `end_time` exactly once.
    pub fn finish(&mut self, status: TestStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }
}
