//! Test execution engine.
//!
//! One background task per admitted test drives the state machine end to
//! end: happy path, mutation generation, bounded-concurrency batch
//! dispatch, detection, and completion. The registry serializes all state
//! access; the task and the cancel/cleanup paths are the only writers.
//!
//! Submodules:
//! - [`registry`]: the shared id → execution map with atomic admission.

pub mod registry;

pub use registry::Registry;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::detect;
use crate::error::EngineError;
use crate::metrics::{MetricsSink, MetricsSummary};
use crate::model::{
    validate_config, TargetRequest, TestExecution, TestPhase, TestResult, TestStatus,
};
use crate::mutation::{MutationGenerator, Mutator};
use crate::report::{self, Report};
use crate::transport::Transport;

/// Maximum number of non-terminal tests admitted at once.
pub const MAX_CONCURRENT_TESTS: usize = 10;

/// Number of mutations dispatched concurrently within one batch.
pub const MAX_CONCURRENT_MUTATIONS: usize = 5;

/// Pause between mutation batches, to reduce target load.
pub const INTER_BATCH_DELAY_MS: u64 = 100;

/// Progress value while the happy path is in flight.
const PROGRESS_HAPPY_PATH: u8 = 10;

/// Progress value when mutation dispatch begins.
const PROGRESS_MUTATIONS_START: u8 = 25;

/// Progress span covered by mutation dispatch (25 → 95).
const PROGRESS_MUTATIONS_SPAN: u8 = 70;

/// Engine tunables. The defaults are the production constants; tests
/// shrink them.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Admission limit for non-terminal tests.
    pub max_concurrent_tests: usize,
    /// Concurrent transport calls per batch.
    pub max_concurrent_mutations: usize,
    /// Delay between batches.
    pub inter_batch_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tests: MAX_CONCURRENT_TESTS,
            max_concurrent_mutations: MAX_CONCURRENT_MUTATIONS,
            inter_batch_delay: Duration::from_millis(INTER_BATCH_DELAY_MS),
        }
    }
}

/// Client-facing status snapshot of one test.
#[derive(Debug, Clone, Serialize)]
pub struct TestStatusView {
    pub test_id: String,
    pub status: TestStatus,
    pub phase: TestPhase,
    pub progress: u8,
    pub total_mutations: usize,
    pub completed_mutations: usize,
    pub created_at: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub cancelled: bool,
}

impl From<&TestExecution> for TestStatusView {
    fn from(execution: &TestExecution) -> Self {
        Self {
            test_id: execution.id.clone(),
            status: execution.status,
            phase: execution.phase,
            progress: execution.progress,
            total_mutations: execution.total_mutations,
            completed_mutations: execution.completed_mutations,
            created_at: execution.created_at,
            start_time: execution.start_time,
            end_time: execution.end_time,
            cancelled: execution.cancelled,
        }
    }
}

/// Aggregate engine statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatistics {
    pub total_tests: usize,
    pub active_tests: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub metrics: MetricsSummary,
}

/// The test execution engine.
///
/// Cheap to clone: all state is behind `Arc`s. A composition root builds
/// one engine and threads it into handlers.
#[derive(Clone)]
pub struct TestEngine {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    mutator: Arc<dyn Mutator>,
    metrics: Arc<MetricsSink>,
    config: EngineConfig,
}

impl TestEngine {
    /// Create an engine with the default generator and configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(
            transport,
            Arc::new(MutationGenerator::new()),
            EngineConfig::default(),
        )
    }

    /// Create an engine with explicit collaborators (tests use stubs).
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        mutator: Arc<dyn Mutator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: Arc::new(Registry::new(config.max_concurrent_tests)),
            transport,
            mutator,
            metrics: Arc::new(MetricsSink::new()),
            config,
        }
    }

    /// Validate and admit a test, then schedule its execution task.
    ///
    /// Returns the new test id. Fails with `Validation` on a bad config and
    /// `Overloaded` when the admission limit is reached.
    pub async fn start(&self, config: TargetRequest) -> Result<String, EngineError> {
        validate_config(&config).map_err(|mut errors| {
            // Surface the first problem; the rest are in the logs.
            for error in &errors[1..] {
                tracing::debug!(error = %error, "additional validation error");
            }
            EngineError::Validation(errors.remove(0))
        })?;

        let id = uuid::Uuid::new_v4().to_string();
        let execution = TestExecution::new(id.clone(), config);
        self.registry.admit(execution).await?;

        tracing::info!(test_id = %id, "test admitted");
        let engine = self.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            engine.run_test(task_id).await;
        });

        Ok(id)
    }

    /// Status snapshot for one test.
    pub async fn status(&self, id: &str) -> Result<TestStatusView, EngineError> {
        let execution = self.registry.snapshot(id).await?;
        Ok(TestStatusView::from(&execution))
    }

    /// Mutation results recorded so far (happy path excluded).
    pub async fn results(&self, id: &str) -> Result<Vec<TestResult>, EngineError> {
        let execution = self.registry.snapshot(id).await?;
        Ok(execution.mutation_results)
    }

    /// Full execution snapshot: config, status, and results.
    pub async fn execution(&self, id: &str) -> Result<TestExecution, EngineError> {
        self.registry.snapshot(id).await
    }

    /// Cooperatively cancel a running test.
    ///
    /// Terminal tests yield `Conflict`. In-flight transport calls settle
    /// normally but their results are discarded.
    pub async fn cancel(&self, id: &str) -> Result<(), EngineError> {
        self.registry
            .update(id, |execution| {
                if execution.status.is_terminal() {
                    return Err(EngineError::Conflict {
                        message: format!("test {} is already terminal", execution.id),
                    });
                }
                execution.cancelled = true;
                execution.cancel_token.cancel();
                execution.finish(TestStatus::Failed);
                tracing::info!(test_id = %execution.id, "test cancelled");
                Ok(())
            })
            .await?
    }

    /// Pausing is part of the public contract but not implemented.
    pub fn pause(&self, _id: &str) -> Result<(), EngineError> {
        Err(EngineError::NotImplemented { operation: "pause" })
    }

    /// Resuming is part of the public contract but not implemented.
    pub fn resume(&self, _id: &str) -> Result<(), EngineError> {
        Err(EngineError::NotImplemented {
            operation: "resume",
        })
    }

    /// Remove one test regardless of state, cancelling it first if running.
    pub async fn force_cleanup(&self, id: &str) -> Result<(), EngineError> {
        let _ = self
            .registry
            .update(id, |execution| {
                if !execution.status.is_terminal() {
                    execution.cancelled = true;
                    execution.cancel_token.cancel();
                    execution.finish(TestStatus::Failed);
                }
            })
            .await?;
        self.registry.remove(id).await?;
        tracing::info!(test_id = %id, "test force-removed");
        Ok(())
    }

    /// Remove terminal tests older than `max_age_ms`. Returns the count
    /// removed.
    pub async fn cleanup_completed(&self, max_age_ms: u64) -> usize {
        let removed = self.registry.cleanup_completed(max_age_ms).await;
        if removed > 0 {
            tracing::info!(removed, max_age_ms, "cleaned up completed tests");
        }
        removed
    }

    /// Status views of all non-terminal tests.
    pub async fn active_tests(&self) -> Vec<TestStatusView> {
        self.registry
            .active()
            .await
            .iter()
            .map(TestStatusView::from)
            .collect()
    }

    /// Aggregate statistics across the registry and the metrics sink.
    pub async fn statistics(&self) -> EngineStatistics {
        let counts = self.registry.status_counts().await;
        let get = |status: TestStatus| counts.get(&status).copied().unwrap_or(0);
        let pending = get(TestStatus::Pending);
        let running = get(TestStatus::Running);
        let completed = get(TestStatus::Completed);
        let failed = get(TestStatus::Failed);
        EngineStatistics {
            total_tests: pending + running + completed + failed,
            active_tests: pending + running,
            pending,
            running,
            completed,
            failed,
            metrics: self.metrics.summary().await,
        }
    }

    /// Build the aggregated report for a completed test.
    ///
    /// Requires `Completed` with a happy-path result; anything else is a
    /// state conflict.
    pub async fn report(&self, id: &str) -> Result<Report, EngineError> {
        let execution = self.registry.snapshot(id).await?;
        if execution.status != TestStatus::Completed {
            return Err(EngineError::Conflict {
                message: format!(
                    "report requires a completed test, current status is {:?}",
                    execution.status
                ),
            });
        }
        let happy = execution
            .happy_path_result
            .as_ref()
            .ok_or_else(|| EngineError::Conflict {
                message: "completed test has no happy-path result".to_string(),
            })?;
        Ok(report::generate_report(
            &execution.id,
            &execution.config,
            happy,
            &execution.mutation_results,
            execution.start_time,
            execution.end_time.unwrap_or(execution.start_time),
        ))
    }

    /// Drive one test end to end, containing any internal fault to this
    /// test.
    async fn run_test(self, id: String) {
        match self.drive(&id).await {
            Ok(()) => {}
            Err(EngineError::NotFound { .. }) => {
                tracing::debug!(test_id = %id, "execution removed mid-run");
            }
            Err(error) => {
                tracing::error!(test_id = %id, error = %error, "test task failed");
                let _ = self
                    .registry
                    .update(&id, |execution| {
                        if !execution.status.is_terminal() {
                            execution.finish(TestStatus::Failed);
                        }
                    })
                    .await;
            }
        }
    }

    async fn drive(&self, id: &str) -> Result<(), EngineError> {
        // Happy path.
        let (request, token) = self
            .registry
            .update(id, |execution| {
                execution.status = TestStatus::Running;
                execution.phase = TestPhase::HappyPath;
                execution.progress = PROGRESS_HAPPY_PATH;
                (execution.config.clone(), execution.cancel_token.clone())
            })
            .await?;

        tracing::info!(test_id = %id, url = %request.url, "issuing happy path");
        let happy_response = self.transport.execute(&request).await;
        self.metrics
            .record(
                happy_response.status_code,
                happy_response.elapsed_ms,
                happy_response.error.is_some(),
            )
            .await;
        let happy_result = TestResult::happy_path(&request, &happy_response);

        if happy_response.error.is_some() || happy_response.status_code >= 400 {
            tracing::info!(
                test_id = %id,
                status = happy_response.status_code,
                "happy path failed, aborting test"
            );
            self.registry
                .update(id, |execution| {
                    if !execution.status.is_terminal() {
                        execution.happy_path_result = Some(happy_result);
                        execution.finish(TestStatus::Failed);
                    }
                })
                .await?;
            return Ok(());
        }

        // Mutation generation.
        let mutations = self.mutator.generate(&request);
        let total = mutations.len();
        let proceed = self
            .registry
            .update(id, |execution| {
                if execution.cancelled || execution.status.is_terminal() {
                    return false;
                }
                execution.happy_path_result = Some(happy_result.clone());
                execution.phase = TestPhase::Mutations;
                execution.total_mutations = total;
                execution.progress = PROGRESS_MUTATIONS_START;
                true
            })
            .await?;
        if !proceed {
            return Ok(());
        }
        tracing::info!(test_id = %id, total, "dispatching mutations");

        // Batched dispatch.
        let batch_size = self.config.max_concurrent_mutations.max(1);
        for (batch_index, batch) in mutations.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }

            // Batch boundary: observe cancellation before dispatching.
            if token.is_cancelled() || self.registry.update(id, |e| e.cancelled).await? {
                tracing::info!(test_id = %id, "cancellation observed at batch boundary");
                return Ok(());
            }

            let settled = futures::future::join_all(batch.iter().map(|mutation| {
                let token = token.clone();
                async move {
                    if token.is_cancelled() {
                        return None;
                    }
                    let response = self.transport.execute(&mutation.modified_request).await;
                    Some((mutation, response))
                }
            }))
            .await;

            let mut batch_results = Vec::with_capacity(batch.len());
            for (mutation, response) in settled.into_iter().flatten() {
                self.metrics
                    .record(
                        response.status_code,
                        response.elapsed_ms,
                        response.error.is_some(),
                    )
                    .await;
                let mut result = TestResult::for_mutation(mutation, &response);
                result.vulnerability_detected = detect::detect_vulnerability(mutation, &response);
                result.integrity_issue =
                    detect::detect_integrity_issue(mutation, &response, Some(&happy_result));
                batch_results.push(result);
            }

            let appended = batch_results.len();
            let keep_going = self
                .registry
                .update(id, move |execution| {
                    if execution.cancelled || execution.status.is_terminal() {
                        // Results of in-flight calls are discarded after
                        // cancellation.
                        return false;
                    }
                    execution.mutation_results.extend(batch_results);
                    execution.completed_mutations += appended;
                    execution.progress = mutation_progress(
                        execution.completed_mutations,
                        execution.total_mutations,
                    );
                    true
                })
                .await?;
            if !keep_going {
                return Ok(());
            }
            tracing::debug!(test_id = %id, batch = batch_index, appended, "batch settled");
        }

        // Completion.
        self.registry
            .update(id, |execution| {
                if !execution.status.is_terminal() && !execution.cancelled {
                    execution.phase = TestPhase::Report;
                    execution.progress = 100;
                    execution.finish(TestStatus::Completed);
                }
            })
            .await?;
        tracing::info!(test_id = %id, total, "test completed");
        Ok(())
    }
}

/// Progress during mutation dispatch: 25 at the start, 95 when every batch
/// has settled.
fn mutation_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_MUTATIONS_START;
    }
    let span = (completed * PROGRESS_MUTATIONS_SPAN as usize) / total;
    PROGRESS_MUTATIONS_START + span as u8
}
