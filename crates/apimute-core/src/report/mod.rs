//! Report aggregation: summary statistics over a completed test and the
//! derived views used by the JSON export.
//!
//! Submodules:
//! - [`export`]: JSON export formatting and filename derivation.

pub mod export;

pub use export::{export_summary_to_json, export_to_json, filename};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{TargetRequest, TestResult};

/// Aggregate counts over the happy path and all mutant results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Happy path plus all mutants.
    pub total_tests: i64,
    /// Results with no transport error and status below 400.
    pub successful_tests: i64,
    /// Everything else.
    pub failed_tests: i64,
    /// Results flagged by the vulnerability detector.
    pub vulnerabilities_found: i64,
    /// Results flagged by the integrity detector.
    pub integrity_issues: i64,
    /// Mean response time in milliseconds, rounded to 2 decimals.
    pub average_response_time: f64,
}

/// Report provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// The tested endpoint.
    pub target_url: String,
    /// When execution started.
    pub execution_date: DateTime<Utc>,
    /// Total execution duration in milliseconds.
    pub duration_ms: i64,
}

/// The aggregated, exportable outcome of one completed test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The test this report belongs to.
    pub test_id: String,
    /// Aggregate counts.
    pub summary: ReportSummary,
    /// Provenance.
    pub metadata: ReportMetadata,
    /// The happy-path result.
    pub happy_path_result: TestResult,
    /// All mutant results, in completion order.
    pub mutation_results: Vec<TestResult>,
}

/// Compute the report for a completed test.
pub fn generate_report(
    test_id: &str,
    config: &TargetRequest,
    happy: &TestResult,
    mutants: &[TestResult],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Report {
    let total = 1 + mutants.len();
    let successful = std::iter::once(happy)
        .chain(mutants.iter())
        .filter(|r| r.is_success())
        .count();
    let vulnerabilities = std::iter::once(happy)
        .chain(mutants.iter())
        .filter(|r| r.vulnerability_detected)
        .count();
    let integrity = std::iter::once(happy)
        .chain(mutants.iter())
        .filter(|r| r.integrity_issue)
        .count();
    let elapsed_sum: u64 = std::iter::once(happy)
        .chain(mutants.iter())
        .map(|r| r.elapsed_ms)
        .sum();

    Report {
        test_id: test_id.to_string(),
        summary: ReportSummary {
            total_tests: total as i64,
            successful_tests: successful as i64,
            failed_tests: (total - successful) as i64,
            vulnerabilities_found: vulnerabilities as i64,
            integrity_issues: integrity as i64,
            average_response_time: round2(elapsed_sum as f64 / total as f64),
        },
        metadata: ReportMetadata {
            target_url: config.url.clone(),
            execution_date: start,
            duration_ms: (end - start).num_milliseconds(),
        },
        happy_path_result: happy.clone(),
        mutation_results: mutants.to_vec(),
    }
}

/// Sanity-check a report before export.
///
/// The structural requirements (happy-path result present, results an
/// ordered sequence) are enforced by the types; this checks the value-level
/// constraints.
pub fn validate(report: &Report) -> bool {
    !report.test_id.is_empty()
        && !report.metadata.target_url.is_empty()
        && report.summary.total_tests >= 0
        && report.metadata.duration_ms >= 0
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
