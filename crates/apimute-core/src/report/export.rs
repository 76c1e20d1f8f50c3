//! JSON export formatting and filename derivation.
//!
//! The full export carries the report plus derived views (categorized
//! results, response-time statistics, status distribution, severity
//! buckets) and a self-describing `export_metadata` block. Output is
//! pretty-printed UTF-8 with 2-space indentation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::{round2, Report};
use crate::detect::{self, IntegrityClass, VulnerabilitySeverity};
use crate::error::ExportError;
use crate::model::TestResult;

/// Version stamp written into every export.
const EXPORT_VERSION: &str = "1.0.0";

/// Format tag of the full export.
const FORMAT_FULL: &str = "api-mutation-tester-report";

/// Format tag of the summary-only export.
const FORMAT_SUMMARY: &str = "api-mutation-tester-summary";

#[derive(Debug, Serialize)]
struct ExportMetadata {
    export_date: DateTime<Utc>,
    version: &'static str,
    format: &'static str,
}

/// Mutant results partitioned by outcome.
#[derive(Debug, Serialize)]
struct CategorizedResults<'a> {
    successful: Vec<&'a TestResult>,
    failed: Vec<&'a TestResult>,
    vulnerabilities: Vec<&'a TestResult>,
    integrity_issues: Vec<&'a TestResult>,
}

/// Response-time statistics over all results, rounded to 2 decimals.
#[derive(Debug, Serialize)]
pub struct ResponseTimeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
}

/// Vulnerable results bucketed by severity.
#[derive(Debug, Serialize)]
struct VulnerabilityBuckets<'a> {
    critical: Vec<&'a TestResult>,
    warning: Vec<&'a TestResult>,
    info: Vec<&'a TestResult>,
}

/// Integrity-flagged results bucketed by class.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct IntegrityBuckets<'a> {
    service_unavailable: Vec<&'a TestResult>,
    unexpected_success: Vec<&'a TestResult>,
    response_anomaly: Vec<&'a TestResult>,
}

#[derive(Serialize)]
struct FullExport<'a> {
    #[serde(flatten)]
    report: &'a Report,
    categorized_results: CategorizedResults<'a>,
    response_time_stats: ResponseTimeStats,
    status_code_distribution: BTreeMap<u16, usize>,
    vulnerability_severity: VulnerabilityBuckets<'a>,
    integrity_classification: IntegrityBuckets<'a>,
    export_metadata: ExportMetadata,
}

#[derive(Serialize)]
struct SummaryExport<'a> {
    test_id: &'a str,
    summary: &'a super::ReportSummary,
    metadata: &'a super::ReportMetadata,
    export_metadata: ExportMetadata,
}

/// Serialize the full report with derived views as pretty-printed JSON.
///
/// Self-referential payloads never reach this point: the generator emits a
/// sentinel string in place of cycles.
pub fn export_to_json(report: &Report) -> Result<Vec<u8>, ExportError> {
    let all: Vec<&TestResult> = std::iter::once(&report.happy_path_result)
        .chain(report.mutation_results.iter())
        .collect();

    let export = FullExport {
        report,
        categorized_results: categorize(&report.mutation_results),
        response_time_stats: response_time_stats(&all),
        status_code_distribution: status_code_distribution(&all),
        vulnerability_severity: vulnerability_buckets(&all),
        integrity_classification: integrity_buckets(&all),
        export_metadata: ExportMetadata {
            export_date: Utc::now(),
            version: EXPORT_VERSION,
            format: FORMAT_FULL,
        },
    };
    serde_json::to_vec_pretty(&export).map_err(|source| ExportError::Serialize { source })
}

/// Serialize the summary-only export variant.
pub fn export_summary_to_json(report: &Report) -> Result<Vec<u8>, ExportError> {
    let export = SummaryExport {
        test_id: &report.test_id,
        summary: &report.summary,
        metadata: &report.metadata,
        export_metadata: ExportMetadata {
            export_date: Utc::now(),
            version: EXPORT_VERSION,
            format: FORMAT_SUMMARY,
        },
    };
    serde_json::to_vec_pretty(&export).map_err(|source| ExportError::Serialize { source })
}

/// Derive the export filename:
/// `api-mutation-test-<safe-host>-<YYYY-MM-DD>-<HH-MM-SS>-<id8>.json`.
///
/// When the target URL does not parse, falls back to
/// `api-mutation-test-<iso-timestamp>-<id8>.json`.
pub fn filename(report: &Report) -> String {
    let id8: String = report.test_id.chars().take(8).collect();
    match Url::parse(&report.metadata.target_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    {
        Some(host) => {
            let safe_host: String = host
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            format!(
                "api-mutation-test-{safe_host}-{}-{id8}.json",
                report.metadata.execution_date.format("%Y-%m-%d-%H-%M-%S")
            )
        }
        None => format!(
            "api-mutation-test-{}-{id8}.json",
            report.metadata.execution_date.format("%Y-%m-%dT%H-%M-%S")
        ),
    }
}

fn categorize(mutants: &[TestResult]) -> CategorizedResults<'_> {
    CategorizedResults {
        successful: mutants.iter().filter(|r| r.is_success()).collect(),
        failed: mutants.iter().filter(|r| !r.is_success()).collect(),
        vulnerabilities: mutants.iter().filter(|r| r.vulnerability_detected).collect(),
        integrity_issues: mutants.iter().filter(|r| r.integrity_issue).collect(),
    }
}

fn response_time_stats(all: &[&TestResult]) -> ResponseTimeStats {
    if all.is_empty() {
        return ResponseTimeStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
            p95: 0.0,
        };
    }
    let mut times: Vec<u64> = all.iter().map(|r| r.elapsed_ms).collect();
    times.sort_unstable();

    let n = times.len();
    let sum: u64 = times.iter().sum();
    let median = if n % 2 == 0 {
        (times[n / 2 - 1] + times[n / 2]) as f64 / 2.0
    } else {
        times[n / 2] as f64
    };
    let p95_index = ((n as f64 * 0.95).ceil() as usize).saturating_sub(1).min(n - 1);

    ResponseTimeStats {
        min: times[0] as f64,
        max: times[n - 1] as f64,
        mean: round2(sum as f64 / n as f64),
        median: round2(median),
        p95: round2(times[p95_index] as f64),
    }
}

fn status_code_distribution(all: &[&TestResult]) -> BTreeMap<u16, usize> {
    let mut distribution = BTreeMap::new();
    for result in all {
        *distribution.entry(result.status_code).or_default() += 1;
    }
    distribution
}

fn vulnerability_buckets<'a>(all: &[&'a TestResult]) -> VulnerabilityBuckets<'a> {
    let mut buckets = VulnerabilityBuckets {
        critical: Vec::new(),
        warning: Vec::new(),
        info: Vec::new(),
    };
    for result in all.iter().copied().filter(|r| r.vulnerability_detected) {
        match detect::vulnerability_severity(result) {
            VulnerabilitySeverity::Critical => buckets.critical.push(result),
            VulnerabilitySeverity::Warning => buckets.warning.push(result),
            VulnerabilitySeverity::Info => buckets.info.push(result),
        }
    }
    buckets
}

fn integrity_buckets<'a>(all: &[&'a TestResult]) -> IntegrityBuckets<'a> {
    let mut buckets = IntegrityBuckets {
        service_unavailable: Vec::new(),
        unexpected_success: Vec::new(),
        response_anomaly: Vec::new(),
    };
    for result in all.iter().copied().filter(|r| r.integrity_issue) {
        match detect::integrity_class(result) {
            IntegrityClass::ServiceUnavailable => buckets.service_unavailable.push(result),
            IntegrityClass::UnexpectedSuccess => buckets.unexpected_success.push(result),
            IntegrityClass::ResponseAnomaly => buckets.response_anomaly.push(result),
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, MutationKind, RequestDetails, TargetRequest};
    use crate::report::generate_report;

    fn config() -> TargetRequest {
        TargetRequest {
            url: "https://api.example.com:8443/users".to_string(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            payload: None,
            timeout_ms: 30_000,
        }
    }

    fn result(status: u16, elapsed_ms: u64, vulnerable: bool, integrity: bool) -> TestResult {
        TestResult {
            id: uuid::Uuid::new_v4().to_string(),
            mutation_id: Some("mut-extra-field-x-1-0".to_string()),
            is_happy_path: false,
            status_code: status,
            elapsed_ms,
            body: Some(serde_json::json!({"ok": status < 400})),
            error: None,
            vulnerability_detected: vulnerable,
            integrity_issue: integrity,
            timestamp: Utc::now(),
            request_details: RequestDetails {
                url: "https://api.example.com:8443/users".to_string(),
                method: HttpMethod::Post,
                headers: BTreeMap::new(),
                payload: None,
                mutation_type: Some(MutationKind::ExtraField),
                mutation_description: Some("stub".to_string()),
            },
        }
    }

    fn sample_report() -> Report {
        let mut happy = result(200, 100, false, false);
        happy.is_happy_path = true;
        happy.mutation_id = None;
        let mutants = vec![
            result(200, 120, true, true),
            result(422, 80, false, false),
            result(503, 400, true, true),
        ];
        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(2_000);
        generate_report("0a1b2c3d-0000-0000-0000-000000000000", &config(), &happy, &mutants, start, end)
    }

    #[test]
    fn export_round_trips_report_fields() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).expect("parse back");

        let reparsed: Report = serde_json::from_value(parsed.clone()).expect("report fields");
        assert_eq!(reparsed.summary, report.summary);
        assert_eq!(reparsed.metadata, report.metadata);
        assert_eq!(reparsed.happy_path_result, report.happy_path_result);
        assert_eq!(reparsed.mutation_results, report.mutation_results);

        assert_eq!(
            parsed["export_metadata"]["format"],
            "api-mutation-tester-report"
        );
        assert_eq!(parsed["export_metadata"]["version"], "1.0.0");
    }

    #[test]
    fn export_is_pretty_printed_with_two_spaces() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");
        let text = String::from_utf8(bytes).expect("utf-8");
        assert!(text.starts_with("{\n  \""));
    }

    #[test]
    fn categorized_results_partition_mutants() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let categorized = &parsed["categorized_results"];
        assert_eq!(categorized["successful"].as_array().unwrap().len(), 1);
        assert_eq!(categorized["failed"].as_array().unwrap().len(), 2);
        assert_eq!(categorized["vulnerabilities"].as_array().unwrap().len(), 2);
        assert_eq!(categorized["integrity_issues"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn severity_and_integrity_buckets_in_export() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        // 200-vulnerable is critical, 503-vulnerable is a warning.
        assert_eq!(
            parsed["vulnerability_severity"]["critical"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            parsed["vulnerability_severity"]["warning"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            parsed["integrity_classification"]["service-unavailable"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            parsed["integrity_classification"]["unexpected-success"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn status_code_distribution_counts() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let distribution = &parsed["status_code_distribution"];
        assert_eq!(distribution["200"], 2);
        assert_eq!(distribution["422"], 1);
        assert_eq!(distribution["503"], 1);
    }

    #[test]
    fn response_time_statistics() {
        let results: Vec<TestResult> = [100u64, 200, 300, 400, 500]
            .iter()
            .map(|ms| result(200, *ms, false, false))
            .collect();
        let refs: Vec<&TestResult> = results.iter().collect();
        let stats = response_time_stats(&refs);

        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 500.0);
        assert_eq!(stats.mean, 300.0);
        assert_eq!(stats.median, 300.0);
        assert_eq!(stats.p95, 500.0);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let results: Vec<TestResult> = [100u64, 200, 300, 400]
            .iter()
            .map(|ms| result(200, *ms, false, false))
            .collect();
        let refs: Vec<&TestResult> = results.iter().collect();
        assert_eq!(response_time_stats(&refs).median, 250.0);
    }

    #[test]
    fn summary_export_has_summary_format_tag() {
        let report = sample_report();
        let bytes = export_summary_to_json(&report).expect("export");
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            parsed["export_metadata"]["format"],
            "api-mutation-tester-summary"
        );
        assert_eq!(parsed["test_id"], report.test_id);
        assert!(parsed.get("mutation_results").is_none());
    }

    #[test]
    fn filename_contains_host_and_id_prefix() {
        let report = sample_report();
        let name = filename(&report);
        assert!(name.starts_with("api-mutation-test-api-example-com-"));
        assert!(name.contains("0a1b2c3d"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn export_writes_to_disk_and_reads_back() {
        let report = sample_report();
        let bytes = export_to_json(&report).expect("export");

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(filename(&report));
        std::fs::write(&path, &bytes).expect("write export");

        let read = std::fs::read(&path).expect("read export");
        let parsed: serde_json::Value = serde_json::from_slice(&read).expect("parse");
        assert_eq!(parsed["test_id"], report.test_id);
    }

    #[test]
    fn filename_falls_back_on_unparseable_url() {
        let mut report = sample_report();
        report.metadata.target_url = "not a url".to_string();
        let name = filename(&report);
        assert!(name.starts_with("api-mutation-test-"));
        assert!(name.contains('T'));
        assert!(name.contains("0a1b2c3d"));
        assert!(name.ends_with(".json"));
    }
}
