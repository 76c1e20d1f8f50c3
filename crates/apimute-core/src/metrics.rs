//! In-memory metrics sink for per-request observations.
//!
//! Bounded history: on overflow the oldest observation is dropped. Appends
//! and summaries are mutually exclusive through the sink's lock.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

/// Maximum number of observations retained.
pub const MAX_METRICS_HISTORY: usize = 10_000;

/// One per-request observation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestObservation {
    /// HTTP status observed, 0 for transport failures.
    pub status_code: u16,
    /// Request duration in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the request failed at the transport layer.
    pub is_error: bool,
    /// When the observation was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Aggregate view over the retained history.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    /// Number of retained observations.
    pub total_requests: usize,
    /// Observations that failed at the transport layer.
    pub transport_failures: usize,
    /// Mean elapsed time across retained observations.
    pub average_elapsed_ms: f64,
    /// Count per status class ("2xx", "4xx", ...; "0xx" for transport
    /// failures).
    pub status_classes: BTreeMap<String, usize>,
}

/// Bounded, mutex-guarded observation history.
pub struct MetricsSink {
    history: Mutex<VecDeque<RequestObservation>>,
    capacity: usize,
}

impl MetricsSink {
    /// Create a sink with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_METRICS_HISTORY)
    }

    /// Create a sink with a custom capacity (tests use small ones).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Append one observation, dropping the oldest on overflow.
    pub async fn record(&self, status_code: u16, elapsed_ms: u64, is_error: bool) {
        let mut history = self.history.lock().await;
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(RequestObservation {
            status_code,
            elapsed_ms,
            is_error,
            timestamp: Utc::now(),
        });
    }

    /// Summarize the retained history.
    pub async fn summary(&self) -> MetricsSummary {
        let history = self.history.lock().await;
        let total_requests = history.len();
        let transport_failures = history.iter().filter(|o| o.is_error).count();
        let average_elapsed_ms = if total_requests == 0 {
            0.0
        } else {
            history.iter().map(|o| o.elapsed_ms as f64).sum::<f64>() / total_requests as f64
        };
        let mut status_classes: BTreeMap<String, usize> = BTreeMap::new();
        for observation in history.iter() {
            let class = format!("{}xx", observation.status_code / 100);
            *status_classes.entry(class).or_default() += 1;
        }
        MetricsSummary {
            total_requests,
            transport_failures,
            average_elapsed_ms,
            status_classes,
        }
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}
