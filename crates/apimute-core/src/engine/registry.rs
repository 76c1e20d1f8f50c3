//! Process-wide registry of live test executions.
//!
//! A single mutex serializes all access, so the admission size check and
//! insert are atomic and status reads observe a consistent snapshot.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::model::{TestExecution, TestStatus};

/// Registry of test executions keyed by test id.
pub struct Registry {
    max_concurrent: usize,
    inner: Mutex<HashMap<String, TestExecution>>,
}

impl Registry {
    /// Create a registry admitting at most `max_concurrent` non-terminal
    /// tests.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically check the admission limit and insert the execution.
    pub async fn admit(&self, execution: TestExecution) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        let non_terminal = inner
            .values()
            .filter(|e| !e.status.is_terminal())
            .count();
        if non_terminal >= self.max_concurrent {
            return Err(EngineError::Overloaded {
                limit: self.max_concurrent,
            });
        }
        inner.insert(execution.id.clone(), execution);
        Ok(())
    }

    /// Snapshot one execution.
    pub async fn snapshot(&self, id: &str) -> Result<TestExecution, EngineError> {
        let inner = self.inner.lock().await;
        inner
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })
    }

    /// Mutate one execution under the registry lock.
    ///
    /// The closure's return value is passed through; `NotFound` is returned
    /// when the id is unknown (e.g. force-removed mid-run).
    pub async fn update<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut TestExecution) -> T,
    ) -> Result<T, EngineError> {
        let mut inner = self.inner.lock().await;
        let execution = inner
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })?;
        Ok(f(execution))
    }

    /// Remove one execution, returning it.
    pub async fn remove(&self, id: &str) -> Result<TestExecution, EngineError> {
        let mut inner = self.inner.lock().await;
        inner
            .remove(id)
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })
    }

    /// Snapshots of all non-terminal executions.
    pub async fn active(&self) -> Vec<TestExecution> {
        let inner = self.inner.lock().await;
        inner
            .values()
            .filter(|e| !e.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Snapshots of every execution.
    pub async fn all(&self) -> Vec<TestExecution> {
        let inner = self.inner.lock().await;
        inner.values().cloned().collect()
    }

    /// Remove terminal executions whose `end_time` is older than
    /// `max_age_ms`. Returns the number removed.
    pub async fn cleanup_completed(&self, max_age_ms: u64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::milliseconds(max_age_ms as i64);
        let mut inner = self.inner.lock().await;
        let before = inner.len();
        inner.retain(|_, e| {
            !(e.status.is_terminal() && e.end_time.map_or(false, |t| t < cutoff))
        });
        before - inner.len()
    }

    /// Count executions per status.
    pub async fn status_counts(&self) -> HashMap<TestStatus, usize> {
        let inner = self.inner.lock().await;
        let mut counts = HashMap::new();
        for execution in inner.values() {
            *counts.entry(execution.status).or_default() += 1;
        }
        counts
    }
}
