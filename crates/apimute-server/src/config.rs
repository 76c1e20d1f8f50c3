//! Server configuration: bind address and engine tunables.
//!
//! Loaded from an optional TOML file; every field has a default so a bare
//! `apimute-server` invocation works without one. Engine limits are plain
//! config values, never environment variables.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use apimute_core::engine::{
    EngineConfig, INTER_BATCH_DELAY_MS, MAX_CONCURRENT_MUTATIONS, MAX_CONCURRENT_TESTS,
};

/// Server configuration file contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Admission limit for concurrently running tests.
    pub max_concurrent_tests: usize,
    /// Concurrent transport calls per mutation batch.
    pub max_concurrent_mutations: usize,
    /// Delay between mutation batches in milliseconds.
    pub inter_batch_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_concurrent_tests: MAX_CONCURRENT_TESTS,
            max_concurrent_mutations: MAX_CONCURRENT_MUTATIONS,
            inter_batch_delay_ms: INTER_BATCH_DELAY_MS,
        }
    }
}

impl ServerConfig {
    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// The engine tunables this configuration describes.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_concurrent_tests: self.max_concurrent_tests,
            max_concurrent_mutations: self.max_concurrent_mutations,
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
        }
    }
}
