//! Test helpers: scripted transport and mutator stubs.
//!
//! Available to dependent crates through the `test-helpers` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::model::{Mutation, MutationKind, TargetRequest, TargetResponse};
use crate::mutation::Mutator;
use crate::transport::Transport;

/// Transport stub that returns a scripted response for every request.
pub struct StubTransport {
    status_code: u16,
    body: Option<Value>,
    error: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubTransport {
    /// Respond to every request with 200 and a small JSON body.
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// Respond to every request with the given status.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            body: Some(serde_json::json!({"ok": status_code < 400})),
            error: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every request at the transport layer with the given error.
    pub fn with_transport_error(error: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            body: None,
            error: Some(error.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Add a fixed per-request delay.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the scripted body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Number of requests executed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn execute(&self, _request: &TargetRequest) -> TargetResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        TargetResponse {
            status_code: self.status_code,
            elapsed_ms: started.elapsed().as_millis() as u64,
            body: self.body.clone(),
            headers: Default::default(),
            error: self.error.clone(),
        }
    }
}

/// Mutator stub returning a preset mutation list.
pub struct StubMutator {
    mutations: Vec<Mutation>,
}

impl StubMutator {
    /// Generate no mutations at all.
    pub fn empty() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    /// Generate `count` trivial header mutations of `request`.
    pub fn repeated(request: &TargetRequest, count: usize) -> Self {
        let mutations = (0..count)
            .map(|i| {
                let mut modified = request.clone();
                modified
                    .headers
                    .insert("X-Stub".to_string(), i.to_string());
                Mutation {
                    id: format!("mut-extra-field-stub-{i}-0"),
                    kind: MutationKind::ExtraField,
                    description: format!("stub mutation {i}"),
                    strategy: "stub".to_string(),
                    original_field: Some("X-Stub".to_string()),
                    modified_request: modified,
                }
            })
            .collect();
        Self { mutations }
    }
}

impl Mutator for StubMutator {
    fn generate(&self, _request: &TargetRequest) -> Vec<Mutation> {
        self.mutations.clone()
    }
}
