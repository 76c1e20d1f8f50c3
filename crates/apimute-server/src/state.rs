//! Shared application state for the apimute server.

use apimute_core::engine::TestEngine;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    /// The test execution engine.
    pub engine: TestEngine,
}

impl AppState {
    /// Create the state around an engine built by the composition root.
    pub fn new(engine: TestEngine) -> Self {
        Self { engine }
    }
}
