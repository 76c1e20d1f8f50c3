/// Core library for the apimute API mutation tester.
///
/// This crate contains all business logic: the request/response data model,
/// the deterministic mutation generator, the HTTP transport seam, the
/// vulnerability/integrity detector, the per-test execution engine with its
/// registry, the metrics sink, and the report aggregator.
pub mod detect;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod mutation;
pub mod report;
pub mod transport;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use error::*;

/// Returns the version of the apimute-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
