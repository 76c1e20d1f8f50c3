//! HTTP transport seam.
//!
//! The engine consumes transport as an opaque capability: one request in,
//! one observed outcome out. Transport failures are never errors at this
//! boundary — they are classified into a `TargetResponse` with
//! `status_code = 0` so batch execution can continue.

mod client;

pub use client::HttpTransport;

use crate::model::{TargetRequest, TargetResponse};

/// Header injected into every outbound request for tracing.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// One-request-in, one-outcome-out transport capability.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` against the target, honoring its timeout.
    ///
    /// Non-2xx statuses are returned, not raised. Transport failures yield
    /// `status_code = 0` with a classified `error` string.
    async fn execute(&self, request: &TargetRequest) -> TargetResponse;
}
