//! Error types for the apimute core library.
//!
//! Each concern has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors. Transport
//! faults are deliberately absent here: they are never surfaced as errors
//! but folded into synthetic results with `status_code = 0`.

/// Errors found while validating a test configuration at admission.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The target URL is not an absolute HTTP/HTTPS URL.
    #[error("invalid target URL '{url}': {message}")]
    InvalidUrl {
        /// The URL that failed validation.
        url: String,
        /// A description of why the URL is invalid.
        message: String,
    },

    /// The request timeout is outside the accepted range.
    #[error("timeout {timeout_ms}ms outside allowed range [{min_ms}, {max_ms}]ms")]
    TimeoutOutOfRange {
        /// The rejected timeout value.
        timeout_ms: u64,
        /// Lower bound of the accepted range.
        min_ms: u64,
        /// Upper bound of the accepted range.
        max_ms: u64,
    },

    /// A header name does not match the accepted pattern.
    #[error("invalid header name '{name}': must match ^[A-Za-z0-9_-]+$")]
    InvalidHeaderName {
        /// The rejected header name.
        name: String,
    },

    /// A header value is empty.
    #[error("header '{name}' has an empty value")]
    EmptyHeaderValue {
        /// The header whose value is empty.
        name: String,
    },
}

/// Errors surfaced by the test execution engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The test configuration failed admission validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Admission denied: the registry already holds the maximum number of
    /// non-terminal tests.
    #[error("maximum concurrent tests reached ({limit}), retry later")]
    Overloaded {
        /// The configured admission limit.
        limit: usize,
    },

    /// No test with the given id is known to the registry.
    #[error("test not found: {id}")]
    NotFound {
        /// The unknown test id.
        id: String,
    },

    /// The operation is not valid in the test's current state.
    #[error("operation not valid in current state: {message}")]
    Conflict {
        /// Details about the state conflict.
        message: String,
    },

    /// The operation is defined by the public contract but not implemented.
    #[error("operation not implemented: {operation}")]
    NotImplemented {
        /// The unimplemented operation name.
        operation: &'static str,
    },
}

/// Errors from report export serialization.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization of the report failed.
    #[error("failed to serialize report: {source}")]
    Serialize {
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
