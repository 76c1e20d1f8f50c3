//! Data model shared across the core: target requests and responses,
//! mutations, per-result records, and the per-test execution state.

pub mod execution;
pub mod mutation;
pub mod request;

pub use execution::{
    RequestDetails, TestExecution, TestPhase, TestResult, TestStatus,
};
pub use mutation::{Mutation, MutationKind};
pub use request::{
    validate_config, HttpMethod, TargetRequest, TargetResponse, DEFAULT_TIMEOUT_MS,
    TIMEOUT_MAX_MS, TIMEOUT_MIN_MS,
};
