//! Typed errors for the detection engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Every variant except [`DetectError::Validation`] is recovered inside
//! the pipeline: an LLM transport failure, timeout, or contract violation
//! degrades to an empty LLM contribution with `metrics.error` populated.
//! Nothing here propagates out of [`crate::Detector::detect`] as a hard
//! failure. Fetch errors occur before this subsystem is invoked and stay
//! with the caller.

use thiserror::Error;

/// Errors that can occur during detection operations.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Input HTML is empty or unusable
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    /// LLM provider call failed (transport error or non-success status)
    #[error("model provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LLM call exceeded its timeout
    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// LLM response did not satisfy the JSON contract
    #[error("model response parse error: {0}")]
    ResponseParse(#[from] serde_json::Error),

    /// LLM response parsed but violated the contract shape
    #[error("model response contract violation: {reason}")]
    Contract { reason: String },

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for detection operations.
pub type Result<T> = std::result::Result<T, DetectError>;
