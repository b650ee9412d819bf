//! Routing engine error definitions.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling the routing engine.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The whole call did not finish within the configured deadline.
    #[error("routing engine timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status from the routing engine.
    #[error("routing engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Successful HTTP exchange but the engine reported a failure code.
    #[error("routing engine rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Connection or transfer failure.
    #[error("routing engine transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON shape.
    #[error("routing engine response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid routing engine URL: {0}")]
    InvalidUrl(String),
}

/// Result type for routing engine operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
