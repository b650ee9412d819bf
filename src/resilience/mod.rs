//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to routing engine:
//!     → timeouts.rs (one deadline covers connect, send and body read)
//!     → On expiry: RoutingError::Timeout → RoutingUnavailable → HTTP 503
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a slow routing engine fails the request fast

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded};
