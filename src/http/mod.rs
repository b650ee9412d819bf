//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, request ID, trace, timeout)
//!     → request.rs (parse body/query, validate coordinates)
//!     → handlers.rs (orchestrator, zone store)
//!     → response.rs (error → status + {"detail"})
//!     → Send to client
//! ```
//!
//! # Routes
//! - `POST /api/v1/routes`
//! - `GET  /api/v1/hazards/nearby?lon=&lat=`
//! - `POST /api/v1/zones/refresh`
//! - `PUT  /api/v1/zones/{category}` (development only)
//! - `GET  /health`

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ROUTING_UNAVAILABLE};
pub use server::{AppState, HttpServer};
