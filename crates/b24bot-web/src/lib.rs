//! HTTP adapter (axum).
//!
//! Exposes the install endpoints and the robot handler URL, decodes the portal's
//! form payloads and calls into the `b24bot-core` services.

pub mod handlers;
pub mod router;

pub use router::{build_router, serve, AppState};
