//! API module
//!
//! HTTP API endpoints and middleware.

pub mod auth;
pub mod middleware;
pub mod routes;

pub use auth::{AuthVerifier, RemoteAuthVerifier};
pub use routes::{create_router, AppState};
