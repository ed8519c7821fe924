//! ledger_bank Library
//!
//! Banking backend whose core is an atomic account ledger: a balance
//! change and its ledger entry are committed together or not at all.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod repository;
pub mod store;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use api::AppState;
pub use config::Config;
pub use domain::{Amount, AmountError, Balance, DomainError};
pub use error::{AppError, AppResult, ErrorResponse};

/// Build the application router
pub fn build_router(state: AppState, frontend_origin: Option<&str>) -> Router {
    // Auth runs as a route layer so it sees the matched path and its params
    let protected_routes = api::create_router()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(cors_layer(frontend_origin))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// CORS for the frontend; preflight requests are answered here, before auth
fn cors_layer(frontend_origin: Option<&str>) -> CorsLayer {
    let origin = match frontend_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::list(Vec::<HeaderValue>::new()),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
