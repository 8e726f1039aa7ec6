//! Storefront checkout server
//!
//! Axum router for the checkout flow. The binary in `main.rs` wires it to
//! the environment; tests drive [`router`] in-process.

pub mod handlers;
pub mod state;

use std::path::Path;

use axum::{Router, routing::{get, post}};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{create_checkout, health_check, stripe_webhook};
pub use crate::state::AppState;

/// API routes with tracing and CORS
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))

        // Payments
        .route("/api/checkout", post(create_checkout))
        .route("/api/checkout/webhook", post(stripe_webhook))

        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// API routes plus the built WASM frontend for every other path
pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    router(state).fallback_service(ServeDir::new(static_dir))
}
