//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, gate, health, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for feature gate endpoints.
///
/// Gate checks are issued by the feature backends on every paid invocation,
/// so they get a higher limit than the user-facing API but are still
/// protected from overload.
const GATE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Credits (JWT auth)
/// - `GET /v1/credits/balance` - Get current balance
/// - `GET /v1/credits/transactions` - List transaction history
/// - `GET /v1/credits/packages` - List the package catalog
/// - `GET /v1/credits/costs` - List feature credit costs
/// - `POST /v1/credits/checkout` - Initiate a credit purchase
///
/// ## Feature gate (service API key auth, rate-limited)
/// - `POST /v1/gate/check` - Check affordability without charging
/// - `POST /v1/gate/consume` - Charge for a feature invocation
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/payment` - Payment gateway notifications
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Create concurrency-limited gate routes
    let gate_routes = Router::new()
        .route("/check", post(gate::check))
        .route("/consume", post(gate::consume))
        .layer(ConcurrencyLimitLayer::new(GATE_MAX_CONCURRENT_REQUESTS));

    // Create concurrency-limited API routes
    let api_routes = Router::new()
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/transactions", get(credits::list_transactions))
        .route("/credits/packages", get(credits::list_packages))
        .route("/credits/costs", get(credits::list_costs))
        .route("/credits/checkout", post(credits::checkout))
        // Gate routes (with their own concurrency limit)
        .nest("/gate", gate_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - retry cadence is controlled by the gateway)
        .route("/webhooks/payment", post(webhooks::payment_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
