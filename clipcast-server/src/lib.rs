//! # Clipcast Server
//!
//! HTTP API for the Clipcast video platform, built on Axum over
//! [`clipcast_core`].
//!
//! Every route lives under `/api/v1`; everything except login, refresh and
//! registration passes the access gate ([`auth::require_auth`]). Responses use
//! the `{statusCode, message, data, success}` envelope.

pub mod auth;
pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::infra::{app_state::AppState, config::CorsConfig};

/// Build the full application router.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = if state.config().dev_mode {
        CorsLayer::permissive()
    } else {
        cors_allow_list(&state.config().cors)
    };

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(routes::create_api_router(state.clone()))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Explicit origins only; credentials are allowed so the token cookies
/// reach the API from a browser client.
fn cors_allow_list(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
