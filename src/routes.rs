//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{prefix}/{url_key}` - Short link redirect (public); `/{url_key}`
//!   when no prefix is configured
//! - `GET  /health`             - Health check: database and visit events (public)
//! - `/api/*`                   - Management API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on the management API
//! - **Authentication** - Bearer token on the management API
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Route path serving redirects for the given (already normalized) prefix.
pub fn redirect_path(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("/{prefix}/{{url_key}}"),
        None => "/{url_key}".to_string(),
    }
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `prefix` - path segment in front of every short key, without slashes
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(
    state: AppState,
    prefix: Option<String>,
    behind_proxy: bool,
) -> NormalizePath<Router> {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::secure_layer(behind_proxy));

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .route(&redirect_path(prefix.as_deref()), get(redirect_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
