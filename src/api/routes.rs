//! Management API route configuration.
//!
//! All endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{create_link_handler, get_link_handler, list_visits_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link management routes.
///
/// # Endpoints
///
/// - `POST /links`                  - Build and store a short link
/// - `GET  /links/{url_key}`        - Link details with visit count
/// - `GET  /links/{url_key}/visits` - Recorded visits (paginated, newest first)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/links/{url_key}", get(get_link_handler))
        .route("/links/{url_key}/visits", get(list_visits_handler))
}
