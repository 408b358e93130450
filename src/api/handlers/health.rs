//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Counts stored links
/// 2. **Visit events**: At least one live subscriber
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let visit_events = check_visit_events(&state);

    let all_healthy = database.is_ok() && visit_events.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            visit_events,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_service.count_links().await {
        Ok(count) => CheckStatus::ok(format!("Connected, {} short links", count)),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// The visit logger holds a receiver for the lifetime of the server.
fn check_visit_events(state: &AppState) -> CheckStatus {
    match state.visit_events.receiver_count() {
        0 => CheckStatus::error("No visit event subscribers"),
        n => CheckStatus::ok(format!("Subscribers: {}", n)),
    }
}
