//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;
use tracing::debug;

use crate::{error::AppError, state::AppState};

/// Authenticates management API requests.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <API_TOKEN>
/// ```
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if the header is
/// missing, malformed, or carries the wrong token.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/links", post(create_link_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => token,
        Err(_) => {
            debug!(path = %parts.uri.path(), "Rejected API request without bearer token");
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            ));
        }
    };

    if let Err(e) = st.auth_service.authenticate(&token) {
        debug!(path = %parts.uri.path(), "Rejected API request with invalid token");
        return Err(e);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
