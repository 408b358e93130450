//! Handlers for short link management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, ShortLinkResponse};
use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::api::dto::visits::{VisitInfo, VisitListResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "destination_url": "http://example.com/landing",
///   "url_key": "spring-sale",
///   "secure": true,
///   "redirect_status_code": 302,
///   "tracking": { "ip_address": false }
/// }
/// ```
///
/// Only `destination_url` is required.
///
/// # Errors
///
/// Returns 400 Bad Request for invalid options, including a taken `url_key`.
/// Returns 503 Service Unavailable if no free key could be allocated.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ShortLinkResponse>), AppError> {
    payload.validate()?;

    let mut builder = state
        .link_service
        .builder()?
        .destination_url(payload.destination_url)?
        .tracking(payload.tracking.into());

    if let Some(url_key) = payload.url_key {
        builder = builder.url_key(url_key);
    }
    if let Some(seed) = payload.seed {
        builder = builder.generate_key_using(seed);
    }
    if let Some(secure) = payload.secure {
        builder = builder.secure(secure);
    }
    if let Some(single_use) = payload.single_use {
        builder = builder.single_use(single_use);
    }
    if let Some(forward) = payload.forward_query_params {
        builder = builder.forward_query_params(forward);
    }
    if let Some(status) = payload.redirect_status_code {
        builder = builder.redirect_status_code(status);
    }
    if let Some(track) = payload.track_visits {
        builder = builder.track_visits(track);
    }
    if let Some(at) = payload.activate_at {
        builder = builder.activate_at(at);
    }
    if let Some(at) = payload.deactivate_at {
        builder = builder.deactivate_at(at);
    }

    let link = builder.build().await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Returns a link with its visit count.
///
/// # Endpoint
///
/// `GET /api/links/{url_key}`
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown.
pub async fn get_link_handler(
    State(state): State<AppState>,
    Path(url_key): Path<String>,
) -> Result<Json<ShortLinkResponse>, AppError> {
    let link = state.link_service.get_by_key(&url_key).await?;
    let visit_count = state.link_service.visit_count(&link).await?;

    let mut response = ShortLinkResponse::from(link);
    response.visit_count = Some(visit_count);

    Ok(Json(response))
}

/// Lists recorded visits for a link, newest first.
///
/// # Endpoint
///
/// `GET /api/links/{url_key}/visits`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, max: 1000)
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown.
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn list_visits_handler(
    State(state): State<AppState>,
    Path(url_key): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<VisitListResponse>, AppError> {
    let (offset, limit) = params
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let link = state.link_service.get_by_key(&url_key).await?;
    let (visits, total) = state.link_service.list_visits(&link, offset, limit).await?;

    Ok(Json(VisitListResponse {
        url_key: link.url_key,
        pagination: PaginationMeta::new(params.page(), params.page_size(), total),
        items: visits.into_iter().map(VisitInfo::from).collect(),
    }))
}
