//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde_json::json;
use std::net::SocketAddr;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::VisitorAttributes;
use crate::domain::visit_context::VisitContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;
use crate::utils::user_agent::parse_user_agent;

/// Name of the encrypted cookie carrying the token of the visitor's last
/// recorded visit. Scoped to the link's own path.
pub const SESSION_COOKIE: &str = "link_session";

/// Session cookie lifetime (30 days).
pub const SESSION_COOKIE_MINUTES: i64 = 43_200;

/// Redirects a short link key to its destination.
///
/// # Endpoint
///
/// `GET /{prefix}/{url_key}` (or `GET /{url_key}` when no prefix is configured)
///
/// # Request Flow
///
/// 1. Look up the link by key
/// 2. Read the previous token from the private `link_session` cookie and mint a fresh one
/// 3. Collect visitor attributes from the peer address and headers
/// 4. Resolve the visit (window check, recording, single-use, query forwarding)
/// 5. Respond with the link's redirect status and a `Location` header, handing
///    back the fresh token when a visit was recorded
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown or the link is pending or expired.
/// Returns 500 if a required visit record could not be written.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(url_key): Path<String>,
    RawQuery(query): RawQuery,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let link = state.link_service.get_by_key(&url_key).await?;

    let presented = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());
    let issued = Uuid::new_v4().to_string();

    let attributes = visitor_attributes(&headers, addr, state.behind_proxy);
    let mut context = VisitContext::new(attributes)
        .with_issued_token(issued.clone())
        .with_query(query);
    if let Some(ref token) = presented {
        context = context.with_session_token(token.clone());
    }

    let resolution = state.visit_resolver.resolve(&context, &link).await?;

    // A repeat visit keeps the token its first visit was recorded under.
    let session_token = match presented {
        Some(token) if resolution.visit.is_none() => token,
        _ => issued,
    };

    debug!(
        url_key = %link.url_key,
        status = resolution.status_code,
        recorded = resolution.visit.is_some(),
        "Redirecting to {}",
        resolution.destination_url
    );

    let status = StatusCode::from_u16(resolution.status_code).map_err(|_| {
        AppError::internal(
            "Invalid redirect status code",
            json!({ "status": resolution.status_code }),
        )
    })?;
    let location = HeaderValue::from_str(&resolution.destination_url).map_err(|_| {
        AppError::internal(
            "Destination URL is not a valid header value",
            json!({ "url_key": link.url_key }),
        )
    })?;

    let cookie = Cookie::build((SESSION_COOKIE, session_token))
        .path(uri.path().to_string())
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(SESSION_COOKIE_MINUTES))
        .build();

    let mut response = Response::new(axum::body::Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, location);

    Ok((jar.add(cookie), response))
}

fn visitor_attributes(headers: &HeaderMap, addr: SocketAddr, behind_proxy: bool) -> VisitorAttributes {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    let user_agent = header_str(header::USER_AGENT)
        .map(parse_user_agent)
        .unwrap_or_default();

    VisitorAttributes {
        ip_address: client_ip(headers, Some(addr.ip()), behind_proxy).map(|ip| ip.to_string()),
        operating_system: user_agent.operating_system,
        operating_system_version: user_agent.operating_system_version,
        browser: user_agent.browser,
        browser_version: user_agent.browser_version,
        referer_url: header_str(header::REFERER).map(str::to_string),
        device_type: user_agent.device_type,
    }
}
