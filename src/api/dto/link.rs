//! DTOs for short link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::TrackingOverrides;
use crate::domain::entities::{ShortLink, TrackingFields};

/// Request to create a short link.
///
/// Every field maps onto one link builder option; omitted fields fall back to
/// the configured defaults.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "Destination URL must be 1-2048 characters"))]
    pub destination_url: String,

    /// Explicit key. Takes precedence over `seed`.
    #[validate(length(min = 1, max = 64))]
    pub url_key: Option<String>,

    /// Seed for deterministic key generation.
    pub seed: Option<u64>,

    pub secure: Option<bool>,
    pub single_use: Option<bool>,
    pub forward_query_params: Option<bool>,
    pub redirect_status_code: Option<u16>,
    pub track_visits: Option<bool>,

    #[serde(default)]
    pub tracking: TrackingRequest,

    pub activate_at: Option<DateTime<Utc>>,
    pub deactivate_at: Option<DateTime<Utc>>,
}

/// Per-field tracking choices; omitted fields use the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingRequest {
    pub ip_address: Option<bool>,
    pub operating_system: Option<bool>,
    pub operating_system_version: Option<bool>,
    pub browser: Option<bool>,
    pub browser_version: Option<bool>,
    pub referer_url: Option<bool>,
    pub device_type: Option<bool>,
}

impl From<TrackingRequest> for TrackingOverrides {
    fn from(t: TrackingRequest) -> Self {
        TrackingOverrides {
            ip_address: t.ip_address,
            operating_system: t.operating_system,
            operating_system_version: t.operating_system_version,
            browser: t.browser,
            browser_version: t.browser_version,
            referer_url: t.referer_url,
            device_type: t.device_type,
        }
    }
}

/// Short link as returned by the API.
#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    pub url_key: String,
    pub destination_url: String,
    pub short_url: String,
    pub single_use: bool,
    pub forward_query_params: bool,
    pub redirect_status_code: u16,
    pub track_visits: bool,
    pub tracking: TrackingFields,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    /// Only present on detail lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<i64>,
}

impl From<ShortLink> for ShortLinkResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            url_key: link.url_key,
            destination_url: link.destination_url,
            short_url: link.public_short_url,
            single_use: link.single_use,
            forward_query_params: link.forward_query_params,
            redirect_status_code: link.redirect_status_code,
            track_visits: link.track_visits,
            tracking: link.tracking,
            activated_at: link.activated_at,
            deactivated_at: link.deactivated_at,
            created_at: link.created_at,
            visit_count: None,
        }
    }
}
