//! DTOs for recorded visits.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pagination::PaginationMeta;
use crate::domain::entities::{DeviceType, Visit};

/// One recorded visit.
///
/// Untracked or unknown attributes are omitted from JSON.
#[derive(Debug, Serialize)]
pub struct VisitInfo {
    pub visited_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
}

impl From<Visit> for VisitInfo {
    fn from(visit: Visit) -> Self {
        let a = visit.attributes;
        Self {
            visited_at: visit.visited_at,
            ip_address: a.ip_address,
            operating_system: a.operating_system,
            operating_system_version: a.operating_system_version,
            browser: a.browser,
            browser_version: a.browser_version,
            referer_url: a.referer_url,
            device_type: a.device_type,
        }
    }
}

/// Paginated visit history for one link.
#[derive(Debug, Serialize)]
pub struct VisitListResponse {
    pub url_key: String,
    pub pagination: PaginationMeta,
    pub items: Vec<VisitInfo>,
}
