//! Short link entity and its tracking configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::visit::VisitorAttributes;

/// Per-attribute capture switches for visit tracking.
///
/// Acts as a redaction mask: [`TrackingFields::redact`] keeps an attribute
/// only when its switch is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingFields {
    pub ip_address: bool,
    pub operating_system: bool,
    pub operating_system_version: bool,
    pub browser: bool,
    pub browser_version: bool,
    pub referer_url: bool,
    pub device_type: bool,
}

impl TrackingFields {
    pub const ALL: Self = Self {
        ip_address: true,
        operating_system: true,
        operating_system_version: true,
        browser: true,
        browser_version: true,
        referer_url: true,
        device_type: true,
    };

    pub const NONE: Self = Self {
        ip_address: false,
        operating_system: false,
        operating_system_version: false,
        browser: false,
        browser_version: false,
        referer_url: false,
        device_type: false,
    };

    /// Returns a copy of `attributes` with every untracked field cleared.
    pub fn redact(&self, attributes: &VisitorAttributes) -> VisitorAttributes {
        fn keep<T: Clone>(enabled: bool, value: &Option<T>) -> Option<T> {
            if enabled { value.clone() } else { None }
        }

        VisitorAttributes {
            ip_address: keep(self.ip_address, &attributes.ip_address),
            operating_system: keep(self.operating_system, &attributes.operating_system),
            operating_system_version: keep(
                self.operating_system_version,
                &attributes.operating_system_version,
            ),
            browser: keep(self.browser, &attributes.browser),
            browser_version: keep(self.browser_version, &attributes.browser_version),
            referer_url: keep(self.referer_url, &attributes.referer_url),
            device_type: keep(self.device_type, &attributes.device_type),
        }
    }
}

impl Default for TrackingFields {
    fn default() -> Self {
        Self::ALL
    }
}

/// Where a link sits relative to its activation window at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// `now < activated_at`
    Pending,
    Active,
    /// `deactivated_at <= now`
    Expired,
}

/// A persisted mapping from a short key to a destination URL.
///
/// Only `deactivated_at` (and `updated_at`) change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: i64,
    pub url_key: String,
    pub destination_url: String,
    pub public_short_url: String,
    pub single_use: bool,
    pub forward_query_params: bool,
    pub redirect_status_code: u16,
    pub track_visits: bool,
    pub tracking: TrackingFields,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    /// Classifies the link against its activation window.
    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        if self.deactivated_at.is_some_and(|d| d <= now) {
            return LinkState::Expired;
        }

        if self.activated_at.is_some_and(|a| now < a) {
            return LinkState::Pending;
        }

        LinkState::Active
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == LinkState::Active
    }
}

/// Input data for persisting a new short link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortLink {
    pub url_key: String,
    pub destination_url: String,
    pub public_short_url: String,
    pub single_use: bool,
    pub forward_query_params: bool,
    pub redirect_status_code: u16,
    pub track_visits: bool,
    pub tracking: TrackingFields,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
}
