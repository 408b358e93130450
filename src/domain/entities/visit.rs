//! Visit entity recorded when a short link is followed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device classification derived from the visitor's User-Agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    /// Crawler or bot traffic.
    Robot,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
            DeviceType::Tablet => "tablet",
            DeviceType::Robot => "robot",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(DeviceType::Mobile),
            "desktop" => Ok(DeviceType::Desktop),
            "tablet" => Ok(DeviceType::Tablet),
            "robot" => Ok(DeviceType::Robot),
            other => Err(format!("Unknown device type: {other}")),
        }
    }
}

/// Visitor data that may be captured on a visit.
///
/// Every field is optional: a value is absent either because the request did
/// not carry it or because the link does not track it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorAttributes {
    pub ip_address: Option<String>,
    pub operating_system: Option<String>,
    pub operating_system_version: Option<String>,
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub referer_url: Option<String>,
    pub device_type: Option<DeviceType>,
}

/// A recorded visit to a short link.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub id: i64,
    pub short_link_id: i64,
    pub session_token: Option<String>,
    pub attributes: VisitorAttributes,
    pub visited_at: DateTime<Utc>,
}

/// Input data for recording a new visit.
///
/// `attributes` must already be redacted by the link's tracking mask.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub short_link_id: i64,
    pub session_token: Option<String>,
    pub attributes: VisitorAttributes,
    pub visited_at: DateTime<Utc>,
}
