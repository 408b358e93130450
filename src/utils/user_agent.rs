//! Browser, OS and device classification from `User-Agent` strings.

use woothee::parser::Parser;

use crate::domain::entities::DeviceType;

/// Fields extracted from a `User-Agent` header. Unknown values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub browser_version: Option<String>,
    pub operating_system: Option<String>,
    pub operating_system_version: Option<String>,
    pub device_type: Option<DeviceType>,
}

/// Parses a `User-Agent` header with woothee.
///
/// # Device Mapping
///
/// - `crawler` -> [`DeviceType::Robot`]
/// - `pc` -> [`DeviceType::Desktop`]
/// - `smartphone` / `mobilephone` -> [`DeviceType::Tablet`] for iPads and
///   Android devices without a `Mobile` token, [`DeviceType::Mobile`] otherwise
/// - anything else -> `None`
pub fn parse_user_agent(user_agent: &str) -> ParsedUserAgent {
    if user_agent.trim().is_empty() {
        return ParsedUserAgent::default();
    }

    let Some(result) = Parser::new().parse(user_agent) else {
        return ParsedUserAgent::default();
    };

    let device_type = match result.category {
        "crawler" => Some(DeviceType::Robot),
        "pc" => Some(DeviceType::Desktop),
        "smartphone" | "mobilephone" => {
            let tablet = result.os == "iPad"
                || (result.os == "Android" && !user_agent.contains("Mobile"));
            Some(if tablet {
                DeviceType::Tablet
            } else {
                DeviceType::Mobile
            })
        }
        _ => None,
    };

    ParsedUserAgent {
        browser: known(result.name),
        browser_version: known(result.version),
        operating_system: known(result.os),
        operating_system_version: known(&result.os_version),
        device_type,
    }
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}
