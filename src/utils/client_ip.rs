//! Client IP resolution for requests that may pass through a reverse proxy.

use axum::http::HeaderMap;
use std::net::IpAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Returns the visitor's IP address.
///
/// With `behind_proxy`, the first valid address in `X-Forwarded-For` wins,
/// then `X-Real-IP`. The socket peer is the fallback, and the only source
/// when not behind a proxy, since those headers are client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> Option<IpAddr> {
    if behind_proxy {
        let forwarded: Option<IpAddr> = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());

        let real_ip = || {
            headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse().ok())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return Some(ip);
        }
    }

    peer
}
