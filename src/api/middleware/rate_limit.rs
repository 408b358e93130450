//! Rate limiting middleware using token bucket algorithm.

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
};

use crate::utils::client_ip::client_ip;

/// Keys requests by client IP, honoring proxy headers when configured.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        client_ip(req.headers(), peer, self.behind_proxy).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Creates the rate limiter for the management API.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Per client IP: the socket peer, or `X-Forwarded-For` / `X-Real-IP` when
/// `behind_proxy` is set.
pub fn secure_layer(
    behind_proxy: bool,
) -> GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor { behind_proxy })
            .per_second(1)
            .burst_size(10)
            .finish()
            .expect("rate limit period and burst are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_peer_ip() {
        let addr: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        let mut req = Request::new(());
        req.extensions_mut().insert(ConnectInfo(addr));

        let key = ClientIpKeyExtractor {
            behind_proxy: false,
        }
        .extract(&req)
        .unwrap();

        assert_eq!(key, addr.ip());
    }

    #[test]
    fn test_extracts_forwarded_ip_behind_proxy() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.5")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("127.0.0.1:1".parse::<SocketAddr>().unwrap()));

        let key = ClientIpKeyExtractor { behind_proxy: true }
            .extract(&req)
            .unwrap();

        assert_eq!(key, "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_missing_ip_is_an_error() {
        let req = Request::new(());
        let result = ClientIpKeyExtractor {
            behind_proxy: false,
        }
        .extract(&req);

        assert!(result.is_err());
    }
}
