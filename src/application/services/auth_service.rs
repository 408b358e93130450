//! Authentication service for API token validation.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Authenticates management API requests against the configured bearer token.
///
/// Only the HMAC-SHA256 of the token (keyed by `signing_secret`) is kept in
/// memory, and presented tokens are compared in constant time.
pub struct AuthService {
    signing_secret: String,
    expected_mac: Vec<u8>,
}

impl AuthService {
    /// Creates a service accepting `api_token`.
    pub fn new(api_token: &str, signing_secret: String) -> Self {
        let expected_mac = sign(&signing_secret, api_token)
            .finalize()
            .into_bytes()
            .to_vec();

        Self {
            signing_secret,
            expected_mac,
        }
    }

    /// Checks a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token does not match.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        sign(&self.signing_secret, token)
            .verify_slice(&self.expected_mac)
            .map_err(|_| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid token"}))
            })
    }
}

fn sign(secret: &str, token: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    mac
}
