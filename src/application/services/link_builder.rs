//! Fluent, validating construction of short links.
//!
//! Options that are not set explicitly fall back to [`LinkConfig`] defaults
//! when [`LinkBuilder::build`] runs. Every validation happens before the single
//! insert, so a failed build leaves nothing behind.
//!
//! ```ignore
//! let link = LinkBuilder::new(repository, &config)?
//!     .destination_url("http://example.com")?
//!     .url_key("promo")
//!     .secure(true)
//!     .track_visits(false)
//!     .build()
//!     .await?;
//! ```

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::key_allocator::KeyAllocator;
use crate::config::{LinkConfig, TrackingConfig};
use crate::domain::entities::{NewShortLink, ShortLink, TrackingFields};
use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;

/// Status code used when none is set explicitly.
pub const DEFAULT_REDIRECT_STATUS: u16 = 301;

static URL_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("URL key pattern is valid"));

pub(crate) const MSG_NO_DESTINATION: &str = "No destination URL has been set.";
pub(crate) const MSG_BAD_DESTINATION: &str =
    "The destination URL must begin with http:// or https://";
pub(crate) const MSG_DUPLICATE_KEY: &str = "A short link with this key already exists.";
pub(crate) const MSG_BAD_STATUS: &str =
    "The redirect status code must be a valid redirect HTTP status code.";
pub(crate) const MSG_ACTIVATION_PAST: &str = "The activation date must not be in the past.";
pub(crate) const MSG_DEACTIVATION_PAST: &str = "The deactivation date must not be in the past.";
pub(crate) const MSG_DEACTIVATION_BEFORE_ACTIVATION: &str =
    "The deactivation date must not be before the activation date.";
pub(crate) const MSG_BAD_KEY: &str =
    "The URL key may only contain letters, digits, '-' and '_'.";
pub(crate) const MSG_RESERVED_KEY: &str = "This URL key is reserved.";

/// Keys that collide with top-level routes when links are served without a prefix.
pub const RESERVED_KEYS: &[&str] = &["api", "health"];

/// Parses the configured key length.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] naming `key_length` if the value is not
/// a positive integer.
pub fn parse_key_length(raw: &str) -> Result<usize, AppError> {
    let length: usize = raw.trim().parse().map_err(|_| {
        AppError::configuration(
            "The config URL length is not a valid integer.",
            json!({ "field": "key_length", "value": raw }),
        )
    })?;

    if length == 0 {
        return Err(AppError::configuration(
            "The config URL length must be at least 1.",
            json!({ "field": "key_length", "value": raw }),
        ));
    }

    Ok(length)
}

/// Explicit per-field tracking choices. `None` defers to the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingOverrides {
    pub ip_address: Option<bool>,
    pub operating_system: Option<bool>,
    pub operating_system_version: Option<bool>,
    pub browser: Option<bool>,
    pub browser_version: Option<bool>,
    pub referer_url: Option<bool>,
    pub device_type: Option<bool>,
}

impl TrackingOverrides {
    pub fn resolve(&self, defaults: TrackingFields) -> TrackingFields {
        TrackingFields {
            ip_address: self.ip_address.unwrap_or(defaults.ip_address),
            operating_system: self.operating_system.unwrap_or(defaults.operating_system),
            operating_system_version: self
                .operating_system_version
                .unwrap_or(defaults.operating_system_version),
            browser: self.browser.unwrap_or(defaults.browser),
            browser_version: self.browser_version.unwrap_or(defaults.browser_version),
            referer_url: self.referer_url.unwrap_or(defaults.referer_url),
            device_type: self.device_type.unwrap_or(defaults.device_type),
        }
    }
}

/// Accumulates short link options and persists the link on [`Self::build`].
pub struct LinkBuilder<R: ShortLinkRepository + ?Sized> {
    repository: Arc<R>,

    key_length: usize,
    base_url: String,
    prefix: Option<String>,
    enforce_https: bool,
    default_forward_query_params: bool,
    default_tracking: TrackingConfig,

    destination_url: Option<String>,
    url_key: Option<String>,
    seed: Option<u64>,
    secure: Option<bool>,
    single_use: bool,
    forward_query_params: Option<bool>,
    redirect_status_code: Option<u16>,
    track_visits: Option<bool>,
    tracking: TrackingOverrides,
    activated_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
}

impl<R: ShortLinkRepository + ?Sized> LinkBuilder<R> {
    /// Creates a builder with defaults taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] if `config.key_length` is not a
    /// positive integer.
    pub fn new(repository: Arc<R>, config: &LinkConfig) -> Result<Self, AppError> {
        let key_length = parse_key_length(&config.key_length)?;

        Ok(Self {
            repository,
            key_length,
            base_url: config.base_url(),
            prefix: config.normalized_prefix(),
            enforce_https: config.enforce_https,
            default_forward_query_params: config.forward_query_params,
            default_tracking: config.tracking.clone(),
            destination_url: None,
            url_key: None,
            seed: None,
            secure: None,
            single_use: false,
            forward_query_params: None,
            redirect_status_code: None,
            track_visits: None,
            tracking: TrackingOverrides::default(),
            activated_at: None,
            deactivated_at: None,
        })
    }

    /// Sets the destination.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL does not begin with
    /// `http://` or `https://`, has no host, or holds anything other than
    /// visible ASCII (it must survive as a `Location` header).
    pub fn destination_url(mut self, url: impl Into<String>) -> Result<Self, AppError> {
        let url = url.into();

        if !is_valid_destination(&url) {
            return Err(AppError::bad_request(
                MSG_BAD_DESTINATION,
                json!({ "field": "destination_url", "value": url }),
            ));
        }

        self.destination_url = Some(url);
        Ok(self)
    }

    /// Uses `key` instead of allocating one. Takes precedence over a seed.
    pub fn url_key(mut self, key: impl Into<String>) -> Self {
        self.url_key = Some(key.into());
        self
    }

    /// Allocates the key deterministically from `seed`.
    pub fn generate_key_using(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rewrites an `http://` destination to `https://`. Overrides `enforce_https`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn single_use(mut self, single_use: bool) -> Self {
        self.single_use = single_use;
        self
    }

    pub fn forward_query_params(mut self, forward: bool) -> Self {
        self.forward_query_params = Some(forward);
        self
    }

    pub fn redirect_status_code(mut self, status: u16) -> Self {
        self.redirect_status_code = Some(status);
        self
    }

    pub fn track_visits(mut self, track: bool) -> Self {
        self.track_visits = Some(track);
        self
    }

    pub fn track_ip_address(mut self, track: bool) -> Self {
        self.tracking.ip_address = Some(track);
        self
    }

    pub fn track_operating_system(mut self, track: bool) -> Self {
        self.tracking.operating_system = Some(track);
        self
    }

    pub fn track_operating_system_version(mut self, track: bool) -> Self {
        self.tracking.operating_system_version = Some(track);
        self
    }

    pub fn track_browser(mut self, track: bool) -> Self {
        self.tracking.browser = Some(track);
        self
    }

    pub fn track_browser_version(mut self, track: bool) -> Self {
        self.tracking.browser_version = Some(track);
        self
    }

    pub fn track_referer_url(mut self, track: bool) -> Self {
        self.tracking.referer_url = Some(track);
        self
    }

    pub fn track_device_type(mut self, track: bool) -> Self {
        self.tracking.device_type = Some(track);
        self
    }

    /// Applies every explicit field choice in `overrides`, leaving unset ones alone.
    pub fn tracking(mut self, overrides: TrackingOverrides) -> Self {
        let current = self.tracking;
        self.tracking = TrackingOverrides {
            ip_address: overrides.ip_address.or(current.ip_address),
            operating_system: overrides.operating_system.or(current.operating_system),
            operating_system_version: overrides
                .operating_system_version
                .or(current.operating_system_version),
            browser: overrides.browser.or(current.browser),
            browser_version: overrides.browser_version.or(current.browser_version),
            referer_url: overrides.referer_url.or(current.referer_url),
            device_type: overrides.device_type.or(current.device_type),
        };
        self
    }

    pub fn activate_at(mut self, at: DateTime<Utc>) -> Self {
        self.activated_at = Some(at);
        self
    }

    pub fn deactivate_at(mut self, at: DateTime<Utc>) -> Self {
        self.deactivated_at = Some(at);
        self
    }

    /// Applies `on_true` or `on_false` depending on `flag`.
    pub fn when<T, F>(self, flag: bool, on_true: T, on_false: F) -> Self
    where
        T: FnOnce(Self) -> Self,
        F: FnOnce(Self) -> Self,
    {
        if flag { on_true(self) } else { on_false(self) }
    }

    /// Validates the accumulated options, allocates a key if needed, and
    /// persists the link.
    ///
    /// Checks run in order: destination, status code, dates, key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for any invalid or missing option,
    /// including an explicit key that is already taken.
    /// Returns [`AppError::KeyExhaustion`] if no free key could be allocated.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn build(self) -> Result<ShortLink, AppError> {
        let now = Utc::now();

        let destination = self.resolve_destination()?;
        let redirect_status_code = self.resolve_status()?;
        let (activated_at, deactivated_at) = self.resolve_window(now)?;
        let url_key = self.resolve_key().await?;

        let new_link = NewShortLink {
            public_short_url: self.public_short_url(&url_key),
            url_key,
            destination_url: destination,
            single_use: self.single_use,
            forward_query_params: self
                .forward_query_params
                .unwrap_or(self.default_forward_query_params),
            redirect_status_code,
            track_visits: self
                .track_visits
                .unwrap_or(self.default_tracking.default_enabled),
            tracking: self.tracking.resolve(self.default_tracking.fields),
            activated_at: Some(activated_at),
            deactivated_at,
        };

        let key = new_link.url_key.clone();
        let link = self
            .repository
            .create(new_link)
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => {
                    debug!("Store rejected key {} as duplicate", key);
                    duplicate_key(&key)
                }
                other => other,
            })?;

        info!(
            url_key = %link.url_key,
            destination = %link.destination_url,
            "Short link created"
        );

        Ok(link)
    }

    fn resolve_destination(&self) -> Result<String, AppError> {
        let destination = self.destination_url.as_deref().ok_or_else(|| {
            AppError::bad_request(MSG_NO_DESTINATION, json!({ "field": "destination_url" }))
        })?;

        let secure = self.secure.unwrap_or(self.enforce_https);
        Ok(match destination.strip_prefix("http://") {
            Some(rest) if secure => format!("https://{rest}"),
            _ => destination.to_string(),
        })
    }

    fn resolve_status(&self) -> Result<u16, AppError> {
        let status = self
            .redirect_status_code
            .unwrap_or(DEFAULT_REDIRECT_STATUS);

        if !(300..=399).contains(&status) {
            return Err(AppError::bad_request(
                MSG_BAD_STATUS,
                json!({ "field": "redirect_status_code", "value": status }),
            ));
        }

        Ok(status)
    }

    /// An unset activation means the link is active from `now`.
    fn resolve_window(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, Option<DateTime<Utc>>), AppError> {
        if let Some(activated_at) = self.activated_at
            && activated_at < now
        {
            return Err(AppError::bad_request(
                MSG_ACTIVATION_PAST,
                json!({ "field": "activated_at", "value": activated_at }),
            ));
        }

        if let Some(deactivated_at) = self.deactivated_at {
            if deactivated_at < now {
                return Err(AppError::bad_request(
                    MSG_DEACTIVATION_PAST,
                    json!({ "field": "deactivated_at", "value": deactivated_at }),
                ));
            }

            if let Some(activated_at) = self.activated_at
                && deactivated_at <= activated_at
            {
                return Err(AppError::bad_request(
                    MSG_DEACTIVATION_BEFORE_ACTIVATION,
                    json!({
                        "field": "deactivated_at",
                        "activated_at": activated_at,
                        "deactivated_at": deactivated_at,
                    }),
                ));
            }
        }

        Ok((self.activated_at.unwrap_or(now), self.deactivated_at))
    }

    async fn resolve_key(&self) -> Result<String, AppError> {
        let prefix = self.prefix.clone();
        let Some(ref key) = self.url_key else {
            return KeyAllocator::new(self.repository.clone())
                .reject_if(move |key| is_reserved_key(prefix.as_deref(), key))
                .allocate(self.key_length, self.seed)
                .await;
        };

        if !URL_KEY_REGEX.is_match(key) {
            return Err(AppError::bad_request(
                MSG_BAD_KEY,
                json!({ "field": "url_key", "value": key }),
            ));
        }

        if is_reserved_key(prefix.as_deref(), key) {
            return Err(AppError::bad_request(
                MSG_RESERVED_KEY,
                json!({ "field": "url_key", "value": key }),
            ));
        }

        if self.repository.key_exists(key).await? {
            return Err(duplicate_key(key));
        }

        Ok(key.clone())
    }

    fn public_short_url(&self, url_key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}/{}/{}", self.base_url, prefix, url_key),
            None => format!("{}/{}", self.base_url, url_key),
        }
    }
}

fn is_valid_destination(url: &str) -> bool {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }

    // Url::parse silently strips tabs and newlines, so check the raw bytes.
    if !url.bytes().all(|b| b.is_ascii_graphic()) {
        return false;
    }

    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| !host.is_empty()))
        .unwrap_or(false)
}

fn is_reserved_key(prefix: Option<&str>, key: &str) -> bool {
    prefix.is_none() && RESERVED_KEYS.contains(&key)
}

fn duplicate_key(key: &str) -> AppError {
    AppError::bad_request(MSG_DUPLICATE_KEY, json!({ "field": "url_key", "value": key }))
}
