//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for short links.
///
/// The store's uniqueness guarantee on `url_key` is the authoritative collision
/// check. [`ShortLinkRepository::key_exists`] is only an optimistic pre-check.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryShortLinkRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortLinkRepository: Send + Sync {
    /// Persists a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a link with the same `url_key` exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_key(&self, url_key: &str) -> Result<Option<ShortLink>, AppError>;

    /// Returns `true` if any link already uses `url_key`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn key_exists(&self, url_key: &str) -> Result<bool, AppError>;

    /// Sets `deactivated_at` on the link with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn deactivate(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Counts all stored links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count(&self) -> Result<i64, AppError>;
}
