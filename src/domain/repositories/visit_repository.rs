//! Repository trait for recorded visits.

use crate::domain::entities::{NewVisit, Visit};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for visit records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVisitRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryVisitRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Records a visit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the referenced link does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, AppError>;

    /// Returns `true` if a visit with `session_token` was already recorded
    /// for the link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn exists_for_session(
        &self,
        short_link_id: i64,
        session_token: &str,
    ) -> Result<bool, AppError>;

    /// Lists visits for a link, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_for_link(
        &self,
        short_link_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError>;

    /// Counts visits recorded for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count_for_link(&self, short_link_id: i64) -> Result<i64, AppError>;
}
