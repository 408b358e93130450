//! Short link creation and lookup.

use std::sync::Arc;

use serde_json::json;

use super::link_builder::LinkBuilder;
use crate::config::LinkConfig;
use crate::domain::entities::{ShortLink, Visit};
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::error::AppError;

/// Entry point for creating links and reading them back with their visits.
pub struct LinkService<L, V>
where
    L: ShortLinkRepository + ?Sized,
    V: VisitRepository + ?Sized,
{
    link_repository: Arc<L>,
    visit_repository: Arc<V>,
    config: LinkConfig,
}

impl<L, V> LinkService<L, V>
where
    L: ShortLinkRepository + ?Sized,
    V: VisitRepository + ?Sized,
{
    pub fn new(link_repository: Arc<L>, visit_repository: Arc<V>, config: LinkConfig) -> Self {
        Self {
            link_repository,
            visit_repository,
            config,
        }
    }

    /// Starts a new link with this service's configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] if the configured key length is invalid.
    pub fn builder(&self) -> Result<LinkBuilder<L>, AppError> {
        LinkBuilder::new(self.link_repository.clone(), &self.config)
    }

    /// Normalized path prefix for redirect routes, if any.
    pub fn prefix(&self) -> Option<String> {
        self.config.normalized_prefix()
    }

    /// Retrieves a link by key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link uses `url_key`.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn get_by_key(&self, url_key: &str) -> Result<ShortLink, AppError> {
        self.link_repository
            .find_by_key(url_key)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "url_key": url_key }))
            })
    }

    pub async fn visit_count(&self, link: &ShortLink) -> Result<i64, AppError> {
        self.visit_repository.count_for_link(link.id).await
    }

    /// Returns one page of visits, newest first, plus the total count.
    pub async fn list_visits(
        &self,
        link: &ShortLink,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Visit>, i64), AppError> {
        let visits = self
            .visit_repository
            .list_for_link(link.id, offset, limit)
            .await?;
        let total = self.visit_repository.count_for_link(link.id).await?;

        Ok((visits, total))
    }

    pub async fn count_links(&self) -> Result<i64, AppError> {
        self.link_repository.count().await
    }
}
