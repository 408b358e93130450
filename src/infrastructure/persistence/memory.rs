//! In-process repository implementations backed by `DashMap`.
//!
//! They keep the same contracts as the PostgreSQL repositories, including the
//! unique `url_key` guarantee, and back the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{NewShortLink, NewVisit, ShortLink, Visit};
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::error::AppError;

/// Short links keyed by `url_key`.
#[derive(Default)]
pub struct InMemoryShortLinkRepository {
    links: DashMap<String, ShortLink>,
    next_id: AtomicI64,
}

impl InMemoryShortLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShortLinkRepository for InMemoryShortLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        match self.links.entry(new_link.url_key.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "short_links_url_key_key" }),
            )),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let link = ShortLink {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    url_key: new_link.url_key,
                    destination_url: new_link.destination_url,
                    public_short_url: new_link.public_short_url,
                    single_use: new_link.single_use,
                    forward_query_params: new_link.forward_query_params,
                    redirect_status_code: new_link.redirect_status_code,
                    track_visits: new_link.track_visits,
                    tracking: new_link.tracking,
                    activated_at: new_link.activated_at,
                    deactivated_at: new_link.deactivated_at,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn find_by_key(&self, url_key: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.links.get(url_key).map(|link| link.value().clone()))
    }

    async fn key_exists(&self, url_key: &str) -> Result<bool, AppError> {
        Ok(self.links.contains_key(url_key))
    }

    async fn deactivate(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut link = self
            .links
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))?;

        link.deactivated_at = Some(at);
        link.updated_at = Utc::now();
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.links.len() as i64)
    }
}

/// Visits grouped by owning link id.
#[derive(Default)]
pub struct InMemoryVisitRepository {
    visits: DashMap<i64, Vec<Visit>>,
    next_id: AtomicI64,
}

impl InMemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let visit = Visit {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            short_link_id: new_visit.short_link_id,
            session_token: new_visit.session_token,
            attributes: new_visit.attributes,
            visited_at: new_visit.visited_at,
        };

        self.visits
            .entry(visit.short_link_id)
            .or_default()
            .push(visit.clone());

        Ok(visit)
    }

    async fn exists_for_session(
        &self,
        short_link_id: i64,
        session_token: &str,
    ) -> Result<bool, AppError> {
        Ok(self.visits.get(&short_link_id).is_some_and(|visits| {
            visits
                .iter()
                .any(|v| v.session_token.as_deref() == Some(session_token))
        }))
    }

    async fn list_for_link(
        &self,
        short_link_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError> {
        let Some(visits) = self.visits.get(&short_link_id) else {
            return Ok(Vec::new());
        };

        Ok(visits
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_for_link(&self, short_link_id: i64) -> Result<i64, AppError> {
        Ok(self
            .visits
            .get(&short_link_id)
            .map_or(0, |visits| visits.len() as i64))
    }
}
