//! Resolution of a visit against a short link.
//!
//! For an active link the resolver:
//!
//! 1. Skips recording when the session already has a visit for this link
//! 2. Records the visit through the link's tracking mask (if tracking is on)
//! 3. Publishes a [`VisitedEvent`]
//! 4. Deactivates single-use links
//! 5. Appends the visitor's query string when the link forwards it
//!
//! Session dedup and single-use bookkeeping are best-effort: their failures are
//! logged and the redirect still happens. A failed visit insert is returned to
//! the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::entities::{LinkState, NewVisit, ShortLink, Visit};
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::domain::visit_context::VisitContext;
use crate::domain::visit_event::VisitedEvent;
use crate::error::AppError;

/// Where to send the visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub destination_url: String,
    pub status_code: u16,
    /// The visit recorded for this request, if any.
    pub visit: Option<Visit>,
}

pub struct VisitResolver<L, V>
where
    L: ShortLinkRepository + ?Sized,
    V: VisitRepository + ?Sized,
{
    links: Arc<L>,
    visits: Arc<V>,
    events: broadcast::Sender<VisitedEvent>,
}

impl<L, V> VisitResolver<L, V>
where
    L: ShortLinkRepository + ?Sized,
    V: VisitRepository + ?Sized,
{
    pub fn new(links: Arc<L>, visits: Arc<V>, events: broadcast::Sender<VisitedEvent>) -> Self {
        Self {
            links,
            visits,
            events,
        }
    }

    /// Resolves a visit at the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_at`].
    pub async fn resolve(
        &self,
        context: &VisitContext,
        link: &ShortLink,
    ) -> Result<Resolution, AppError> {
        self.resolve_at(context, link, Utc::now()).await
    }

    /// Resolves a visit as if it happened at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LinkUnavailable`] if the link is pending or expired.
    /// Returns [`AppError::Internal`] if the visit could not be recorded.
    pub async fn resolve_at(
        &self,
        context: &VisitContext,
        link: &ShortLink,
        now: DateTime<Utc>,
    ) -> Result<Resolution, AppError> {
        match link.state_at(now) {
            LinkState::Active => {}
            LinkState::Pending => {
                return Err(AppError::link_unavailable(
                    "Short link is not active yet",
                    json!({ "url_key": link.url_key, "state": "pending" }),
                ));
            }
            LinkState::Expired => {
                return Err(AppError::link_unavailable(
                    "Short link has expired",
                    json!({ "url_key": link.url_key, "state": "expired" }),
                ));
            }
        }

        let visit = if link.track_visits {
            self.record_visit(context, link, now).await?
        } else {
            None
        };

        if link.single_use && (visit.is_some() || !link.track_visits) {
            match self.links.deactivate(link.id, now).await {
                Ok(()) => debug!("Single-use link {} deactivated", link.url_key),
                Err(e) => warn!("Failed to deactivate single-use link {}: {}", link.url_key, e),
            }
        }

        let destination_url = if link.forward_query_params {
            forward_query(&link.destination_url, context.query.as_deref())
        } else {
            link.destination_url.clone()
        };

        Ok(Resolution {
            destination_url,
            status_code: link.redirect_status_code,
            visit,
        })
    }

    /// Records the visit unless this session already has one for the link.
    async fn record_visit(
        &self,
        context: &VisitContext,
        link: &ShortLink,
        now: DateTime<Utc>,
    ) -> Result<Option<Visit>, AppError> {
        if let Some(ref token) = context.session_token {
            match self.visits.exists_for_session(link.id, token).await {
                Ok(true) => {
                    debug!("Repeat visit to {} within session, not recorded", link.url_key);
                    return Ok(None);
                }
                Ok(false) => {}
                Err(e) => warn!("Session lookup failed for {}: {}", link.url_key, e),
            }
        }

        let visit = self
            .visits
            .record(NewVisit {
                short_link_id: link.id,
                session_token: context.recorded_token(),
                attributes: link.tracking.redact(&context.attributes),
                visited_at: now,
            })
            .await?;

        // No subscribers is not an error.
        let _ = self.events.send(VisitedEvent {
            short_link: link.clone(),
            visit: visit.clone(),
        });

        Ok(Some(visit))
    }
}

/// Appends `query` to `destination`, keeping any fragment last.
///
/// Uses `&` when the destination already has a query and `?` otherwise. An
/// empty query leaves the destination unchanged.
pub fn forward_query(destination: &str, query: Option<&str>) -> String {
    let query = query.map(|q| q.trim_start_matches('?')).unwrap_or_default();
    if query.is_empty() {
        return destination.to_string();
    }

    let (base, fragment) = match destination.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (destination, None),
    };

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut url = format!("{base}{separator}{query}");
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}
