//! Shared application state injected into every handler.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::services::{AuthService, LinkService, VisitResolver};
use crate::config::LinkConfig;
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::domain::visit_event::VisitedEvent;

pub type DynLinkService = LinkService<dyn ShortLinkRepository, dyn VisitRepository>;
pub type DynVisitResolver = VisitResolver<dyn ShortLinkRepository, dyn VisitRepository>;

/// Services and settings shared by all requests.
///
/// Repositories are held as trait objects so the same router serves the
/// PostgreSQL and in-memory stores.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<DynLinkService>,
    pub visit_resolver: Arc<DynVisitResolver>,
    pub auth_service: Arc<AuthService>,
    pub visit_events: broadcast::Sender<VisitedEvent>,
    /// Encrypts the `link_session` cookie.
    pub cookie_key: Key,
    /// Read the client IP from proxy headers.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_repository: Arc<dyn ShortLinkRepository>,
        visit_repository: Arc<dyn VisitRepository>,
        link_config: LinkConfig,
        auth_service: AuthService,
        session_secret: &str,
        visit_events: broadcast::Sender<VisitedEvent>,
    ) -> Self {
        let link_service = LinkService::new(
            link_repository.clone(),
            visit_repository.clone(),
            link_config,
        );
        let visit_resolver =
            VisitResolver::new(link_repository, visit_repository, visit_events.clone());

        Self {
            link_service: Arc::new(link_service),
            visit_resolver: Arc::new(visit_resolver),
            auth_service: Arc::new(auth_service),
            visit_events,
            cookie_key: cookie_key(session_secret),
            behind_proxy: false,
        }
    }

    pub fn with_behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derives the 64-byte cookie key from an arbitrary-length secret.
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
