#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo, middleware, routing::get};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use short_url::api;
use short_url::api::handlers::{health_handler, redirect_handler};
use short_url::api::middleware::auth;
use short_url::application::services::AuthService;
use short_url::config::LinkConfig;
use short_url::domain::entities::{NewShortLink, ShortLink, TrackingFields};
use short_url::domain::repositories::ShortLinkRepository;
use short_url::domain::visit_event::VisitedEvent;
use short_url::infrastructure::persistence::{InMemoryShortLinkRepository, InMemoryVisitRepository};
use short_url::routes::redirect_path;
use short_url::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::Layer;

pub const TEST_TOKEN: &str = "test-api-token";
pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const SESSION_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const PEER_ADDR: &str = "127.0.0.1:12345";

/// In-memory application with direct access to its stores.
pub struct TestApp {
    pub state: AppState,
    pub links: Arc<InMemoryShortLinkRepository>,
    pub visits: Arc<InMemoryVisitRepository>,
    /// Keeps the visit channel alive and lets tests observe notifications.
    pub events: broadcast::Receiver<VisitedEvent>,
}

pub fn link_config() -> LinkConfig {
    LinkConfig {
        app_url: "https://sho.rt".to_string(),
        ..LinkConfig::default()
    }
}

pub fn create_test_app(config: LinkConfig) -> TestApp {
    let links = Arc::new(InMemoryShortLinkRepository::new());
    let visits = Arc::new(InMemoryVisitRepository::new());
    let (tx, rx) = broadcast::channel(16);

    let state = AppState::new(
        links.clone(),
        visits.clone(),
        config,
        AuthService::new(TEST_TOKEN, SIGNING_SECRET.to_string()),
        SESSION_SECRET,
        tx,
    );

    TestApp {
        state,
        links,
        visits,
        events: rx,
    }
}

/// Same routes as the production router, with a fixed peer address and no
/// rate limiting.
pub fn test_router(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .route(&redirect_path(Some("short")), get(redirect_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(test_router(state)).unwrap()
}

pub fn new_link(url_key: &str, destination_url: &str) -> NewShortLink {
    NewShortLink {
        url_key: url_key.to_string(),
        destination_url: destination_url.to_string(),
        public_short_url: format!("https://sho.rt/short/{url_key}"),
        single_use: false,
        forward_query_params: false,
        redirect_status_code: 301,
        track_visits: true,
        tracking: TrackingFields::ALL,
        activated_at: Some(Utc::now() - chrono::Duration::minutes(1)),
        deactivated_at: None,
    }
}

pub async fn seed_link(links: &InMemoryShortLinkRepository, new_link: NewShortLink) -> ShortLink {
    links.create(new_link).await.unwrap()
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(hours)
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
