//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, the visit logger, and the Axum
//! server lifecycle.

use crate::application::services::AuthService;
use crate::config::Config;
use crate::domain::repositories::{ShortLinkRepository, VisitRepository};
use crate::domain::visit_worker::run_visit_logger;
use crate::infrastructure::persistence::{PgShortLinkRepository, PgVisitRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;

/// Opens the PostgreSQL pool with the configured limits and timeouts.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Visit notification channel and its logger
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn ShortLinkRepository> =
        Arc::new(PgShortLinkRepository::new(pool.clone()));
    let visit_repository: Arc<dyn VisitRepository> = Arc::new(PgVisitRepository::new(pool));

    let (visit_tx, visit_rx) = broadcast::channel(config.visit_event_capacity);
    tokio::spawn(run_visit_logger(visit_rx));
    tracing::info!("Visit logger started");

    let auth_service = AuthService::new(&config.api_token, config.token_signing_secret.clone());

    let state = AppState::new(
        link_repository,
        visit_repository,
        config.links.clone(),
        auth_service,
        &config.session_secret,
        visit_tx,
    )
    .with_behind_proxy(config.behind_proxy);

    let prefix = state.link_service.prefix();
    let app = app_router(state, prefix, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
