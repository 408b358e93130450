//! PostgreSQL implementation of the short link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink, TrackingFields};
use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;

const SELECT_COLUMNS: &str = r#"
    id, url_key, destination_url, public_short_url, single_use,
    forward_query_params, redirect_status_code, track_visits,
    track_ip_address, track_operating_system, track_operating_system_version,
    track_browser, track_browser_version, track_referer_url, track_device_type,
    activated_at, deactivated_at, created_at, updated_at
"#;

#[derive(FromRow)]
struct ShortLinkRow {
    id: i64,
    url_key: String,
    destination_url: String,
    public_short_url: String,
    single_use: bool,
    forward_query_params: bool,
    redirect_status_code: i32,
    track_visits: bool,
    track_ip_address: bool,
    track_operating_system: bool,
    track_operating_system_version: bool,
    track_browser: bool,
    track_browser_version: bool,
    track_referer_url: bool,
    track_device_type: bool,
    activated_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShortLinkRow> for ShortLink {
    type Error = AppError;

    fn try_from(row: ShortLinkRow) -> Result<Self, Self::Error> {
        let redirect_status_code = u16::try_from(row.redirect_status_code).map_err(|_| {
            AppError::internal(
                "Stored redirect status code is out of range",
                json!({ "url_key": row.url_key, "value": row.redirect_status_code }),
            )
        })?;

        Ok(ShortLink {
            id: row.id,
            url_key: row.url_key,
            destination_url: row.destination_url,
            public_short_url: row.public_short_url,
            single_use: row.single_use,
            forward_query_params: row.forward_query_params,
            redirect_status_code,
            track_visits: row.track_visits,
            tracking: TrackingFields {
                ip_address: row.track_ip_address,
                operating_system: row.track_operating_system,
                operating_system_version: row.track_operating_system_version,
                browser: row.track_browser,
                browser_version: row.track_browser_version,
                referer_url: row.track_referer_url,
                device_type: row.track_device_type,
            },
            activated_at: row.activated_at,
            deactivated_at: row.deactivated_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL repository for short links.
///
/// The `short_links_url_key_key` unique constraint is the final word on key
/// collisions; a violation surfaces as [`AppError::Conflict`].
pub struct PgShortLinkRepository {
    pool: Arc<PgPool>,
}

impl PgShortLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortLinkRepository for PgShortLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            r#"
            INSERT INTO short_links (
                url_key, destination_url, public_short_url, single_use,
                forward_query_params, redirect_status_code, track_visits,
                track_ip_address, track_operating_system, track_operating_system_version,
                track_browser, track_browser_version, track_referer_url, track_device_type,
                activated_at, deactivated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let tracking = new_link.tracking;
        let row: ShortLinkRow = sqlx::query_as(&sql)
            .bind(&new_link.url_key)
            .bind(&new_link.destination_url)
            .bind(&new_link.public_short_url)
            .bind(new_link.single_use)
            .bind(new_link.forward_query_params)
            .bind(i32::from(new_link.redirect_status_code))
            .bind(new_link.track_visits)
            .bind(tracking.ip_address)
            .bind(tracking.operating_system)
            .bind(tracking.operating_system_version)
            .bind(tracking.browser)
            .bind(tracking.browser_version)
            .bind(tracking.referer_url)
            .bind(tracking.device_type)
            .bind(new_link.activated_at)
            .bind(new_link.deactivated_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        row.try_into()
    }

    async fn find_by_key(&self, url_key: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM short_links WHERE url_key = $1");

        let row: Option<ShortLinkRow> = sqlx::query_as(&sql)
            .bind(url_key)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(ShortLink::try_from).transpose()
    }

    async fn key_exists(&self, url_key: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM short_links WHERE url_key = $1)")
                .bind(url_key)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn deactivate(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE short_links SET deactivated_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "id": id }),
            ));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
