//! PostgreSQL implementation of the visit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewVisit, Visit, VisitorAttributes};
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;

#[derive(FromRow)]
struct VisitRow {
    id: i64,
    short_link_id: i64,
    session_token: Option<String>,
    ip_address: Option<String>,
    operating_system: Option<String>,
    operating_system_version: Option<String>,
    browser: Option<String>,
    browser_version: Option<String>,
    referer_url: Option<String>,
    device_type: Option<String>,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Visit {
            id: row.id,
            short_link_id: row.short_link_id,
            session_token: row.session_token,
            attributes: VisitorAttributes {
                ip_address: row.ip_address,
                operating_system: row.operating_system,
                operating_system_version: row.operating_system_version,
                browser: row.browser,
                browser_version: row.browser_version,
                referer_url: row.referer_url,
                // The CHECK constraint limits stored values to known device types.
                device_type: row.device_type.and_then(|d| d.parse().ok()),
            },
            visited_at: row.visited_at,
        }
    }
}

/// PostgreSQL repository for visit records.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let attributes = new_visit.attributes;

        let row: VisitRow = sqlx::query_as(
            r#"
            INSERT INTO short_link_visits (
                short_link_id, session_token, ip_address, operating_system,
                operating_system_version, browser, browser_version, referer_url,
                device_type, visited_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, short_link_id, session_token, ip_address, operating_system,
                      operating_system_version, browser, browser_version, referer_url,
                      device_type, visited_at
            "#,
        )
        .bind(new_visit.short_link_id)
        .bind(new_visit.session_token)
        .bind(attributes.ip_address)
        .bind(attributes.operating_system)
        .bind(attributes.operating_system_version)
        .bind(attributes.browser)
        .bind(attributes.browser_version)
        .bind(attributes.referer_url)
        .bind(attributes.device_type.map(|d| d.as_str()))
        .bind(new_visit.visited_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if let Some(db) = e.as_database_error()
                && db.is_foreign_key_violation()
            {
                return AppError::bad_request(
                    "Short link does not exist",
                    json!({ "short_link_id": new_visit.short_link_id }),
                );
            }
            AppError::from(e)
        })?;

        Ok(row.into())
    }

    async fn exists_for_session(
        &self,
        short_link_id: i64,
        session_token: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM short_link_visits
                WHERE short_link_id = $1 AND session_token = $2
            )
            "#,
        )
        .bind(short_link_id)
        .bind(session_token)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn list_for_link(
        &self,
        short_link_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r#"
            SELECT id, short_link_id, session_token, ip_address, operating_system,
                   operating_system_version, browser, browser_version, referer_url,
                   device_type, visited_at
            FROM short_link_visits
            WHERE short_link_id = $1
            ORDER BY visited_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(short_link_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    async fn count_for_link(&self, short_link_id: i64) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM short_link_visits WHERE short_link_id = $1")
                .bind(short_link_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
