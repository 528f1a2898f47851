//! SQLite implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::{ClickRepository, StoreError};

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    timestamp: DateTime<Utc>,
    user_agent: String,
    ip_address: String,
}

/// Append-only SQLite click store.
#[derive(Clone)]
pub struct SqliteClickRepository {
    pool: SqlitePool,
}

impl SqliteClickRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for SqliteClickRepository {
    async fn create(&self, new_click: NewClick) -> Result<Click, StoreError> {
        let row: ClickRow = sqlx::query_as(
            r#"
            INSERT INTO clicks (link_id, timestamp, user_agent, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, link_id, timestamp, user_agent, ip_address
            "#,
        )
        .bind(new_click.link_id)
        .bind(new_click.timestamp)
        .bind(&new_click.user_agent)
        .bind(&new_click.ip_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(Click::new(
            row.id,
            row.link_id,
            row.timestamp,
            row.user_agent,
            row.ip_address,
        ))
    }
}
