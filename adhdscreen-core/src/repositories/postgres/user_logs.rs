// src/repositories/postgres/user_logs.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use adhdscreen_common::models::{ActivityLogEntry, NewActivityLogEntry};
use adhdscreen_common::traits::ActivityLogRepository;
use crate::Error;
use crate::repositories::postgres::owner_violation;

#[derive(Clone)]
pub struct PostgresActivityLogRepository {
    pool: Pool<Postgres>,
}

impl PostgresActivityLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn insert_entry(&self, entry: &NewActivityLogEntry) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_logs (user_id, action, details)
            VALUES ($1, $2, $3)
            "#,
        )
            .bind(entry.user_id)
            .bind(&entry.action)
            .bind(&entry.details)
            .execute(&self.pool)
            .await
            .map_err(|e| owner_violation(e, entry.user_id))?;
        Ok(())
    }

    async fn get_entries_for_user(&self, user_id: i64, limit: i64)
                                  -> Result<Vec<ActivityLogEntry>, Error>
    {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, action, details, created_at
            FROM user_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
            .bind(user_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(ActivityLogEntry {
                id: r.try_get("id")?,
                user_id: r.try_get("user_id")?,
                action: r.try_get("action")?,
                details: r.try_get("details")?,
                created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
            });
        }
        Ok(entries)
    }
}
