// src/repositories/postgres/results.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::warn;

use adhdscreen_common::models::{NewScreeningResult, RiskLevel, ScreeningResult};
use adhdscreen_common::traits::ResultRepository;
use crate::Error;
use crate::repositories::postgres::owner_violation;

#[derive(Clone)]
pub struct PostgresResultRepository {
    pool: Pool<Postgres>,
}

impl PostgresResultRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_result(r: &PgRow) -> Result<ScreeningResult, Error> {
    let risk_level: String = r.try_get("risk_level")?;
    Ok(ScreeningResult {
        id: r.try_get("id")?,
        user_id: r.try_get("user_id")?,
        score: r.try_get("score")?,
        percentage: r.try_get("percentage")?,
        message: r.try_get("message")?,
        risk_level: risk_level.parse::<RiskLevel>()?,
        responses: r.try_get("responses")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl ResultRepository for PostgresResultRepository {
    async fn create(&self, result: &NewScreeningResult) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO results (user_id, score, percentage, message, risk_level, responses)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
            .bind(result.user_id)
            .bind(result.score)
            .bind(result.percentage)
            .bind(&result.message)
            .bind(result.risk_level.as_str())
            .bind(&result.responses)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| owner_violation(e, result.user_id))?;
        Ok(row.try_get("id")?)
    }

    async fn get(&self, result_id: i64, owner_id: i64) -> Result<Option<ScreeningResult>, Error> {
        // Fetched by id alone; ownership is decided below, not by the WHERE clause.
        let row = sqlx::query(
            r#"
            SELECT id, user_id, score, percentage, message,
                   risk_level, responses, created_at
            FROM results
            WHERE id = $1
            "#,
        )
            .bind(result_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(r) = row else {
            return Ok(None);
        };
        let result = row_to_result(&r)?;
        let owner = result.user_id;
        // Ownership first, so a corrupt foreign row still reads as absent.
        let Some(result) = result.owned_by(owner_id) else {
            warn!(
                "result {} requested by user {} but owned by user {}",
                result_id, owner_id, owner
            );
            return Ok(None);
        };
        result.verify_tier()?;
        Ok(Some(result))
    }

    async fn list_recent(&self, owner_id: i64, limit: i64) -> Result<Vec<ScreeningResult>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, score, percentage, message,
                   risk_level, responses, created_at
            FROM results
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
            .bind(owner_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(rows.len());
        for r in rows {
            let result = row_to_result(&r)?;
            result.verify_tier()?;
            results.push(result);
        }
        Ok(results)
    }
}
