use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use hangar_core::ats::StrategyId;
use hangar_core::error::AppError;
use hangar_core::models::{RunStatus, ScrapeRun};
use hangar_core::traits::RunLog;

/// Append-only run log in PostgreSQL.
#[derive(Clone)]
pub struct RunRepository {
    pool: Pool<Postgres>,
}

impl RunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScrapeRunRow {
    id: Uuid,
    target_id: Uuid,
    target_name: String,
    detected_strategy: String,
    status: String,
    postings_found: i32,
    jobs_saved: i32,
    rejected: i32,
    duration_ms: i64,
    error: Option<String>,
    completed_at: DateTime<Utc>,
}

impl From<ScrapeRunRow> for ScrapeRun {
    fn from(row: ScrapeRunRow) -> Self {
        ScrapeRun {
            id: row.id,
            target_id: row.target_id,
            target_name: row.target_name,
            detected_strategy: row.detected_strategy.parse().unwrap_or(StrategyId::Custom),
            status: row.status.parse().unwrap_or(RunStatus::Failed),
            postings_found: row.postings_found.max(0) as u32,
            jobs_saved: row.jobs_saved.max(0) as u32,
            rejected: row.rejected.max(0) as u32,
            duration_ms: row.duration_ms.max(0) as u64,
            error: row.error,
            completed_at: row.completed_at,
        }
    }
}

impl RunLog for RunRepository {
    async fn record(&self, run: &ScrapeRun) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO scrape_runs (
                id, target_id, target_name, detected_strategy, status,
                postings_found, jobs_saved, rejected, duration_ms, error, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(run.id)
        .bind(run.target_id)
        .bind(&run.target_name)
        .bind(run.detected_strategy.as_str())
        .bind(run.status.as_str())
        .bind(run.postings_found as i32)
        .bind(run.jobs_saved as i32)
        .bind(run.rejected as i32)
        .bind(run.duration_ms as i64)
        .bind(&run.error)
        .bind(run.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ScrapeRun>, AppError> {
        let rows = sqlx::query_as::<_, ScrapeRunRow>(
            r#"
            SELECT id, target_id, target_name, detected_strategy, status,
                   postings_found, jobs_saved, rejected, duration_ms, error, completed_at
            FROM scrape_runs
            ORDER BY completed_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
