use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use hangar_core::error::AppError;
use hangar_core::models::QueueStats;
use hangar_core::target::{Target, TargetStatus, TargetUpdate, Tier, TierSchedule};
use hangar_core::traits::TargetRegistry;

const TARGET_COLUMNS: &str = "id, name, url, category_hint, tier, region, status, \
    last_checked_at, last_success_at, consecutive_failures, last_error, \
    jobs_found_last_run, total_jobs_found";

/// PostgreSQL-backed target registry.
#[derive(Clone)]
pub struct TargetRepository {
    pool: Pool<Postgres>,
}

impl TargetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a target. Returns false when the URL is already registered.
    pub async fn insert(&self, target: &Target) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO targets (
                id, name, url, category_hint, tier, region, status,
                last_checked_at, last_success_at, consecutive_failures, last_error,
                jobs_found_last_run, total_jobs_found
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(target.id)
        .bind(&target.name)
        .bind(&target.url)
        .bind(&target.category_hint)
        .bind(i16::from(target.tier.number()))
        .bind(&target.region)
        .bind(target.status.as_str())
        .bind(target.last_checked_at)
        .bind(target.last_success_at)
        .bind(target.consecutive_failures as i32)
        .bind(&target.last_error)
        .bind(target.jobs_found_last_run as i32)
        .bind(target.total_jobs_found as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Target>, AppError> {
        let row = sqlx::query_as::<_, TargetRow>(&format!(
            "SELECT {TARGET_COLUMNS} FROM targets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TargetRow {
    id: Uuid,
    name: String,
    url: String,
    category_hint: Option<String>,
    tier: i16,
    region: Option<String>,
    status: String,
    last_checked_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    consecutive_failures: i32,
    last_error: Option<String>,
    jobs_found_last_run: i32,
    total_jobs_found: i64,
}

impl From<TargetRow> for Target {
    fn from(row: TargetRow) -> Self {
        Target {
            id: row.id,
            name: row.name,
            url: row.url,
            category_hint: row.category_hint,
            tier: u8::try_from(row.tier)
                .ok()
                .and_then(|t| Tier::try_from(t).ok())
                .unwrap_or(Tier::Three),
            region: row.region,
            status: row.status.parse().unwrap_or(TargetStatus::Disabled),
            last_checked_at: row.last_checked_at,
            last_success_at: row.last_success_at,
            consecutive_failures: row.consecutive_failures.max(0) as u32,
            last_error: row.last_error,
            jobs_found_last_run: row.jobs_found_last_run.max(0) as u32,
            total_jobs_found: row.total_jobs_found.max(0) as u64,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CountRow {
    key: String,
    count: i64,
}

impl TargetRegistry for TargetRepository {
    async fn list_due(
        &self,
        tier: Tier,
        checked_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Target>, AppError> {
        let rows = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            SELECT {TARGET_COLUMNS}
            FROM targets
            WHERE status = 'active'
              AND tier = $1
              AND (last_checked_at IS NULL OR last_checked_at <= $2)
            ORDER BY last_checked_at ASC NULLS FIRST, created_at ASC
            LIMIT $3
            "#
        ))
        .bind(i16::from(tier.number()))
        .bind(checked_before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_degraded(&self, max_failures: u32, limit: usize) -> Result<Vec<Target>, AppError> {
        let rows = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            SELECT {TARGET_COLUMNS}
            FROM targets
            WHERE status = 'degraded' AND consecutive_failures < $1
            ORDER BY last_checked_at ASC NULLS FIRST
            LIMIT $2
            "#
        ))
        .bind(max_failures as i32)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_after_run(&self, target_id: Uuid, update: &TargetUpdate) -> Result<(), AppError> {
        // An operator may disable a target while it is being processed; that wins.
        let result = sqlx::query(
            r#"
            UPDATE targets
            SET last_checked_at = $2,
                consecutive_failures = $3,
                status = CASE WHEN status = 'disabled' THEN status ELSE $4 END,
                last_error = $5,
                last_success_at = COALESCE($6, last_success_at),
                jobs_found_last_run = COALESCE($7, jobs_found_last_run),
                total_jobs_found = total_jobs_found + COALESCE($7, 0)
            WHERE id = $1
            "#,
        )
        .bind(target_id)
        .bind(update.last_checked_at)
        .bind(update.consecutive_failures as i32)
        .bind(update.status.as_str())
        .bind(&update.last_error)
        .bind(update.last_success_at)
        .bind(update.jobs_found.map(|n| n as i32))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::DatabaseError(format!(
                "Target {target_id} not found"
            )));
        }
        Ok(())
    }

    async fn list_targets(&self, status: Option<TargetStatus>) -> Result<Vec<Target>, AppError> {
        let rows = sqlx::query_as::<_, TargetRow>(&format!(
            r#"
            SELECT {TARGET_COLUMNS}
            FROM targets
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY tier ASC, name ASC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn queue_stats(
        &self,
        now: DateTime<Utc>,
        schedule: &TierSchedule,
    ) -> Result<QueueStats, AppError> {
        let (total, due): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (
                    WHERE status = 'active' AND (
                        last_checked_at IS NULL
                        OR (tier = 1 AND last_checked_at <= $1)
                        OR (tier = 2 AND last_checked_at <= $2)
                        OR (tier = 3 AND last_checked_at <= $3)
                    )
                )
            FROM targets
            "#,
        )
        .bind(schedule.due_cutoff(Tier::One, now))
        .bind(schedule.due_cutoff(Tier::Two, now))
        .bind(schedule.due_cutoff(Tier::Three, now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let by_tier = sqlx::query_as::<_, CountRow>(
            "SELECT tier::TEXT AS key, COUNT(*) AS count FROM targets GROUP BY tier",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let by_status = sqlx::query_as::<_, CountRow>(
            "SELECT status AS key, COUNT(*) AS count FROM targets GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(QueueStats {
            total: total as u64,
            due: due as u64,
            by_tier: by_tier
                .into_iter()
                .filter_map(|r| Some((r.key.parse().ok()?, r.count as u64)))
                .collect(),
            by_status: by_status
                .into_iter()
                .map(|r| (r.key, r.count as u64))
                .collect(),
        })
    }
}
