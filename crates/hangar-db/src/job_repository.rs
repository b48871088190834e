use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use hangar_core::error::AppError;
use hangar_core::models::NormalizedJob;
use hangar_core::traits::JobStore;
use hangar_core::util::truncate_chars;

const TITLE_MAX: usize = 500;
const COMPANY_MAX: usize = 255;
const LOCATION_MAX: usize = 255;

/// PostgreSQL-backed job store, idempotent on `application_url`.
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of active jobs.
    pub async fn count_active(&self) -> Result<u64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pilot_jobs WHERE is_active")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(count as u64)
    }
}

impl JobStore for JobRepository {
    async fn upsert(&self, jobs: &[NormalizedJob]) -> Result<usize, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let mut saved = 0;
        for job in jobs {
            let Some(url) = job
                .application_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
            else {
                tracing::debug!(title = %job.title, "Skipping job without application URL");
                continue;
            };

            sqlx::query(
                r#"
                INSERT INTO pilot_jobs (
                    application_url, canonical_key, title, company, location, region,
                    position_type, aircraft_type, aircraft_category,
                    min_total_hours, min_pic_hours, min_type_hours, license_required,
                    type_rating_required, type_rating_provided, visa_sponsorship, is_entry_level,
                    contract_type, tags, description, source_target_id, is_active, scraped_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16, $17, $18, $19, $20, $21, TRUE, $22)
                ON CONFLICT (application_url) DO UPDATE SET
                    canonical_key = EXCLUDED.canonical_key,
                    title = EXCLUDED.title,
                    company = EXCLUDED.company,
                    location = EXCLUDED.location,
                    region = EXCLUDED.region,
                    position_type = EXCLUDED.position_type,
                    aircraft_type = EXCLUDED.aircraft_type,
                    aircraft_category = EXCLUDED.aircraft_category,
                    min_total_hours = EXCLUDED.min_total_hours,
                    min_pic_hours = EXCLUDED.min_pic_hours,
                    min_type_hours = EXCLUDED.min_type_hours,
                    license_required = EXCLUDED.license_required,
                    type_rating_required = EXCLUDED.type_rating_required,
                    type_rating_provided = EXCLUDED.type_rating_provided,
                    visa_sponsorship = EXCLUDED.visa_sponsorship,
                    is_entry_level = EXCLUDED.is_entry_level,
                    contract_type = EXCLUDED.contract_type,
                    tags = EXCLUDED.tags,
                    description = EXCLUDED.description,
                    source_target_id = EXCLUDED.source_target_id,
                    is_active = TRUE,
                    scraped_at = EXCLUDED.scraped_at
                "#,
            )
            .bind(url)
            .bind(&job.canonical_key)
            .bind(truncate_chars(&job.title, TITLE_MAX))
            .bind(truncate_chars(&job.company, COMPANY_MAX))
            .bind(truncate_chars(&job.location, LOCATION_MAX))
            .bind(&job.region)
            .bind(job.position_type.as_str())
            .bind(&job.aircraft_type)
            .bind(job.aircraft_category.as_str())
            .bind(job.min_total_hours.map(|h| h as i32))
            .bind(job.min_pic_hours.map(|h| h as i32))
            .bind(job.min_type_hours.map(|h| h as i32))
            .bind(&job.license_required)
            .bind(job.type_rating_required)
            .bind(job.type_rating_provided)
            .bind(job.visa_sponsorship)
            .bind(job.is_entry_level)
            .bind(job.contract_type.as_str())
            .bind(&job.tags)
            .bind(&job.description)
            .bind(job.source_target_id)
            .bind(job.scraped_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            saved += 1;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(saved)
    }

    async fn deactivate_stale(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE pilot_jobs SET is_active = FALSE WHERE is_active AND scraped_at < $1",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
