use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hangar_core::models::{QueueStats, ScrapeRun};
use hangar_core::target::Target;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    pub total_targets: u64,
    /// Active targets whose tier frequency has elapsed
    pub due_targets: u64,
    /// Target count keyed by tier number
    pub by_tier: BTreeMap<String, u64>,
    /// Target count keyed by status
    pub by_status: BTreeMap<String, u64>,
    pub active_jobs: u64,
}

impl StatsResponse {
    pub fn new(stats: QueueStats, active_jobs: u64) -> Self {
        Self {
            total_targets: stats.total,
            due_targets: stats.due,
            by_tier: stats
                .by_tier
                .into_iter()
                .map(|(tier, count)| (tier.to_string(), count))
                .collect(),
            by_status: stats.by_status,
            active_jobs,
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListTargetsQuery {
    /// active, degraded or disabled
    pub status: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TargetResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub category_hint: Option<String>,
    pub tier: u8,
    pub region: Option<String>,
    pub status: String,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub jobs_found_last_run: u32,
    pub total_jobs_found: u64,
}

impl From<Target> for TargetResponse {
    fn from(t: Target) -> Self {
        Self {
            id: t.id,
            name: t.name,
            url: t.url,
            category_hint: t.category_hint,
            tier: t.tier.number(),
            region: t.region,
            status: t.status.to_string(),
            last_checked_at: t.last_checked_at,
            last_success_at: t.last_success_at,
            consecutive_failures: t.consecutive_failures,
            last_error: t.last_error,
            jobs_found_last_run: t.jobs_found_last_run,
            total_jobs_found: t.total_jobs_found,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TargetListResponse {
    pub targets: Vec<TargetResponse>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListRunsQuery {
    /// Maximum number of runs (default 20, max 100)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunResponse {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub detected_strategy: String,
    pub status: String,
    pub postings_found: u32,
    pub jobs_saved: u32,
    pub rejected: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl From<ScrapeRun> for RunResponse {
    fn from(run: ScrapeRun) -> Self {
        Self {
            id: run.id,
            target_id: run.target_id,
            target_name: run.target_name,
            detected_strategy: run.detected_strategy.to_string(),
            status: run.status.as_str().to_string(),
            postings_found: run.postings_found,
            jobs_saved: run.jobs_saved,
            rejected: run.rejected,
            duration_ms: run.duration_ms,
            error: run.error,
            completed_at: run.completed_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunListResponse {
    pub runs: Vec<RunResponse>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
