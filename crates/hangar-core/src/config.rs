use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use crate::backoff::BackoffPolicy;
use crate::error::AppError;
use crate::target::TierSchedule;

/// Configuration for the tiered scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Targets per batch.
    pub batch_size: usize,
    /// Targets processed at the same time within a batch.
    pub max_concurrency: usize,
    /// Pause after each target, per concurrency slot.
    pub politeness_delay: Duration,
    /// Pause between batches.
    pub batch_pause: Duration,
    /// Pause when nothing is due.
    pub idle_pause: Duration,
    /// Upper bound on one target's whole extraction.
    pub target_timeout: Duration,
    /// Consecutive failures that move a target to DEGRADED.
    pub failure_threshold: u32,
    pub schedule: TierSchedule,
    /// Backoff for the degraded retry path.
    pub retry: BackoffPolicy,
    /// Jobs unseen for this long are marked inactive.
    pub stale_after: TimeDelta,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_concurrency: 3,
            politeness_delay: Duration::from_secs(10),
            batch_pause: Duration::from_secs(60),
            idle_pause: Duration::from_secs(300),
            target_timeout: Duration::from_secs(120),
            failure_threshold: 5,
            schedule: TierSchedule::default(),
            retry: BackoffPolicy::default(),
            stale_after: TimeDelta::hours(168),
        }
    }
}

impl SchedulerConfig {
    /// Defaults overlaid with environment variables.
    ///
    /// - `HANGAR_BATCH_SIZE`, `HANGAR_MAX_CONCURRENCY`, `HANGAR_FAILURE_THRESHOLD`
    /// - `HANGAR_TIER1_HOURS`, `HANGAR_TIER2_HOURS`, `HANGAR_TIER3_HOURS`
    /// - `HANGAR_TARGET_TIMEOUT_SECS`, `HANGAR_RETRY_ATTEMPTS`
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();
        if let Some(v) = env_positive::<usize>("HANGAR_BATCH_SIZE")? {
            config.batch_size = v;
        }
        if let Some(v) = env_positive::<usize>("HANGAR_MAX_CONCURRENCY")? {
            config.max_concurrency = v;
        }
        if let Some(v) = env_positive::<u32>("HANGAR_FAILURE_THRESHOLD")? {
            config.failure_threshold = v;
        }
        if let Some(v) = env_positive::<i64>("HANGAR_TIER1_HOURS")? {
            config.schedule.tier1 = hours_delta("HANGAR_TIER1_HOURS", v)?;
        }
        if let Some(v) = env_positive::<i64>("HANGAR_TIER2_HOURS")? {
            config.schedule.tier2 = hours_delta("HANGAR_TIER2_HOURS", v)?;
        }
        if let Some(v) = env_positive::<i64>("HANGAR_TIER3_HOURS")? {
            config.schedule.tier3 = hours_delta("HANGAR_TIER3_HOURS", v)?;
        }
        if let Some(v) = env_positive::<u64>("HANGAR_TARGET_TIMEOUT_SECS")? {
            config.target_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_positive::<u32>("HANGAR_RETRY_ATTEMPTS")? {
            config.retry.max_attempts = v;
        }
        Ok(config)
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Set politeness, between-batch and idle pauses at once.
    pub fn with_pauses(mut self, politeness: Duration, batch: Duration, idle: Duration) -> Self {
        self.politeness_delay = politeness;
        self.batch_pause = batch;
        self.idle_pause = idle;
        self
    }

    pub fn with_target_timeout(mut self, timeout: Duration) -> Self {
        self.target_timeout = timeout;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_schedule(mut self, schedule: TierSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_retry(mut self, retry: BackoffPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn env_positive<T>(name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(Some(v)),
        _ => Err(AppError::ConfigError(format!(
            "Invalid {name} '{raw}': must be a positive integer"
        ))),
    }
}

fn hours_delta(name: &str, hours: i64) -> Result<TimeDelta, AppError> {
    TimeDelta::try_hours(hours)
        .ok_or_else(|| AppError::ConfigError(format!("Invalid {name} '{hours}': too large")))
}
