//! Tiered due-scheduler.
//!
//! A single control loop selects a batch of due targets, processes them with
//! bounded concurrency, records a [`ScrapeRun`] per target and writes the
//! target's new state back to the registry. Per-target failures are contained:
//! they become failed runs and failure counts, never loop errors.

use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ats::{self, StrategyId};
use crate::config::SchedulerConfig;
use crate::error::AppError;
use crate::harvest::HarvestService;
use crate::models::{RunStatus, ScrapeRun};
use crate::target::{MAX_ERROR_LEN, Target, TargetStatus, TargetUpdate, Tier};
use crate::traits::{ExtractionStrategy, JobStore, RunLog, TargetRegistry, TextClassifier};
use crate::util::truncate_chars;

/// Upper bound on degraded targets inspected per retry selection.
const RETRY_SCAN_LIMIT: usize = 1_000;

/// Events emitted by the scheduler for monitoring/logging.
#[derive(Debug, Clone)]
pub enum SchedulerEvent<'a> {
    Started,
    BatchSelected {
        size: usize,
    },
    Idle,
    TargetStarted {
        target: &'a Target,
        strategy: StrategyId,
    },
    TargetSucceeded {
        target_id: Uuid,
        postings_found: u32,
        jobs_saved: u32,
    },
    TargetFailed {
        target_id: Uuid,
        error: &'a str,
        degraded: bool,
        /// Whether the failure looks transient (network, timeout, 5xx, 429).
        retryable: bool,
    },
    BatchCompleted {
        succeeded: usize,
        failed: usize,
    },
    StaleJobsDeactivated {
        count: u64,
    },
    ShuttingDown,
    Stopped,
}

/// Trait for receiving scheduler events (decoupled logging).
pub trait SchedulerReporter: Send + Sync {
    fn report(&self, event: SchedulerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSchedulerReporter;

impl SchedulerReporter for TracingSchedulerReporter {
    fn report(&self, event: SchedulerEvent<'_>) {
        match event {
            SchedulerEvent::Started => tracing::info!("Scheduler started"),
            SchedulerEvent::BatchSelected { size } => {
                tracing::info!(%size, "Batch selected");
            }
            SchedulerEvent::Idle => tracing::debug!("No targets due"),
            SchedulerEvent::TargetStarted { target, strategy } => {
                tracing::info!(target_id = %target.id, name = %target.name, %strategy, "Processing target");
            }
            SchedulerEvent::TargetSucceeded {
                target_id,
                postings_found,
                jobs_saved,
            } => {
                tracing::info!(%target_id, %postings_found, %jobs_saved, "Target succeeded");
            }
            SchedulerEvent::TargetFailed {
                target_id,
                error,
                degraded,
                retryable,
            } => {
                tracing::warn!(%target_id, %error, %degraded, %retryable, "Target failed");
            }
            SchedulerEvent::BatchCompleted { succeeded, failed } => {
                tracing::info!(%succeeded, %failed, "Batch completed");
            }
            SchedulerEvent::StaleJobsDeactivated { count } => {
                tracing::info!(%count, "Stale jobs deactivated");
            }
            SchedulerEvent::ShuttingDown => tracing::info!("Scheduler shutting down"),
            SchedulerEvent::Stopped => tracing::info!("Scheduler stopped"),
        }
    }
}

/// Scheduler over a target registry, a harvest pipeline and a run log.
pub struct Scheduler<R, S, C, J, L>
where
    R: TargetRegistry,
    S: ExtractionStrategy,
    C: TextClassifier,
    J: JobStore,
    L: RunLog,
{
    registry: R,
    harvest: HarvestService<S, C, J>,
    runs: L,
    config: SchedulerConfig,
}

impl<R, S, C, J, L> Scheduler<R, S, C, J, L>
where
    R: TargetRegistry,
    S: ExtractionStrategy,
    C: TextClassifier,
    J: JobStore,
    L: RunLog,
{
    pub fn new(
        registry: R,
        harvest: HarvestService<S, C, J>,
        runs: L,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            harvest,
            runs,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Due targets across all tiers, oldest check first (never-checked first),
    /// truncated to the batch size.
    pub async fn select_batch(&self) -> Result<Vec<Target>, AppError> {
        let now = Utc::now();
        let mut batch = Vec::new();
        for tier in Tier::ALL {
            let cutoff = self.config.schedule.due_cutoff(tier, now);
            let due = self
                .registry
                .list_due(tier, cutoff, self.config.batch_size)
                .await?;
            batch.extend(
                due.into_iter()
                    .filter(|t| t.is_due(now, &self.config.schedule)),
            );
        }
        batch.sort_by_key(|t| t.last_checked_at);
        batch.truncate(self.config.batch_size);
        Ok(batch)
    }

    /// Degraded targets eligible for another attempt under the backoff policy.
    pub async fn select_retry_batch(&self) -> Result<Vec<Target>, AppError> {
        let now = Utc::now();
        let threshold = self.config.failure_threshold;
        let policy = self.config.retry;
        let max_failures = threshold.saturating_add(policy.max_attempts);

        // Backoff readiness is per target: filter before cutting to batch size.
        let candidates = self
            .registry
            .list_degraded(max_failures, RETRY_SCAN_LIMIT)
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|t| t.status == TargetStatus::Degraded)
            .filter(|t| {
                let attempts_made = t.consecutive_failures.saturating_sub(threshold);
                policy.allows(attempts_made)
                    && policy.is_ready(attempts_made + 1, t.last_checked_at, now)
            })
            .take(self.config.batch_size)
            .collect())
    }

    /// Run the scheduler loop until cancellation.
    pub async fn run<SR: SchedulerReporter>(
        &self,
        cancel_token: CancellationToken,
        reporter: &SR,
    ) -> Result<(), AppError> {
        reporter.report(SchedulerEvent::Started);

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let pause = match self.select_batch().await {
                Ok(batch) if batch.is_empty() => {
                    reporter.report(SchedulerEvent::Idle);
                    self.deactivate_stale(reporter).await;
                    self.config.idle_pause
                }
                Ok(batch) => {
                    self.run_batch(batch, &cancel_token, reporter).await;
                    self.config.batch_pause
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to select batch");
                    self.config.batch_pause
                }
            };

            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = cancel_token.cancelled() => break,
            }
        }

        reporter.report(SchedulerEvent::ShuttingDown);
        reporter.report(SchedulerEvent::Stopped);
        Ok(())
    }

    /// Select and process a single batch.
    pub async fn run_once<SR: SchedulerReporter>(
        &self,
        cancel_token: &CancellationToken,
        reporter: &SR,
    ) -> Result<Vec<ScrapeRun>, AppError> {
        let batch = self.select_batch().await?;
        if batch.is_empty() {
            reporter.report(SchedulerEvent::Idle);
            return Ok(Vec::new());
        }
        Ok(self.run_batch(batch, cancel_token, reporter).await)
    }

    /// Reprocess degraded targets whose backoff has elapsed.
    pub async fn retry_degraded<SR: SchedulerReporter>(
        &self,
        cancel_token: &CancellationToken,
        reporter: &SR,
    ) -> Result<Vec<ScrapeRun>, AppError> {
        let batch = self.select_retry_batch().await?;
        if batch.is_empty() {
            reporter.report(SchedulerEvent::Idle);
            return Ok(Vec::new());
        }
        Ok(self.run_batch(batch, cancel_token, reporter).await)
    }

    /// Process targets with at most `max_concurrency` in flight.
    ///
    /// Cancellation is checked before each target starts; a target already in
    /// progress always completes and records its run.
    pub async fn run_batch<SR: SchedulerReporter>(
        &self,
        targets: Vec<Target>,
        cancel_token: &CancellationToken,
        reporter: &SR,
    ) -> Vec<ScrapeRun> {
        reporter.report(SchedulerEvent::BatchSelected {
            size: targets.len(),
        });

        let runs: Vec<ScrapeRun> = futures::stream::iter(targets)
            .map(move |target| async move {
                if cancel_token.is_cancelled() {
                    return None;
                }
                let run = self.process_target(&target, reporter).await;
                tokio::select! {
                    () = tokio::time::sleep(self.config.politeness_delay) => {}
                    () = cancel_token.cancelled() => {}
                }
                Some(run)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .filter_map(|run| async move { run })
            .collect()
            .await;

        let succeeded = runs
            .iter()
            .filter(|r| r.status == RunStatus::Success)
            .count();
        reporter.report(SchedulerEvent::BatchCompleted {
            succeeded,
            failed: runs.len() - succeeded,
        });
        runs
    }

    /// Harvest one target, then record the run and the target's new state.
    pub async fn process_target<SR: SchedulerReporter>(
        &self,
        target: &Target,
        reporter: &SR,
    ) -> ScrapeRun {
        let strategy = ats::resolve(&target.url, target.category_hint.as_deref());
        reporter.report(SchedulerEvent::TargetStarted { target, strategy });

        let started = Instant::now();
        let timeout = self.config.target_timeout;
        let result = match tokio::time::timeout(timeout, self.harvest.harvest(target)).await {
            Ok(inner) => inner,
            Err(_) => Err(AppError::Timeout(timeout.as_secs())),
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();

        let (run, update) = match result {
            Ok(harvest) => {
                reporter.report(SchedulerEvent::TargetSucceeded {
                    target_id: target.id,
                    postings_found: harvest.postings_found,
                    jobs_saved: harvest.jobs_saved,
                });
                let run = ScrapeRun {
                    id: Uuid::new_v4(),
                    target_id: target.id,
                    target_name: target.name.clone(),
                    detected_strategy: harvest.strategy,
                    status: RunStatus::Success,
                    postings_found: harvest.postings_found,
                    jobs_saved: harvest.jobs_saved,
                    rejected: harvest.rejected,
                    duration_ms,
                    error: None,
                    completed_at: now,
                };
                (run, TargetUpdate::success(target, now, harvest.jobs_saved))
            }
            Err(e) => {
                let error = truncate_chars(&e.to_string(), MAX_ERROR_LEN);
                let update =
                    TargetUpdate::failure(target, now, &error, self.config.failure_threshold);
                reporter.report(SchedulerEvent::TargetFailed {
                    target_id: target.id,
                    error: &error,
                    degraded: update.status == TargetStatus::Degraded,
                    retryable: e.is_retryable(),
                });
                let run = ScrapeRun {
                    id: Uuid::new_v4(),
                    target_id: target.id,
                    target_name: target.name.clone(),
                    detected_strategy: strategy,
                    status: RunStatus::Failed,
                    postings_found: 0,
                    jobs_saved: 0,
                    rejected: 0,
                    duration_ms,
                    error: Some(error),
                    completed_at: now,
                };
                (run, update)
            }
        };

        if let Err(e) = self.registry.update_after_run(target.id, &update).await {
            tracing::error!(target_id = %target.id, error = %e, "Failed to update target state");
        }
        if let Err(e) = self.runs.record(&run).await {
            tracing::error!(target_id = %target.id, error = %e, "Failed to record scrape run");
        }
        run
    }

    async fn deactivate_stale<SR: SchedulerReporter>(&self, reporter: &SR) {
        let cutoff = Utc::now() - self.config.stale_after;
        match self.harvest.deactivate_stale(cutoff).await {
            Ok(0) => {}
            Ok(count) => reporter.report(SchedulerEvent::StaleJobsDeactivated { count }),
            Err(e) => tracing::error!(error = %e, "Failed to deactivate stale jobs"),
        }
    }
}
