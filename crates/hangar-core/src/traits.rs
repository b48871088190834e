use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ats::StrategyId;
use crate::error::AppError;
use crate::models::{ClassifierVerdict, NormalizedJob, QueueStats, RawPosting, ScrapeRun};
use crate::target::{Target, TargetStatus, TargetUpdate, Tier, TierSchedule};

/// Fetches raw HTML content from a URL.
pub trait PageFetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into readable text.
pub trait TextCleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Produces candidate postings for a target.
///
/// Implementations receive the strategy already resolved by the ATS
/// classifier and may raise any fetch error; the scheduler treats every
/// implementation uniformly.
pub trait ExtractionStrategy: Send + Sync + Clone {
    fn fetch(
        &self,
        strategy: StrategyId,
        target: &Target,
    ) -> impl Future<Output = Result<Vec<RawPosting>, AppError>> + Send;
}

/// Optional text-understanding backend for the normalization pipeline.
pub trait TextClassifier: Send + Sync + Clone {
    /// Classify posting text. `context_label` names the source (usually the company).
    fn classify(
        &self,
        text: &str,
        url: &str,
        context_label: &str,
    ) -> impl Future<Output = Result<ClassifierVerdict, AppError>> + Send;
}

/// A classifier that accepts everything and contributes no fields,
/// leaving the rule-based backend in charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClassifier;

impl TextClassifier for NullClassifier {
    async fn classify(
        &self,
        _text: &str,
        _url: &str,
        _context_label: &str,
    ) -> Result<ClassifierVerdict, AppError> {
        Ok(ClassifierVerdict {
            is_valid_job: true,
            ..ClassifierVerdict::default()
        })
    }
}

/// Durable sink for normalized jobs, idempotent on application URL.
pub trait JobStore: Send + Sync + Clone {
    /// Insert or update jobs. Returns how many were saved; jobs without an
    /// application URL are skipped.
    fn upsert(&self, jobs: &[NormalizedJob])
    -> impl Future<Output = Result<usize, AppError>> + Send;

    /// Mark jobs not seen since `older_than` as inactive. Returns the count.
    fn deactivate_stale(
        &self,
        older_than: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Source of scrape targets and sink for their post-run state.
pub trait TargetRegistry: Send + Sync + Clone {
    /// Active targets of `tier` never checked or last checked at or before
    /// `checked_before`, oldest first, at most `limit`.
    fn list_due(
        &self,
        tier: Tier,
        checked_before: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Target>, AppError>> + Send;

    /// Degraded targets with fewer than `max_failures` consecutive failures,
    /// oldest check first, at most `limit`.
    fn list_degraded(
        &self,
        max_failures: u32,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Target>, AppError>> + Send;

    fn update_after_run(
        &self,
        target_id: Uuid,
        update: &TargetUpdate,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn list_targets(
        &self,
        status: Option<TargetStatus>,
    ) -> impl Future<Output = Result<Vec<Target>, AppError>> + Send;

    fn queue_stats(
        &self,
        now: DateTime<Utc>,
        schedule: &TierSchedule,
    ) -> impl Future<Output = Result<QueueStats, AppError>> + Send;
}

/// Append-only audit log of target runs.
pub trait RunLog: Send + Sync + Clone {
    fn record(&self, run: &ScrapeRun) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Most recent runs, newest first.
    fn recent(&self, limit: usize) -> impl Future<Output = Result<Vec<ScrapeRun>, AppError>> + Send;
}
