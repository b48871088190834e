//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ats::StrategyId;
use crate::error::AppError;
use crate::models::{
    AircraftCategory, ClassifierVerdict, ContractType, NormalizedJob, PositionType, QueueStats,
    RawPosting, ScrapeRun,
};
use crate::scheduler::{SchedulerEvent, SchedulerReporter};
use crate::target::{Target, TargetStatus, TargetUpdate, Tier, TierSchedule};
use crate::traits::{
    ExtractionStrategy, JobStore, PageFetcher, RunLog, TargetRegistry, TextClassifier,
    TextCleaner,
};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A minimal accepted job.
pub fn make_job(title: &str, url: Option<&str>) -> NormalizedJob {
    NormalizedJob {
        canonical_key: url.unwrap_or(title).to_string(),
        title: title.to_string(),
        company: "Example Air".to_string(),
        location: "Dubai, UAE".to_string(),
        region: "middle_east".to_string(),
        position_type: PositionType::Captain,
        aircraft_type: None,
        aircraft_category: AircraftCategory::Unknown,
        min_total_hours: None,
        min_pic_hours: None,
        min_type_hours: None,
        license_required: "ATPL/CPL".to_string(),
        type_rating_required: false,
        type_rating_provided: false,
        visa_sponsorship: false,
        is_entry_level: false,
        contract_type: ContractType::Permanent,
        tags: Vec::new(),
        description: None,
        application_url: url.map(str::to_string),
        source_target_id: Uuid::nil(),
        is_active: true,
        scraped_at: Utc::now(),
    }
}

pub fn make_raw(target_id: Uuid, title: &str, url: &str) -> RawPosting {
    RawPosting::new(target_id, title, url)
}

/// An active, never-checked target with a URL derived from its name.
pub fn make_target(name: &str, tier: Tier) -> Target {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    Target::new(name, format!("https://careers.{slug}.example/jobs"), tier)
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Fetcher serving canned pages by URL; unknown URLs answer HTTP 404.
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    pages: Arc<Mutex<HashMap<String, String>>>,
    errors: Arc<Mutex<HashMap<String, AppError>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
        self
    }

    /// The next fetch of `url` fails with `error`.
    pub fn with_error(self, url: &str, error: AppError) -> Self {
        self.errors.lock().unwrap().insert(url.to_string(), error);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(e) = self.errors.lock().unwrap().remove(url) {
            return Err(e);
        }
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::HttpError(format!("HTTP 404 Not Found for {url}")))
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Cleaner that strips tags crudely, enough for assertions on text.
#[derive(Clone, Default)]
pub struct MockCleaner;

impl TextCleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let mut out = String::with_capacity(html.len());
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => {
                    in_tag = false;
                    out.push(' ');
                }
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        Ok(crate::util::collapse_whitespace(&out))
    }
}

// ---------------------------------------------------------------------------
// MockStrategy
// ---------------------------------------------------------------------------

type StrategyResult = Result<Vec<RawPosting>, AppError>;

/// Extraction strategy returning queued results per target.
///
/// Each call pops the target's next result; an empty queue yields no postings.
#[derive(Clone, Default)]
pub struct MockStrategy {
    results: Arc<Mutex<HashMap<Uuid, Vec<StrategyResult>>>>,
    calls: Arc<Mutex<Vec<(Uuid, StrategyId)>>>,
    delay: Arc<Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_postings(self, target_id: Uuid, postings: Vec<RawPosting>) -> Self {
        self.push_postings(target_id, postings);
        self
    }

    pub fn with_error(self, target_id: Uuid, error: AppError) -> Self {
        self.push_error(target_id, error);
        self
    }

    pub fn push_postings(&self, target_id: Uuid, postings: Vec<RawPosting>) {
        self.push(target_id, Ok(postings));
    }

    pub fn push_error(&self, target_id: Uuid, error: AppError) {
        self.push(target_id, Err(error));
    }

    /// Every fetch sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<(Uuid, StrategyId)> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, target_id: Uuid, result: StrategyResult) {
        self.results
            .lock()
            .unwrap()
            .entry(target_id)
            .or_default()
            .push(result);
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ExtractionStrategy for MockStrategy {
    async fn fetch(&self, strategy: StrategyId, target: &Target) -> StrategyResult {
        self.calls.lock().unwrap().push((target.id, strategy));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let next = {
            let mut results = self.results.lock().unwrap();
            results
                .get_mut(&target.id)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0))
        };
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Classifier returning a fixed verdict and recording the texts it saw.
#[derive(Clone)]
pub struct MockClassifier {
    verdict: ClassifierVerdict,
    error: Arc<Mutex<Option<AppError>>>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl MockClassifier {
    pub fn new(verdict: ClassifierVerdict) -> Self {
        Self {
            verdict,
            error: Arc::new(Mutex::new(None)),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The first call fails with `error`; later calls accept with no fields.
    pub fn with_error(error: AppError) -> Self {
        Self {
            verdict: ClassifierVerdict {
                is_valid_job: true,
                ..ClassifierVerdict::default()
            },
            error: Arc::new(Mutex::new(Some(error))),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl TextClassifier for MockClassifier {
    async fn classify(
        &self,
        text: &str,
        _url: &str,
        _context_label: &str,
    ) -> Result<ClassifierVerdict, AppError> {
        self.texts.lock().unwrap().push(text.to_string());
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.verdict.clone())
    }
}

// ---------------------------------------------------------------------------
// MockJobStore
// ---------------------------------------------------------------------------

/// Job store recording upserts; jobs without an application URL are skipped.
#[derive(Clone, Default)]
pub struct MockJobStore {
    saved: Arc<Mutex<Vec<NormalizedJob>>>,
    upsert_calls: Arc<AtomicUsize>,
    error: Arc<Mutex<Option<AppError>>>,
    stale_count: Arc<Mutex<u64>>,
    stale_calls: Arc<AtomicUsize>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next upsert fails with `error`.
    pub fn with_error(error: AppError) -> Self {
        let store = Self::default();
        *store.error.lock().unwrap() = Some(error);
        store
    }

    /// Count returned by `deactivate_stale`.
    pub fn set_stale_count(&self, count: u64) {
        *self.stale_count.lock().unwrap() = count;
    }

    pub fn saved(&self) -> Vec<NormalizedJob> {
        self.saved.lock().unwrap().clone()
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn stale_calls(&self) -> usize {
        self.stale_calls.load(Ordering::SeqCst)
    }
}

impl JobStore for MockJobStore {
    async fn upsert(&self, jobs: &[NormalizedJob]) -> Result<usize, AppError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        let mut saved = self.saved.lock().unwrap();
        let before = saved.len();
        saved.extend(
            jobs.iter()
                .filter(|j| j.application_url.as_deref().is_some_and(|u| !u.trim().is_empty()))
                .cloned(),
        );
        Ok(saved.len() - before)
    }

    async fn deactivate_stale(&self, _older_than: DateTime<Utc>) -> Result<u64, AppError> {
        self.stale_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.stale_count.lock().unwrap())
    }
}

// ---------------------------------------------------------------------------
// InMemoryRegistry
// ---------------------------------------------------------------------------

/// Target registry over a Vec, with the same selection rules as the database.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    targets: Arc<Mutex<Vec<Target>>>,
    updates: Arc<Mutex<Vec<(Uuid, TargetUpdate)>>>,
}

impl InMemoryRegistry {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets: Arc::new(Mutex::new(targets)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Target> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn updates(&self) -> Vec<(Uuid, TargetUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    fn select<F>(&self, limit: usize, pred: F) -> Vec<Target>
    where
        F: Fn(&Target) -> bool,
    {
        let mut selected: Vec<Target> = self
            .targets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| pred(t))
            .cloned()
            .collect();
        selected.sort_by_key(|t| t.last_checked_at);
        selected.truncate(limit);
        selected
    }
}

impl TargetRegistry for InMemoryRegistry {
    async fn list_due(
        &self,
        tier: Tier,
        checked_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Target>, AppError> {
        Ok(self.select(limit, |t| {
            t.status == TargetStatus::Active
                && t.tier == tier
                && t.last_checked_at.is_none_or(|at| at <= checked_before)
        }))
    }

    async fn list_degraded(&self, max_failures: u32, limit: usize) -> Result<Vec<Target>, AppError> {
        Ok(self.select(limit, |t| {
            t.status == TargetStatus::Degraded && t.consecutive_failures < max_failures
        }))
    }

    async fn update_after_run(&self, target_id: Uuid, update: &TargetUpdate) -> Result<(), AppError> {
        let mut targets = self.targets.lock().unwrap();
        let target = targets
            .iter_mut()
            .find(|t| t.id == target_id)
            .ok_or_else(|| AppError::Generic(format!("Target {target_id} not found")))?;
        target.apply(update);
        self.updates
            .lock()
            .unwrap()
            .push((target_id, update.clone()));
        Ok(())
    }

    async fn list_targets(&self, status: Option<TargetStatus>) -> Result<Vec<Target>, AppError> {
        Ok(self
            .targets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect())
    }

    async fn queue_stats(
        &self,
        now: DateTime<Utc>,
        schedule: &TierSchedule,
    ) -> Result<QueueStats, AppError> {
        let targets = self.targets.lock().unwrap();
        let mut stats = QueueStats::default();
        for t in targets.iter() {
            stats.total += 1;
            if t.is_due(now, schedule) {
                stats.due += 1;
            }
            *stats.by_tier.entry(t.tier.number()).or_default() += 1;
            *stats
                .by_status
                .entry(t.status.as_str().to_string())
                .or_default() += 1;
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// MockRunLog
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockRunLog {
    runs: Arc<Mutex<Vec<ScrapeRun>>>,
}

impl MockRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<ScrapeRun> {
        self.runs.lock().unwrap().clone()
    }
}

impl RunLog for MockRunLog {
    async fn record(&self, run: &ScrapeRun) -> Result<(), AppError> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ScrapeRun>, AppError> {
        let runs = self.runs.lock().unwrap();
        Ok(runs.iter().rev().take(limit).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Reporter recording a short tag per event.
#[derive(Clone, Default)]
pub struct MockReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl SchedulerReporter for MockReporter {
    fn report(&self, event: SchedulerEvent<'_>) {
        let tag = match event {
            SchedulerEvent::Started => "started".to_string(),
            SchedulerEvent::BatchSelected { size } => format!("batch_selected {size}"),
            SchedulerEvent::Idle => "idle".to_string(),
            SchedulerEvent::TargetStarted { target, .. } => {
                format!("target_started {}", target.name)
            }
            SchedulerEvent::TargetSucceeded { jobs_saved, .. } => {
                format!("target_succeeded {jobs_saved}")
            }
            SchedulerEvent::TargetFailed {
                degraded,
                retryable,
                ..
            } => format!("target_failed degraded={degraded} retryable={retryable}"),
            SchedulerEvent::BatchCompleted { succeeded, failed } => {
                format!("batch_completed {succeeded}/{failed}")
            }
            SchedulerEvent::StaleJobsDeactivated { count } => format!("stale_deactivated {count}"),
            SchedulerEvent::ShuttingDown => "shutting_down".to_string(),
            SchedulerEvent::Stopped => "stopped".to_string(),
        };
        self.events.lock().unwrap().push(tag);
    }
}
