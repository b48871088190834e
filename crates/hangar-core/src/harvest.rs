use chrono::{DateTime, Utc};

use crate::ats::{self, StrategyId};
use crate::dedup::Deduplicator;
use crate::error::AppError;
use crate::filter::is_candidate;
use crate::models::{NormalizedJob, RawPosting};
use crate::normalize::{Normalizer, Outcome, Rejection};
use crate::target::Target;
use crate::traits::{ExtractionStrategy, JobStore, TextClassifier};

/// Result of harvesting one target.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestResult {
    pub strategy: StrategyId,
    pub postings_found: u32,
    pub rejected: u32,
    pub jobs_saved: u32,
}

/// Orchestrates one target: classify → fetch → filter → normalize → dedupe → upsert.
///
/// Generic over every external dependency so tests run without HTTP or a database.
#[derive(Clone)]
pub struct HarvestService<S, C, J>
where
    S: ExtractionStrategy,
    C: TextClassifier,
    J: JobStore,
{
    strategy: S,
    normalizer: Normalizer<C>,
    store: J,
}

impl<S, C, J> HarvestService<S, C, J>
where
    S: ExtractionStrategy,
    C: TextClassifier,
    J: JobStore,
{
    pub fn new(strategy: S, normalizer: Normalizer<C>, store: J) -> Self {
        Self {
            strategy,
            normalizer,
            store,
        }
    }

    /// Harvest a target. Fetch and store errors propagate; rejected postings
    /// are counted, never raised.
    pub async fn harvest(&self, target: &Target) -> Result<HarvestResult, AppError> {
        let strategy = ats::resolve(&target.url, target.category_hint.as_deref());
        tracing::debug!(target_id = %target.id, %strategy, url = %target.url, "Fetching postings");

        let postings = self.strategy.fetch(strategy, target).await?;
        let postings_found = postings.len() as u32;

        let (jobs, rejected) = self.normalize_all(&postings, target).await;
        let saved = if jobs.is_empty() {
            0
        } else {
            self.store.upsert(&jobs).await?
        };

        tracing::info!(
            target_id = %target.id,
            %strategy,
            postings = postings_found,
            rejected,
            saved,
            "Harvest complete"
        );

        Ok(HarvestResult {
            strategy,
            postings_found,
            rejected,
            jobs_saved: saved as u32,
        })
    }

    /// Mark jobs not seen since `older_than` inactive.
    pub async fn deactivate_stale(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        self.store.deactivate_stale(older_than).await
    }

    /// Filter, normalize and dedupe postings in discovery order.
    pub async fn normalize_all(
        &self,
        postings: &[RawPosting],
        target: &Target,
    ) -> (Vec<NormalizedJob>, u32) {
        let mut dedup = Deduplicator::new();
        let mut jobs = Vec::new();
        let mut rejected = 0u32;

        for raw in postings {
            let outcome = if is_candidate(&raw.title_text, &raw.anchor_url) {
                self.normalizer
                    .normalize(raw, &target.name, target.region.as_deref())
                    .await
            } else {
                Outcome::Rejected(Rejection::NotCandidate)
            };

            match outcome {
                Outcome::Accepted(job) => {
                    if dedup.insert(&job) {
                        jobs.push(*job);
                    } else {
                        tracing::debug!(key = %job.canonical_key, "Duplicate posting skipped");
                    }
                }
                Outcome::Rejected(reason) => {
                    rejected += 1;
                    tracing::debug!(title = %raw.title_text, %reason, "Posting rejected");
                }
            }
        }

        (jobs, rejected)
    }
}
