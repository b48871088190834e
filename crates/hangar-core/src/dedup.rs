use std::collections::HashSet;

use crate::models::NormalizedJob;
use crate::util::{collapse_whitespace, truncate_chars};

/// Characters of location kept in the composite key.
const LOCATION_KEY_LEN: usize = 50;

/// Stable identity for a job.
///
/// The application URL as scraped (case preserved) when present, otherwise
/// `title|company|location` lower-cased and whitespace-normalized with the
/// location cut to 50 characters.
pub fn dedupe_key(job: &NormalizedJob) -> String {
    composite_or_url(
        job.application_url.as_deref(),
        &job.title,
        &job.company,
        &job.location,
    )
}

fn composite_or_url(
    url: Option<&str>,
    title: &str,
    company: &str,
    location: &str,
) -> String {
    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    let norm = |s: &str| collapse_whitespace(s).to_lowercase();
    format!(
        "{}|{}|{}",
        norm(title),
        norm(company),
        truncate_chars(&norm(location), LOCATION_KEY_LEN)
    )
}

/// In-run deduplicator: the first job seen for a key wins.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a job's key is offered.
    pub fn insert(&mut self, job: &NormalizedJob) -> bool {
        self.seen.insert(dedupe_key(job))
    }

    /// Keep the first occurrence of each key, preserving discovery order.
    pub fn dedupe(&mut self, jobs: Vec<NormalizedJob>) -> Vec<NormalizedJob> {
        jobs.into_iter().filter(|job| self.insert(job)).collect()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
