//! Normalization pipeline: RawPosting → NormalizedJob, or a typed rejection.
//!
//! Two backends fill the same [`NormalizedJob`]. The rule-based backend
//! always runs. The text classifier runs alongside it; its validity flag is
//! authoritative and any field it returns overrides the rule-based value.
//! A classifier failure degrades that posting to rule-based fields only.

use std::fmt;

use crate::aircraft::{category_for, find_aircraft, normalize_aircraft};
use crate::dedup::dedupe_key;
use crate::hours::{
    PIC_HOURS_RANGE, TOTAL_HOURS_RANGE, extract_pic_hours, extract_total_hours,
    extract_type_hours,
};
use crate::models::{AircraftCategory, ClassifierVerdict, NormalizedJob, RawPosting};
use crate::rules;
use crate::traits::{NullClassifier, TextClassifier};
use crate::util::{collapse_whitespace, matchable_text, truncate_chars};

/// Longest text handed to the classifier.
pub const CLASSIFIER_TEXT_LIMIT: usize = 4_000;
/// Longest description kept on a job.
pub const DESCRIPTION_LIMIT: usize = 500;
/// Total time below which a posting counts as entry level.
pub const ENTRY_LEVEL_HOURS: u32 = 500;

/// Why a posting was filtered out. Rejection is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Failed the allow/deny keyword screen.
    NotCandidate,
    /// The text classifier said this is not a job posting.
    ClassifierInvalid,
    /// The resulting title looks like a site page (FAQ, login, policy).
    JunkTitle,
    EmptyTitle,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::NotCandidate => "not a pilot posting",
            Rejection::ClassifierInvalid => "rejected by classifier",
            Rejection::JunkTitle => "junk title",
            Rejection::EmptyTitle => "empty title",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Box<NormalizedJob>),
    Rejected(Rejection),
}

impl Outcome {
    pub fn accepted(self) -> Option<NormalizedJob> {
        match self {
            Outcome::Accepted(job) => Some(*job),
            Outcome::Rejected(_) => None,
        }
    }
}

/// Turns raw postings into normalized jobs.
#[derive(Debug, Clone)]
pub struct Normalizer<C = NullClassifier> {
    classifier: C,
}

impl Default for Normalizer<NullClassifier> {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl Normalizer<NullClassifier> {
    pub fn rule_based() -> Self {
        Self {
            classifier: NullClassifier,
        }
    }
}

impl<C: TextClassifier> Normalizer<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    pub async fn normalize(
        &self,
        raw: &RawPosting,
        company: &str,
        region_hint: Option<&str>,
    ) -> Outcome {
        let raw_title = collapse_whitespace(&raw.title_text);
        if raw_title.is_empty() {
            return Outcome::Rejected(Rejection::EmptyTitle);
        }

        let full_text = [
            Some(raw_title.as_str()),
            raw.location_text.as_deref(),
            raw.body_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");

        let verdict = match self
            .classifier
            .classify(
                &truncate_chars(&full_text, CLASSIFIER_TEXT_LIMIT),
                &raw.anchor_url,
                company,
            )
            .await
        {
            Ok(verdict) if !verdict.is_valid_job => {
                return Outcome::Rejected(Rejection::ClassifierInvalid);
            }
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(url = %raw.anchor_url, error = %e, "Classifier failed, using rules only");
                ClassifierVerdict {
                    is_valid_job: true,
                    ..ClassifierVerdict::default()
                }
            }
        };

        let job = build_job(raw, &raw_title, &full_text, company, region_hint, verdict);

        if rules::is_junk_title(&job.title) {
            return Outcome::Rejected(Rejection::JunkTitle);
        }
        Outcome::Accepted(Box::new(job))
    }
}

fn in_range(value: u32, (min, max): (u32, u32)) -> Option<u32> {
    (min..=max).contains(&value).then_some(value)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
}

/// Rule-based extraction merged with the classifier verdict (verdict wins).
fn build_job(
    raw: &RawPosting,
    raw_title: &str,
    full_text: &str,
    company: &str,
    region_hint: Option<&str>,
    verdict: ClassifierVerdict,
) -> NormalizedJob {
    let text = matchable_text(full_text);

    let title = rules::clean_title(
        &non_empty(verdict.title).unwrap_or_else(|| raw_title.to_string()),
    );
    let title_text = matchable_text(&title);

    let position_type = verdict
        .position_type
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(|| rules::position_type(&title_text));

    let location = rules::clean_location(
        &non_empty(verdict.location)
            .or_else(|| raw.location_text.clone())
            .unwrap_or_default(),
    );
    let region = rules::infer_region(&location, region_hint);

    // Classifier aircraft count only when they resolve to a known type.
    let aircraft_type = verdict
        .aircraft
        .iter()
        .find_map(|a| normalize_aircraft(a))
        .or_else(|| find_aircraft(raw_title))
        .or_else(|| raw.body_text.as_deref().and_then(find_aircraft));
    let aircraft_category = aircraft_type
        .map(category_for)
        .unwrap_or(AircraftCategory::Unknown);

    let min_total_hours = verdict
        .min_total_hours
        .and_then(|h| in_range(h, TOTAL_HOURS_RANGE))
        .or_else(|| extract_total_hours(full_text));
    let min_pic_hours = verdict
        .min_pic_hours
        .and_then(|h| in_range(h, PIC_HOURS_RANGE))
        .or_else(|| extract_pic_hours(full_text));
    let min_type_hours = extract_type_hours(full_text);

    let type_rating_required = verdict
        .type_rating_required
        .unwrap_or_else(|| rules::type_rating_required(&text));
    let type_rating_provided = verdict
        .type_rating_provided
        .unwrap_or_else(|| rules::type_rating_provided(&text));
    let visa_sponsorship = verdict
        .visa_sponsored
        .unwrap_or_else(|| rules::visa_sponsorship(&text));
    let contract_type = verdict
        .contract_type
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or_else(|| rules::contract_type(&text));

    let is_entry_level = verdict.is_entry_level.unwrap_or_else(|| {
        min_total_hours.is_some_and(|h| h < ENTRY_LEVEL_HOURS) || rules::entry_level_keywords(&text)
    });

    let mut tags = Vec::new();
    if visa_sponsorship {
        tags.push("Visa Sponsored".to_string());
    }
    if rules::commuting_contract(&text) {
        tags.push("Commuting Contract".to_string());
    }
    if is_entry_level {
        tags.push("Entry Level".to_string());
    }

    let description = non_empty(verdict.summary)
        .or_else(|| non_empty(raw.body_text.clone()))
        .map(|d| truncate_chars(&d, DESCRIPTION_LIMIT));

    let application_url = Some(raw.anchor_url.trim().to_string()).filter(|u| !u.is_empty());

    let mut job = NormalizedJob {
        canonical_key: String::new(),
        title,
        company: collapse_whitespace(company),
        location,
        region,
        position_type,
        aircraft_type: aircraft_type.map(str::to_string),
        aircraft_category,
        min_total_hours,
        min_pic_hours,
        min_type_hours,
        license_required: rules::license_required(&text),
        type_rating_required,
        type_rating_provided,
        visa_sponsorship,
        is_entry_level,
        contract_type,
        tags,
        description,
        application_url,
        source_target_id: raw.source_target_id,
        is_active: true,
        scraped_at: raw.captured_at,
    };
    job.canonical_key = dedupe_key(&job);
    job
}
