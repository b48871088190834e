use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::truncate_chars;

/// Longest error message kept on a target or a run record.
pub const MAX_ERROR_LEN: usize = 500;

/// Health status of a scrape target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Active,
    Degraded,
    Disabled,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Active => "active",
            TargetStatus::Degraded => "degraded",
            TargetStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TargetStatus::Active),
            "degraded" => Ok(TargetStatus::Degraded),
            "disabled" => Ok(TargetStatus::Disabled),
            _ => Err(format!("Unknown target status: {}", s)),
        }
    }
}

/// Priority class controlling how often a target is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    One,
    Two,
    Three,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    pub fn number(&self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            _ => Err(format!("Unknown tier: {}", value)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.number()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Revisit interval per tier.
///
/// Defaults: tier 1 every 3h, tier 2 every 12h, tier 3 every 24h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSchedule {
    pub tier1: TimeDelta,
    pub tier2: TimeDelta,
    pub tier3: TimeDelta,
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            tier1: TimeDelta::hours(3),
            tier2: TimeDelta::hours(12),
            tier3: TimeDelta::hours(24),
        }
    }
}

impl TierSchedule {
    pub fn frequency(&self, tier: Tier) -> TimeDelta {
        match tier {
            Tier::One => self.tier1,
            Tier::Two => self.tier2,
            Tier::Three => self.tier3,
        }
    }

    /// Targets of `tier` last checked at or before this instant are due.
    ///
    /// Never earlier than the Unix epoch, so oversized frequencies stay
    /// representable in the database.
    pub fn due_cutoff(&self, tier: Tier, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.frequency(tier))
            .map_or(DateTime::UNIX_EPOCH, |cutoff| cutoff.max(DateTime::UNIX_EPOCH))
    }
}

/// A scrape source: one airline or agency career page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// Vendor ATS family ("workday", "taleo", ...) or "custom".
    pub category_hint: Option<String>,
    pub tier: Tier,
    pub region: Option<String>,
    pub status: TargetStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub jobs_found_last_run: u32,
    pub total_jobs_found: u64,
}

impl Target {
    pub fn new(name: impl Into<String>, url: impl Into<String>, tier: Tier) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            category_hint: None,
            tier,
            region: None,
            status: TargetStatus::Active,
            last_checked_at: None,
            last_success_at: None,
            consecutive_failures: 0,
            last_error: None,
            jobs_found_last_run: 0,
            total_jobs_found: 0,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_category_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }

    /// Whether the normal due cycle should pick this target up.
    pub fn is_due(&self, now: DateTime<Utc>, schedule: &TierSchedule) -> bool {
        if self.status != TargetStatus::Active {
            return false;
        }
        match self.last_checked_at {
            None => true,
            Some(checked) => now - checked >= schedule.frequency(self.tier),
        }
    }

    /// Apply a post-run update in place.
    pub fn apply(&mut self, update: &TargetUpdate) {
        self.last_checked_at = Some(update.last_checked_at);
        self.consecutive_failures = update.consecutive_failures;
        self.status = update.status;
        self.last_error = update.last_error.clone();
        if let Some(at) = update.last_success_at {
            self.last_success_at = Some(at);
        }
        if let Some(found) = update.jobs_found {
            self.jobs_found_last_run = found;
            self.total_jobs_found += u64::from(found);
        }
    }
}

/// State written back to the registry once a target's run completes.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetUpdate {
    pub last_checked_at: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub status: TargetStatus,
    pub last_error: Option<String>,
    /// Set only on success.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Postings saved by this run; set only on success.
    pub jobs_found: Option<u32>,
}

impl TargetUpdate {
    /// A successful run resets the failure streak and revives a degraded target.
    pub fn success(target: &Target, now: DateTime<Utc>, jobs_found: u32) -> Self {
        let status = match target.status {
            TargetStatus::Disabled => TargetStatus::Disabled,
            TargetStatus::Active | TargetStatus::Degraded => TargetStatus::Active,
        };
        Self {
            last_checked_at: now,
            consecutive_failures: 0,
            status,
            last_error: None,
            last_success_at: Some(now),
            jobs_found: Some(jobs_found),
        }
    }

    /// A failed run extends the streak; crossing `threshold` degrades the target.
    pub fn failure(target: &Target, now: DateTime<Utc>, error: &str, threshold: u32) -> Self {
        let consecutive_failures = target.consecutive_failures.saturating_add(1);
        let status = match target.status {
            TargetStatus::Disabled => TargetStatus::Disabled,
            _ if consecutive_failures >= threshold => TargetStatus::Degraded,
            other => other,
        };
        Self {
            last_checked_at: now,
            consecutive_failures,
            status,
            last_error: Some(truncate_chars(error, MAX_ERROR_LEN)),
            last_success_at: None,
            jobs_found: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(tier: Tier) -> Target {
        Target::new("Example Air", "https://careers.example-air.com", tier)
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TargetStatus::Active,
            TargetStatus::Degraded,
            TargetStatus::Disabled,
        ] {
            let parsed: TargetStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("paused".parse::<TargetStatus>().is_err());
    }

    #[test]
    fn test_tier_conversion() {
        assert_eq!(Tier::try_from(2).unwrap(), Tier::Two);
        assert!(Tier::try_from(4).is_err());
        assert_eq!(u8::from(Tier::Three), 3);
        let json = serde_json::to_string(&Tier::One).unwrap();
        assert_eq!(json, "1");
    }

    #[test]
    fn test_never_checked_target_is_due() {
        let t = target(Tier::Three);
        assert!(t.is_due(Utc::now(), &TierSchedule::default()));
    }

    #[test]
    fn test_due_respects_tier_frequency() {
        let now = Utc::now();
        let mut t = target(Tier::One);
        t.last_checked_at = Some(now - TimeDelta::hours(4));

        let three_hours = TierSchedule::default();
        assert!(t.is_due(now, &three_hours));

        let six_hours = TierSchedule {
            tier1: TimeDelta::hours(6),
            ..TierSchedule::default()
        };
        assert!(!t.is_due(now, &six_hours));
    }

    #[test]
    fn test_due_cutoff_saturates_for_huge_frequency() {
        let now = Utc::now();
        let schedule = TierSchedule {
            tier3: TimeDelta::MAX,
            ..TierSchedule::default()
        };
        assert_eq!(schedule.due_cutoff(Tier::Three, now), DateTime::UNIX_EPOCH);
        assert_eq!(
            schedule.due_cutoff(Tier::One, now),
            now - TimeDelta::hours(3)
        );
    }

    #[test]
    fn test_degraded_and_disabled_never_due() {
        let now = Utc::now();
        let mut t = target(Tier::One);
        t.status = TargetStatus::Degraded;
        assert!(!t.is_due(now, &TierSchedule::default()));
        t.status = TargetStatus::Disabled;
        assert!(!t.is_due(now, &TierSchedule::default()));
    }

    #[test]
    fn test_failure_crosses_threshold() {
        let now = Utc::now();
        let mut t = target(Tier::One);
        for _ in 0..4 {
            let update = TargetUpdate::failure(&t, now, "HTTP 503", 5);
            assert_eq!(update.status, TargetStatus::Active);
            t.apply(&update);
        }
        let update = TargetUpdate::failure(&t, now, "HTTP 503", 5);
        assert_eq!(update.consecutive_failures, 5);
        assert_eq!(update.status, TargetStatus::Degraded);
    }

    #[test]
    fn test_success_resets_and_revives() {
        let now = Utc::now();
        let mut t = target(Tier::Two);
        t.status = TargetStatus::Degraded;
        t.consecutive_failures = 7;
        t.last_error = Some("boom".into());

        let update = TargetUpdate::success(&t, now, 3);
        t.apply(&update);

        assert_eq!(t.status, TargetStatus::Active);
        assert_eq!(t.consecutive_failures, 0);
        assert_eq!(t.last_error, None);
        assert_eq!(t.last_success_at, Some(now));
        assert_eq!(t.jobs_found_last_run, 3);
        assert_eq!(t.total_jobs_found, 3);
    }

    #[test]
    fn test_disabled_is_never_changed_automatically() {
        let now = Utc::now();
        let mut t = target(Tier::One);
        t.status = TargetStatus::Disabled;
        assert_eq!(
            TargetUpdate::success(&t, now, 0).status,
            TargetStatus::Disabled
        );
        assert_eq!(
            TargetUpdate::failure(&t, now, "x", 1).status,
            TargetStatus::Disabled
        );
    }

    #[test]
    fn test_failure_truncates_error() {
        let t = target(Tier::One);
        let long = "x".repeat(2_000);
        let update = TargetUpdate::failure(&t, Utc::now(), &long, 5);
        assert_eq!(update.last_error.unwrap().len(), MAX_ERROR_LEN);
    }
}
