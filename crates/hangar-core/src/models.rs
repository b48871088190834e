use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ats::StrategyId;

/// An unvalidated candidate extracted from a target page.
///
/// Lives only for the duration of one scrape run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawPosting {
    pub source_target_id: Uuid,
    pub title_text: String,
    /// Absolute URL of the posting (empty when the strategy could not resolve one).
    pub anchor_url: String,
    pub location_text: Option<String>,
    /// Listing snippet or detail-page text.
    pub body_text: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl RawPosting {
    pub fn new(
        source_target_id: Uuid,
        title_text: impl Into<String>,
        anchor_url: impl Into<String>,
    ) -> Self {
        Self {
            source_target_id,
            title_text: title_text.into(),
            anchor_url: anchor_url.into(),
            location_text: None,
            body_text: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_text = Some(location.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_text = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    Captain,
    FirstOfficer,
    SecondOfficer,
    Cadet,
    Instructor,
    Other,
}

impl PositionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Captain => "captain",
            PositionType::FirstOfficer => "first_officer",
            PositionType::SecondOfficer => "second_officer",
            PositionType::Cadet => "cadet",
            PositionType::Instructor => "instructor",
            PositionType::Other => "other",
        }
    }
}

impl FromStr for PositionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "captain" => Ok(PositionType::Captain),
            "first_officer" => Ok(PositionType::FirstOfficer),
            "second_officer" => Ok(PositionType::SecondOfficer),
            "cadet" => Ok(PositionType::Cadet),
            "instructor" => Ok(PositionType::Instructor),
            "other" => Ok(PositionType::Other),
            _ => Err(format!("Unknown position type: {}", s)),
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftCategory {
    Narrowbody,
    Widebody,
    Regional,
    Turboprop,
    Business,
    Unknown,
}

impl AircraftCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AircraftCategory::Narrowbody => "narrowbody",
            AircraftCategory::Widebody => "widebody",
            AircraftCategory::Regional => "regional",
            AircraftCategory::Turboprop => "turboprop",
            AircraftCategory::Business => "business",
            AircraftCategory::Unknown => "unknown",
        }
    }
}

impl FromStr for AircraftCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrowbody" => Ok(AircraftCategory::Narrowbody),
            "widebody" => Ok(AircraftCategory::Widebody),
            "regional" => Ok(AircraftCategory::Regional),
            "turboprop" => Ok(AircraftCategory::Turboprop),
            "business" => Ok(AircraftCategory::Business),
            "unknown" => Ok(AircraftCategory::Unknown),
            _ => Err(format!("Unknown aircraft category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Permanent,
    Contract,
    Seasonal,
    Freelance,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Permanent => "permanent",
            ContractType::Contract => "contract",
            ContractType::Seasonal => "seasonal",
            ContractType::Freelance => "freelance",
        }
    }
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permanent" => Ok(ContractType::Permanent),
            "contract" => Ok(ContractType::Contract),
            "seasonal" => Ok(ContractType::Seasonal),
            "freelance" => Ok(ContractType::Freelance),
            _ => Err(format!("Unknown contract type: {}", s)),
        }
    }
}

/// The validated, structured job record ready for storage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedJob {
    /// Stable identity: application URL, or a title/company/location composite.
    pub canonical_key: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub region: String,
    pub position_type: PositionType,
    pub aircraft_type: Option<String>,
    pub aircraft_category: AircraftCategory,
    /// Minimum required total time; never a preferred value.
    pub min_total_hours: Option<u32>,
    pub min_pic_hours: Option<u32>,
    pub min_type_hours: Option<u32>,
    pub license_required: String,
    pub type_rating_required: bool,
    pub type_rating_provided: bool,
    pub visa_sponsorship: bool,
    pub is_entry_level: bool,
    pub contract_type: ContractType,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub application_url: Option<String>,
    pub source_target_id: Uuid,
    pub is_active: bool,
    pub scraped_at: DateTime<Utc>,
}

/// Output of an external text classifier.
///
/// Every field except the validity flag is optional; present values override
/// the rule-based ones.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierVerdict {
    pub is_valid_job: bool,
    #[serde(alias = "job_title")]
    pub title: Option<String>,
    pub position_type: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "min_hours")]
    pub min_total_hours: Option<u32>,
    pub min_pic_hours: Option<u32>,
    pub aircraft: Vec<String>,
    pub type_rating_required: Option<bool>,
    pub type_rating_provided: Option<bool>,
    pub visa_sponsored: Option<bool>,
    pub contract_type: Option<String>,
    pub is_entry_level: Option<bool>,
    #[serde(alias = "description_summary")]
    pub summary: Option<String>,
}

/// Outcome of one target's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// Audit record of a single target run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrapeRun {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub detected_strategy: StrategyId,
    pub status: RunStatus,
    pub postings_found: u32,
    pub jobs_saved: u32,
    pub rejected: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Operator-facing queue counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueStats {
    pub total: u64,
    pub due: u64,
    pub by_tier: BTreeMap<u8, u64>,
    pub by_status: BTreeMap<String, u64>,
}
