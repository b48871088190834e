//! ATS classification: maps a career-page URL to an extraction strategy.
//!
//! Classification is an ordered substring match over a fixed table. Narrow
//! vendor patterns come before broad ones, and the first hit wins. A URL that
//! matches nothing is routed to the generic [`StrategyId::Custom`] harvester.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Extraction strategy identifier, one per supported ATS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyId {
    Taleo,
    Workday,
    SuccessFactors,
    Brassring,
    Icims,
    Greenhouse,
    Lever,
    SmartRecruiters,
    Avature,
    Custom,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Taleo => "taleo",
            StrategyId::Workday => "workday",
            StrategyId::SuccessFactors => "successfactors",
            StrategyId::Brassring => "brassring",
            StrategyId::Icims => "icims",
            StrategyId::Greenhouse => "greenhouse",
            StrategyId::Lever => "lever",
            StrategyId::SmartRecruiters => "smartrecruiters",
            StrategyId::Avature => "avature",
            StrategyId::Custom => "custom",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "taleo" => Ok(StrategyId::Taleo),
            "workday" => Ok(StrategyId::Workday),
            "successfactors" | "sap" => Ok(StrategyId::SuccessFactors),
            "brassring" => Ok(StrategyId::Brassring),
            "icims" => Ok(StrategyId::Icims),
            "greenhouse" => Ok(StrategyId::Greenhouse),
            "lever" => Ok(StrategyId::Lever),
            "smartrecruiters" => Ok(StrategyId::SmartRecruiters),
            "avature" => Ok(StrategyId::Avature),
            "custom" | "customai" => Ok(StrategyId::Custom),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// Ordered (strategy, patterns) table. Order is significant.
const PATTERNS: &[(StrategyId, &[&str])] = &[
    (
        StrategyId::Taleo,
        &["taleo.net", "taleo.com", "oraclecloud.com/hcmui"],
    ),
    (
        StrategyId::Workday,
        &[
            "myworkdayjobs.com",
            "workday.com",
            ".wd1.",
            ".wd3.",
            ".wd5.",
        ],
    ),
    (
        StrategyId::SuccessFactors,
        &["successfactors.com", "successfactors.eu", "jobs2web.com"],
    ),
    (StrategyId::Brassring, &["brassring"]),
    (StrategyId::Icims, &["icims.com"]),
    (
        StrategyId::Greenhouse,
        &["boards.greenhouse", "greenhouse.io"],
    ),
    (StrategyId::Lever, &["jobs.lever", "lever.co"]),
    (StrategyId::SmartRecruiters, &["smartrecruiters.com"]),
    (StrategyId::Avature, &["avature.net"]),
];

/// Classify a URL. Total and pure: unknown hosts yield [`StrategyId::Custom`].
pub fn classify(url: &str) -> StrategyId {
    let lower = url.to_lowercase();
    PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(id, _)| *id)
        .unwrap_or(StrategyId::Custom)
}

/// Resolve the strategy for a target: URL classification first, then the
/// registry's category hint when the URL alone is inconclusive.
pub fn resolve(url: &str, category_hint: Option<&str>) -> StrategyId {
    match classify(url) {
        StrategyId::Custom => category_hint
            .and_then(|hint| hint.parse().ok())
            .unwrap_or(StrategyId::Custom),
        id => id,
    }
}
