pub mod aircraft;
pub mod ats;
pub mod backoff;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod harvest;
pub mod hours;
pub mod models;
pub mod normalize;
pub mod rules;
pub mod scheduler;
pub mod target;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use ats::StrategyId;
pub use backoff::BackoffPolicy;
pub use config::SchedulerConfig;
pub use dedup::{Deduplicator, dedupe_key};
pub use error::AppError;
pub use filter::is_candidate;
pub use harvest::{HarvestResult, HarvestService};
pub use models::{
    AircraftCategory, ClassifierVerdict, ContractType, NormalizedJob, PositionType, QueueStats,
    RawPosting, RunStatus, ScrapeRun,
};
pub use normalize::{Normalizer, Outcome, Rejection};
pub use scheduler::{Scheduler, SchedulerEvent, SchedulerReporter, TracingSchedulerReporter};
pub use target::{Target, TargetStatus, TargetUpdate, Tier, TierSchedule};
pub use traits::{
    ExtractionStrategy, JobStore, NullClassifier, PageFetcher, RunLog, TargetRegistry,
    TextClassifier, TextCleaner,
};
