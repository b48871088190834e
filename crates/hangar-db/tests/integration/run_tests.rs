use chrono::{TimeDelta, Utc};
use hangar_core::ats::StrategyId;
use hangar_core::models::{RunStatus, ScrapeRun};
use hangar_core::target::Tier;
use hangar_core::testutil::make_target;
use hangar_core::traits::RunLog;
use uuid::Uuid;

use crate::integration::common::setup_test_db;

fn run(target_id: Uuid, minutes_ago: i64, status: RunStatus) -> ScrapeRun {
    ScrapeRun {
        id: Uuid::new_v4(),
        target_id,
        target_name: "Example Air".into(),
        detected_strategy: StrategyId::Workday,
        status,
        postings_found: 4,
        jobs_saved: 3,
        rejected: 1,
        duration_ms: 1_250,
        error: (status == RunStatus::Failed).then(|| "HTTP 503".to_string()),
        completed_at: Utc::now() - TimeDelta::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn record_and_list_recent_newest_first() {
    let (db, _container) = setup_test_db().await;
    let target = make_target("Example Air", Tier::One);
    db.target_repo().insert(&target).await.unwrap();
    let log = db.run_repo();

    log.record(&run(target.id, 30, RunStatus::Success)).await.unwrap();
    log.record(&run(target.id, 10, RunStatus::Failed)).await.unwrap();
    log.record(&run(target.id, 20, RunStatus::Success)).await.unwrap();

    let recent = log.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].status, RunStatus::Failed);
    assert_eq!(recent[0].error.as_deref(), Some("HTTP 503"));
    assert_eq!(recent[0].detected_strategy, StrategyId::Workday);
    assert_eq!(recent[1].status, RunStatus::Success);
    assert_eq!(recent[1].jobs_saved, 3);
    assert_eq!(recent[1].duration_ms, 1_250);
}

#[tokio::test]
async fn run_for_unknown_target_is_rejected() {
    let (db, _container) = setup_test_db().await;
    let result = db
        .run_repo()
        .record(&run(Uuid::new_v4(), 0, RunStatus::Success))
        .await;
    assert!(result.is_err());
}
