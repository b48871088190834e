use std::time::Duration;

use hangar_core::config::SchedulerConfig;
use hangar_core::error::AppError;
use hangar_core::harvest::HarvestService;
use hangar_core::models::RunStatus;
use hangar_core::normalize::Normalizer;
use hangar_core::scheduler::Scheduler;
use hangar_core::target::{TargetStatus, Tier};
use hangar_core::testutil::{MockReporter, MockStrategy, make_raw, make_target};
use hangar_core::traits::RunLog;
use tokio_util::sync::CancellationToken;

use crate::integration::common::setup_test_db;

#[tokio::test]
async fn batch_against_postgres_isolates_failures() {
    let (db, _container) = setup_test_db().await;
    let registry = db.target_repo();

    let targets: Vec<_> = (0..5)
        .map(|i| make_target(&format!("Airline {i}"), Tier::One))
        .collect();
    for t in &targets {
        registry.insert(t).await.unwrap();
    }

    let strategy = MockStrategy::new();
    for (i, t) in targets.iter().enumerate() {
        if i == 3 {
            strategy.push_error(t.id, AppError::HttpError("HTTP 502 for listing".into()));
        } else {
            strategy.push_postings(
                t.id,
                vec![
                    make_raw(t.id, "Captain A320", &format!("{}/captain", t.url)),
                    make_raw(t.id, "Cabin Crew", &format!("{}/cabin", t.url)),
                ],
            );
        }
    }

    let config = SchedulerConfig::default().with_pauses(
        Duration::ZERO,
        Duration::ZERO,
        Duration::ZERO,
    );
    let scheduler = Scheduler::new(
        registry.clone(),
        HarvestService::new(strategy, Normalizer::rule_based(), db.job_repo()),
        db.run_repo(),
        config,
    );

    let runs = scheduler
        .run_once(&CancellationToken::new(), &MockReporter::new())
        .await
        .unwrap();

    assert_eq!(runs.len(), 5);
    assert_eq!(
        runs.iter().filter(|r| r.status == RunStatus::Success).count(),
        4
    );
    assert_eq!(db.run_repo().recent(10).await.unwrap().len(), 5);
    assert_eq!(db.job_repo().count_active().await.unwrap(), 4);

    let failed = registry.get(targets[3].id).await.unwrap().unwrap();
    assert_eq!(failed.consecutive_failures, 1);
    assert_eq!(failed.status, TargetStatus::Active);
    assert!(failed.last_error.unwrap().contains("HTTP 502"));

    let ok = registry.get(targets[0].id).await.unwrap().unwrap();
    assert_eq!(ok.jobs_found_last_run, 1);
    assert!(ok.last_success_at.is_some());

    // Everything was just checked, so nothing is due.
    assert!(scheduler.select_batch().await.unwrap().is_empty());
}
