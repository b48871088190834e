use chrono::{TimeDelta, Utc};
use hangar_core::target::{Target, TargetStatus, TargetUpdate, Tier, TierSchedule};
use hangar_core::traits::TargetRegistry;
use hangar_core::testutil::make_target;

use crate::integration::common::setup_test_db;

fn checked(mut target: Target, hours_ago: i64) -> Target {
    target.last_checked_at = Some(Utc::now() - TimeDelta::hours(hours_ago));
    target
}

#[tokio::test]
async fn insert_is_unique_on_url() {
    let (db, _container) = setup_test_db().await;
    let repo = db.target_repo();
    let target = make_target("Example Air", Tier::One).with_region("Middle East");

    assert!(repo.insert(&target).await.unwrap());
    let mut dup = make_target("Example Air", Tier::Two);
    dup.url = target.url.clone();
    assert!(!repo.insert(&dup).await.unwrap());

    let stored = repo.get(target.id).await.unwrap().expect("target exists");
    assert_eq!(stored.name, "Example Air");
    assert_eq!(stored.tier, Tier::One);
    assert_eq!(stored.region.as_deref(), Some("Middle East"));
    assert_eq!(stored.status, TargetStatus::Active);
}

#[tokio::test]
async fn list_due_respects_tier_window_and_order() {
    let (db, _container) = setup_test_db().await;
    let repo = db.target_repo();

    let never = make_target("Never Checked", Tier::One);
    let old = checked(make_target("Old", Tier::One), 10);
    let due = checked(make_target("Four Hours", Tier::One), 4);
    let fresh = checked(make_target("Fresh", Tier::One), 1);
    let other_tier = make_target("Tier Two", Tier::Two);
    let mut degraded = make_target("Degraded", Tier::One);
    degraded.status = TargetStatus::Degraded;
    for t in [&due, &fresh, &old, &never, &other_tier, &degraded] {
        repo.insert(t).await.unwrap();
    }

    let now = Utc::now();
    let cutoff = TierSchedule::default().due_cutoff(Tier::One, now);
    let listed = repo.list_due(Tier::One, cutoff, 10).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Never Checked", "Old", "Four Hours"]);

    let six_hours = TierSchedule {
        tier1: TimeDelta::hours(6),
        ..TierSchedule::default()
    };
    let listed = repo
        .list_due(Tier::One, six_hours.due_cutoff(Tier::One, now), 10)
        .await
        .unwrap();
    let names: Vec<&str> = listed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Never Checked", "Old"]);

    let limited = repo.list_due(Tier::One, cutoff, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn update_after_run_tracks_failures_and_counters() {
    let (db, _container) = setup_test_db().await;
    let repo = db.target_repo();
    let mut target = make_target("Flaky Air", Tier::One);
    target.consecutive_failures = 4;
    repo.insert(&target).await.unwrap();

    let now = Utc::now();
    let failure = TargetUpdate::failure(&target, now, &"x".repeat(900), 5);
    repo.update_after_run(target.id, &failure).await.unwrap();

    let stored = repo.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.consecutive_failures, 5);
    assert_eq!(stored.status, TargetStatus::Degraded);
    assert_eq!(stored.last_error.unwrap().len(), 500);
    assert!(stored.last_checked_at.is_some());
    assert!(stored.last_success_at.is_none());

    let degraded = repo.list_degraded(10, 10).await.unwrap();
    assert_eq!(degraded.len(), 1);
    assert!(repo.list_degraded(5, 10).await.unwrap().is_empty());

    let stored = repo.get(target.id).await.unwrap().unwrap();
    let success = TargetUpdate::success(&stored, Utc::now(), 7);
    repo.update_after_run(target.id, &success).await.unwrap();
    repo.update_after_run(target.id, &TargetUpdate::success(&stored, Utc::now(), 3))
        .await
        .unwrap();

    let stored = repo.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TargetStatus::Active);
    assert_eq!(stored.consecutive_failures, 0);
    assert_eq!(stored.last_error, None);
    assert_eq!(stored.jobs_found_last_run, 3);
    assert_eq!(stored.total_jobs_found, 10);
}

#[tokio::test]
async fn disabled_target_survives_update() {
    let (db, _container) = setup_test_db().await;
    let repo = db.target_repo();
    let target = make_target("Paused Air", Tier::Two);
    repo.insert(&target).await.unwrap();

    sqlx::query("UPDATE targets SET status = 'disabled' WHERE id = $1")
        .bind(target.id)
        .execute(db.pool())
        .await
        .unwrap();

    // Snapshot taken before the operator disabled it.
    let update = TargetUpdate::success(&target, Utc::now(), 1);
    repo.update_after_run(target.id, &update).await.unwrap();

    let stored = repo.get(target.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TargetStatus::Disabled);
}

#[tokio::test]
async fn update_unknown_target_errors() {
    let (db, _container) = setup_test_db().await;
    let target = make_target("Ghost Air", Tier::One);
    let update = TargetUpdate::success(&target, Utc::now(), 0);
    assert!(db.target_repo().update_after_run(target.id, &update).await.is_err());
}

#[tokio::test]
async fn list_targets_and_queue_stats() {
    let (db, _container) = setup_test_db().await;
    let repo = db.target_repo();

    let a = make_target("Alpha Air", Tier::One);
    let b = checked(make_target("Bravo Air", Tier::Two), 1);
    let mut c = make_target("Charlie Air", Tier::Three);
    c.status = TargetStatus::Degraded;
    for t in [&a, &b, &c] {
        repo.insert(t).await.unwrap();
    }

    assert_eq!(repo.list_targets(None).await.unwrap().len(), 3);
    let degraded = repo
        .list_targets(Some(TargetStatus::Degraded))
        .await
        .unwrap();
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].name, "Charlie Air");

    let stats = repo
        .queue_stats(Utc::now(), &TierSchedule::default())
        .await
        .unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.due, 1);
    assert_eq!(stats.by_tier.get(&1), Some(&1));
    assert_eq!(stats.by_tier.get(&3), Some(&1));
    assert_eq!(stats.by_status.get("active"), Some(&2));
    assert_eq!(stats.by_status.get("degraded"), Some(&1));
}
