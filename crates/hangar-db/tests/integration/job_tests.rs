use chrono::{TimeDelta, Utc};
use hangar_core::testutil::make_job;
use hangar_core::traits::JobStore;

use crate::integration::common::setup_test_db;

#[tokio::test]
async fn upsert_is_idempotent_on_application_url() {
    let (db, _container) = setup_test_db().await;
    let repo = db.job_repo();

    let job = make_job("Captain A320", Some("https://a.example/jobs/1"));
    assert_eq!(repo.upsert(&[job.clone()]).await.unwrap(), 1);

    let mut updated = job.clone();
    updated.min_total_hours = Some(3000);
    updated.tags = vec!["Visa Sponsored".into()];
    assert_eq!(repo.upsert(&[updated]).await.unwrap(), 1);

    let (count, hours, tags): (i64, Option<i32>, Vec<String>) = sqlx::query_as(
        "SELECT COUNT(*) OVER (), min_total_hours, tags FROM pilot_jobs LIMIT 1",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
    assert_eq!(hours, Some(3000));
    assert_eq!(tags, vec!["Visa Sponsored".to_string()]);
}

#[tokio::test]
async fn jobs_without_url_are_skipped() {
    let (db, _container) = setup_test_db().await;
    let repo = db.job_repo();

    let saved = repo
        .upsert(&[
            make_job("Captain", None),
            make_job("First Officer", Some("   ")),
            make_job("Second Officer", Some("https://a.example/jobs/2")),
        ])
        .await
        .unwrap();
    assert_eq!(saved, 1);
    assert_eq!(repo.count_active().await.unwrap(), 1);
}

#[tokio::test]
async fn long_fields_are_truncated() {
    let (db, _container) = setup_test_db().await;
    let repo = db.job_repo();

    let mut job = make_job(&"T".repeat(800), Some("https://a.example/jobs/3"));
    job.company = "C".repeat(400);
    job.location = "L".repeat(400);
    repo.upsert(&[job]).await.unwrap();

    let (title, company, location): (String, String, String) =
        sqlx::query_as("SELECT title, company, location FROM pilot_jobs")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(title.len(), 500);
    assert_eq!(company.len(), 255);
    assert_eq!(location.len(), 255);
}

#[tokio::test]
async fn stale_jobs_are_deactivated_and_revived_on_sighting() {
    let (db, _container) = setup_test_db().await;
    let repo = db.job_repo();

    let mut old = make_job("Captain B777", Some("https://a.example/jobs/old"));
    old.scraped_at = Utc::now() - TimeDelta::hours(200);
    let fresh = make_job("Captain A350", Some("https://a.example/jobs/fresh"));
    repo.upsert(&[old.clone(), fresh]).await.unwrap();

    let cutoff = Utc::now() - TimeDelta::hours(168);
    assert_eq!(repo.deactivate_stale(cutoff).await.unwrap(), 1);
    assert_eq!(repo.count_active().await.unwrap(), 1);
    assert_eq!(repo.deactivate_stale(cutoff).await.unwrap(), 0);

    old.scraped_at = Utc::now();
    repo.upsert(&[old]).await.unwrap();
    assert_eq!(repo.count_active().await.unwrap(), 2);
}
