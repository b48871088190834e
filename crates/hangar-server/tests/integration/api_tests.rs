use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{TimeDelta, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use hangar_core::ats::StrategyId;
use hangar_core::models::{RunStatus, ScrapeRun};
use hangar_core::target::{Target, TargetUpdate, Tier};
use hangar_core::traits::{RunLog, TargetRegistry};

use crate::integration::common::{TEST_API_TOKEN, TestApp, setup_test_app};

async fn get_authed(app: &TestApp, uri: &str) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::get(uri)
                .header("authorization", format!("Bearer {TEST_API_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Three targets: one checked just now, one never checked, one degraded.
async fn seed_targets(app: &TestApp) -> Vec<Target> {
    let repo = app.db.target_repo();
    let targets = vec![
        Target::new("Alpine Air", "https://careers.alpine.example/jobs", Tier::One),
        Target::new("Boreal Wings", "https://jobs.boreal.example/pilots", Tier::Two),
        Target::new("Coastal Charter", "https://coastal.example/careers", Tier::Three),
    ];
    for target in &targets {
        assert!(repo.insert(target).await.unwrap());
    }

    let now = Utc::now();
    repo.update_after_run(targets[0].id, &TargetUpdate::success(&targets[0], now, 4))
        .await
        .unwrap();
    repo.update_after_run(
        targets[2].id,
        &TargetUpdate::failure(&targets[2], now, "HTTP 503 for https://coastal.example/careers", 1),
    )
    .await
    .unwrap();

    targets
}

fn run(target: &Target, minutes_ago: i64, status: RunStatus) -> ScrapeRun {
    ScrapeRun {
        id: Uuid::new_v4(),
        target_id: target.id,
        target_name: target.name.clone(),
        detected_strategy: StrategyId::Custom,
        status,
        postings_found: 2,
        jobs_saved: 2,
        rejected: 0,
        duration_ms: 900,
        error: (status == RunStatus::Failed).then(|| "Request timed out".to_string()),
        completed_at: Utc::now() - TimeDelta::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/v1/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/v1/targets")
                .header("authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_counts_targets_and_due() {
    let app = setup_test_app().await;
    seed_targets(&app).await;

    let response = get_authed(&app, "/v1/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total_targets"], 3);
    // Only the never-checked active target is due.
    assert_eq!(json["due_targets"], 1);
    assert_eq!(json["by_tier"]["1"], 1);
    assert_eq!(json["by_status"]["active"], 2);
    assert_eq!(json["by_status"]["degraded"], 1);
    assert_eq!(json["active_jobs"], 0);
}

#[tokio::test]
async fn targets_filter_by_status() {
    let app = setup_test_app().await;
    let targets = seed_targets(&app).await;

    let response = get_authed(&app, "/v1/targets").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total"], 3);

    let response = get_authed(&app, "/v1/targets?status=degraded").await;
    let json = json_body(response).await;
    assert_eq!(json["total"], 1);
    let degraded = &json["targets"][0];
    assert_eq!(degraded["id"], targets[2].id.to_string());
    assert_eq!(degraded["status"], "degraded");
    assert_eq!(degraded["consecutive_failures"], 1);
    assert!(
        degraded["last_error"]
            .as_str()
            .unwrap()
            .starts_with("HTTP 503")
    );
}

#[tokio::test]
async fn unknown_status_filter_returns_400() {
    let app = setup_test_app().await;

    let response = get_authed(&app, "/v1/targets?status=paused").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_request");
}

#[tokio::test]
async fn runs_are_newest_first_and_limited() {
    let app = setup_test_app().await;
    let targets = seed_targets(&app).await;
    let log = app.db.run_repo();
    log.record(&run(&targets[0], 30, RunStatus::Success)).await.unwrap();
    log.record(&run(&targets[1], 5, RunStatus::Failed)).await.unwrap();
    log.record(&run(&targets[2], 15, RunStatus::Success)).await.unwrap();

    let response = get_authed(&app, "/v1/runs?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["total"], 2);
    let runs = json["runs"].as_array().unwrap();
    assert_eq!(runs[0]["target_name"], "Boreal Wings");
    assert_eq!(runs[0]["status"], "failed");
    assert_eq!(runs[0]["error"], "Request timed out");
    assert_eq!(runs[1]["target_name"], "Coastal Charter");
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/v1/stats"].is_object());
    assert!(json["paths"]["/v1/runs"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer"].is_object());
}
