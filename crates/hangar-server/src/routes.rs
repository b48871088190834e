use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::Utc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hangar_core::error::AppError;
use hangar_core::target::TargetStatus;
use hangar_core::traits::{RunLog, TargetRegistry};

use crate::auth::require_api_token;
use crate::dto::{
    HealthResponse, ListRunsQuery, ListTargetsQuery, RunListResponse, RunResponse, StatsResponse,
    TargetListResponse, TargetResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

const DEFAULT_RUNS_LIMIT: usize = 20;
const MAX_RUNS_LIMIT: usize = 100;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/stats", get(stats))
        .route("/v1/targets", get(list_targets))
        .route("/v1/runs", get(list_runs))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_token,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/stats",
    responses(
        (status = 200, description = "Queue statistics", body = StatsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "queue"
)]
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let queue = state
        .db
        .target_repo()
        .queue_stats(Utc::now(), &state.schedule)
        .await?;
    let active_jobs = state.db.job_repo().count_active().await?;

    Ok(axum::Json(StatsResponse::new(queue, active_jobs)))
}

#[utoipa::path(
    get,
    path = "/v1/targets",
    params(ListTargetsQuery),
    responses(
        (status = 200, description = "Registered targets", body = TargetListResponse),
        (status = 400, description = "Unknown status filter", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "queue"
)]
pub async fn list_targets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTargetsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status_filter = query
        .status
        .map(|s| s.parse::<TargetStatus>().map_err(AppError::Generic))
        .transpose()?;

    let targets = state.db.target_repo().list_targets(status_filter).await?;
    let total = targets.len();

    Ok(axum::Json(TargetListResponse {
        targets: targets.into_iter().map(TargetResponse::from).collect(),
        total,
    }))
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/runs",
    params(ListRunsQuery),
    responses(
        (status = 200, description = "Most recent runs, newest first", body = RunListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "runs"
)]
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRunsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RUNS_LIMIT)
        .clamp(1, MAX_RUNS_LIMIT);
    let runs = state.db.run_repo().recent(limit).await?;
    let total = runs.len();

    Ok(axum::Json(RunListResponse {
        runs: runs.into_iter().map(RunResponse::from).collect(),
        total,
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = state.db.health_check().await.is_ok();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        database: if healthy { "ok" } else { "error" },
    };

    (status, axum::Json(response))
}
