use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hangar_core::SchedulerConfig;
use hangar_db::{Database, DatabaseConfig};
use hangar_server::routes;
use hangar_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hangar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let api_token = std::env::var("HANGAR_API_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("HANGAR_API_TOKEN must be set")?;
    let addr = std::env::var("HANGAR_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let config = SchedulerConfig::from_env()?;
    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let state = Arc::new(AppState {
        db,
        api_token,
        schedule: config.schedule,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
