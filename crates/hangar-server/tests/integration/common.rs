use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use hangar_core::target::TierSchedule;
use hangar_db::Database;
use hangar_server::routes;
use hangar_server::state::AppState;

pub const TEST_API_TOKEN: &str = "test-operator-token";

/// Router plus the database behind it, for seeding.
///
/// The container is stopped when the `TestApp` is dropped.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up a PostgreSQL container, apply migrations and build the router.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "hangar_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/hangar_test");
    let pool = retry_connect(&url).await;

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");

    let state = Arc::new(AppState {
        db: db.clone(),
        api_token: TEST_API_TOKEN.to_string(),
        schedule: TierSchedule::default(),
    });

    TestApp {
        router: routes::router(state),
        db,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}
