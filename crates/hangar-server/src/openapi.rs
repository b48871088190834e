use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hangar API",
        version = "0.1.0",
        description = "Read-only view of the pilot job harvester: queue statistics, targets and recent runs."
    ),
    paths(
        crate::routes::stats,
        crate::routes::list_targets,
        crate::routes::list_runs,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::StatsResponse,
        crate::dto::TargetResponse,
        crate::dto::TargetListResponse,
        crate::dto::RunResponse,
        crate::dto::RunListResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "queue", description = "Scheduler queue and targets"),
        (name = "runs", description = "Per-target run log"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer token security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Operator token. Set via HANGAR_API_TOKEN environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
