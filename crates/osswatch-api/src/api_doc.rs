//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use osswatch_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Osswatch API",
        version = "0.1.0",
        description = "Multi-tenant tracking of open source projects and their security-scan results. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::projects::create_project,
        handlers::projects::get_project,
        handlers::projects::list_projects,
        handlers::projects::disconnect_project,
        handlers::health::healthcheck,
    ),
    components(schemas(
        models::Project,
        models::Organization,
        models::DisconnectOutcome,
        models::GlobalRole,
        handlers::projects::CreateProjectRequest,
        handlers::projects::DisconnectResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "projects", description = "Open source project lifecycle"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
