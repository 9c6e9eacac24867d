//! Project endpoints: create-or-attach, get, list, disconnect.

use crate::auth::models::Caller;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use osswatch_core::models::{DisconnectOutcome, Project};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    /// Canonical source-repository URL
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// Optional scan results to store; replaces any existing document when the
    /// project already exists
    pub scan_results: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisconnectResponse {
    pub status: DisconnectOutcome,
}

#[utoipa::path(
    post,
    path = "/api/v0/organizations/{org_id}/projects",
    tag = "projects",
    params(
        ("org_id" = Uuid, Path, description = "Organization ID")
    ),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created or attached", body = Project),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Caller may not create projects for this organization", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %caller.0.user_id, organization_id = %org_id, operation = "create_project")
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.validate().map_err(osswatch_core::AppError::from)?;

    let project = state
        .lifecycle
        .create_or_attach(&body.url, body.scan_results, org_id, &caller.0)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/api/v0/projects/{project_id}",
    tag = "projects",
    params(
        ("project_id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 403, description = "Caller may not view this project", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let project = state.lifecycle.get_by_id(project_id, &caller).await?;
    Ok(Json(project))
}

#[utoipa::path(
    get,
    path = "/api/v0/organizations/{org_id}/projects",
    tag = "projects",
    params(
        ("org_id" = Uuid, Path, description = "Organization ID")
    ),
    responses(
        (status = 200, description = "Projects associated with the organization", body = [Project]),
        (status = 403, description = "Caller may not list this organization", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    )
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(org_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let projects = state.lifecycle.list_by_organization(org_id, &caller).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    delete,
    path = "/api/v0/projects/{project_id}/organizations/{org_id}",
    tag = "projects",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("org_id" = Uuid, Path, description = "Organization ID to disconnect")
    ),
    responses(
        (status = 200, description = "Association removed; project deleted if it was the last one", body = DisconnectResponse),
        (status = 403, description = "Caller may not disconnect from this organization", body = ErrorResponse),
        (status = 404, description = "Project or association not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %caller.0.user_id, project_id = %project_id, organization_id = %org_id, operation = "disconnect_project")
)]
pub async fn disconnect_project(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((project_id, org_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state
        .lifecycle
        .disconnect(project_id, org_id, &caller.0)
        .await?;
    Ok(Json(DisconnectResponse { status: outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use osswatch_core::models::{CallerContext, GlobalRole};
    use osswatch_db::MemoryProjectStore;
    use sqlx::PgPool;

    // State over the in-memory store; the pool is lazy and never connects.
    async fn test_state(store: &MemoryProjectStore) -> Arc<AppState> {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        Arc::new(AppState::with_store(pool, Arc::new(store.clone())))
    }

    fn writer_caller() -> Caller {
        Caller(CallerContext {
            user_id: Uuid::new_v4(),
            global_role: GlobalRole::Writer,
            org_memberships: vec![],
        })
    }

    #[tokio::test]
    async fn create_project_returns_created_with_body() {
        let store = MemoryProjectStore::new();
        let org_id = store.add_organization("org").await;
        let state = test_state(&store).await;

        let response = create_project(
            State(state),
            writer_caller(),
            Path(org_id),
            Json(CreateProjectRequest {
                url: "https://github.com/acme/widget".to_string(),
                scan_results: None,
            }),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn create_project_rejects_blank_url() {
        let store = MemoryProjectStore::new();
        let org_id = store.add_organization("org").await;
        let state = test_state(&store).await;

        let response = create_project(
            State(state),
            writer_caller(),
            Path(org_id),
            Json(CreateProjectRequest {
                url: String::new(),
                scan_results: None,
            }),
        )
        .await
        .err()
        .expect("expected validation error")
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn disconnect_project_reports_deletion_of_last_association() {
        let store = MemoryProjectStore::new();
        let org_id = store.add_organization("org").await;
        let state = test_state(&store).await;
        let caller = writer_caller();

        let project = state
            .lifecycle
            .create_or_attach("https://github.com/acme/widget", None, org_id, &caller.0)
            .await
            .unwrap();

        let response = disconnect_project(
            State(state.clone()),
            caller,
            Path((project.id, org_id)),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.find_project(project.id).await.unwrap().is_none());
    }
}
