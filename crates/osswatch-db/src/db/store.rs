//! Store seam consumed by the lifecycle service and the scan runner.

use async_trait::async_trait;
use osswatch_core::models::{DisconnectOutcome, Organization, Project};
use osswatch_core::AppError;
use uuid::Uuid;

/// Fields required to insert a new project row.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub url: String,
    pub name: String,
    pub scan_results: serde_json::Value,
}

/// Durable project/organization store.
///
/// `detach_or_delete` is the one compound operation: the check-branch-mutate
/// sequence it performs must be atomic with respect to concurrent mutations of
/// the same project, so it lives behind the store boundary where the Postgres
/// implementation can wrap it in a transaction with a row lock.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project with its organization set. `None` if the id is unknown.
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError>;

    /// Exact-match lookup by repository URL, across all organizations.
    async fn find_by_url(&self, url: &str) -> Result<Option<Project>, AppError>;

    /// All projects currently associated with the organization.
    async fn find_by_organization(&self, org_id: Uuid) -> Result<Vec<Project>, AppError>;

    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, AppError>;

    /// Insert a new project row. A unique-constraint violation on `(url, name)`
    /// surfaces as [`AppError::Conflict`] so the caller can retry as a lookup.
    async fn insert_project(&self, new: NewProject) -> Result<Project, AppError>;

    /// Associate the organization with the project. Idempotent: attaching an
    /// existing association is a no-op, not an error.
    async fn attach_organization(&self, project_id: Uuid, org_id: Uuid) -> Result<(), AppError>;

    /// Fully replace the stored scan results document.
    async fn replace_scan_results(
        &self,
        project_id: Uuid,
        results: &serde_json::Value,
    ) -> Result<(), AppError>;

    /// Remove one organization association. If other associations remain the
    /// link alone is removed; if it was the last one the project record is
    /// deleted. Returns [`AppError::NotFound`] when the project does not exist
    /// or the organization is not among its associations.
    async fn detach_or_delete(
        &self,
        project_id: Uuid,
        org_id: Uuid,
    ) -> Result<DisconnectOutcome, AppError>;

    /// Every project in the store, for the scan batch.
    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;
}
