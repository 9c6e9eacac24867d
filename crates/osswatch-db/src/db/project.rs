//! Postgres-backed [`ProjectStore`].

use async_trait::async_trait;
use osswatch_core::models::{DisconnectOutcome, Organization, Project, ProjectRow};
use osswatch_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{NewProject, ProjectStore};

#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_organizations(&self, project_id: Uuid) -> Result<Vec<Organization>, AppError> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.created_at, o.updated_at
            FROM organizations o
            JOIN project_organizations po ON po.organization_id = o.id
            WHERE po.project_id = $1
            ORDER BY o.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %project_id, "Failed to load project organizations");
            AppError::Database(e)
        })?;

        Ok(organizations)
    }

    async fn with_organizations(&self, rows: Vec<ProjectRow>) -> Result<Vec<Project>, AppError> {
        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let organizations = self.load_organizations(row.id).await?;
            projects.push(row.into_project(organizations));
        }
        Ok(projects)
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, url, name, scan_results, created_at, updated_at
            FROM open_source_projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %id, "Failed to fetch project by id");
            AppError::Database(e)
        })?;

        match row {
            Some(row) => {
                let organizations = self.load_organizations(row.id).await?;
                Ok(Some(row.into_project(organizations)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, url, name, scan_results, created_at, updated_at
            FROM open_source_projects
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch project by url");
            AppError::Database(e)
        })?;

        match row {
            Some(row) => {
                let organizations = self.load_organizations(row.id).await?;
                Ok(Some(row.into_project(organizations)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_organization(&self, org_id: Uuid) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.id, p.url, p.name, p.scan_results, p.created_at, p.updated_at
            FROM open_source_projects p
            JOIN project_organizations po ON po.project_id = p.id
            WHERE po.organization_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, organization_id = %org_id, "Failed to list projects for organization");
            AppError::Database(e)
        })?;

        self.with_organizations(rows).await
    }

    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, organization_id = %org_id, "Failed to fetch organization");
            AppError::Database(e)
        })?;

        Ok(organization)
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO open_source_projects (url, name, scan_results)
            VALUES ($1, $2, $3)
            RETURNING id, url, name, scan_results, created_at, updated_at
            "#,
        )
        .bind(&new.url)
        .bind(&new.name)
        .bind(&new.scan_results)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    tracing::warn!(url = %new.url, "Concurrent insert for project url, yielding to existing row");
                    return AppError::Conflict(format!(
                        "Project already exists for url {}",
                        new.url
                    ));
                }
            }
            tracing::error!(error = %e, url = %new.url, "Failed to insert project");
            AppError::Database(e)
        })?;

        tracing::info!(project_id = %row.id, url = %row.url, "Created new project");
        Ok(row.into_project(Vec::new()))
    }

    async fn attach_organization(&self, project_id: Uuid, org_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO project_organizations (project_id, organization_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(org_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %project_id, organization_id = %org_id, "Failed to attach organization");
            AppError::Database(e)
        })?;

        Ok(())
    }

    async fn replace_scan_results(
        &self,
        project_id: Uuid,
        results: &serde_json::Value,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE open_source_projects
            SET scan_results = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .bind(results)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %project_id, "Failed to replace scan results");
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".to_string()));
        }

        Ok(())
    }

    async fn detach_or_delete(
        &self,
        project_id: Uuid,
        org_id: Uuid,
    ) -> Result<DisconnectOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lock the project row so concurrent disconnects serialize on the
        // cardinality check.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM open_source_projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?;

        if locked.is_none() {
            return Err(AppError::NotFound("Project not found".to_string()));
        }

        let association_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM project_organizations WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let removed = sqlx::query(
            "DELETE FROM project_organizations WHERE project_id = $1 AND organization_id = $2",
        )
        .bind(project_id)
        .bind(org_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if removed.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Project is not associated with this organization".to_string(),
            ));
        }

        let outcome = if association_count > 1 {
            DisconnectOutcome::Disconnected
        } else {
            sqlx::query("DELETE FROM open_source_projects WHERE id = $1")
                .bind(project_id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            DisconnectOutcome::Deleted
        };

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            project_id = %project_id,
            organization_id = %org_id,
            outcome = ?outcome,
            "Disconnected organization from project"
        );
        Ok(outcome)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, url, name, scan_results, created_at, updated_at
            FROM open_source_projects
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list projects");
            AppError::Database(e)
        })?;

        self.with_organizations(rows).await
    }
}
