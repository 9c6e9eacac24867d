//! In-memory [`ProjectStore`] used by service-level tests.
//!
//! Mirrors the Postgres implementation's observable behavior: `(url, name)`
//! uniqueness, idempotent attach, and the detach-or-delete cardinality branch.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use osswatch_core::models::{DisconnectOutcome, Organization, Project};
use osswatch_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{NewProject, ProjectStore};

#[derive(Default)]
struct MemoryState {
    organizations: HashMap<Uuid, Organization>,
    projects: HashMap<Uuid, Project>,
    // project_id -> associated organization ids
    links: HashMap<Uuid, BTreeSet<Uuid>>,
}

#[derive(Clone, Default)]
pub struct MemoryProjectStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an organization, returning its id.
    pub async fn add_organization(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = organization.id;
        self.state
            .write()
            .await
            .organizations
            .insert(id, organization);
        id
    }

    fn assemble(state: &MemoryState, project: &Project) -> Project {
        let mut assembled = project.clone();
        assembled.organizations = state
            .links
            .get(&project.id)
            .map(|org_ids| {
                org_ids
                    .iter()
                    .filter_map(|org_id| state.organizations.get(org_id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        assembled
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .get(&id)
            .map(|project| Self::assemble(&state, project)))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Project>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|project| project.url == url)
            .map(|project| Self::assemble(&state, project)))
    }

    async fn find_by_organization(&self, org_id: Uuid) -> Result<Vec<Project>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .filter(|project| {
                state
                    .links
                    .get(&project.id)
                    .is_some_and(|org_ids| org_ids.contains(&org_id))
            })
            .map(|project| Self::assemble(&state, project))
            .collect())
    }

    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.state.read().await.organizations.get(&org_id).cloned())
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, AppError> {
        let mut state = self.state.write().await;
        if state
            .projects
            .values()
            .any(|project| project.url == new.url && project.name == new.name)
        {
            return Err(AppError::Conflict(format!(
                "Project already exists for url {}",
                new.url
            )));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            url: new.url,
            name: new.name,
            scan_results: new.scan_results,
            created_at: now,
            updated_at: now,
            organizations: Vec::new(),
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn attach_organization(&self, project_id: Uuid, org_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.links.entry(project_id).or_default().insert(org_id);
        Ok(())
    }

    async fn replace_scan_results(
        &self,
        project_id: Uuid,
        results: &serde_json::Value,
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        project.scan_results = results.clone();
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn detach_or_delete(
        &self,
        project_id: Uuid,
        org_id: Uuid,
    ) -> Result<DisconnectOutcome, AppError> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&project_id) {
            return Err(AppError::NotFound("Project not found".to_string()));
        }

        let org_ids = state.links.entry(project_id).or_default();
        if !org_ids.remove(&org_id) {
            return Err(AppError::NotFound(
                "Project is not associated with this organization".to_string(),
            ));
        }

        if org_ids.is_empty() {
            state.links.remove(&project_id);
            state.projects.remove(&project_id);
            Ok(DisconnectOutcome::Deleted)
        } else {
            Ok(DisconnectOutcome::Disconnected)
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .map(|project| Self::assemble(&state, project))
            .collect();
        projects.sort_by_key(|project| project.created_at);
        Ok(projects)
    }
}
