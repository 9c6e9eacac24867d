//! Project lifecycle service.
//!
//! Orchestrates create-or-attach, read, list, and disconnect over the
//! [`ProjectStore`], consulting the authorization policy before any access.
//! Handlers stay thin; all invariants live here or in the store.

use std::sync::Arc;

use osswatch_core::models::{CallerContext, DisconnectOutcome, Project};
use osswatch_core::policy::{self, Action};
use osswatch_core::validation::{derive_project_name, validate_project_url};
use osswatch_core::AppError;
use osswatch_db::{NewProject, ProjectStore};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectLifecycleService {
    store: Arc<dyn ProjectStore>,
}

impl ProjectLifecycleService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// Create a project for `url` or attach an existing one to `org_id`.
    ///
    /// Projects are deduplicated by exact `url` across all organizations:
    /// calling this twice with the same `(url, org_id)` yields the same
    /// project id, and the organization set grows monotonically. When the
    /// project already exists, its stored scan results are preserved unless
    /// this call supplies a replacement.
    pub async fn create_or_attach(
        &self,
        url: &str,
        scan_results: Option<serde_json::Value>,
        org_id: Uuid,
        caller: &CallerContext,
    ) -> Result<Project, AppError> {
        if !policy::decide(caller, Action::Create, org_id) {
            return Err(AppError::Forbidden(
                "Not allowed to create projects for this organization".to_string(),
            ));
        }

        let url = url.trim();
        validate_project_url(url)?;

        if self.store.find_organization(org_id).await?.is_none() {
            return Err(AppError::NotFound("Organization not found".to_string()));
        }

        let project = match self.store.find_by_url(url).await? {
            Some(existing) => {
                if let Some(results) = scan_results {
                    self.store.replace_scan_results(existing.id, &results).await?;
                }
                existing
            }
            None => {
                let new = NewProject {
                    url: url.to_string(),
                    name: derive_project_name(url),
                    scan_results: scan_results.unwrap_or_else(|| serde_json::json!({})),
                };
                match self.store.insert_project(new).await {
                    Ok(created) => created,
                    // Lost an insert race: the unique constraint rejected us,
                    // so the project now exists and we attach to it instead.
                    Err(AppError::Conflict(_)) => {
                        self.store.find_by_url(url).await?.ok_or_else(|| {
                            AppError::Internal(
                                "Project vanished after duplicate-url conflict".to_string(),
                            )
                        })?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.store.attach_organization(project.id, org_id).await?;

        self.store
            .find_project(project.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    /// Load a project by id, applying the read policy against its full
    /// organization set.
    pub async fn get_by_id(
        &self,
        project_id: Uuid,
        caller: &CallerContext,
    ) -> Result<Project, AppError> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        if !policy::can_read_project(caller, &project.organization_ids()) {
            return Err(AppError::Forbidden(
                "Not allowed to view this project".to_string(),
            ));
        }

        Ok(project)
    }

    /// List all projects associated with an organization.
    pub async fn list_by_organization(
        &self,
        org_id: Uuid,
        caller: &CallerContext,
    ) -> Result<Vec<Project>, AppError> {
        if !policy::decide(caller, Action::List, org_id) {
            return Err(AppError::Forbidden(
                "Not allowed to list projects for this organization".to_string(),
            ));
        }

        if self.store.find_organization(org_id).await?.is_none() {
            return Err(AppError::NotFound("Organization not found".to_string()));
        }

        self.store.find_by_organization(org_id).await
    }

    /// Remove one organization's association with a project. Deletes the
    /// project entirely when the organization was its last association; the
    /// store performs the branch atomically so a project can never survive
    /// with zero organizations.
    pub async fn disconnect(
        &self,
        project_id: Uuid,
        org_id: Uuid,
        caller: &CallerContext,
    ) -> Result<DisconnectOutcome, AppError> {
        if !policy::decide(caller, Action::Disconnect, org_id) {
            return Err(AppError::Forbidden(
                "Not allowed to disconnect projects from this organization".to_string(),
            ));
        }

        self.store.detach_or_delete(project_id, org_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osswatch_core::models::GlobalRole;
    use osswatch_db::MemoryProjectStore;
    use serde_json::json;

    const WIDGET_URL: &str = "https://github.com/acme/widget";

    struct Fixture {
        service: ProjectLifecycleService,
        org_a: Uuid,
        org_b: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = MemoryProjectStore::new();
        let org_a = store.add_organization("org-a").await;
        let org_b = store.add_organization("org-b").await;
        Fixture {
            service: ProjectLifecycleService::new(Arc::new(store)),
            org_a,
            org_b,
        }
    }

    fn writer() -> CallerContext {
        CallerContext {
            user_id: Uuid::new_v4(),
            global_role: GlobalRole::Writer,
            org_memberships: vec![],
        }
    }

    fn viewer() -> CallerContext {
        CallerContext {
            user_id: Uuid::new_v4(),
            global_role: GlobalRole::Viewer,
            org_memberships: vec![],
        }
    }

    fn member_of(org_id: Uuid) -> CallerContext {
        CallerContext {
            user_id: Uuid::new_v4(),
            global_role: GlobalRole::None,
            org_memberships: vec![org_id],
        }
    }

    #[tokio::test]
    async fn create_derives_name_and_attaches() {
        let fx = fixture().await;
        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &writer())
            .await
            .unwrap();

        assert_eq!(project.name, "acme/widget");
        assert_eq!(project.scan_results, json!({}));
        assert_eq!(project.organization_ids(), vec![fx.org_a]);
    }

    #[tokio::test]
    async fn attach_is_idempotent() {
        let fx = fixture().await;
        let caller = member_of(fx.org_a);

        let first = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &caller)
            .await
            .unwrap();
        let second = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &caller)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.organization_ids(), vec![fx.org_a]);
    }

    #[tokio::test]
    async fn cross_org_dedup_reuses_project() {
        let fx = fixture().await;

        let first = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &member_of(fx.org_a))
            .await
            .unwrap();
        let second = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_b, &member_of(fx.org_b))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let mut org_ids = second.organization_ids();
        org_ids.sort();
        let mut expected = vec![fx.org_a, fx.org_b];
        expected.sort();
        assert_eq!(org_ids, expected);
    }

    #[tokio::test]
    async fn reuse_preserves_scan_results_unless_supplied() {
        let fx = fixture().await;
        let caller = writer();

        fx.service
            .create_or_attach(WIDGET_URL, Some(json!({"score": 7})), fx.org_a, &caller)
            .await
            .unwrap();

        // No scan results supplied: existing document preserved
        let reused = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_b, &caller)
            .await
            .unwrap();
        assert_eq!(reused.scan_results, json!({"score": 7}));

        // Supplied: replaced wholesale
        let replaced = fx
            .service
            .create_or_attach(WIDGET_URL, Some(json!({"score": 3})), fx.org_a, &caller)
            .await
            .unwrap();
        assert_eq!(replaced.scan_results, json!({"score": 3}));
    }

    /// Store whose first insert fails with a duplicate-url conflict after
    /// another writer's row has already landed, as under a concurrent create.
    struct RacingStore {
        inner: MemoryProjectStore,
        raced: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl ProjectStore for RacingStore {
        async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
            self.inner.find_project(id).await
        }

        async fn find_by_url(&self, url: &str) -> Result<Option<Project>, AppError> {
            self.inner.find_by_url(url).await
        }

        async fn find_by_organization(&self, org_id: Uuid) -> Result<Vec<Project>, AppError> {
            self.inner.find_by_organization(org_id).await
        }

        async fn find_organization(
            &self,
            org_id: Uuid,
        ) -> Result<Option<osswatch_core::models::Organization>, AppError> {
            self.inner.find_organization(org_id).await
        }

        async fn insert_project(&self, new: NewProject) -> Result<Project, AppError> {
            if !self.raced.swap(true, std::sync::atomic::Ordering::SeqCst) {
                // The competing writer commits first; our insert hits the
                // unique constraint.
                self.inner.insert_project(new.clone()).await?;
                return Err(AppError::Conflict(format!(
                    "Project already exists for url {}",
                    new.url
                )));
            }
            self.inner.insert_project(new).await
        }

        async fn attach_organization(
            &self,
            project_id: Uuid,
            org_id: Uuid,
        ) -> Result<(), AppError> {
            self.inner.attach_organization(project_id, org_id).await
        }

        async fn replace_scan_results(
            &self,
            project_id: Uuid,
            results: &serde_json::Value,
        ) -> Result<(), AppError> {
            self.inner.replace_scan_results(project_id, results).await
        }

        async fn detach_or_delete(
            &self,
            project_id: Uuid,
            org_id: Uuid,
        ) -> Result<DisconnectOutcome, AppError> {
            self.inner.detach_or_delete(project_id, org_id).await
        }

        async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
            self.inner.list_projects().await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_attaches_to_winning_row() {
        let inner = MemoryProjectStore::new();
        let org_id = inner.add_organization("org-a").await;
        let store = Arc::new(RacingStore {
            inner: inner.clone(),
            raced: std::sync::atomic::AtomicBool::new(false),
        });
        let service = ProjectLifecycleService::new(store);

        let project = service
            .create_or_attach(WIDGET_URL, None, org_id, &writer())
            .await
            .unwrap();

        // The caller gets the row the competing writer created, attached to
        // the requested organization, and no second row exists.
        let winner = inner.find_by_url(WIDGET_URL).await.unwrap().unwrap();
        assert_eq!(project.id, winner.id);
        assert_eq!(project.organization_ids(), vec![org_id]);
        assert_eq!(inner.list_projects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let fx = fixture().await;

        let err = fx
            .service
            .create_or_attach("", None, fx.org_a, &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = fx
            .service
            .create_or_attach(WIDGET_URL, None, Uuid::new_v4(), &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_denied_for_viewer_and_non_member() {
        let fx = fixture().await;

        let err = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &viewer())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &member_of(fx.org_b))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn disconnect_with_survivors_keeps_project() {
        let fx = fixture().await;
        let caller = writer();

        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &caller)
            .await
            .unwrap();
        fx.service
            .create_or_attach(WIDGET_URL, None, fx.org_b, &caller)
            .await
            .unwrap();

        let outcome = fx
            .service
            .disconnect(project.id, fx.org_a, &caller)
            .await
            .unwrap();
        assert_eq!(outcome, DisconnectOutcome::Disconnected);

        let remaining = fx.service.get_by_id(project.id, &caller).await.unwrap();
        assert_eq!(remaining.organization_ids(), vec![fx.org_b]);
    }

    #[tokio::test]
    async fn disconnect_last_org_deletes_project() {
        let fx = fixture().await;
        let caller = member_of(fx.org_a);

        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &caller)
            .await
            .unwrap();

        let outcome = fx
            .service
            .disconnect(project.id, fx.org_a, &caller)
            .await
            .unwrap();
        assert_eq!(outcome, DisconnectOutcome::Deleted);

        let err = fx.service.get_by_id(project.id, &writer()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn disconnect_requires_membership_in_target_org() {
        let fx = fixture().await;
        let admin = writer();

        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &admin)
            .await
            .unwrap();
        fx.service
            .create_or_attach(WIDGET_URL, None, fx.org_b, &admin)
            .await
            .unwrap();

        // Member of org B cannot remove the org A association, even though the
        // project also belongs to their own org.
        let err = fx
            .service
            .disconnect(project.id, fx.org_a, &member_of(fx.org_b))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Viewer is read-only everywhere.
        let err = fx
            .service
            .disconnect(project.id, fx.org_a, &viewer())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn disconnect_unassociated_org_is_not_found() {
        let fx = fixture().await;
        let caller = writer();

        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &caller)
            .await
            .unwrap();

        let err = fx
            .service
            .disconnect(project.id, fx.org_b, &caller)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = fx
            .service
            .disconnect(Uuid::new_v4(), fx.org_a, &caller)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_by_id_applies_read_policy() {
        let fx = fixture().await;

        let project = fx
            .service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &writer())
            .await
            .unwrap();

        // Viewer and member of an associated org can read
        assert!(fx.service.get_by_id(project.id, &viewer()).await.is_ok());
        assert!(fx
            .service
            .get_by_id(project.id, &member_of(fx.org_a))
            .await
            .is_ok());

        // Member of an unrelated org cannot
        let err = fx
            .service
            .get_by_id(project.id, &member_of(fx.org_b))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn list_by_organization_scopes_results_and_access() {
        let fx = fixture().await;
        let admin = writer();

        fx.service
            .create_or_attach(WIDGET_URL, None, fx.org_a, &admin)
            .await
            .unwrap();
        fx.service
            .create_or_attach("https://github.com/acme/gadget", None, fx.org_b, &admin)
            .await
            .unwrap();

        let listed = fx
            .service
            .list_by_organization(fx.org_a, &member_of(fx.org_a))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].url, WIDGET_URL);

        // Viewer may list any org
        assert!(fx
            .service
            .list_by_organization(fx.org_b, &viewer())
            .await
            .is_ok());

        // Member requesting a foreign org id is denied
        let err = fx
            .service
            .list_by_organization(fx.org_b, &member_of(fx.org_a))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Unknown org is NotFound for an authorized caller
        let err = fx
            .service
            .list_by_organization(Uuid::new_v4(), &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
