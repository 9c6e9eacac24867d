//! Application state shared by all handlers.

use crate::services::project_lifecycle::ProjectLifecycleService;
use osswatch_db::{PgProjectStore, ProjectStore};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn ProjectStore>,
    pub lifecycle: ProjectLifecycleService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store: Arc<dyn ProjectStore> = Arc::new(PgProjectStore::new(pool.clone()));
        Self::with_store(pool, store)
    }

    /// Build state over an explicit store. Handler tests use this with the
    /// in-memory store and a lazy (never-connected) pool.
    pub fn with_store(pool: PgPool, store: Arc<dyn ProjectStore>) -> Self {
        let lifecycle = ProjectLifecycleService::new(store.clone());
        Self {
            pool,
            store,
            lifecycle,
        }
    }
}
