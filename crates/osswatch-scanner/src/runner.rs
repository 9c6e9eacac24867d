//! Sequential scan batch over all tracked projects.

use std::sync::Arc;

use osswatch_db::ProjectStore;

use crate::tool::ScanTool;

/// Outcome counts for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct ScanRunner {
    store: Arc<dyn ProjectStore>,
    tool: Arc<dyn ScanTool>,
}

impl ScanRunner {
    pub fn new(store: Arc<dyn ProjectStore>, tool: Arc<dyn ScanTool>) -> Self {
        Self { store, tool }
    }

    /// Scan every project once, sequentially. A failed scan leaves the
    /// project's existing results untouched and the batch moves on; only a
    /// store failure while listing projects aborts the run.
    pub async fn run_batch(&self) -> Result<BatchSummary, osswatch_core::AppError> {
        let projects = self.store.list_projects().await?;
        let mut summary = BatchSummary {
            scanned: projects.len(),
            ..Default::default()
        };

        for project in projects {
            match self.tool.run(&project.url).await {
                Ok(verdict) => {
                    match self.store.replace_scan_results(project.id, &verdict).await {
                        Ok(()) => {
                            tracing::info!(
                                project_id = %project.id,
                                name = %project.name,
                                "Scan completed"
                            );
                            summary.updated += 1;
                        }
                        Err(e) => {
                            // The project may have been deleted mid-batch.
                            tracing::warn!(
                                project_id = %project.id,
                                error = %e,
                                "Failed to persist scan results, skipping"
                            );
                            summary.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        project_id = %project.id,
                        url = %project.url,
                        error = %e,
                        "Scan failed, keeping previous results"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            scanned = summary.scanned,
            updated = summary.updated,
            failed = summary.failed,
            "Scan batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ScanError;
    use async_trait::async_trait;
    use osswatch_db::{MemoryProjectStore, NewProject};
    use serde_json::json;

    /// Tool that fails for configured URLs and returns a fixed verdict otherwise.
    struct FakeTool {
        failing_urls: Vec<String>,
    }

    #[async_trait]
    impl ScanTool for FakeTool {
        async fn run(&self, url: &str) -> Result<serde_json::Value, ScanError> {
            if self.failing_urls.iter().any(|failing| failing == url) {
                Err(ScanError::NonZeroExit {
                    status: "exit status: 1".to_string(),
                    stderr: "clone failed".to_string(),
                })
            } else {
                Ok(json!({ "verdict": "pass", "url": url }))
            }
        }
    }

    async fn seed_project(store: &MemoryProjectStore, url: &str) -> uuid::Uuid {
        let org_id = store.add_organization("org").await;
        let project = store
            .insert_project(NewProject {
                url: url.to_string(),
                name: url.rsplit('/').next().unwrap().to_string(),
                scan_results: json!({ "verdict": "stale" }),
            })
            .await
            .unwrap();
        store.attach_organization(project.id, org_id).await.unwrap();
        project.id
    }

    #[tokio::test]
    async fn batch_tolerates_partial_failure() {
        let store = MemoryProjectStore::new();
        let first = seed_project(&store, "https://github.com/acme/first").await;
        let second = seed_project(&store, "https://github.com/acme/second").await;
        let third = seed_project(&store, "https://github.com/acme/third").await;

        let runner = ScanRunner::new(
            Arc::new(store.clone()),
            Arc::new(FakeTool {
                failing_urls: vec!["https://github.com/acme/second".to_string()],
            }),
        );

        let summary = runner.run_batch().await.unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                scanned: 3,
                updated: 2,
                failed: 1
            }
        );

        let updated = store.find_project(first).await.unwrap().unwrap();
        assert_eq!(updated.scan_results["verdict"], "pass");
        let updated = store.find_project(third).await.unwrap().unwrap();
        assert_eq!(updated.scan_results["verdict"], "pass");

        // The failing project keeps its previous results
        let untouched = store.find_project(second).await.unwrap().unwrap();
        assert_eq!(untouched.scan_results, json!({ "verdict": "stale" }));
    }

    #[tokio::test]
    async fn empty_store_is_a_noop() {
        let store = MemoryProjectStore::new();
        let runner = ScanRunner::new(
            Arc::new(store),
            Arc::new(FakeTool {
                failing_urls: vec![],
            }),
        );
        let summary = runner.run_batch().await.unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[tokio::test]
    async fn verdict_fully_replaces_previous_results() {
        let store = MemoryProjectStore::new();
        let id = seed_project(&store, "https://github.com/acme/widget").await;

        let runner = ScanRunner::new(
            Arc::new(store.clone()),
            Arc::new(FakeTool {
                failing_urls: vec![],
            }),
        );
        runner.run_batch().await.unwrap();

        let project = store.find_project(id).await.unwrap().unwrap();
        // No merge: the old "stale" document is gone entirely
        assert_eq!(
            project.scan_results,
            json!({ "verdict": "pass", "url": "https://github.com/acme/widget" })
        );
    }
}
