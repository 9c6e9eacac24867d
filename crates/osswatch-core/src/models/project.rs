use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Organization;

/// Tracked open source project: a repository URL, its derived name, and the
/// latest security-scan verdict.
///
/// Invariant: a persisted project always belongs to at least one organization.
/// Detaching the last organization deletes the record in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub url: String,
    /// Derived from `url` at creation time; not independently settable.
    pub name: String,
    /// Latest scan tool output, fully replaced on each scan run.
    pub scan_results: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Organizations this project is associated with (many-to-many).
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

impl Project {
    /// Ids of the organizations this project is associated with.
    pub fn organization_ids(&self) -> Vec<Uuid> {
        self.organizations.iter().map(|org| org.id).collect()
    }
}

/// Row shape of `open_source_projects` without the association loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProjectRow {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub scan_results: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    /// Combine the row with its loaded associations.
    pub fn into_project(self, organizations: Vec<Organization>) -> Project {
        Project {
            id: self.id,
            url: self.url,
            name: self.name,
            scan_results: self.scan_results,
            created_at: self.created_at,
            updated_at: self.updated_at,
            organizations,
        }
    }
}

/// Result of removing one organization's association from a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectOutcome {
    /// Other associations remain; only the link was removed.
    Disconnected,
    /// The organization was the last one; the project record was deleted.
    Deleted,
}
