use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// System-wide role of a caller, independent of organization memberships.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    /// No cross-organization privilege; access comes from memberships only.
    None,
    /// Read and list on any organization.
    Viewer,
    /// Every action on any organization.
    Writer,
}

impl Display for GlobalRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            GlobalRole::None => write!(f, "none"),
            GlobalRole::Viewer => write!(f, "viewer"),
            GlobalRole::Writer => write!(f, "writer"),
        }
    }
}

/// Caller identity resolved upstream (JWT claims or session) and carried
/// through request extensions into handlers and services.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub global_role: GlobalRole,
    pub org_memberships: Vec<Uuid>,
}

impl CallerContext {
    pub fn is_member_of(&self, org_id: Uuid) -> bool {
        self.org_memberships.contains(&org_id)
    }
}
