//! Authorization policy
//!
//! Pure decision functions over [`CallerContext`]. The policy never errors;
//! anything it cannot resolve is a deny. Side effects (loading the project's
//! organization set) happen in the lifecycle service before consulting it.

use uuid::Uuid;

use crate::models::{CallerContext, GlobalRole};

/// Action a caller wants to perform against a target organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    List,
    Disconnect,
}

impl Action {
    fn is_read_only(self) -> bool {
        matches!(self, Action::Read | Action::List)
    }
}

/// Decide whether `caller` may perform `action` scoped to `target_org`.
///
/// Global writers are allowed everything; global viewers only read-only
/// actions; organization members get all four actions, but only for
/// organizations in their membership set.
pub fn decide(caller: &CallerContext, action: Action, target_org: Uuid) -> bool {
    match caller.global_role {
        GlobalRole::Writer => true,
        GlobalRole::Viewer if action.is_read_only() => true,
        _ => caller.is_member_of(target_org),
    }
}

/// Read access for a single project is granted against its full organization
/// set: global writer/viewer, or a non-empty intersection between the caller's
/// memberships and the project's organizations.
pub fn can_read_project(caller: &CallerContext, project_org_ids: &[Uuid]) -> bool {
    match caller.global_role {
        GlobalRole::Writer | GlobalRole::Viewer => true,
        GlobalRole::None => project_org_ids
            .iter()
            .any(|org_id| caller.is_member_of(*org_id)),
    }
}
