//! Assignment queue semantics: lenses, status-priority ordering and the row
//! actions offered for each instance.

use crate::models::instance::WorkflowInstance;
use crate::status;

/// The two views over instances visible to the current admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueLens {
    /// Unassigned or not yet started.
    Pending,
    /// Assigned to the current user directly or through a team.
    AssignedToMe,
}

impl QueueLens {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AssignedToMe => "assigned_to_me",
        }
    }
}

/// Actions available on one queue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowActions {
    pub start: bool,
    pub quick_start: bool,
    pub view_details: bool,
    pub assign_user: bool,
    pub assign_team: bool,
    pub unassign: bool,
}

/// Compute row actions from the instance's state.
///
/// * start: the status or assignment status says the workflow is ready.
/// * quick start: nobody owns it yet (assign-to-self + start).
/// * view details: always.
/// * overflow: assign while not terminal, unassign when someone owns it.
pub fn row_actions(instance: &WorkflowInstance) -> RowActions {
    let terminal = status::is_terminal(&instance.status);
    let unassigned = instance.is_unassigned();
    let ready = status::is_startable(&instance.status, instance.assignment_status.as_deref());
    RowActions {
        start: !terminal && ready && !unassigned,
        quick_start: !terminal && unassigned,
        view_details: true,
        assign_user: !terminal,
        assign_team: !terminal,
        unassign: !terminal && !unassigned,
    }
}

/// Order rows of one fetched page by the status-priority table.
///
/// Stable, so rows with equal priority keep the server's order. This is a
/// display ordering of the current page only.
pub fn sort_by_status_priority(rows: &mut [WorkflowInstance]) {
    rows.sort_by_key(|row| status::status_priority(&row.status));
}
