//! Instance and assignment status values as reported by the backend.
//!
//! The server owns the workflow state machine; the client keeps the raw
//! status string and interprets it through the constants and helpers here.
//! Unknown values are tolerated everywhere and sort last.

// ---------------------------------------------------------------------------
// Instance status constants
// ---------------------------------------------------------------------------

/// Instance exists but has not been started yet.
pub const STATUS_WAITING_FOR_START: &str = "waiting_for_start";
/// Instance is waiting for someone to be assigned.
pub const STATUS_PENDING_ASSIGNMENT: &str = "pending_assignment";
/// Instance is assigned and queued to start.
pub const STATUS_PENDING_START: &str = "pending_start";
/// Instance is waiting on an external event.
pub const STATUS_WAITING: &str = "waiting";
/// Engine is executing steps.
pub const STATUS_RUNNING: &str = "running";
/// Alias used by some engine versions for `running`.
pub const STATUS_IN_PROGRESS: &str = "in_progress";
/// Engine stopped on a step that needs input (see `waiting_for`).
pub const STATUS_PAUSED: &str = "paused";
/// A reviewer is looking at the instance.
pub const STATUS_UNDER_REVIEW: &str = "under_review";
/// Instance is queued for review.
pub const STATUS_PENDING_REVIEW: &str = "pending_review";
/// Terminal: finished successfully.
pub const STATUS_COMPLETED: &str = "completed";
/// Terminal: finished with an error.
pub const STATUS_FAILED: &str = "failed";
/// Terminal: cancelled by an operator.
pub const STATUS_CANCELLED: &str = "cancelled";

/// Terminal instance statuses.
pub const TERMINAL_STATUSES: &[&str] = &[STATUS_COMPLETED, STATUS_FAILED, STATUS_CANCELLED];

/// Statuses in which the console offers the "start" action.
pub const STARTABLE_STATUSES: &[&str] = &[
    STATUS_WAITING_FOR_START,
    STATUS_PENDING_ASSIGNMENT,
    STATUS_PENDING_START,
];

// ---------------------------------------------------------------------------
// Assignment status constants
// ---------------------------------------------------------------------------

/// Nobody owns the instance.
pub const ASSIGNMENT_UNASSIGNED: &str = "unassigned";
/// A user or team owns the instance but has not started it.
pub const ASSIGNMENT_ASSIGNED: &str = "assigned";
/// The owner started working on the instance.
pub const ASSIGNMENT_IN_PROGRESS: &str = "in_progress";
/// The owner finished.
pub const ASSIGNMENT_COMPLETED: &str = "completed";

// ---------------------------------------------------------------------------
// Priority table
// ---------------------------------------------------------------------------

/// Priority assigned to any status missing from [`STATUS_PRIORITY`].
pub const UNKNOWN_STATUS_PRIORITY: u8 = 10;

/// Display ordering for the "assigned to me" list, most actionable first.
pub const STATUS_PRIORITY: &[(&str, u8)] = &[
    (STATUS_WAITING_FOR_START, 0),
    (STATUS_PENDING_START, 1),
    (STATUS_WAITING, 2),
    (STATUS_RUNNING, 3),
    (STATUS_IN_PROGRESS, 4),
    (STATUS_UNDER_REVIEW, 5),
    (STATUS_PENDING_REVIEW, 6),
    (STATUS_COMPLETED, 7),
    (STATUS_FAILED, 8),
    (STATUS_CANCELLED, 9),
];

/// Look up the display priority of a status. Lower sorts first.
pub fn status_priority(status: &str) -> u8 {
    STATUS_PRIORITY
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, p)| *p)
        .unwrap_or(UNKNOWN_STATUS_PRIORITY)
}

/// Whether the instance has reached an end state.
pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Whether the engine is currently executing (either spelling).
pub fn is_running(status: &str) -> bool {
    status == STATUS_RUNNING || status == STATUS_IN_PROGRESS
}

/// Whether the console should offer "start" for this instance.
///
/// An instance whose assignment has been made but not yet started is also
/// startable even if the engine still reports a generic status.
pub fn is_startable(status: &str, assignment_status: Option<&str>) -> bool {
    STARTABLE_STATUSES.contains(&status) || assignment_status == Some(ASSIGNMENT_ASSIGNED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_table_follows_declared_order() {
        let ordered = [
            "waiting_for_start",
            "pending_start",
            "waiting",
            "running",
            "in_progress",
            "under_review",
            "pending_review",
            "completed",
            "failed",
            "cancelled",
        ];
        for (expected, status) in ordered.iter().enumerate() {
            assert_eq!(status_priority(status) as usize, expected, "{status}");
        }
    }

    #[test]
    fn unknown_status_sorts_last() {
        assert_eq!(status_priority("archived"), 10);
        assert_eq!(status_priority(""), 10);
        // paused is deliberately absent from the table
        assert_eq!(status_priority(STATUS_PAUSED), 10);
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal("completed"));
        assert!(is_terminal("failed"));
        assert!(is_terminal("cancelled"));
        assert!(!is_terminal("paused"));
    }

    #[test]
    fn running_accepts_both_spellings() {
        assert!(is_running("running"));
        assert!(is_running("in_progress"));
        assert!(!is_running("paused"));
    }

    #[test]
    fn startable_by_status_or_assignment() {
        assert!(is_startable("waiting_for_start", None));
        assert!(is_startable("pending_assignment", None));
        assert!(is_startable("draft", Some("assigned")));
        assert!(!is_startable("running", Some("in_progress")));
    }
}
