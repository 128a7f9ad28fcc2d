//! Query operation names shared by every view.
//!
//! Names are dotted by resource group so a mutation can invalidate a whole
//! group (`assignments`) at once.

use civica_core::models::{AssignmentListParams, InstanceListParams};
use civica_core::queue::QueueLens;
use civica_query::QueryKey;

pub const INSTANCES: &str = "instances";
pub const INSTANCES_LIST: &str = "instances.list";
pub const INSTANCES_TRACK: &str = "instances.track";
pub const ASSIGNMENTS: &str = "assignments";
pub const ASSIGNMENTS_PENDING: &str = "assignments.pending";
pub const ASSIGNMENTS_MINE: &str = "assignments.mine";
pub const ADMIN_INBOX: &str = "admin.inbox";
pub const ADMIN_STATS: &str = "admin.stats";

pub fn track(instance_id: &str) -> QueryKey {
    QueryKey::new(INSTANCES_TRACK, instance_id)
}

pub fn instance_list(params: &InstanceListParams) -> QueryKey {
    QueryKey::new(INSTANCES_LIST, params)
}

pub fn lens(lens: QueueLens, params: &AssignmentListParams) -> QueryKey {
    let operation = match lens {
        QueueLens::Pending => ASSIGNMENTS_PENDING,
        QueueLens::AssignedToMe => ASSIGNMENTS_MINE,
    };
    QueryKey::new(operation, params)
}

pub fn inbox(page: u32, page_size: u32) -> QueryKey {
    QueryKey::new(
        ADMIN_INBOX,
        &serde_json::json!({ "page": page, "page_size": page_size }),
    )
}
