//! Assignment queue lenses, the admin inbox, and the queue's mutations.

use std::sync::Arc;
use std::time::Duration;

use civica_client::services::{AdminService, AssignmentsService, InstancesService};
use civica_client::{ApiClient, ApiError};
use civica_core::models::{Assignment, AssignmentListParams, Page, WorkflowInstance};
use civica_core::pagination;
use civica_core::queue::{row_actions, sort_by_status_priority, QueueLens, RowActions};
use civica_query::{QueryCache, QueryError, QueryState, QuerySubscription};
use futures::future::{BoxFuture, FutureExt};

use crate::keys;

type ListFetch = BoxFuture<'static, Result<Page<WorkflowInstance>, ApiError>>;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueRow {
    pub instance: WorkflowInstance,
    pub actions: RowActions,
}

/// One rendered page of a queue list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueuePage {
    pub rows: Vec<QueueRow>,
    pub total: u64,
    /// 0-based.
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl QueuePage {
    /// Build rows from a fetched page. `requested_page_size` fills in for a
    /// server that does not echo paging fields.
    pub fn from_page(
        page: &Page<WorkflowInstance>,
        requested_page: u32,
        requested_page_size: u32,
        by_priority: bool,
    ) -> Self {
        let mut instances = page.items.clone();
        if by_priority {
            sort_by_status_priority(&mut instances);
        }
        let page_size = if page.page_size > 0 {
            page.page_size
        } else {
            requested_page_size
        };
        Self {
            rows: instances
                .into_iter()
                .map(|instance| QueueRow {
                    actions: row_actions(&instance),
                    instance,
                })
                .collect(),
            total: page.total,
            page: if page.page_size > 0 { page.page } else { requested_page },
            page_size,
            total_pages: pagination::total_pages(page.total, page_size as u64),
        }
    }

    pub fn show_pagination(&self) -> bool {
        pagination::show_pagination(self.total, self.page_size as u64)
    }
}

/// Which list a [`LensView`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueList {
    Lens(QueueLens),
    Inbox,
}

impl QueueList {
    /// "Assigned to me" is ordered by the status-priority table.
    fn by_priority(self) -> bool {
        matches!(self, Self::Lens(QueueLens::AssignedToMe))
    }
}

/// Queue views and mutations over the shared query cache.
#[derive(Debug, Clone)]
pub struct AssignmentQueue {
    assignments: AssignmentsService,
    instances: InstancesService,
    admin: AdminService,
    cache: QueryCache,
    refetch_interval: Option<Duration>,
}

impl AssignmentQueue {
    pub fn new(client: &ApiClient, cache: &QueryCache, refetch_interval: Option<Duration>) -> Self {
        Self {
            assignments: client.assignments.clone(),
            instances: client.instances.clone(),
            admin: client.admin.clone(),
            cache: cache.clone(),
            refetch_interval,
        }
    }

    /// Load one page of a lens through the cache.
    pub async fn load(
        &self,
        lens: QueueLens,
        params: &AssignmentListParams,
    ) -> Result<QueuePage, QueryError> {
        let key = keys::lens(lens, params);
        let page = self.cache.fetch(&key, self.lens_fetcher(lens, params)).await?;
        Ok(QueuePage::from_page(
            &page,
            params.page,
            params.page_size,
            QueueList::Lens(lens).by_priority(),
        ))
    }

    /// Like [`load`](Self::load), but an out-of-range `params.page` is pulled
    /// back to the last page and reloaded.
    pub async fn load_clamped(
        &self,
        lens: QueueLens,
        params: &mut AssignmentListParams,
    ) -> Result<QueuePage, QueryError> {
        let page = self.load(lens, params).await?;
        let clamped = pagination::clamp_page(params.page, page.total, params.page_size);
        if clamped == params.page {
            return Ok(page);
        }
        tracing::debug!(requested = params.page, clamped, "Page past the end; clamping");
        params.page = clamped;
        self.load(lens, params).await
    }

    /// Mount a self-refreshing view of one lens page.
    pub fn watch(&self, lens: QueueLens, params: AssignmentListParams) -> LensView {
        let key = keys::lens(lens, &params);
        let subscription = self
            .cache
            .watch(key, self.lens_fetcher(lens, &params), self.refetch_interval);
        LensView {
            list: QueueList::Lens(lens),
            page: params.page,
            page_size: params.page_size,
            subscription,
        }
    }

    pub async fn load_inbox(&self, page: u32, page_size: u32) -> Result<QueuePage, QueryError> {
        let key = keys::inbox(page, page_size);
        let data = self
            .cache
            .fetch(&key, self.inbox_fetcher(page, page_size))
            .await?;
        Ok(QueuePage::from_page(&data, page, page_size, false))
    }

    /// Inbox counterpart of [`load_clamped`](Self::load_clamped).
    pub async fn load_inbox_clamped(
        &self,
        page: &mut u32,
        page_size: u32,
    ) -> Result<QueuePage, QueryError> {
        let loaded = self.load_inbox(*page, page_size).await?;
        let clamped = pagination::clamp_page(*page, loaded.total, page_size);
        if clamped == *page {
            return Ok(loaded);
        }
        tracing::debug!(requested = *page, clamped, "Inbox page past the end; clamping");
        *page = clamped;
        self.load_inbox(clamped, page_size).await
    }

    pub fn watch_inbox(&self, page: u32, page_size: u32) -> LensView {
        let key = keys::inbox(page, page_size);
        let subscription =
            self.cache
                .watch(key, self.inbox_fetcher(page, page_size), self.refetch_interval);
        LensView {
            list: QueueList::Inbox,
            page,
            page_size,
            subscription,
        }
    }

    // ---- mutations ----

    pub async fn assign_user(
        &self,
        instance_id: &str,
        user_id: &str,
        notes: Option<String>,
    ) -> Result<Assignment, ApiError> {
        let assignment = self
            .assignments
            .assign_user(instance_id, user_id, notes)
            .await?;
        self.after_mutation("assign_user", instance_id);
        Ok(assignment)
    }

    pub async fn assign_team(
        &self,
        instance_id: &str,
        team_id: &str,
        notes: Option<String>,
    ) -> Result<Assignment, ApiError> {
        let assignment = self
            .assignments
            .assign_team(instance_id, team_id, notes)
            .await?;
        self.after_mutation("assign_team", instance_id);
        Ok(assignment)
    }

    pub async fn unassign(&self, instance_id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self.instances.unassign(instance_id).await?;
        self.after_mutation("unassign", instance_id);
        Ok(response)
    }

    pub async fn start(&self, instance_id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self.assignments.start(instance_id).await?;
        self.after_mutation("start", instance_id);
        Ok(response)
    }

    pub async fn quick_start(&self, instance_id: &str) -> Result<serde_json::Value, ApiError> {
        let response = self.assignments.quick_start(instance_id).await?;
        self.after_mutation("quick_start", instance_id);
        Ok(response)
    }

    // ---- private helpers ----

    fn after_mutation(&self, action: &'static str, instance_id: &str) {
        tracing::info!(action, instance_id, "Queue mutation applied; invalidating lists");
        self.cache.invalidate_operation(keys::ASSIGNMENTS);
        self.cache.invalidate_operation(keys::INSTANCES);
        self.cache.invalidate_operation(keys::ADMIN_INBOX);
    }

    fn lens_fetcher(
        &self,
        lens: QueueLens,
        params: &AssignmentListParams,
    ) -> impl Fn() -> ListFetch + Send + Sync + 'static {
        let assignments = self.assignments.clone();
        let params = Arc::new(params.clone());
        move || {
            let assignments = assignments.clone();
            let params = params.clone();
            async move {
                match lens {
                    QueueLens::Pending => assignments.pending(&params).await,
                    QueueLens::AssignedToMe => assignments.mine(&params).await,
                }
            }
            .boxed()
        }
    }

    fn inbox_fetcher(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Fn() -> ListFetch + Send + Sync + 'static {
        let admin = self.admin.clone();
        move || {
            let admin = admin.clone();
            async move { admin.inbox(page, page_size).await }.boxed()
        }
    }
}

/// A live, self-refreshing queue list.
pub struct LensView {
    list: QueueList,
    page: u32,
    page_size: u32,
    subscription: QuerySubscription<Page<WorkflowInstance>>,
}

impl std::fmt::Debug for LensView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LensView")
            .field("list", &self.list)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl LensView {
    pub fn list(&self) -> QueueList {
        self.list
    }

    /// Rows of the latest loaded page, if any.
    pub fn current(&self) -> Option<QueuePage> {
        self.render(&self.subscription.state())
    }

    pub fn error(&self) -> Option<String> {
        self.subscription.state().error.map(|e| e.to_string())
    }

    pub fn is_fetching(&self) -> bool {
        self.subscription.state().is_fetching
    }

    /// Wait for the next settled page. States published while a fetch is
    /// in flight are skipped so a refresh yields one page, not two.
    pub async fn changed(&mut self) -> Option<QueuePage> {
        loop {
            let state = self.subscription.changed().await?;
            if state.is_fetching {
                continue;
            }
            if let Some(page) = self.render(&state) {
                return Some(page);
            }
        }
    }

    /// Wait until a loaded page satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&QueuePage) -> bool,
    ) -> Option<QueuePage> {
        let (list, page, page_size) = (self.list, self.page, self.page_size);
        let state = self
            .subscription
            .wait_for(|s| {
                s.data.as_deref().is_some_and(|data| {
                    predicate(&QueuePage::from_page(data, page, page_size, list.by_priority()))
                })
            })
            .await?;
        self.render(&state)
    }

    pub fn refresh(&self) {
        self.subscription.refresh();
    }

    pub fn stop(&self) {
        self.subscription.stop();
    }

    fn render(&self, state: &QueryState<Page<WorkflowInstance>>) -> Option<QueuePage> {
        state.data.as_deref().map(|data| {
            QueuePage::from_page(data, self.page, self.page_size, self.list.by_priority())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str, status: &str, user: Option<&str>) -> WorkflowInstance {
        serde_json::from_value(serde_json::json!({
            "instance_id": id,
            "workflow_id": "w-1",
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "assigned_user_id": user,
        }))
        .unwrap()
    }

    fn page(items: Vec<WorkflowInstance>, total: u64) -> Page<WorkflowInstance> {
        Page {
            items,
            total,
            page: 0,
            page_size: 10,
        }
    }

    #[test]
    fn assigned_to_me_rows_follow_status_priority() {
        let data = page(
            vec![
                instance("a", "completed", Some("u")),
                instance("b", "waiting_for_start", Some("u")),
                instance("c", "paused", Some("u")),
            ],
            3,
        );
        let mine = QueuePage::from_page(&data, 0, 10, true);
        let ids: Vec<&str> = mine.rows.iter().map(|r| r.instance.instance_id.as_str()).collect();
        // paused is not in the priority table, so it sorts after completed
        assert_eq!(ids, vec!["b", "a", "c"]);

        let pending = QueuePage::from_page(&data, 0, 10, false);
        assert_eq!(pending.rows[0].instance.instance_id, "a");
    }

    #[test]
    fn rows_carry_actions() {
        let data = page(vec![instance("x", "waiting_for_start", None)], 1);
        let rendered = QueuePage::from_page(&data, 0, 10, false);
        let actions = rendered.rows[0].actions;
        assert!(actions.quick_start);
        assert!(!actions.unassign);
        assert!(actions.view_details);
    }

    #[test]
    fn missing_paging_fields_fall_back_to_request() {
        let data = Page {
            items: vec![],
            total: 25,
            page: 0,
            page_size: 0,
        };
        let rendered = QueuePage::from_page(&data, 2, 10, false);
        assert_eq!(rendered.page, 2);
        assert_eq!(rendered.page_size, 10);
        assert_eq!(rendered.total_pages, 3);
        assert!(rendered.show_pagination());
    }
}
