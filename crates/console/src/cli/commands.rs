use std::sync::Arc;

use anyhow::Result;
use civica_client::services::WorkflowListParams;
use civica_client::ApiClient;
use civica_core::catalog_view::CatalogView;
use civica_core::input::{FilePart, InputCollector};
use civica_core::models::{
    AdminDecision, AdminVerification, AssignmentListParams, Catalog, Category, Document,
    InstanceListParams, SortOrder, Team, TeamMember, User, WorkflowDefinition, WorkflowInstance,
};
use civica_core::progress::{AdminWorkflowProgress, StepState};
use civica_core::queue::QueueLens;
use civica_core::tracking::TrackingStage;
use civica_core::Timestamp;
use civica_query::QueryCache;
use serde::Serialize;
use tabled::Tabled;

use crate::catalog_browser::CatalogBrowser;
use crate::cli::args::{
    CatalogCommands, CategoryCommands, DecisionArg, DocumentCommands, InstanceCommands,
    LensArgs, Paging, QueueCommands, SubmitArgs, TeamCommands, UserCommands, WorkflowCommands,
};
use crate::cli::output::OutputManager;
use crate::config::ConsoleConfig;
use crate::error::CliError;
use crate::queue::{AssignmentQueue, QueuePage, QueueRow};
use crate::tracking::{InstanceTracker, TrackerSettings};

/// Everything a command handler needs.
pub struct Context {
    pub config: ConsoleConfig,
    pub client: ApiClient,
    pub cache: QueryCache,
    pub output: OutputManager,
}

impl Context {
    fn page_size(&self, paging: &Paging) -> u32 {
        paging
            .page_size
            .unwrap_or(self.config.default_page_size)
            .max(1)
    }

    fn queue(&self) -> AssignmentQueue {
        AssignmentQueue::new(&self.client, &self.cache, self.config.list_refetch())
    }

    fn tracker(&self, id: &str) -> InstanceTracker {
        InstanceTracker::mount(
            self.client.instances.clone(),
            &self.cache,
            id,
            TrackerSettings {
                poll_interval: self.config.track_poll_interval,
                submit_refresh_delay: self.config.submit_refresh_delay,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub workflow: String,
    pub status: String,
    pub step: String,
    pub assignee: String,
    pub updated_at: String,
}

impl From<&WorkflowInstance> for InstanceInfo {
    fn from(instance: &WorkflowInstance) -> Self {
        Self {
            instance_id: instance.instance_id.clone(),
            workflow: instance
                .workflow_name
                .clone()
                .unwrap_or_else(|| instance.workflow_id.clone()),
            status: instance.status.clone(),
            step: dash(instance.current_step.as_deref()),
            assignee: assignee(instance),
            updated_at: format_timestamp(&instance.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct QueueInfo {
    pub instance_id: String,
    pub workflow: String,
    pub status: String,
    pub assignee: String,
    pub actions: String,
}

impl From<&QueueRow> for QueueInfo {
    fn from(row: &QueueRow) -> Self {
        let a = row.actions;
        let actions: Vec<&str> = [
            (a.start, "start"),
            (a.quick_start, "quick-start"),
            (a.view_details, "details"),
            (a.assign_user, "assign-user"),
            (a.assign_team, "assign-team"),
            (a.unassign, "unassign"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        Self {
            instance_id: row.instance.instance_id.clone(),
            workflow: row
                .instance
                .workflow_name
                .clone()
                .unwrap_or_else(|| row.instance.workflow_id.clone()),
            status: row.instance.status.clone(),
            assignee: assignee(&row.instance),
            actions: actions.join(", "),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct ProgressInfo {
    pub instance_id: String,
    pub status: String,
    pub stage: String,
    pub step: String,
    pub progress: String,
    pub waiting_for: String,
}

impl ProgressInfo {
    fn new(progress: &AdminWorkflowProgress, stage: &TrackingStage) -> Self {
        Self {
            instance_id: progress.instance_id.clone(),
            status: progress.status.clone(),
            stage: describe_stage(stage),
            step: dash(
                progress
                    .current_step_name
                    .as_deref()
                    .or(progress.current_step.as_deref()),
            ),
            progress: format!(
                "{:.0}% ({}/{})",
                progress.progress_percentage, progress.completed_steps, progress.total_steps
            ),
            waiting_for: dash(progress.waiting_for.as_ref().map(|w| w.as_str())),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct StepInfo {
    #[tabled(rename = "#")]
    pub index: u32,
    pub step: String,
    pub state: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct CatalogInfo {
    pub id: String,
    pub name: String,
    pub source: String,
    pub active: bool,
    pub last_sync: String,
}

impl From<&Catalog> for CatalogInfo {
    fn from(catalog: &Catalog) -> Self {
        Self {
            id: catalog.id.clone(),
            name: catalog.name.clone(),
            source: catalog.source_type.as_str().to_string(),
            active: catalog.is_active,
            last_sync: catalog
                .last_sync_result
                .as_ref()
                .map(|s| {
                    let outcome = if s.success { "ok" } else { "failed" };
                    format!("{outcome}, {} rows", s.row_count)
                })
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct WorkflowInfo {
    pub id: String,
    pub name: String,
    pub category: String,
    pub steps: usize,
    pub active: bool,
}

impl From<&WorkflowDefinition> for WorkflowInfo {
    fn from(workflow: &WorkflowDefinition) -> Self {
        Self {
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            category: dash(workflow.category_id.as_deref()),
            steps: workflow.steps.len(),
            active: workflow.is_active,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub workflows: u64,
    pub active: bool,
}

impl From<&Category> for CategoryInfo {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            workflows: category.workflow_count,
            active: category.is_active,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct TeamInfo {
    pub id: String,
    pub name: String,
    pub members: usize,
    pub active: bool,
}

impl From<&Team> for TeamInfo {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            members: team.members.len(),
            active: team.is_active,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct MemberInfo {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl From<&TeamMember> for MemberInfo {
    fn from(member: &TeamMember) -> Self {
        Self {
            user_id: member.user_id.clone(),
            name: dash(member.full_name.as_deref()),
            role: format!("{:?}", member.role).to_lowercase(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub roles: String,
    pub active: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.display_name().to_string(),
            roles: user.roles.join(", "),
            active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct DocumentInfo {
    pub id: String,
    pub filename: String,
    pub status: String,
    pub uploaded_at: String,
}

impl From<&Document> for DocumentInfo {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            filename: doc.filename.clone(),
            status: doc.status.clone(),
            uploaded_at: doc
                .uploaded_at
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct StatInfo {
    pub metric: String,
    pub value: String,
}

// Helper functions
fn format_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn assignee(instance: &WorkflowInstance) -> String {
    match (&instance.assigned_user_id, &instance.assigned_team_id) {
        (Some(user), _) => format!("user:{user}"),
        (None, Some(team)) => format!("team:{team}"),
        (None, None) => "-".to_string(),
    }
}

fn describe_stage(stage: &TrackingStage) -> String {
    match stage {
        TrackingStage::AwaitingStart => "awaiting start".to_string(),
        TrackingStage::Running => "running".to_string(),
        TrackingStage::AwaitingInput(request) => {
            format!("awaiting {:?} input", request.kind()).to_lowercase()
        }
        TrackingStage::Finished(terminal) => format!("finished ({terminal:?})").to_lowercase(),
        TrackingStage::Other(status) => status.clone(),
    }
}

/// Split a `KEY=VALUE` argument.
fn split_pair(raw: &str) -> Result<(&str, &str), CliError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim(), value))
        .ok_or_else(|| CliError::InvalidInput(format!("Expected KEY=VALUE, got '{raw}'")))
}

async fn read_file_part(field: &str, path: &str) -> Result<FilePart, CliError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| field.to_string());
    Ok(FilePart {
        field: field.to_string(),
        filename,
        content_type: None,
        bytes,
    })
}

/// Apply submit arguments to the mounted input component.
pub async fn fill_collector(collector: &mut InputCollector, args: &SubmitArgs) -> Result<(), CliError> {
    match collector {
        InputCollector::Form(form) => {
            for raw in &args.fields {
                let (name, value) = split_pair(raw)?;
                form.set_value(name, value)?;
            }
            for raw in &args.files {
                let (field, path) = split_pair(raw)?;
                form.attach_file(read_file_part(field, path).await?)?;
            }
        }
        InputCollector::Signature(signature) => {
            for raw in &args.fields {
                let (name, value) = split_pair(raw)?;
                signature.set_value(name, value)?;
            }
            if let Some(data) = &args.signature {
                signature.sign(data.clone());
            }
            signature.accept_terms(args.accept_terms);
        }
        InputCollector::ContextValidation(validation) => {
            for key in &args.confirmed {
                validation.confirm(key)?;
            }
            match args.decision {
                Some(DecisionArg::Approve) => validation.approve(args.comments.clone()),
                Some(DecisionArg::Reject) => validation.reject(args.comments.clone()),
                None => {}
            }
        }
        InputCollector::Selection(selection) => {
            for raw in &args.selections {
                let row: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
                selection.toggle(row)?;
            }
            if let Some(message) = selection.blocking_message() {
                return Err(CliError::InvalidInput(message));
            }
        }
    }
    Ok(())
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Instance command handlers
// ---------------------------------------------------------------------------

pub async fn handle_instance_command(ctx: &Context, command: &InstanceCommands) -> Result<()> {
    let output = &ctx.output;

    match command {
        InstanceCommands::List {
            status,
            workflow_id,
            search,
            paging,
        } => {
            let params = InstanceListParams {
                status: status.clone(),
                workflow_id: workflow_id.clone(),
                search: search.clone(),
                page: paging.page,
                page_size: ctx.page_size(paging),
            };
            let page = ctx
                .client
                .instances
                .list(&params)
                .await
                .map_err(CliError::from)?;
            let rows: Vec<InstanceInfo> = page.items.iter().map(InstanceInfo::from).collect();
            output.print_list(&rows)?;
            output.print_notice(&format!(
                "Page {} of {} ({} instances)",
                page.page + 1,
                page.total_pages().max(1),
                page.total
            ));
        }

        InstanceCommands::Get { id } => {
            let instance = ctx.client.instances.get(id).await.map_err(CliError::from)?;
            output.print_item(&InstanceInfo::from(&instance))?;
        }

        InstanceCommands::Track { id, watch } => {
            let mut tracker = ctx.tracker(id);
            let progress = tracker.loaded().await.map_err(CliError::from)?;
            print_progress(output, &progress)?;

            if *watch {
                loop {
                    if tracker.stage().map(|s| s.is_finished()).unwrap_or(false) {
                        break;
                    }
                    let state = tokio::select! {
                        _ = ctrl_c() => break,
                        state = tracker.changed() => match state {
                            Some(state) => state,
                            None => break,
                        },
                    };
                    if state.is_fetching {
                        continue;
                    }
                    match (&state.data, &state.error) {
                        (_, Some(error)) => output.print_error(&error.to_string()),
                        (Some(progress), None) => print_progress(output, progress)?,
                        (None, None) => {}
                    }
                }
            }
            tracker.stop();
        }

        InstanceCommands::Start { id } => {
            let mut tracker = ctx.tracker(id);
            tracker.loaded().await.map_err(CliError::from)?;
            tracker.start().await.map_err(CliError::from)?;
            output.print_success_message(&format!("Instance '{id}' started"));
            tracker.stop();
        }

        InstanceCommands::Cancel { id, reason } => {
            let response = ctx
                .client
                .instances
                .cancel(id, reason.as_deref())
                .await
                .map_err(CliError::from)?;
            ctx.cache.invalidate_operation(crate::keys::INSTANCES);
            output.print_json(&response)?;
            output.print_success_message(&format!("Instance '{id}' cancelled"));
        }

        InstanceCommands::Submit(args) => {
            let mut tracker = ctx.tracker(&args.id);
            tracker.loaded().await.map_err(CliError::from)?;
            let mut collector = tracker.input_collector().map_err(CliError::from)?;
            fill_collector(&mut collector, args).await?;

            let submitted_at = tokio::time::Instant::now();
            let response = tracker.submit(&collector).await.map_err(CliError::from)?;
            output.print_json(&response)?;
            output.print_success_message("Input submitted");

            if args.wait {
                if let Some(progress) = tracker.refreshed_since(submitted_at).await {
                    print_progress(output, &progress)?;
                }
            }
            tracker.stop();
        }
    }

    Ok(())
}

fn print_progress(output: &OutputManager, progress: &AdminWorkflowProgress) -> Result<()> {
    if let Err(e) = progress.validate() {
        tracing::warn!(instance_id = %progress.instance_id, error = %e, "Inconsistent progress");
    }
    let stage = TrackingStage::from_progress(progress).map_err(CliError::from)?;
    output.print_item(&ProgressInfo::new(progress, &stage))?;
    let steps: Vec<StepInfo> = progress
        .stepper()
        .into_iter()
        .map(|entry| StepInfo {
            index: entry.index,
            step: entry.label,
            state: match entry.state {
                StepState::Completed => "done",
                StepState::Current => "current",
                StepState::Pending => "pending",
            }
            .to_string(),
        })
        .collect();
    if !steps.is_empty() {
        output.print_list(&steps)?;
    }
    if let Some(error) = &progress.error_message {
        output.print_error(error);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Queue command handlers
// ---------------------------------------------------------------------------

pub async fn handle_queue_command(ctx: &Context, command: &QueueCommands) -> Result<()> {
    let output = &ctx.output;
    let queue = ctx.queue();

    match command {
        QueueCommands::Pending(args) => show_lens(ctx, &queue, QueueLens::Pending, args).await?,
        QueueCommands::Mine(args) => show_lens(ctx, &queue, QueueLens::AssignedToMe, args).await?,

        QueueCommands::Assign {
            instance_id,
            user,
            team,
            notes,
        } => {
            let assignment = match (user, team) {
                (Some(user), _) => queue.assign_user(instance_id, user, notes.clone()).await,
                (None, Some(team)) => queue.assign_team(instance_id, team, notes.clone()).await,
                (None, None) => {
                    return Err(CliError::InvalidInput("Pass --user or --team".into()).into())
                }
            }
            .map_err(CliError::from)?;
            output.print_json(&serde_json::to_value(&assignment)?)?;
            output.print_success_message(&format!("Instance '{instance_id}' assigned"));
        }

        QueueCommands::Unassign { instance_id } => {
            queue.unassign(instance_id).await.map_err(CliError::from)?;
            output.print_success_message(&format!("Instance '{instance_id}' unassigned"));
        }

        QueueCommands::Start { instance_id } => {
            queue.start(instance_id).await.map_err(CliError::from)?;
            output.print_success_message(&format!("Instance '{instance_id}' started"));
        }

        QueueCommands::QuickStart { instance_id } => {
            queue.quick_start(instance_id).await.map_err(CliError::from)?;
            output.print_success_message(&format!("Instance '{instance_id}' taken and started"));
        }
    }

    Ok(())
}

async fn show_lens(
    ctx: &Context,
    queue: &AssignmentQueue,
    lens: QueueLens,
    args: &LensArgs,
) -> Result<()> {
    let mut params = AssignmentListParams {
        status: args.status.clone(),
        search: args.search.clone(),
        page: args.paging.page,
        page_size: ctx.page_size(&args.paging),
    };

    let page = queue
        .load_clamped(lens, &mut params)
        .await
        .map_err(CliError::from)?;
    if !args.watch {
        return print_queue_page(&ctx.output, &page);
    }

    let mut view = queue.watch(lens, params);
    loop {
        let page = tokio::select! {
            _ = ctrl_c() => break,
            page = view.changed() => match page {
                Some(page) => page,
                None => break,
            },
        };
        if let Some(error) = view.error() {
            ctx.output.print_error(&error);
        }
        print_queue_page(&ctx.output, &page)?;
    }
    view.stop();
    Ok(())
}

fn print_queue_page(output: &OutputManager, page: &QueuePage) -> Result<()> {
    let rows: Vec<QueueInfo> = page.rows.iter().map(QueueInfo::from).collect();
    output.print_list(&rows)?;
    if page.show_pagination() {
        output.print_notice(&format!(
            "Page {} of {} ({} instances)",
            page.page + 1,
            page.total_pages,
            page.total
        ));
    }
    Ok(())
}

pub async fn handle_inbox(ctx: &Context, paging: &Paging, watch: bool) -> Result<()> {
    let queue = ctx.queue();
    let page_size = ctx.page_size(paging);
    let mut page_index = paging.page;

    let page = queue
        .load_inbox_clamped(&mut page_index, page_size)
        .await
        .map_err(CliError::from)?;
    if !watch {
        return print_queue_page(&ctx.output, &page);
    }

    let mut view = queue.watch_inbox(page_index, page_size);
    loop {
        let page = tokio::select! {
            _ = ctrl_c() => break,
            page = view.changed() => match page {
                Some(page) => page,
                None => break,
            },
        };
        print_queue_page(&ctx.output, &page)?;
    }
    view.stop();
    Ok(())
}

pub async fn handle_stats(ctx: &Context) -> Result<()> {
    let stats = ctx.client.admin.stats().await.map_err(CliError::from)?;
    let mut rows = vec![
        ("total_instances", stats.total_instances),
        ("pending_assignment", stats.pending_assignment),
        ("in_progress", stats.in_progress),
        ("requires_action", stats.requires_action),
        ("completed", stats.completed),
    ]
    .into_iter()
    .map(|(metric, value)| StatInfo {
        metric: metric.to_string(),
        value: value.to_string(),
    })
    .collect::<Vec<_>>();
    rows.extend(stats.extra.iter().map(|(metric, value)| StatInfo {
        metric: metric.clone(),
        value: value.to_string(),
    }));
    ctx.output.print_list(&rows)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog command handlers
// ---------------------------------------------------------------------------

pub async fn handle_catalog_command(ctx: &Context, command: &CatalogCommands) -> Result<()> {
    let output = &ctx.output;

    match command {
        CatalogCommands::List => {
            let catalogs = ctx.client.catalogs.list().await.map_err(CliError::from)?;
            let rows: Vec<CatalogInfo> = catalogs.iter().map(CatalogInfo::from).collect();
            output.print_list(&rows)?;
        }

        CatalogCommands::Get { id } => {
            let catalog = ctx.client.catalogs.get(id).await.map_err(CliError::from)?;
            output.print_json(&serde_json::to_value(&catalog)?)?;
        }

        CatalogCommands::Sync { id } => {
            let result = ctx.client.catalogs.sync(id).await.map_err(CliError::from)?;
            output.print_json(&serde_json::to_value(&result)?)?;
            if result.success {
                output.print_success_message(&format!(
                    "Catalog '{id}' synced: {} rows in {} ms",
                    result.row_count, result.duration_ms
                ));
            } else {
                output.print_error(result.error_message.as_deref().unwrap_or("Sync failed"));
            }
        }

        CatalogCommands::Browse {
            id,
            search,
            filters,
            sort,
            desc,
            page,
            page_size,
        } => {
            let mut view = CatalogView::new(
                page_size.unwrap_or(civica_core::pagination::DEFAULT_CATALOG_PAGE_SIZE),
            );
            if let Some(search) = search {
                view.set_search(search.clone());
            }
            for raw in filters {
                let (column, value) = split_pair(raw)?;
                view.set_filter(column, value);
            }
            if let Some(column) = sort {
                view.toggle_sort(column.clone());
                if *desc && view.sort().map(|(_, o)| o) == Some(SortOrder::Asc) {
                    view.toggle_sort(column.clone());
                }
            }
            view.set_page(*page);

            let browser = CatalogBrowser::open(
                Arc::new(ctx.client.catalogs.clone()),
                id.clone(),
                view,
                ctx.config.search_debounce,
                ctx.cache.cancellation_token(),
            );
            let state = browser
                .settled()
                .await
                .ok_or_else(|| CliError::InvalidInput("Catalog browser closed".into()))?;
            browser.close();

            if let Some(error) = state.error {
                return Err(CliError::InvalidInput(error).into());
            }
            let Some(data) = state.page.as_deref() else {
                return Ok(());
            };
            output.print_records(&data.rows)?;
            if state.show_pagination() {
                output.print_notice(&format!(
                    "Page {} of {} ({} rows)",
                    state.view.page(),
                    state.total_pages(),
                    data.total_count
                ));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Directory command handlers
// ---------------------------------------------------------------------------

pub async fn handle_workflow_command(ctx: &Context, command: &WorkflowCommands) -> Result<()> {
    let output = &ctx.output;

    match command {
        WorkflowCommands::List {
            category_id,
            active,
        } => {
            let params = WorkflowListParams {
                category_id: category_id.clone(),
                is_active: *active,
            };
            let workflows = ctx.client.workflows.list(&params).await.map_err(CliError::from)?;
            let rows: Vec<WorkflowInfo> = workflows.iter().map(WorkflowInfo::from).collect();
            output.print_list(&rows)?;
        }

        WorkflowCommands::Instantiate { id, context } => {
            let context: serde_json::Value = serde_json::from_str(context).map_err(CliError::from)?;
            if !context.is_object() {
                return Err(CliError::InvalidInput("Context must be a JSON object".into()).into());
            }
            let instance = ctx
                .client
                .workflows
                .instantiate(id, &context)
                .await
                .map_err(CliError::from)?;
            ctx.cache.invalidate_operation(crate::keys::INSTANCES);
            output.print_item(&InstanceInfo::from(&instance))?;
            output.print_success_message(&format!(
                "Instance '{}' created",
                instance.instance_id
            ));
        }
    }

    Ok(())
}

pub async fn handle_category_command(ctx: &Context, command: &CategoryCommands) -> Result<()> {
    match command {
        CategoryCommands::List => {
            let categories = ctx.client.categories.list().await.map_err(CliError::from)?;
            let rows: Vec<CategoryInfo> = categories.iter().map(CategoryInfo::from).collect();
            ctx.output.print_list(&rows)?;
        }
    }
    Ok(())
}

pub async fn handle_team_command(ctx: &Context, command: &TeamCommands) -> Result<()> {
    match command {
        TeamCommands::List => {
            let teams = ctx.client.teams.list().await.map_err(CliError::from)?;
            let rows: Vec<TeamInfo> = teams.iter().map(TeamInfo::from).collect();
            ctx.output.print_list(&rows)?;
        }
        TeamCommands::Members { id } => {
            let members = ctx.client.teams.members(id).await.map_err(CliError::from)?;
            let rows: Vec<MemberInfo> = members.iter().map(MemberInfo::from).collect();
            ctx.output.print_list(&rows)?;
        }
    }
    Ok(())
}

pub async fn handle_user_command(ctx: &Context, command: &UserCommands) -> Result<()> {
    match command {
        UserCommands::List => {
            let users = ctx.client.users.list().await.map_err(CliError::from)?;
            let rows: Vec<UserInfo> = users.iter().map(UserInfo::from).collect();
            ctx.output.print_list(&rows)?;
        }
        UserCommands::Me => {
            let user = ctx.client.users.me().await.map_err(CliError::from)?;
            ctx.output.print_item(&UserInfo::from(&user))?;
        }
    }
    Ok(())
}

pub async fn handle_document_command(ctx: &Context, command: &DocumentCommands) -> Result<()> {
    let output = &ctx.output;

    match command {
        DocumentCommands::List { instance_id } => {
            let docs = ctx
                .client
                .documents
                .list_for_instance(instance_id)
                .await
                .map_err(CliError::from)?;
            let rows: Vec<DocumentInfo> = docs.iter().map(DocumentInfo::from).collect();
            output.print_list(&rows)?;
        }

        DocumentCommands::Upload {
            instance_id,
            path,
            content_type,
        } => {
            let path_str = path.to_string_lossy();
            let mut file = read_file_part("file", &path_str).await?;
            file.content_type = content_type.clone();
            let doc = ctx
                .client
                .documents
                .upload(instance_id, file)
                .await
                .map_err(CliError::from)?;
            output.print_item(&DocumentInfo::from(&doc))?;
        }

        DocumentCommands::Analyze { id } => {
            let analysis = ctx.client.documents.analyze(id).await.map_err(CliError::from)?;
            output.print_json(&serde_json::to_value(&analysis)?)?;
        }

        DocumentCommands::Verify {
            id,
            decision,
            comments,
        } => {
            let decision = match decision {
                DecisionArg::Approve => AdminDecision::Approve,
                DecisionArg::Reject => AdminDecision::Reject,
            };
            let verification =
                AdminVerification::new(decision, comments.clone()).map_err(CliError::from)?;
            let doc = ctx
                .client
                .documents
                .admin_verify(id, &verification)
                .await
                .map_err(CliError::from)?;
            output.print_item(&DocumentInfo::from(&doc))?;
        }
    }

    Ok(())
}
