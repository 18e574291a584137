use crate::application::bootstrap::bootstrap_workspace;
use crate::application::calendar_reschedule::{
    ApiSchedulePersister, CalendarRescheduleService, DroppedEvent, RescheduleOutcome,
};
use crate::application::notification_feed::{NotificationFeed, build_notification_feed};
use crate::application::recurring_tasks::{RecurringTaskPlanner, RecurringTaskRequest};
use crate::application::task_calendar::{CalendarEvent, build_calendar_events};
use crate::domain::due_category::{DueCategory, group_tasks_by_due_category};
use crate::domain::formatting::{DisplayConfig, display_config, init_display_config};
use crate::domain::models::{NewTask, Notification, Recurrence, Task, parse_due_date};
use crate::domain::notification_router::notification_href;
use crate::infrastructure::api_client::{CrmApiClient, ReqwestCrmApiClient, TaskListQuery};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::task_cache::{InMemoryTaskCacheRepository, TaskCacheRepository};
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const NOTIFICATION_PAGE_LIMIT: u32 = 50;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AppState<C = ReqwestCrmApiClient>
where
    C: CrmApiClient + 'static,
{
    config_dir: PathBuf,
    config: AppConfig,
    client: Arc<C>,
    task_cache: Arc<InMemoryTaskCacheRepository>,
    display: &'static DisplayConfig,
    now_provider: NowProvider,
}

impl AppState<ReqwestCrmApiClient> {
    /// Bootstraps the workspace, starts logging and connects to the backend.
    pub fn new(workspace_root: &Path, access_token: &str) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(workspace_root)?;
        // Another workspace in this process may already own the logger.
        if let Err(error) = init_logging(&bootstrap.config.log_level, &bootstrap.logs_dir) {
            warn!("event=logging_init status=skipped reason={error}");
        }

        let client = Arc::new(ReqwestCrmApiClient::new(
            bootstrap.config.api_base_url.clone(),
            access_token,
        ));
        info!(
            "event=app_state_ready app={} timezone={} api={}",
            bootstrap.config.app_name,
            bootstrap.config.timezone.name(),
            bootstrap.config.api_base_url
        );
        Ok(Self::with_client(bootstrap.config_dir, bootstrap.config, client))
    }
}

impl<C> AppState<C>
where
    C: CrmApiClient + 'static,
{
    pub fn with_client(config_dir: PathBuf, config: AppConfig, client: Arc<C>) -> Self {
        if !init_display_config(config.timezone) {
            warn!(
                "event=display_config status=conflict requested={} active={}",
                config.timezone.name(),
                display_config().timezone.name()
            );
        }
        Self {
            config_dir,
            config,
            client,
            task_cache: Arc::new(InMemoryTaskCacheRepository::default()),
            display: display_config(),
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        log_command_failure(command, error);
        error.to_string()
    }

    fn today(&self) -> NaiveDate {
        (self.now_provider)()
            .with_timezone(&self.config.timezone)
            .date_naive()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskGroupResponse {
    pub category: DueCategory,
    pub label: &'static str,
    pub badge: &'static str,
    pub tasks: Vec<TaskListItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskGroupsResponse {
    pub groups: Vec<TaskGroupResponse>,
    pub completed_count: usize,
}

pub fn notification_href_impl(notification: &Notification) -> String {
    notification_href(notification)
}

pub async fn list_notifications_impl<C>(state: &AppState<C>) -> Result<NotificationFeed, InfraError>
where
    C: CrmApiClient + 'static,
{
    let page = state
        .client
        .list_notifications(NOTIFICATION_PAGE_LIMIT)
        .await
        .inspect_err(|error| log_command_failure("list_notifications", error))?;
    let feed = build_notification_feed(page, state.display, (state.now_provider)());
    info!(
        "event=command_ok command=list_notifications count={} unread={}",
        feed.items.len(),
        feed.unread_count
    );
    Ok(feed)
}

pub async fn mark_notification_read_impl<C>(
    state: &AppState<C>,
    notification_id: String,
) -> Result<bool, InfraError>
where
    C: CrmApiClient + 'static,
{
    let notification_id = notification_id.trim();
    if notification_id.is_empty() {
        let error = InfraError::InvalidInput("notification_id must not be empty".to_string());
        log_command_failure("mark_notification_read", &error);
        return Err(error);
    }
    state
        .client
        .mark_notification_read(notification_id)
        .await
        .inspect_err(|error| log_command_failure("mark_notification_read", error))?;
    info!("event=command_ok command=mark_notification_read notification_id={notification_id}");
    Ok(true)
}

pub async fn list_task_groups_impl<C>(state: &AppState<C>) -> Result<TaskGroupsResponse, InfraError>
where
    C: CrmApiClient + 'static,
{
    let tasks = state
        .client
        .list_my_tasks(TaskListQuery {
            include_completed: true,
            ..TaskListQuery::default()
        })
        .await
        .inspect_err(|error| log_command_failure("list_task_groups", error))?;
    let grouped = group_tasks_by_due_category(tasks, state.today());

    let groups = grouped
        .groups
        .into_iter()
        .map(|group| {
            let style = group.category.style();
            TaskGroupResponse {
                category: group.category,
                label: style.label,
                badge: style.badge,
                tasks: group
                    .tasks
                    .into_iter()
                    .map(|task| TaskListItem {
                        due_label: task
                            .due_date
                            .as_deref()
                            .map(|due_date| state.display.format_due_label(due_date, task.due_time.as_deref())),
                        task,
                    })
                    .collect(),
            }
        })
        .collect();

    let response = TaskGroupsResponse {
        groups,
        completed_count: grouped.completed_count,
    };
    info!(
        "event=command_ok command=list_task_groups groups={} completed={}",
        response.groups.len(),
        response.completed_count
    );
    Ok(response)
}

pub async fn calendar_events_impl<C>(
    state: &AppState<C>,
    range_start: String,
    range_end: String,
) -> Result<Vec<CalendarEvent>, InfraError>
where
    C: CrmApiClient + 'static,
{
    load_calendar_events(state, &range_start, &range_end)
        .await
        .inspect_err(|error| log_command_failure("calendar_events", error))
}

async fn load_calendar_events<C>(
    state: &AppState<C>,
    range_start: &str,
    range_end: &str,
) -> Result<Vec<CalendarEvent>, InfraError>
where
    C: CrmApiClient + 'static,
{
    let range_start = parse_date_arg(range_start, "range_start")?;
    let range_end = parse_date_arg(range_end, "range_end")?;
    if range_end < range_start {
        return Err(InfraError::InvalidInput(
            "range_end must not be before range_start".to_string(),
        ));
    }

    let tasks = state
        .client
        .list_my_tasks(TaskListQuery {
            include_completed: true,
            due_after: Some(range_start),
            due_before: Some(range_end),
        })
        .await?;
    state.task_cache.replace_all(&tasks)?;

    let events = build_calendar_events(
        &tasks,
        range_start,
        range_end,
        state.today(),
        state.config.timezone,
    );
    info!(
        "event=command_ok command=calendar_events range_start={range_start} range_end={range_end} events={}",
        events.len()
    );
    Ok(events)
}

pub async fn reschedule_task_impl<C>(
    state: &AppState<C>,
    task_id: String,
    dropped: DroppedEvent,
) -> RescheduleOutcome
where
    C: CrmApiClient + 'static,
{
    let persister = Arc::new(ApiSchedulePersister::new(Arc::clone(&state.client)));
    let outcome = CalendarRescheduleService::new(Arc::clone(&state.task_cache), state.config.timezone)
        .with_persister(persister)
        .reschedule(&task_id, &dropped)
        .await;
    match &outcome {
        RescheduleOutcome::Persisted(task) => info!(
            "event=command_ok command=reschedule_task task_id={} due_date={}",
            task.id,
            task.due_date.as_deref().unwrap_or("none")
        ),
        RescheduleOutcome::Reverted { reason } => error!(
            "event=command_failed command=reschedule_task task_id={task_id} reason={reason:?}"
        ),
    }
    outcome
}

pub async fn create_recurring_tasks_impl<C>(
    state: &AppState<C>,
    draft: NewTask,
    start: String,
    end: String,
    recurrence: String,
) -> Result<Vec<Task>, InfraError>
where
    C: CrmApiClient + 'static,
{
    create_recurring_tasks(state, draft, &start, &end, &recurrence)
        .await
        .inspect_err(|error| log_command_failure("create_recurring_tasks", error))
}

async fn create_recurring_tasks<C>(
    state: &AppState<C>,
    draft: NewTask,
    start: &str,
    end: &str,
    recurrence: &str,
) -> Result<Vec<Task>, InfraError>
where
    C: CrmApiClient + 'static,
{
    let request = RecurringTaskRequest {
        draft,
        start: parse_date_arg(start, "start")?,
        end: parse_date_arg(end, "end")?,
        recurrence: recurrence
            .parse::<Recurrence>()
            .map_err(InfraError::InvalidInput)?,
    };

    let created = RecurringTaskPlanner::new(Arc::clone(&state.client))
        .create(&request)
        .await?;
    for task in &created {
        state.task_cache.upsert(task)?;
    }
    info!(
        "event=command_ok command=create_recurring_tasks recurrence={} count={}",
        request.recurrence,
        created.len()
    );
    Ok(created)
}

fn log_command_failure(command: &str, error: &InfraError) {
    error!("{}", command_failure_message(command, error));
}

fn command_failure_message(command: &str, error: &InfraError) -> String {
    format!("event=command_failed command={command} error={error}")
}

fn parse_date_arg(value: &str, field: &str) -> Result<NaiveDate, InfraError> {
    parse_due_date(value)
        .ok_or_else(|| InfraError::InvalidInput(format!("{field} must be YYYY-MM-DD: {value}")))
}
