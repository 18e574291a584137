use crate::domain::models::{Task, TaskSchedule};
use crate::infrastructure::api_client::CrmApiClient;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::task_cache::TaskCacheRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

/// Where the calendar says a dragged task landed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedEvent {
    pub start: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub was_all_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResolution {
    Reschedule(TaskSchedule),
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    NoDropTarget,
    NoPersister,
    UnknownTask,
    CacheFailed(String),
    PersistFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescheduleOutcome {
    Persisted(Task),
    Reverted { reason: RevertReason },
}

/// Translates a drop into the schedule to persist.
///
/// The date comes from the local calendar fields of the drop instant. A timed
/// drop takes its local time-of-day, a timed task dropped into the all-day row
/// loses its time, and an all-day move keeps whatever time the task had.
pub fn resolve_drop(event: &DroppedEvent, task: &Task, timezone: Tz) -> DropResolution {
    let Some(start) = event.start else {
        return DropResolution::Revert;
    };
    let local = start.with_timezone(&timezone);
    let due_date = local.format("%Y-%m-%d").to_string();

    let due_time = if !event.all_day {
        Some(local.format("%H:%M:00").to_string())
    } else if !event.was_all_day {
        None
    } else {
        task.due_time.clone()
    };

    DropResolution::Reschedule(TaskSchedule { due_date, due_time })
}

#[async_trait]
pub trait TaskSchedulePersister: Send + Sync {
    async fn persist(&self, task_id: &str, schedule: &TaskSchedule) -> Result<(), InfraError>;
}

/// Persists reschedules through the backend task endpoint.
pub struct ApiSchedulePersister<C: CrmApiClient> {
    client: Arc<C>,
}

impl<C: CrmApiClient> ApiSchedulePersister<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: CrmApiClient> TaskSchedulePersister for ApiSchedulePersister<C> {
    async fn persist(&self, task_id: &str, schedule: &TaskSchedule) -> Result<(), InfraError> {
        self.client.update_task_schedule(task_id, schedule).await.map(|_| ())
    }
}

pub struct CalendarRescheduleService<R>
where
    R: TaskCacheRepository,
{
    cache: Arc<R>,
    persister: Option<Arc<dyn TaskSchedulePersister>>,
    timezone: Tz,
}

impl<R> CalendarRescheduleService<R>
where
    R: TaskCacheRepository,
{
    pub fn new(cache: Arc<R>, timezone: Tz) -> Self {
        Self {
            cache,
            persister: None,
            timezone,
        }
    }

    pub fn with_persister(mut self, persister: Arc<dyn TaskSchedulePersister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Moves a cached task and persists the move once.
    ///
    /// The cache is updated before the backend call and restored if that call
    /// fails, unless a newer move has replaced the entry in the meantime.
    /// Failures come back as `Reverted`; nothing is retried.
    pub async fn reschedule(&self, task_id: &str, event: &DroppedEvent) -> RescheduleOutcome {
        let original = match self.cache.get_by_id(task_id) {
            Ok(Some(task)) => task,
            Ok(None) => return self.revert(task_id, RevertReason::UnknownTask),
            Err(error) => return self.revert(task_id, RevertReason::CacheFailed(error.to_string())),
        };

        let schedule = match resolve_drop(event, &original, self.timezone) {
            DropResolution::Reschedule(schedule) => schedule,
            DropResolution::Revert => return self.revert(task_id, RevertReason::NoDropTarget),
        };

        let Some(persister) = self.persister.as_ref() else {
            return self.revert(task_id, RevertReason::NoPersister);
        };

        let mut moved = original.clone();
        moved.apply_schedule(&schedule);
        if let Err(error) = self.cache.upsert(&moved) {
            return self.revert(task_id, RevertReason::CacheFailed(error.to_string()));
        }

        match persister.persist(&original.id, &schedule).await {
            Ok(()) => {
                info!(
                    "event=task_rescheduled task_id={} due_date={} due_time={}",
                    original.id,
                    schedule.due_date,
                    schedule.due_time.as_deref().unwrap_or("none")
                );
                RescheduleOutcome::Persisted(moved)
            }
            Err(error) => {
                // A later move of the same task may already own the cache entry.
                let reason = match self.cache.replace_if_current(&moved, &original) {
                    Ok(_) => RevertReason::PersistFailed(error.to_string()),
                    Err(cache_error) => RevertReason::CacheFailed(format!(
                        "{error}; restoring cached task failed: {cache_error}"
                    )),
                };
                self.revert(task_id, reason)
            }
        }
    }

    fn revert(&self, task_id: &str, reason: RevertReason) -> RescheduleOutcome {
        warn!("event=task_reschedule_reverted task_id={task_id} reason={reason:?}");
        RescheduleOutcome::Reverted { reason }
    }
}
