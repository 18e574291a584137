pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::calendar_reschedule::{
    CalendarRescheduleService, DropResolution, DroppedEvent, RescheduleOutcome, RevertReason,
    TaskSchedulePersister, resolve_drop,
};
pub use application::commands::{
    AppState, TaskGroupResponse, TaskGroupsResponse, TaskListItem, calendar_events_impl,
    create_recurring_tasks_impl, list_notifications_impl, list_task_groups_impl,
    mark_notification_read_impl, notification_href_impl, reschedule_task_impl,
};
pub use domain::due_category::{DueCategory, classify_due_date, group_tasks_by_due_category};
pub use domain::formatting::{DisplayConfig, display_config, init_display_config};
pub use domain::models::{EntityType, NewTask, Notification, Recurrence, Task, TaskSchedule};
pub use domain::notification_router::notification_href;
pub use domain::recurrence::{MAX_OCCURRENCES, build_recurring_dates};
pub use infrastructure::error::InfraError;
