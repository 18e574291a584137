pub mod bootstrap;
pub mod calendar_reschedule;
pub mod commands;
pub mod notification_feed;
pub mod recurring_tasks;
pub mod task_calendar;
