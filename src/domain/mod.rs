pub mod due_category;
pub mod formatting;
pub mod models;
pub mod notification_router;
pub mod recurrence;
