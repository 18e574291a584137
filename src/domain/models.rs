use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Surrogate,
    IntendedParent,
    Task,
    Appointment,
    Case,
    Match,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub entity_type: EntityType,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Meeting,
    FollowUp,
    Contact,
    Review,
    Medication,
    Exam,
    Appointment,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    pub task_type: TaskType,
    #[serde(default)]
    pub case_id: Option<String>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        if let Some(due_date) = self.due_date.as_deref() {
            validate_date(due_date, "task.due_date")?;
        }
        if let Some(due_time) = self.due_time.as_deref() {
            validate_time(due_time, "task.due_time")?;
            if self.due_date.is_none() {
                return Err("task.due_time requires task.due_date".to_string());
            }
        }
        Ok(())
    }

    pub fn schedule(&self) -> Option<TaskSchedule> {
        self.due_date.as_ref().map(|due_date| TaskSchedule {
            due_date: due_date.clone(),
            due_time: self.due_time.clone(),
        })
    }

    pub fn apply_schedule(&mut self, schedule: &TaskSchedule) {
        self.due_date = Some(schedule.due_date.clone());
        self.due_time = schedule.due_time.clone();
    }
}

/// Due date and optional time-of-day persisted when a task is moved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSchedule {
    pub due_date: String,
    pub due_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "new_task.title")?;
        if let Some(due_date) = self.due_date.as_deref() {
            validate_date(due_date, "new_task.due_date")?;
        }
        if let Some(due_time) = self.due_time.as_deref() {
            validate_time(due_time, "new_task.due_time")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("invalid recurrence value: {other}")),
        }
    }
}

pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_due_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    parse_due_date(value).ok_or_else(|| format!("{field_name} must be YYYY-MM-DD"))?;
    Ok(())
}

fn validate_time(value: &str, field_name: &str) -> Result<(), String> {
    parse_due_time(value).ok_or_else(|| format!("{field_name} must be HH:MM or HH:MM:SS"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: "task-1".to_string(),
            title: "Schedule transfer consult".to_string(),
            description: None,
            due_date: Some("2026-03-05".to_string()),
            due_time: Some("14:00:00".to_string()),
            is_completed: false,
            task_type: TaskType::Meeting,
            case_id: Some("surrogate-1".to_string()),
        }
    }

    #[test]
    fn task_validate_accepts_valid_task() {
        assert!(sample_task().validate().is_ok());
    }

    #[test]
    fn task_validate_rejects_bad_date_and_orphan_time() {
        let mut task = sample_task();
        task.due_date = Some("03/05/2026".to_string());
        assert!(task.validate().is_err());

        let mut task = sample_task();
        task.due_date = None;
        assert!(task.validate().is_err());
    }

    #[test]
    fn notification_deserializes_backend_payload() {
        let payload = serde_json::json!({
            "id": "n-1",
            "type": "task_assigned",
            "title": "New task",
            "entity_type": "intended_parent",
            "entity_id": "ip-7",
            "read_at": null,
            "created_at": "2026-02-16T09:00:00Z"
        });
        let notification: Notification = serde_json::from_value(payload).expect("deserialize");

        assert_eq!(notification.notification_type, "task_assigned");
        assert_eq!(notification.entity_type, EntityType::IntendedParent);
        assert_eq!(notification.entity_id.as_deref(), Some("ip-7"));
        assert!(!notification.is_read());
    }

    #[test]
    fn unknown_enum_values_fall_back_to_other() {
        let entity: EntityType = serde_json::from_str("\"zapier_webhook\"").expect("entity");
        let task_type: TaskType = serde_json::from_str("\"paperwork\"").expect("task type");
        assert_eq!(entity, EntityType::Other);
        assert_eq!(task_type, TaskType::Other);
    }

    #[test]
    fn recurrence_parses_form_values() {
        assert_eq!("Weekly".parse::<Recurrence>(), Ok(Recurrence::Weekly));
        assert_eq!("".parse::<Recurrence>(), Ok(Recurrence::None));
        assert!("yearly".parse::<Recurrence>().is_err());
        assert_eq!(Recurrence::Monthly.to_string(), "monthly");
    }

    #[test]
    fn parse_due_time_accepts_both_precisions() {
        assert_eq!(parse_due_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_due_time("09:30:15"), NaiveTime::from_hms_opt(9, 30, 15));
        assert_eq!(parse_due_time("9.30"), None);
    }

    #[test]
    fn apply_schedule_overwrites_date_and_time() {
        let mut task = sample_task();
        task.apply_schedule(&TaskSchedule {
            due_date: "2026-03-09".to_string(),
            due_time: None,
        });
        assert_eq!(task.due_date.as_deref(), Some("2026-03-09"));
        assert_eq!(task.due_time, None);
    }
}
