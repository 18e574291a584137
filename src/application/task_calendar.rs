use crate::domain::due_category::{DueCategory, classify_task};
use crate::domain::models::{Task, parse_due_date, parse_due_time};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

const DEFAULT_EVENT_MINUTES: i64 = 30;

/// Calendar entry built from a task for rendering.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub all_day: bool,
    pub date: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_completed: bool,
    pub category: DueCategory,
    pub text_color: &'static str,
}

/// Builds events for tasks due within `[range_start, range_end]`.
///
/// Tasks without a parseable due date are skipped. A task with no due time
/// renders as an all-day event.
pub fn build_calendar_events(
    tasks: &[Task],
    range_start: NaiveDate,
    range_end: NaiveDate,
    today: NaiveDate,
    timezone: Tz,
) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = tasks
        .iter()
        .filter_map(|task| {
            let date = task.due_date.as_deref().and_then(parse_due_date)?;
            if date < range_start || date > range_end {
                return None;
            }
            let time = task.due_time.as_deref().and_then(parse_due_time);
            let naive_start = match time {
                Some(time) => date.and_time(time),
                None => date.and_hms_opt(0, 0, 0)?,
            };
            let start = match timezone.from_local_datetime(&naive_start) {
                LocalResult::Single(value) | LocalResult::Ambiguous(value, _) => value.with_timezone(&Utc),
                // Skipped wall-clock times (spring forward) are shifted past the gap.
                LocalResult::None => timezone
                    .from_local_datetime(&(naive_start + Duration::hours(1)))
                    .earliest()?
                    .with_timezone(&Utc),
            };
            let end = if time.is_some() {
                start + Duration::minutes(DEFAULT_EVENT_MINUTES)
            } else {
                start + Duration::days(1)
            };
            let category = classify_task(task, today);

            Some(CalendarEvent {
                id: task.id.clone(),
                title: task.title.clone(),
                all_day: time.is_none(),
                date: date.format("%Y-%m-%d").to_string(),
                start,
                end,
                is_completed: task.is_completed,
                category,
                text_color: category.style().text_color,
            })
        })
        .collect();

    events.sort_by(|left, right| {
        left.start
            .cmp(&right.start)
            .then_with(|| right.all_day.cmp(&left.all_day))
            .then_with(|| left.id.cmp(&right.id))
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskType;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn task(id: &str, due_date: Option<&str>, due_time: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            due_date: due_date.map(ToOwned::to_owned),
            due_time: due_time.map(ToOwned::to_owned),
            is_completed: false,
            task_type: TaskType::Meeting,
            case_id: None,
        }
    }

    #[test]
    fn builds_timed_and_all_day_events_in_range() {
        let tasks = vec![
            task("timed", Some("2026-03-05"), Some("09:30:00")),
            task("all-day", Some("2026-03-05"), None),
            task("outside", Some("2026-04-20"), None),
            task("undated", None, None),
        ];

        let events = build_calendar_events(
            &tasks,
            date("2026-03-01"),
            date("2026-03-31"),
            date("2026-03-05"),
            chrono_tz::America::New_York,
        );

        let ids: Vec<&str> = events.iter().map(|event| event.id.as_str()).collect();
        assert_eq!(ids, vec!["all-day", "timed"]);

        let timed = &events[1];
        assert!(!timed.all_day);
        assert_eq!(timed.start.to_rfc3339(), "2026-03-05T14:30:00+00:00");
        assert_eq!(timed.end - timed.start, Duration::minutes(30));
        assert_eq!(timed.category, DueCategory::Today);
        assert_eq!(timed.text_color, "text-amber-600");

        let all_day = &events[0];
        assert!(all_day.all_day);
        assert_eq!(all_day.end - all_day.start, Duration::days(1));
    }

    #[test]
    fn skipped_local_time_is_shifted_forward() {
        let tasks = vec![task("gap", Some("2026-03-08"), Some("02:30"))];
        let events = build_calendar_events(
            &tasks,
            date("2026-03-08"),
            date("2026-03-08"),
            date("2026-03-01"),
            chrono_tz::America::New_York,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start.to_rfc3339(), "2026-03-08T07:30:00+00:00");
    }
}
