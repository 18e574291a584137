use crate::domain::models::{Task, parse_due_date, parse_due_time};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

const THIS_WEEK_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DueCategory {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    Later,
    NoDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueCategoryStyle {
    pub label: &'static str,
    pub text_color: &'static str,
    pub badge: &'static str,
}

const OVERDUE_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "Overdue",
    text_color: "text-red-600",
    badge: "bg-red-100 text-red-700 border-red-200",
};
const TODAY_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "Today",
    text_color: "text-amber-600",
    badge: "bg-amber-100 text-amber-700 border-amber-200",
};
const TOMORROW_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "Tomorrow",
    text_color: "text-blue-600",
    badge: "bg-blue-100 text-blue-700 border-blue-200",
};
const THIS_WEEK_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "This Week",
    text_color: "text-indigo-600",
    badge: "bg-indigo-100 text-indigo-700 border-indigo-200",
};
const LATER_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "Later",
    text_color: "text-slate-600",
    badge: "bg-slate-100 text-slate-700 border-slate-200",
};
const NO_DATE_STYLE: DueCategoryStyle = DueCategoryStyle {
    label: "No Date",
    text_color: "text-muted-foreground",
    badge: "bg-muted text-muted-foreground border-border",
};

impl DueCategory {
    /// Display order of task list sections.
    pub const ALL: [DueCategory; 6] = [
        DueCategory::Overdue,
        DueCategory::Today,
        DueCategory::Tomorrow,
        DueCategory::ThisWeek,
        DueCategory::Later,
        DueCategory::NoDate,
    ];

    pub fn style(self) -> &'static DueCategoryStyle {
        match self {
            Self::Overdue => &OVERDUE_STYLE,
            Self::Today => &TODAY_STYLE,
            Self::Tomorrow => &TOMORROW_STYLE,
            Self::ThisWeek => &THIS_WEEK_STYLE,
            Self::Later => &LATER_STYLE,
            Self::NoDate => &NO_DATE_STYLE,
        }
    }

    pub fn label(self) -> &'static str {
        self.style().label
    }
}

/// Buckets a `YYYY-MM-DD` due date against the local calendar day `today`.
///
/// Comparison is by calendar day only, so a task due today stays `Today`
/// until local midnight. Blank dates are `NoDate`; unparseable ones are
/// `Later`.
pub fn classify_due_date(due_date: Option<&str>, today: NaiveDate) -> DueCategory {
    let Some(raw) = due_date.map(str::trim).filter(|value| !value.is_empty()) else {
        return DueCategory::NoDate;
    };
    let Some(due) = parse_due_date(raw) else {
        return DueCategory::Later;
    };

    let tomorrow = today.checked_add_days(Days::new(1));
    let week_end = today.checked_add_days(Days::new(THIS_WEEK_DAYS));

    if due < today {
        DueCategory::Overdue
    } else if due == today {
        DueCategory::Today
    } else if Some(due) == tomorrow {
        DueCategory::Tomorrow
    } else if week_end.is_some_and(|week_end| due <= week_end) {
        DueCategory::ThisWeek
    } else {
        DueCategory::Later
    }
}

pub fn classify_task(task: &Task, today: NaiveDate) -> DueCategory {
    classify_due_date(task.due_date.as_deref(), today)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub category: DueCategory,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedTasks {
    pub groups: Vec<TaskGroup>,
    pub completed_count: usize,
}

/// Splits open tasks into non-empty sections in display order.
pub fn group_tasks_by_due_category(tasks: Vec<Task>, today: NaiveDate) -> GroupedTasks {
    let mut grouped = GroupedTasks::default();
    let mut buckets: Vec<(DueCategory, Vec<Task>)> =
        DueCategory::ALL.iter().map(|category| (*category, Vec::new())).collect();

    for task in tasks {
        if task.is_completed {
            grouped.completed_count += 1;
            continue;
        }
        let category = classify_task(&task, today);
        if let Some((_, bucket)) = buckets.iter_mut().find(|(candidate, _)| *candidate == category) {
            bucket.push(task);
        }
    }

    for (category, mut tasks) in buckets {
        if tasks.is_empty() {
            continue;
        }
        tasks.sort_by(|left, right| {
            sort_key(left)
                .cmp(&sort_key(right))
                .then_with(|| left.title.cmp(&right.title))
        });
        grouped.groups.push(TaskGroup { category, tasks });
    }
    grouped
}

/// Dated tasks first by date and time; unparseable dates trail the section.
fn sort_key(task: &Task) -> (bool, Option<NaiveDate>, Option<chrono::NaiveTime>) {
    let due_date = task.due_date.as_deref().and_then(parse_due_date);
    (
        due_date.is_none(),
        due_date,
        task.due_time.as_deref().and_then(parse_due_time),
    )
}
