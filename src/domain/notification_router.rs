use crate::domain::models::{EntityType, Notification};
use url::{Position, Url};

pub const NOTIFICATIONS_PATH: &str = "/notifications";
const TASKS_SEGMENT: &str = "tasks";
const MY_TASKS_FILTER: &str = "my_tasks";
const APPROVALS_FOCUS: &str = "approvals";

const APPROVAL_TYPES: [&str; 3] = [
    "workflow_approval_requested",
    "workflow_approval_expired",
    "status_change_requested",
];

const TASK_FOCUS: [(&str, &str); 3] = [
    ("task_overdue", "overdue"),
    ("task_due_soon", "tasks"),
    ("task_assigned", "tasks"),
];

/// Maps a notification to the in-app path it should open.
///
/// Every input yields a path; anything unrecognized lands on the inbox.
pub fn notification_href(notification: &Notification) -> String {
    let notification_type = notification.notification_type.trim();
    if let Some(focus) = task_focus(notification_type) {
        return tasks_path(Some(focus));
    }

    let entity_id = notification
        .entity_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match (&notification.entity_type, entity_id) {
        (EntityType::Surrogate | EntityType::Case, Some(id)) => detail_path("surrogates", id),
        (EntityType::IntendedParent, Some(id)) => detail_path("intended-parents", id),
        (EntityType::Appointment, Some(id)) => detail_path("appointments", id),
        (EntityType::Task, _) => tasks_path(None),
        _ => NOTIFICATIONS_PATH.to_string(),
    }
}

fn task_focus(notification_type: &str) -> Option<&'static str> {
    if APPROVAL_TYPES.contains(&notification_type) {
        return Some(APPROVALS_FOCUS);
    }
    TASK_FOCUS
        .iter()
        .find(|(candidate, _)| *candidate == notification_type)
        .map(|(_, focus)| *focus)
}

fn tasks_path(focus: Option<&str>) -> String {
    let Some(mut url) = app_url() else {
        return NOTIFICATIONS_PATH.to_string();
    };
    push_segments(&mut url, &[TASKS_SEGMENT]);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("filter", MY_TASKS_FILTER);
        if let Some(focus) = focus {
            query.append_pair("focus", focus);
        }
    }
    url[Position::BeforePath..].to_string()
}

fn detail_path(collection: &str, id: &str) -> String {
    let Some(mut url) = app_url() else {
        return NOTIFICATIONS_PATH.to_string();
    };
    push_segments(&mut url, &[collection, id]);
    url[Position::BeforePath..].to_string()
}

fn app_url() -> Option<Url> {
    Url::parse("app://local/").ok()
}

fn push_segments(url: &mut Url, segments: &[&str]) {
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    fn notification(notification_type: &str, entity_type: EntityType, entity_id: Option<&str>) -> Notification {
        Notification {
            id: "n-1".to_string(),
            notification_type: notification_type.to_string(),
            title: "Notification".to_string(),
            body: None,
            entity_type,
            entity_id: entity_id.map(ToOwned::to_owned),
            read_at: None,
            created_at: DateTime::parse_from_rfc3339("2026-02-16T09:00:00Z")
                .expect("valid datetime")
                .with_timezone(&Utc),
        }
    }

    fn entity_type_strategy() -> impl Strategy<Value = EntityType> {
        prop_oneof![
            Just(EntityType::Surrogate),
            Just(EntityType::IntendedParent),
            Just(EntityType::Task),
            Just(EntityType::Appointment),
            Just(EntityType::Case),
            Just(EntityType::Match),
            Just(EntityType::Other),
        ]
    }

    #[test]
    fn expired_approval_on_task_focuses_approvals() {
        let href = notification_href(&notification(
            "workflow_approval_expired",
            EntityType::Task,
            Some("task-1"),
        ));
        assert_eq!(href, "/tasks?filter=my_tasks&focus=approvals");
    }

    #[test]
    fn case_entity_opens_surrogate_detail() {
        let href = notification_href(&notification(
            "interview_transcription_completed",
            EntityType::Case,
            Some("surrogate-1"),
        ));
        assert_eq!(href, "/surrogates/surrogate-1");
    }

    #[test]
    fn task_focus_table_sets_focus() {
        let overdue = notification_href(&notification("task_overdue", EntityType::Task, Some("t")));
        let assigned = notification_href(&notification("task_assigned", EntityType::Other, None));
        assert_eq!(overdue, "/tasks?filter=my_tasks&focus=overdue");
        assert_eq!(assigned, "/tasks?filter=my_tasks&focus=tasks");
    }

    #[test]
    fn detail_paths_cover_each_entity() {
        assert_eq!(
            notification_href(&notification("x", EntityType::IntendedParent, Some("ip-2"))),
            "/intended-parents/ip-2"
        );
        assert_eq!(
            notification_href(&notification("x", EntityType::Appointment, Some("appt-3"))),
            "/appointments/appt-3"
        );
        assert_eq!(
            notification_href(&notification("x", EntityType::Surrogate, Some("s 4"))),
            "/surrogates/s%204"
        );
    }

    #[test]
    fn missing_entity_id_falls_back_to_inbox() {
        assert_eq!(
            notification_href(&notification("x", EntityType::Surrogate, None)),
            NOTIFICATIONS_PATH
        );
        assert_eq!(
            notification_href(&notification("x", EntityType::Appointment, Some("  "))),
            NOTIFICATIONS_PATH
        );
        assert_eq!(
            notification_href(&notification("x", EntityType::Match, Some("m-1"))),
            NOTIFICATIONS_PATH
        );
    }

    proptest! {
        #[test]
        fn approval_types_always_focus_approvals(
            index in 0usize..APPROVAL_TYPES.len(),
            entity_type in entity_type_strategy(),
            entity_id in proptest::option::of("[a-z0-9-]{1,16}")
        ) {
            let href = notification_href(&notification(APPROVAL_TYPES[index], entity_type, entity_id.as_deref()));
            prop_assert!(href.contains("focus=approvals"));
        }

        #[test]
        fn plain_task_notifications_have_no_focus(
            notification_type in "[a-z_]{1,24}",
            entity_id in proptest::option::of("[a-z0-9-]{1,16}")
        ) {
            prop_assume!(task_focus(&notification_type).is_none());
            let href = notification_href(&notification(&notification_type, EntityType::Task, entity_id.as_deref()));
            prop_assert_eq!(href, "/tasks?filter=my_tasks");
        }
    }
}
