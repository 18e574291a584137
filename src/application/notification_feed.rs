use crate::domain::formatting::DisplayConfig;
use crate::domain::models::Notification;
use crate::domain::notification_router::notification_href;
use crate::infrastructure::api_client::NotificationPage;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub href: String,
    pub relative_time: String,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationFeed {
    pub items: Vec<NotificationItem>,
    pub unread_count: usize,
}

/// Decorates one page of notifications for the inbox, newest first.
///
/// The unread badge uses the backend total, which also counts unread items
/// beyond this page.
pub fn build_notification_feed(
    page: NotificationPage,
    display: &DisplayConfig,
    now: DateTime<Utc>,
) -> NotificationFeed {
    let mut notifications: Vec<Notification> = page.items;
    notifications.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });

    let unread_on_page = notifications.iter().filter(|item| !item.is_read()).count();
    let unread_count = page.unread_count.max(unread_on_page);
    let items = notifications
        .into_iter()
        .map(|notification| NotificationItem {
            href: notification_href(&notification),
            relative_time: display.format_relative(notification.created_at, now),
            is_read: notification.is_read(),
            id: notification.id,
            title: notification.title,
            body: notification.body,
        })
        .collect();

    NotificationFeed {
        items,
        unread_count,
    }
}
