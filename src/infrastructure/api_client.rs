use crate::domain::models::{NewTask, Notification, Task, TaskSchedule};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

const DEFAULT_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub include_completed: bool,
    pub due_after: Option<NaiveDate>,
    pub due_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub unread_count: usize,
}

/// Backend endpoints the client core talks to.
#[async_trait]
pub trait CrmApiClient: Send + Sync {
    async fn list_my_tasks(&self, query: TaskListQuery) -> Result<Vec<Task>, InfraError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, InfraError>;

    async fn update_task_schedule(
        &self,
        task_id: &str,
        schedule: &TaskSchedule,
    ) -> Result<Task, InfraError>;

    async fn list_notifications(&self, limit: u32) -> Result<NotificationPage, InfraError>;

    async fn mark_notification_read(&self, notification_id: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCrmApiClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl ReqwestCrmApiClient {
    pub fn new(base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            access_token: access_token.into(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::InvalidInput(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        if status == reqwest::StatusCode::NOT_FOUND {
            return InfraError::NotFound(format!("crm api returned 404; body={body}"));
        }
        let message = if body.trim().is_empty() {
            format!("crm api error: http {}", status.as_u16())
        } else {
            format!("crm api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Http(message)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig("crm api base URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T, InfraError> {
        let body = self.send(request, action).await?;
        serde_json::from_str(&body)
            .map_err(|error| InfraError::Http(format!("invalid {action} payload: {error}; body={body}")))
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<String, InfraError> {
        Self::ensure_non_empty(&self.access_token, "access token")?;

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| InfraError::Http(format!("network error while {action}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Http(format!("failed reading {action} response: {error}")))?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }
        Ok(body)
    }
}

#[derive(Debug, serde::Deserialize)]
struct TaskListResponse {
    items: Option<Vec<Task>>,
}

#[derive(Debug, serde::Deserialize)]
struct NotificationListResponse {
    items: Option<Vec<Notification>>,
    #[serde(default)]
    unread_count: Option<usize>,
}

#[async_trait]
impl CrmApiClient for ReqwestCrmApiClient {
    async fn list_my_tasks(&self, query: TaskListQuery) -> Result<Vec<Task>, InfraError> {
        let endpoint = self.endpoint(&["tasks"])?;
        let mut request = self.client.get(endpoint).query(&[
            ("my_tasks", "true".to_string()),
            ("per_page", DEFAULT_PAGE_SIZE.to_string()),
            ("include_completed", query.include_completed.to_string()),
        ]);
        if let Some(due_after) = query.due_after {
            request = request.query(&[("due_after", due_after.format("%Y-%m-%d").to_string())]);
        }
        if let Some(due_before) = query.due_before {
            request = request.query(&[("due_before", due_before.format("%Y-%m-%d").to_string())]);
        }

        let parsed: TaskListResponse = self.send_json(request, "listing tasks").await?;
        Ok(parsed.items.unwrap_or_default())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, InfraError> {
        task.validate().map_err(InfraError::InvalidInput)?;

        let endpoint = self.endpoint(&["tasks"])?;
        let request = self.client.post(endpoint).json(task);
        self.send_json(request, "creating task").await
    }

    async fn update_task_schedule(
        &self,
        task_id: &str,
        schedule: &TaskSchedule,
    ) -> Result<Task, InfraError> {
        Self::ensure_non_empty(task_id, "task id")?;

        let endpoint = self.endpoint(&["tasks", task_id.trim()])?;
        let request = self.client.patch(endpoint).json(schedule);
        self.send_json(request, "updating task schedule").await
    }

    async fn list_notifications(&self, limit: u32) -> Result<NotificationPage, InfraError> {
        let endpoint = self.endpoint(&["me", "notifications"])?;
        let request = self.client.get(endpoint).query(&[("limit", limit.max(1))]);

        let parsed: NotificationListResponse = self.send_json(request, "listing notifications").await?;
        let items = parsed.items.unwrap_or_default();
        let unread_count = parsed
            .unread_count
            .unwrap_or_else(|| items.iter().filter(|item| !item.is_read()).count());
        Ok(NotificationPage {
            items,
            unread_count,
        })
    }

    async fn mark_notification_read(&self, notification_id: &str) -> Result<(), InfraError> {
        Self::ensure_non_empty(notification_id, "notification id")?;

        let endpoint = self.endpoint(&["me", "notifications", notification_id.trim(), "read"])?;
        self.send(self.client.patch(endpoint), "marking notification read")
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable in-memory backend for service and command tests.
    #[derive(Debug, Default)]
    pub(crate) struct FakeCrmApiClient {
        pub tasks: Mutex<Vec<Task>>,
        pub notifications: Mutex<Vec<Notification>>,
        pub unread_total: Option<usize>,
        pub fail_create_on_due_date: Option<String>,
        pub fail_updates: bool,
        pub create_calls: AtomicUsize,
        pub update_calls: AtomicUsize,
        pub read_ids: Mutex<Vec<String>>,
        pub last_query: Mutex<Option<TaskListQuery>>,
    }

    impl FakeCrmApiClient {
        pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl CrmApiClient for FakeCrmApiClient {
        async fn list_my_tasks(&self, query: TaskListQuery) -> Result<Vec<Task>, InfraError> {
            *self.last_query.lock().expect("query lock poisoned") = Some(query);
            Ok(self.tasks.lock().expect("tasks lock poisoned").clone())
        }

        async fn create_task(&self, task: &NewTask) -> Result<Task, InfraError> {
            let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
            if task.due_date.is_some() && task.due_date == self.fail_create_on_due_date {
                return Err(InfraError::Http("crm api error: http 422".to_string()));
            }
            // Earlier calls sleep longer so completions arrive out of order.
            let delay = 5u64.saturating_sub(call as u64);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

            let created = Task {
                id: format!("task-{}", task.due_date.as_deref().unwrap_or("undated")),
                title: task.title.clone(),
                description: task.description.clone(),
                due_date: task.due_date.clone(),
                due_time: task.due_time.clone(),
                is_completed: false,
                task_type: task.task_type.clone(),
                case_id: task.case_id.clone(),
            };
            self.tasks
                .lock()
                .expect("tasks lock poisoned")
                .push(created.clone());
            Ok(created)
        }

        async fn update_task_schedule(
            &self,
            task_id: &str,
            schedule: &TaskSchedule,
        ) -> Result<Task, InfraError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(InfraError::Http("crm api error: http 503".to_string()));
            }
            let mut tasks = self.tasks.lock().expect("tasks lock poisoned");
            let task = tasks
                .iter_mut()
                .find(|task| task.id == task_id)
                .ok_or_else(|| InfraError::NotFound(format!("task {task_id}")))?;
            task.apply_schedule(schedule);
            Ok(task.clone())
        }

        async fn list_notifications(&self, limit: u32) -> Result<NotificationPage, InfraError> {
            let items: Vec<Notification> = self
                .notifications
                .lock()
                .expect("notifications lock poisoned")
                .iter()
                .take(limit as usize)
                .cloned()
                .collect();
            let unread_count = self
                .unread_total
                .unwrap_or_else(|| items.iter().filter(|item| !item.is_read()).count());
            Ok(NotificationPage {
                items,
                unread_count,
            })
        }

        async fn mark_notification_read(&self, notification_id: &str) -> Result<(), InfraError> {
            self.read_ids
                .lock()
                .expect("read ids lock poisoned")
                .push(notification_id.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ReqwestCrmApiClient {
        ReqwestCrmApiClient::new(Url::parse(base).expect("valid base url"), "token")
    }

    #[test]
    fn endpoint_appends_encoded_segments_to_base_path() {
        let client = client("https://crm.example.com/api/");
        let url = client.endpoint(&["tasks", "task 1"]).expect("endpoint");
        assert_eq!(url.as_str(), "https://crm.example.com/api/tasks/task%201");
    }

    #[test]
    fn http_error_maps_not_found_separately() {
        let not_found = ReqwestCrmApiClient::http_error(reqwest::StatusCode::NOT_FOUND, "");
        let server = ReqwestCrmApiClient::http_error(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(matches!(not_found, InfraError::NotFound(_)));
        assert!(server.to_string().contains("http 502; body=upstream"));
    }

    #[tokio::test]
    async fn blank_task_id_is_rejected_before_any_request() {
        let client = client("http://127.0.0.1:9/");
        let result = client
            .update_task_schedule(
                " ",
                &TaskSchedule {
                    due_date: "2026-03-05".to_string(),
                    due_time: None,
                },
            )
            .await;
        assert!(matches!(result, Err(InfraError::InvalidInput(_))));
    }
}
