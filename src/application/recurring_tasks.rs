use crate::domain::models::{NewTask, Recurrence, Task};
use crate::domain::recurrence::build_recurring_dates;
use crate::infrastructure::api_client::CrmApiClient;
use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;
use tokio::task::JoinSet;

const TASK_CREATION_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringTaskRequest {
    pub draft: NewTask,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub recurrence: Recurrence,
}

/// Expands the request into one draft per occurrence, in date order.
pub fn plan_occurrences(request: &RecurringTaskRequest) -> Vec<NewTask> {
    build_recurring_dates(request.start, request.end, request.recurrence)
        .into_iter()
        .map(|date| NewTask {
            due_date: Some(date.format("%Y-%m-%d").to_string()),
            ..request.draft.clone()
        })
        .collect()
}

pub struct RecurringTaskPlanner<C>
where
    C: CrmApiClient + 'static,
{
    client: Arc<C>,
    concurrency: usize,
}

impl<C> RecurringTaskPlanner<C>
where
    C: CrmApiClient + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            concurrency: TASK_CREATION_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Creates every occurrence and returns the created tasks in date order.
    ///
    /// The first failed creation aborts the rest; tasks already created are
    /// left on the backend.
    pub async fn create(&self, request: &RecurringTaskRequest) -> Result<Vec<Task>, InfraError> {
        request.draft.validate().map_err(InfraError::InvalidInput)?;
        let drafts = plan_occurrences(request);
        if drafts.is_empty() {
            return Err(InfraError::InvalidInput(format!(
                "recurrence {} produced no dates between {} and {}",
                request.recurrence, request.start, request.end
            )));
        }

        let mut create_tasks: JoinSet<Result<(usize, Task), InfraError>> = JoinSet::new();
        let mut created: Vec<Option<Task>> = vec![None; drafts.len()];

        for (index, draft) in drafts.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            create_tasks.spawn(async move {
                let task = client.create_task(&draft).await?;
                Ok((index, task))
            });

            if create_tasks.len() >= self.concurrency {
                collect_created_task(&mut create_tasks, &mut created).await?;
            }
        }

        while !create_tasks.is_empty() {
            collect_created_task(&mut create_tasks, &mut created).await?;
        }

        let created: Vec<Task> = created.into_iter().flatten().collect();
        info!(
            "event=recurring_tasks_created recurrence={} count={}",
            request.recurrence,
            created.len()
        );
        Ok(created)
    }
}

async fn collect_created_task(
    create_tasks: &mut JoinSet<Result<(usize, Task), InfraError>>,
    created: &mut [Option<Task>],
) -> Result<(), InfraError> {
    let Some(join_result) = create_tasks.join_next().await else {
        return Ok(());
    };
    let (index, task) = join_result.map_err(|error| {
        InfraError::Http(format!("failed to join task creation: {error}"))
    })??;
    if let Some(slot) = created.get_mut(index) {
        *slot = Some(task);
    }
    Ok(())
}
