use crate::domain::models::Task;
use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Tasks currently shown by the calendar, keyed by id.
pub trait TaskCacheRepository: Send + Sync {
    fn get_by_id(&self, task_id: &str) -> Result<Option<Task>, InfraError>;
    fn upsert(&self, task: &Task) -> Result<(), InfraError>;
    /// Swaps in `replacement` only while the cached entry equals `expected`.
    fn replace_if_current(&self, expected: &Task, replacement: &Task) -> Result<bool, InfraError>;
    fn remove(&self, task_id: &str) -> Result<(), InfraError>;
    fn replace_all(&self, tasks: &[Task]) -> Result<(), InfraError>;
    fn list_all(&self) -> Result<Vec<Task>, InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTaskCacheRepository {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskCacheRepository {
    fn normalized_id(task_id: &str) -> Option<String> {
        let normalized = task_id.trim();
        if normalized.is_empty() {
            return None;
        }
        Some(normalized.to_string())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Task>>, InfraError> {
        self.tasks
            .lock()
            .map_err(|error| InfraError::InvalidInput(format!("task cache lock poisoned: {error}")))
    }
}

impl TaskCacheRepository for InMemoryTaskCacheRepository {
    fn get_by_id(&self, task_id: &str) -> Result<Option<Task>, InfraError> {
        let Some(task_id) = Self::normalized_id(task_id) else {
            return Ok(None);
        };
        Ok(self.lock()?.get(&task_id).cloned())
    }

    fn upsert(&self, task: &Task) -> Result<(), InfraError> {
        let task_id = Self::normalized_id(&task.id).ok_or_else(|| {
            InfraError::InvalidInput("task id is required for cache upsert".to_string())
        })?;
        self.lock()?.insert(task_id, task.clone());
        Ok(())
    }

    fn replace_if_current(&self, expected: &Task, replacement: &Task) -> Result<bool, InfraError> {
        let Some(task_id) = Self::normalized_id(&expected.id) else {
            return Ok(false);
        };
        let mut cached = self.lock()?;
        match cached.get_mut(&task_id) {
            Some(current) if current == expected => {
                *current = replacement.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove(&self, task_id: &str) -> Result<(), InfraError> {
        let Some(task_id) = Self::normalized_id(task_id) else {
            return Ok(());
        };
        self.lock()?.remove(&task_id);
        Ok(())
    }

    fn replace_all(&self, tasks: &[Task]) -> Result<(), InfraError> {
        let mut cached = self.lock()?;
        cached.clear();
        for task in tasks {
            if let Some(task_id) = Self::normalized_id(&task.id) {
                cached.insert(task_id, task.clone());
            }
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Task>, InfraError> {
        let mut tasks: Vec<Task> = self.lock()?.values().cloned().collect();
        tasks.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskType;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            due_date: Some("2026-03-05".to_string()),
            due_time: None,
            is_completed: false,
            task_type: TaskType::Review,
            case_id: None,
        }
    }

    #[test]
    fn upsert_get_and_remove_use_trimmed_ids() {
        let cache = InMemoryTaskCacheRepository::default();
        cache.upsert(&task("task-1")).expect("upsert");

        assert!(cache.get_by_id(" task-1 ").expect("get").is_some());
        cache.remove("task-1").expect("remove");
        assert!(cache.get_by_id("task-1").expect("get").is_none());
    }

    #[test]
    fn upsert_rejects_blank_id() {
        let cache = InMemoryTaskCacheRepository::default();
        assert!(cache.upsert(&task("  ")).is_err());
    }

    #[test]
    fn replace_all_drops_previous_entries() {
        let cache = InMemoryTaskCacheRepository::default();
        cache.upsert(&task("stale")).expect("seed");
        cache
            .replace_all(&[task("b"), task("a")])
            .expect("replace");

        let ids: Vec<String> = cache
            .list_all()
            .expect("list")
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn replace_if_current_skips_entries_that_changed() {
        let cache = InMemoryTaskCacheRepository::default();
        let original = task("task-1");
        let mut moved = original.clone();
        moved.due_date = Some("2026-03-09".to_string());
        let mut later = original.clone();
        later.due_date = Some("2026-03-12".to_string());

        cache.upsert(&moved).expect("upsert");
        assert!(cache.replace_if_current(&moved, &original).expect("swap"));
        assert_eq!(cache.get_by_id("task-1").expect("read"), Some(original.clone()));

        cache.upsert(&later).expect("upsert");
        assert!(!cache.replace_if_current(&moved, &original).expect("swap"));
        assert_eq!(cache.get_by_id("task-1").expect("read"), Some(later));

        cache.remove("task-1").expect("remove");
        assert!(!cache.replace_if_current(&moved, &original).expect("swap"));
        assert_eq!(cache.get_by_id("task-1").expect("read"), None);
    }
}
