//! In-memory repository for tasks and evaluation reports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{EvaluationReport, Task, TaskId},
    ports::{
        EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    reports: HashMap<TaskId, Vec<EvaluationReport>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task, expected_version: u64) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        if stored.version() != expected_version {
            return Err(TaskRepositoryError::VersionConflict {
                task_id: task.id(),
                expected: expected_version,
                actual: stored.version(),
            });
        }
        *stored = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by_key(Task::id);
        Ok(tasks)
    }
}

#[async_trait]
impl EvaluationReportRepository for InMemoryTaskRepository {
    async fn store_report(&self, report: &EvaluationReport) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .reports
            .entry(report.task_id())
            .or_default()
            .push(report.clone());
        Ok(())
    }

    async fn list_reports(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<EvaluationReport>> {
        let state = self.read()?;
        Ok(state.reports.get(&task_id).cloned().unwrap_or_default())
    }
}
