//! Task use-case service.
//!
//! # Responsibility
//! - Provide stable id-based entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.
//! - Completion transitions that change nothing are not written back.

use crate::model::entity::TaskId;
use crate::model::task::{TaskItem, TaskPriority};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};

/// Request model for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Due date in epoch milliseconds.
    pub due_date: Option<i64>,
    pub priority: TaskPriority,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Use-case service wrapper for task operations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists a new task, returning it with its id.
    pub fn create_task(&self, request: &NewTask) -> RepoResult<TaskItem> {
        let item = TaskItem::new(
            request.title.as_str(),
            request.description.as_deref(),
            request.due_date,
            request.priority,
        )?;
        self.repo.add(item)
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<TaskItem>> {
        self.repo.get_by_id(id)
    }

    /// Marks a task complete. Already-complete tasks are returned untouched.
    pub fn complete_task(&self, id: TaskId) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        if item.mark_complete() {
            self.repo.update(&item)?;
        }
        Ok(item)
    }

    /// Marks a task incomplete. Already-pending tasks are returned untouched.
    pub fn reopen_task(&self, id: TaskId) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        if item.mark_incomplete() {
            self.repo.update(&item)?;
        }
        Ok(item)
    }

    /// Replaces the title. Validation failures leave the stored task unchanged.
    pub fn rename_task(&self, id: TaskId, title: &str) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        item.set_title(title)?;
        self.repo.update(&item)?;
        Ok(item)
    }

    pub fn describe_task(&self, id: TaskId, description: Option<&str>) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        item.set_description(description);
        self.repo.update(&item)?;
        Ok(item)
    }

    /// Sets or clears the due date.
    pub fn reschedule_task(&self, id: TaskId, due_date: Option<i64>) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        item.set_due_date(due_date);
        self.repo.update(&item)?;
        Ok(item)
    }

    pub fn reprioritize_task(&self, id: TaskId, priority: TaskPriority) -> RepoResult<TaskItem> {
        let mut item = self.load(id)?;
        item.set_priority(priority);
        self.repo.update(&item)?;
        Ok(item)
    }

    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.repo.delete_by_id(id)
    }

    pub fn list_all(&self) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_all()
    }

    pub fn list_overdue(&self) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_overdue()
    }

    pub fn list_by_priority(&self, priority: TaskPriority) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_by_priority(priority)
    }

    pub fn list_completed(&self) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_completed()
    }

    pub fn list_pending(&self) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_pending()
    }

    pub fn list_due_before(&self, date: i64) -> RepoResult<Vec<TaskItem>> {
        self.repo.get_due_before(date)
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }

    fn load(&self, id: TaskId) -> RepoResult<TaskItem> {
        self.repo.get_by_id(id)?.ok_or(RepoError::NotFound(id))
    }
}
