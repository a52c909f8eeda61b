//! Core domain logic for task tracking.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{now_epoch_ms, EntityMeta, TaskId};
pub use model::task::{
    TaskItem, TaskPriority, TaskValidationError, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::task_service::{NewTask, TaskService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
