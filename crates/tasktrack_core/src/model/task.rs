//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do item and its priority scale.
//! - Own field validation/normalization and completion transitions.
//!
//! # Invariants
//! - `title` is trimmed, non-empty and at most `TITLE_MAX_CHARS` characters.
//! - `description` is trimmed; blank input is stored as `None`.
//! - Every successful mutation re-stamps `updated_at`; failed ones change nothing.
//! - `is_overdue` is derived and never stored.

use crate::model::entity::{now_epoch_ms, EntityMeta, TaskId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum title length, counted in characters after trimming.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length accepted by storage.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Ordered task priority. Persisted as its ordinal (`Low = 0`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [Self::Low, Self::Medium, Self::High];

    /// Integer encoding used by the `tasks.priority` column.
    pub fn as_db(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for TaskPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unsupported priority `{other}`; expected low|medium|high"
            )),
        }
    }
}

/// Field-level validation failure. Each variant names the field and rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { len: usize, max: usize },
    /// Title carries leading or trailing whitespace.
    UntrimmedTitle,
    /// Description is blank or carries leading or trailing whitespace.
    UnnormalizedDescription,
    DescriptionTooLong { len: usize, max: usize },
    TimestampsOutOfOrder { created_at: i64, updated_at: i64 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::TitleTooLong { len, max } => {
                write!(f, "title cannot exceed {max} characters (got {len})")
            }
            Self::UntrimmedTitle => {
                write!(f, "title must not have leading or trailing whitespace")
            }
            Self::UnnormalizedDescription => write!(
                f,
                "description must be absent or non-blank without surrounding whitespace"
            ),
            Self::DescriptionTooLong { len, max } => {
                write!(f, "description cannot exceed {max} characters (got {len})")
            }
            Self::TimestampsOutOfOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// A to-do item with validated fields and lifecycle timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    #[serde(flatten)]
    meta: EntityMeta,
    title: String,
    description: Option<String>,
    /// Unix epoch milliseconds (UTC).
    due_date: Option<i64>,
    priority: TaskPriority,
    is_completed: bool,
}

impl TaskItem {
    /// Creates a new, not yet persisted task.
    ///
    /// # Errors
    /// - `EmptyTitle` when `title` is empty or whitespace-only.
    /// - `TitleTooLong` when the trimmed title exceeds `TITLE_MAX_CHARS`.
    pub fn new(
        title: &str,
        description: Option<&str>,
        due_date: Option<i64>,
        priority: TaskPriority,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            title: normalize_title(title)?,
            description: normalize_description(description),
            due_date,
            priority,
            is_completed: false,
            meta: EntityMeta::new(),
        })
    }

    /// Creates a task with only a title; other fields take their defaults.
    pub fn with_title(title: &str) -> Result<Self, TaskValidationError> {
        Self::new(title, None, None, TaskPriority::default())
    }

    /// Rebuilds a task from persisted values without field validation.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: TaskId,
        title: String,
        description: Option<String>,
        due_date: Option<i64>,
        priority: TaskPriority,
        is_completed: bool,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            meta: EntityMeta::from_storage(id, created_at, updated_at),
            title,
            description,
            due_date,
            priority,
            is_completed,
        }
    }

    pub fn id(&self) -> Option<TaskId> {
        self.meta.id()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due_date(&self) -> Option<i64> {
        self.due_date
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn created_at(&self) -> i64 {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> i64 {
        self.meta.updated_at()
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), TaskValidationError> {
        self.title = normalize_title(title)?;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = normalize_description(description);
        self.touch();
    }

    pub fn set_due_date(&mut self, due_date: Option<i64>) {
        self.due_date = due_date;
        self.touch();
    }

    pub fn set_priority(&mut self, priority: TaskPriority) {
        self.priority = priority;
        self.touch();
    }

    /// Marks the task complete. Returns `false` (and keeps `updated_at`)
    /// when it already was.
    pub fn mark_complete(&mut self) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.touch();
        true
    }

    /// Marks the task incomplete. Returns `false` when it already was.
    pub fn mark_incomplete(&mut self) -> bool {
        if !self.is_completed {
            return false;
        }
        self.is_completed = false;
        self.touch();
        true
    }

    /// Re-stamps `updated_at` without changing any field.
    pub fn touch(&mut self) {
        self.meta.touch();
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(now_epoch_ms())
    }

    /// Overdue relative to an explicit reference time.
    pub fn is_overdue_at(&self, now_ms: i64) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now_ms)
    }

    /// Checks every stored invariant, including storage-only limits.
    ///
    /// Repository writes call this so that deserialized or otherwise
    /// externally built items cannot bypass field rules.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if normalize_title(&self.title)? != self.title {
            return Err(TaskValidationError::UntrimmedTitle);
        }
        if normalize_description(self.description.as_deref()) != self.description {
            return Err(TaskValidationError::UnnormalizedDescription);
        }
        if let Some(description) = self.description.as_deref() {
            let len = description.chars().count();
            if len > DESCRIPTION_MAX_CHARS {
                return Err(TaskValidationError::DescriptionTooLong {
                    len,
                    max: DESCRIPTION_MAX_CHARS,
                });
            }
        }
        if self.updated_at() < self.created_at() {
            return Err(TaskValidationError::TimestampsOutOfOrder {
                created_at: self.created_at(),
                updated_at: self.updated_at(),
            });
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: TaskId) {
        self.meta.assign_id(id);
    }
}

fn normalize_title(title: &str) -> Result<String, TaskValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let len = trimmed.chars().count();
    if len > TITLE_MAX_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            len,
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
