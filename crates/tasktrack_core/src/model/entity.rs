//! Shared identity and lifecycle timestamps for persisted entities.
//!
//! # Responsibility
//! - Hold the storage-assigned id plus creation/update timestamps.
//! - Provide the single re-stamp helper used by every entity mutation.
//!
//! # Invariants
//! - `id` is `None` until the repository assigns it and never changes after.
//! - `created_at` is written once; `updated_at >= created_at` always holds.
//! - `touch()` strictly increases `updated_at`, even within one millisecond.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Storage-assigned integer identity.
pub type TaskId = i64;

/// Returns current wall-clock time in Unix epoch milliseconds (UTC).
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Identity + lifecycle timestamps embedded by each entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub(crate) id: Option<TaskId>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}

impl EntityMeta {
    /// Stamps both timestamps with the current time. No id yet.
    pub fn new() -> Self {
        let now = now_epoch_ms();
        Self {
            id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds metadata from trusted persisted values.
    pub(crate) fn from_storage(id: TaskId, created_at: i64, updated_at: i64) -> Self {
        Self {
            id: Some(id),
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Option<TaskId> {
        self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Re-stamps `updated_at` with the current time.
    ///
    /// The stamp always moves forward by at least one millisecond, so two
    /// mutations in the same millisecond (or a clock stepping backwards)
    /// still yield distinct, ordered stamps.
    pub fn touch(&mut self) {
        let next = self.updated_at.saturating_add(1);
        self.updated_at = now_epoch_ms().max(next);
    }

    pub(crate) fn assign_id(&mut self, id: TaskId) {
        self.id = Some(id);
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}
