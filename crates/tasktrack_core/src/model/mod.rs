//! Domain model for task tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation next to the data it protects.
//!
//! # Invariants
//! - Every persisted entity is identified by a storage-assigned `TaskId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod entity;
pub mod task;
