//! crates/study_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the planner's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete document store behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DailyEntry, DateId, LateTask, LateTaskId, ScheduleTask, Subject, SubjectId, TaskRef,
    TaskStatus, UserId,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Per-user storage for subjects, daily entries, schedule tasks and parked late tasks.
///
/// Every method is scoped to one user's namespace. Writes are last-write-wins;
/// nothing here coordinates concurrent mutation of the same record.
#[async_trait]
pub trait StudyStore: Send + Sync {
    // --- Users ---
    async fn get_or_create_user(&self, user_id: UserId) -> PortResult<()>;

    // --- Subjects ---
    async fn list_subjects(&self, user_id: UserId) -> PortResult<Vec<Subject>>;

    async fn get_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<Subject>;

    /// Inserts or overwrites a subject.
    async fn save_subject(&self, user_id: UserId, subject: &Subject) -> PortResult<()>;

    async fn remove_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<()>;

    // --- Daily Entries ---
    async fn get_entry(&self, user_id: UserId, date_id: DateId) -> PortResult<Option<DailyEntry>>;

    /// Inserts or overwrites the entry keyed by `entry.date_id`.
    async fn save_entry(&self, user_id: UserId, entry: &DailyEntry) -> PortResult<()>;

    /// All entries, ordered by day.
    async fn list_entries(&self, user_id: UserId) -> PortResult<Vec<DailyEntry>>;

    /// Backfills `updated_at` without touching the rest of the entry.
    async fn touch_entry(
        &self,
        user_id: UserId,
        date_id: DateId,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()>;

    // --- Schedule Tasks ---
    async fn insert_task(&self, user_id: UserId, task: &ScheduleTask) -> PortResult<()>;

    /// All tasks stored under `date_id`, in creation order.
    async fn list_tasks(&self, user_id: UserId, date_id: DateId) -> PortResult<Vec<ScheduleTask>>;

    async fn get_task(&self, user_id: UserId, task: TaskRef) -> PortResult<ScheduleTask>;

    /// Sets the status and completed pages of one stored task.
    async fn update_task_status(
        &self,
        user_id: UserId,
        task: TaskRef,
        status: TaskStatus,
        completed_pages: Option<u32>,
    ) -> PortResult<()>;

    async fn remove_task(&self, user_id: UserId, task: TaskRef) -> PortResult<()>;

    // --- Late Tasks ---
    async fn insert_late_task(&self, user_id: UserId, late: &LateTask) -> PortResult<()>;

    async fn list_late_tasks(&self, user_id: UserId) -> PortResult<Vec<LateTask>>;

    async fn remove_late_task(&self, user_id: UserId, late_id: LateTaskId) -> PortResult<()>;

    /// Backfills `created_at` on a legacy late task.
    async fn touch_late_task(
        &self,
        user_id: UserId,
        late_id: LateTaskId,
        created_at: DateTime<Utc>,
    ) -> PortResult<()>;
}
