//! Task persistence.
//!
//! The task store is the single owner of task identity and status. Everything
//! else (API handlers, the pipeline) reads and writes tasks exclusively
//! through the [`TaskStore`] trait.

mod sqlite_store;
mod types;

pub use sqlite_store::SqliteTaskStore;
pub use types::{FhirTask, TaskStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Task store has been torn down")]
    Closed,
}

/// Durable storage for submission tasks.
pub trait TaskStore: Send + Sync {
    /// Create a new draft task with a generated id.
    fn create(&self, intent: &str, description: Option<&str>) -> Result<FhirTask, TaskStoreError>;

    /// Persist a caller-supplied task, discarding any id it arrived with and
    /// forcing it into the draft status. Returns the stored representation.
    fn create_with_overwrite(&self, candidate: FhirTask) -> Result<FhirTask, TaskStoreError>;

    /// Fetch a task by id.
    fn get(&self, id: &str) -> Result<Option<FhirTask>, TaskStoreError>;

    /// All stored tasks.
    fn list(&self) -> Result<Vec<FhirTask>, TaskStoreError>;

    /// Advance the status of an existing task. A write that does not advance
    /// the lifecycle (see [`TaskStatus::can_advance_to`]) is ignored; either
    /// way the stored record is returned.
    fn set_status(&self, id: &str, status: TaskStatus) -> Result<FhirTask, TaskStoreError>;

    /// Release the underlying connection. Safe to call more than once; every
    /// operation after the first call fails with [`TaskStoreError::Closed`].
    fn teardown(&self);
}
