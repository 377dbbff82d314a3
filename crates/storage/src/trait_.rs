//! Storage trait abstraction.

use async_trait::async_trait;
use taskhub_core::{Task, User};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot persistence for TaskHub records.
///
/// Backends take and return whole snapshots, as produced by
/// [`RecordStore::list_all`](crate::RecordStore::list_all). The in-memory
/// stores stay the source of truth while the process runs.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Task operations ===

    /// Load every persisted task. A backend with nothing stored yields an
    /// empty list.
    async fn load_tasks(&self) -> Result<Vec<Task>>;

    /// Replace the persisted tasks with `tasks`.
    async fn save_tasks(&self, tasks: &[Task]) -> Result<()>;

    // === User operations ===

    /// Load every persisted user.
    async fn load_users(&self) -> Result<Vec<User>>;

    /// Replace the persisted users with `users`.
    async fn save_users(&self, users: &[User]) -> Result<()>;
}
