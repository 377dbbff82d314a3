//! TaskHub core data models.
//!
//! This crate defines the records shared by every layer of the
//! collaborative task store: tasks, users, their identifiers and the
//! error taxonomy the managers report.

#![warn(missing_docs)]

// Core identities
mod id;

// Records
mod task;
mod user;

mod error;

// Re-exports
pub use id::*;

pub use task::{Category, Task, TaskFilter, TaskStats, TaskStatus, TaskUpdate};
pub use user::{User, UserUpdate};
pub use error::{Error, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
