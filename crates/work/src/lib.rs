//! Work Management
//!
//! Lifecycle rules for tasks and users on top of the record stores, and the
//! [`TaskHub`] facade a front-end talks to.

#![warn(missing_docs)]

pub mod error;
pub mod hub;
pub mod task_manager;
pub mod user_manager;

pub use error::HubError;
pub use hub::{AssigneePolicy, TaskHub};
pub use task_manager::{NewTask, TaskManager};
pub use user_manager::UserManager;
