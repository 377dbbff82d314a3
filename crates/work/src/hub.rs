//! The TaskHub facade: both managers plus snapshot persistence.

use taskhub_core::{Error, Result, Task, TaskUpdate, User, UserId};
use taskhub_storage::Storage;
use tracing::info;

use crate::error::HubError;
use crate::task_manager::{NewTask, TaskManager};
use crate::user_manager::UserManager;

/// How task assignees are checked against the user store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssigneePolicy {
    /// Any id is accepted; references may dangle.
    #[default]
    Permissive,
    /// The assignee must be a known user when the task is written.
    RequireExisting,
}

/// Entry point for front-ends.
///
/// Each manager owns its own store; a task refers to its assignee only by
/// id, so removing a user leaves its tasks in place.
#[derive(Debug, Default)]
pub struct TaskHub {
    tasks: TaskManager,
    users: UserManager,
    policy: AssigneePolicy,
}

impl TaskHub {
    /// Create an empty hub with the permissive assignee policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the assignee policy.
    pub fn with_policy(mut self, policy: AssigneePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current assignee policy.
    pub fn policy(&self) -> AssigneePolicy {
        self.policy
    }

    /// The task manager, for queries and status changes.
    ///
    /// Its `create_task` and `update_task` do not consult the assignee
    /// policy. Set or change assignees through [`TaskHub::create_task`] and
    /// [`TaskHub::update_task`] instead.
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// The user manager.
    pub fn users(&self) -> &UserManager {
        &self.users
    }

    /// Create a task after checking the assignee against the policy.
    pub fn create_task(&self, spec: NewTask) -> Result<Task> {
        if let Some(user) = &spec.assigned_to {
            self.check_assignee(user)?;
        }
        self.tasks.create_task(spec)
    }

    /// Update a task after checking a new assignee against the policy.
    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        if let Some(Some(user)) = &update.assigned_to {
            self.check_assignee(user)?;
        }
        self.tasks.update_task(id, update)
    }

    /// Return the user with `id`, creating it first if it does not exist.
    pub fn ensure_user(
        &self,
        id: impl Into<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<User> {
        let user = User::new(id, name, email);
        let id = user.id.clone();
        self.users.add_user_if_absent(user)?;
        self.users
            .get_user(id.as_str())
            .ok_or_else(|| Error::user_not_found(&id))
    }

    fn check_assignee(&self, user: &UserId) -> Result<()> {
        match self.policy {
            AssigneePolicy::Permissive => Ok(()),
            AssigneePolicy::RequireExisting if self.users.contains(user.as_str()) => Ok(()),
            AssigneePolicy::RequireExisting => {
                Err(Error::invalid(format!("unknown assignee: {user}")))
            }
        }
    }

    /// Replace both stores with the snapshots held by `storage`.
    pub async fn load<S: Storage + ?Sized>(&self, storage: &S) -> std::result::Result<(), HubError> {
        let tasks = storage.load_tasks().await?;
        let users = storage.load_users().await?;
        info!(tasks = tasks.len(), users = users.len(), "Loaded snapshot");

        self.tasks.restore(tasks);
        self.users.restore(users);
        Ok(())
    }

    /// Write snapshots of both stores to `storage`.
    pub async fn save<S: Storage + ?Sized>(&self, storage: &S) -> std::result::Result<(), HubError> {
        let tasks = self.tasks.get_all_tasks();
        let users = self.users.get_all_users();
        storage.save_tasks(&tasks).await?;
        storage.save_users(&users).await?;
        info!(tasks = tasks.len(), users = users.len(), "Saved snapshot");
        Ok(())
    }
}
