//! Task model - the unit of work shared between collaborators.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::error::{Error, Result};
use crate::id::{TaskId, UserId};
use crate::Time;

/// A task represents one unit of work.
///
/// Tasks are minted by the task manager; callers never choose the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, immutable after creation
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Category
    pub category: Category,

    /// Current status
    pub status: TaskStatus,

    /// Assignee. A plain identifier: it may name a user that does not exist.
    pub assigned_to: Option<UserId>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Task {
    /// Build a pending task stamped with the current time.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        assigned_to: Option<UserId>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            title: title.into(),
            description: description.into(),
            category,
            status: TaskStatus::Pending,
            assigned_to,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`.
    ///
    /// The new stamp is strictly later than the previous one even if the
    /// wall clock has not moved (or moved backwards).
    pub fn touch(&mut self) {
        let now = chrono::Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::nanoseconds(1)
        };
    }

    /// Set the status and refresh `updated_at`.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.touch();
    }

    /// Whether the task is assigned to `user`.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assigned_to.as_ref() == Some(user)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({})", self.status, self.title, self.category)?;
        match &self.assigned_to {
            Some(user) => write!(f, " - assigned to {user}"),
            None => write!(f, " - unassigned"),
        }
    }
}

/// Task category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Work item
    Work,
    /// Personal errand
    Personal,
    /// Shopping list entry
    Shopping,
}

impl Category {
    /// Every valid category.
    pub const ALL: [Category; 3] = [Category::Work, Category::Personal, Category::Shopping];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "WORK",
            Category::Personal => "PERSONAL",
            Category::Shopping => "SHOPPING",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize(s);
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::InvalidEnumeration {
                kind: "category",
                value: s.to_string(),
            })
    }
}

/// Task status.
///
/// PENDING -> IN_PROGRESS -> COMPLETED, with PENDING -> COMPLETED allowed.
/// Transitions are not enforced; a completed task may be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
}

impl TaskStatus {
    /// Every valid status.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize(s);
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == normalized)
            .ok_or_else(|| Error::InvalidEnumeration {
                kind: "status",
                value: s.to_string(),
            })
    }
}

// "in-progress", "In_Progress" and "IN_PROGRESS" all name the same value.
fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace('-', "_")
}

/// Partial update for a task. Only the provided fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// New title (must not be blank)
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New category
    pub category: Option<Category>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee; `Some(None)` clears the assignment
    pub assigned_to: Option<Option<UserId>>,
}

impl TaskUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
    }

    /// Check the update without applying it.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::invalid("task title cannot be empty"));
            }
        }
        Ok(())
    }

    /// Apply to `task`. Returns whether anything was set.
    ///
    /// Validation happens before any field is touched, so a rejected update
    /// leaves the task as it was.
    pub fn apply(&self, task: &mut Task) -> Result<bool> {
        self.validate()?;
        if self.is_empty() {
            return Ok(false);
        }

        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        task.touch();
        Ok(true)
    }
}

/// Filter for querying tasks. All set criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Exact assignee match
    pub assigned_to: Option<UserId>,

    /// Filter by category
    pub category: Option<Category>,

    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring of title or description
    pub keyword: Option<String>,
}

impl TaskFilter {
    /// Filter that matches every task.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to an assignee.
    pub fn assigned_to(mut self, user: impl Into<UserId>) -> Self {
        self.assigned_to = Some(user.into());
        self
    }

    /// Restrict to a category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to a status.
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a keyword.
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Whether `task` satisfies every set criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(user) = &self.assigned_to {
            if !task.is_assigned_to(user) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if task.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let needle = keyword.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Task counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// All tasks
    pub total: usize,
    /// PENDING tasks
    pub pending: usize,
    /// IN_PROGRESS tasks
    pub in_progress: usize,
    /// COMPLETED tasks
    pub completed: usize,
}

impl<'a> FromIterator<&'a Task> for TaskStats {
    fn from_iter<I: IntoIterator<Item = &'a Task>>(iter: I) -> Self {
        iter.into_iter().fold(TaskStats::default(), |mut acc, task| {
            acc.total += 1;
            match task.status {
                TaskStatus::Pending => acc.pending += 1,
                TaskStatus::InProgress => acc.in_progress += 1,
                TaskStatus::Completed => acc.completed += 1,
            }
            acc
        })
    }
}
