//! Task lifecycle management.

use taskhub_core::{
    Category, Error, Result, Task, TaskFilter, TaskId, TaskStats, TaskStatus, TaskUpdate, UserId,
};
use taskhub_storage::RecordStore;
use tracing::{debug, info};

/// Fields for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Title (required, trimmed)
    pub title: String,
    /// Description
    pub description: String,
    /// Category
    pub category: Category,
    /// Assignee, if any
    pub assigned_to: Option<UserId>,
}

impl NewTask {
    /// Unassigned task spec.
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            assigned_to: None,
        }
    }

    /// Set the assignee.
    pub fn assign_to(mut self, user: impl Into<UserId>) -> Self {
        self.assigned_to = Some(user.into());
        self
    }
}

/// Owns the task store and enforces task rules on top of it.
///
/// Ids are minted here, new tasks start PENDING, and every read-modify-write
/// runs under the task's entry lock so concurrent callers never lose each
/// other's changes.
#[derive(Debug, Default)]
pub struct TaskManager {
    tasks: RecordStore<Task>,
}

impl TaskManager {
    /// Create a manager with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task with a fresh id and status PENDING.
    pub fn create_task(&self, spec: NewTask) -> Result<Task> {
        let title = spec.title.trim();
        if title.is_empty() {
            return Err(Error::invalid("task title cannot be empty"));
        }

        let mut task = Task::new(
            TaskId::new(),
            title,
            spec.description,
            spec.category,
            spec.assigned_to,
        );
        // A ULID collision is practically impossible, but the store is the
        // authority on uniqueness.
        while !self.tasks.insert_new(task.id.as_str(), task.clone()) {
            task.id = TaskId::new();
        }

        info!(task_id = %task.id, category = %task.category, "Task created");
        Ok(task)
    }

    /// Force a task to COMPLETED, whatever its current status.
    pub fn complete_task(&self, id: &str) -> Result<Task> {
        self.set_status(id, TaskStatus::Completed)
    }

    /// Move a task to IN_PROGRESS.
    pub fn start_task(&self, id: &str) -> Result<Task> {
        self.set_status(id, TaskStatus::InProgress)
    }

    fn set_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        let task = self
            .tasks
            .update(id, |task| {
                task.set_status(status);
                task.clone()
            })
            .ok_or_else(|| Error::task_not_found(id))?;

        info!(task_id = %task.id, %status, "Task status changed");
        Ok(task)
    }

    /// Apply a partial update. Any status may be set, including reopening a
    /// completed task.
    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        update.validate()?;
        let task = self
            .tasks
            .try_update(id, |task| {
                update.apply(task)?;
                Ok::<_, Error>(task.clone())
            })?
            .ok_or_else(|| Error::task_not_found(id))?;

        debug!(task_id = %task.id, "Task updated");
        Ok(task)
    }

    /// Delete a task. Returns `false` if it was not there.
    pub fn remove_task(&self, id: &str) -> bool {
        let removed = self.tasks.remove(id);
        if removed {
            info!(task_id = id, "Task removed");
        }
        removed
    }

    /// Look up a task.
    pub fn get_task_by_id(&self, id: &str) -> Option<Task> {
        self.tasks.get(id)
    }

    /// Snapshot of every task.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.tasks.list_all()
    }

    /// Tasks whose assignee is exactly `user`.
    pub fn get_tasks_by_user(&self, user: impl Into<UserId>) -> Vec<Task> {
        self.find_tasks(&TaskFilter::all().assigned_to(user))
    }

    /// Tasks in `category`.
    pub fn get_tasks_by_category(&self, category: Category) -> Vec<Task> {
        self.find_tasks(&TaskFilter::all().category(category))
    }

    /// Tasks with `status`.
    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.find_tasks(&TaskFilter::all().status(status))
    }

    /// Tasks whose title or description contains `keyword`, ignoring case.
    pub fn search_tasks(&self, keyword: &str) -> Vec<Task> {
        self.find_tasks(&TaskFilter::all().keyword(keyword))
    }

    /// Tasks matching `filter`.
    ///
    /// A linear scan over a snapshot; an index could replace it without
    /// changing the result.
    pub fn find_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks.filter(|task| filter.matches(task))
    }

    /// Counts by status.
    pub fn stats(&self) -> TaskStats {
        self.tasks.list_all().iter().collect()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replace every task with a persisted snapshot, keeping their ids.
    pub fn restore(&self, tasks: Vec<Task>) {
        let count = tasks.len();
        self.tasks
            .replace_all(tasks.into_iter().map(|task| (task.id.to_string(), task)));
        debug!(count, "Tasks restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn spec(title: &str, category: Category, user: &str) -> NewTask {
        NewTask::new(title, "Desc", category).assign_to(user)
    }

    #[test]
    fn create_task_success() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("Buy Milk", Category::Shopping, "u1")).unwrap();

        assert!(!task.id.as_str().is_empty());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(manager.get_task_by_id(task.id.as_str()), Some(task));
    }

    #[test]
    fn create_task_trims_and_requires_title() {
        let manager = TaskManager::new();
        let task = manager.create_task(NewTask::new("  Pad  ", "", Category::Work)).unwrap();
        assert_eq!(task.title, "Pad");
        assert_eq!(task.assigned_to, None);

        let err = manager.create_task(NewTask::new(" ", "", Category::Work)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn assignment_may_dangle() {
        let manager = TaskManager::new();
        manager.create_task(spec("Code", Category::Work, "user99")).unwrap();

        let tasks = manager.get_tasks_by_user("user99");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].assigned_to, Some(UserId::new("user99")));
    }

    #[test]
    fn complete_task_flow() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("Test Task", Category::Work, "u1")).unwrap();

        let completed = manager.complete_task(task.id.as_str()).unwrap();
        assert_eq!(completed.status, TaskStatus::Completed);
        assert!(completed.updated_at > task.updated_at);
        assert_eq!(completed.created_at, task.created_at);

        let stored = manager.get_task_by_id(task.id.as_str()).unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
    }

    #[test]
    fn complete_non_existent_task() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("Keep", Category::Work, "u1")).unwrap();

        let err = manager.complete_task("NON_EXISTENT_ID_999").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(manager.get_all_tasks(), vec![task]);
    }

    #[test]
    fn start_then_complete_then_reopen() {
        let manager = TaskManager::new();
        let id = manager.create_task(spec("t", Category::Work, "u1")).unwrap().id;

        assert_eq!(manager.start_task(id.as_str()).unwrap().status, TaskStatus::InProgress);
        assert_eq!(manager.complete_task(id.as_str()).unwrap().status, TaskStatus::Completed);

        let reopened = manager
            .update_task(
                id.as_str(),
                &TaskUpdate { status: Some(TaskStatus::Pending), ..Default::default() },
            )
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
    }

    #[test]
    fn update_task_errors() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("t", Category::Work, "u1")).unwrap();

        let blank = TaskUpdate { title: Some(String::new()), ..Default::default() };
        assert!(matches!(
            manager.update_task(task.id.as_str(), &blank),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(manager.get_task_by_id(task.id.as_str()), Some(task));

        let rename = TaskUpdate { title: Some("x".into()), ..Default::default() };
        assert!(manager.update_task("missing", &rename).unwrap_err().is_not_found());
    }

    #[test]
    fn remove_task_twice() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("Delete Me", Category::Personal, "u1")).unwrap();

        assert!(manager.remove_task(task.id.as_str()));
        assert_eq!(manager.get_task_by_id(task.id.as_str()), None);
        assert!(!manager.remove_task(task.id.as_str()));
        assert!(!manager.remove_task("fake-id"));
    }

    #[test]
    fn filters_by_category_status_and_keyword() {
        let manager = TaskManager::new();
        let milk = manager.create_task(spec("Buy Milk", Category::Shopping, "u1")).unwrap();
        let report = manager.create_task(spec("Write report", Category::Work, "u2")).unwrap();
        manager.complete_task(report.id.as_str()).unwrap();

        let shopping = manager.get_tasks_by_category(Category::Shopping);
        assert_eq!(shopping.len(), 1);
        assert_eq!(shopping[0].id, milk.id);

        let done = manager.get_tasks_by_status(TaskStatus::Completed);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, report.id);

        assert_eq!(manager.search_tasks("REPORT").len(), 1);
        assert_eq!(manager.search_tasks("desc").len(), 2);
        assert!(manager.get_tasks_by_category(Category::Personal).is_empty());

        let stats = manager.stats();
        assert_eq!((stats.total, stats.pending, stats.completed), (2, 1, 1));
    }

    #[test]
    fn restore_keeps_ids() {
        let source = TaskManager::new();
        source.create_task(spec("a", Category::Work, "u1")).unwrap();
        source.create_task(spec("b", Category::Work, "u1")).unwrap();

        let target = TaskManager::new();
        target.create_task(spec("stale", Category::Work, "u1")).unwrap();
        target.restore(source.get_all_tasks());

        let mut expected: Vec<_> = source.get_all_tasks().into_iter().map(|t| t.id).collect();
        let mut actual: Vec<_> = target.get_all_tasks().into_iter().map(|t| t.id).collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn concurrent_creates_are_all_kept() {
        let manager = TaskManager::new();
        std::thread::scope(|s| {
            for i in 0..10 {
                let manager = &manager;
                s.spawn(move || {
                    manager
                        .create_task(spec(&format!("ThreadTask-{i}"), Category::Work, "u1"))
                        .unwrap();
                });
            }
        });

        let tasks = manager.get_all_tasks();
        assert_eq!(tasks.len(), 10);
        let ids: HashSet<_> = tasks.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn concurrent_updates_to_one_task_are_serialized() {
        let manager = TaskManager::new();
        let task = manager.create_task(spec("shared", Category::Work, "u1")).unwrap();
        let id = task.id.as_str();

        let stamps: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let manager = &manager;
                    s.spawn(move || {
                        (0..50)
                            .map(|j| {
                                let update = TaskUpdate {
                                    description: Some(format!("{i}-{j}")),
                                    ..Default::default()
                                };
                                manager.update_task(id, &update).unwrap().updated_at
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        // Each update observed the previous one's stamp, so all 400 differ.
        let unique: HashSet<_> = stamps.iter().collect();
        assert_eq!(unique.len(), 400);
        let last = manager.get_task_by_id(id).unwrap();
        assert_eq!(Some(&last.updated_at), stamps.iter().max());
    }

    #[test]
    fn concurrent_completions_all_succeed() {
        let manager = TaskManager::new();
        let id = manager.create_task(spec("t", Category::Work, "u1")).unwrap().id;

        std::thread::scope(|s| {
            for _ in 0..8 {
                let manager = &manager;
                let id = id.as_str();
                s.spawn(move || manager.complete_task(id).unwrap());
            }
        });
        assert_eq!(
            manager.get_task_by_id(id.as_str()).unwrap().status,
            TaskStatus::Completed
        );
    }

    proptest! {
        #[test]
        fn tasks_by_user_is_exact(assignees in proptest::collection::vec(0u8..4, 0..40)) {
            let manager = TaskManager::new();
            let mut expected: Vec<TaskId> = Vec::new();
            for (i, user) in assignees.iter().enumerate() {
                let task = manager
                    .create_task(spec(&format!("t{i}"), Category::Work, &format!("user{user}")))
                    .unwrap();
                if *user == 1 {
                    expected.push(task.id);
                }
            }

            let mut actual: Vec<TaskId> =
                manager.get_tasks_by_user("user1").into_iter().map(|t| t.id).collect();
            actual.sort();
            expected.sort();
            prop_assert_eq!(actual, expected);
        }
    }
}
