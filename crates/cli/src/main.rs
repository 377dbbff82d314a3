//! TaskHub CLI - collaborative to-do list front-end.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use taskhub_core::{Category, Task, TaskFilter, TaskStatus, TaskUpdate, User, UserUpdate};
use taskhub_storage::JsonStorage;
use taskhub_work::{NewTask, TaskHub};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "taskhub")]
#[command(about = "Collaborative to-do list", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, env = "TASKHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Show task counts by status
    Stats,
    /// Hammer an in-memory hub from many threads and check nothing was lost
    Stress {
        /// Number of worker threads
        #[arg(long, default_value = "10")]
        workers: usize,
        /// Tasks created by each worker
        #[arg(long, default_value = "100")]
        per_worker: usize,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a new task
    Add {
        /// Title
        title: String,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Category (work, personal, shopping)
        #[arg(long, default_value = "work")]
        category: String,
        /// Assignee user id
        #[arg(long)]
        assign: Option<String>,
        /// Name for the assignee if it does not exist yet
        #[arg(long, requires = "assign")]
        user_name: Option<String>,
        /// Email for the assignee if it does not exist yet
        #[arg(long, requires = "assign")]
        user_email: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by assignee
        #[arg(long)]
        user: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Keyword in title or description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Mark a task in progress
    Start {
        /// Task ID
        id: String,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Change task fields
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// New assignee
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<String>,
        /// Clear the assignee
        #[arg(long)]
        unassign: bool,
    },
    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add or overwrite a user
    Add {
        /// User ID (e.g. user001)
        id: String,
        /// Display name
        name: String,
        /// Email
        email: String,
    },
    /// List users
    List,
    /// Show a user and their tasks
    Show {
        /// User ID
        id: String,
    },
    /// Change user fields
    Update {
        /// User ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove a user (their tasks keep the assignment)
    Remove {
        /// User ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    init_logging(&config.log_level);
    debug!(?config, "Configuration loaded");

    if let Commands::Stress { workers, per_worker } = &cli.command {
        return stress(*workers, *per_worker);
    }

    let storage = JsonStorage::new(&config.data_dir).await?;
    let hub = TaskHub::new().with_policy(config.assignee_policy());
    hub.load(&storage).await?;

    let mut dirty = false;
    if config.seed_users && hub.users().is_empty() {
        hub.users().add_user(User::new("user001", "Alice", "alice@example.com"))?;
        hub.users().add_user(User::new("user002", "Bob", "bob@example.com"))?;
        dirty = true;
    }

    dirty |= match cli.command {
        Commands::Task(cmd) => run_task(&hub, cmd)?,
        Commands::User(cmd) => run_user(&hub, cmd)?,
        Commands::Stats => {
            let stats = hub.tasks().stats();
            println!("TaskHub Status");
            println!("  PENDING: {}", stats.pending);
            println!("  IN_PROGRESS: {}", stats.in_progress);
            println!("  COMPLETED: {}", stats.completed);
            println!("  Total: {}", stats.total);
            println!("  Users: {}", hub.users().len());
            false
        }
        Commands::Stress { .. } => unreachable!("handled above"),
    };

    if dirty {
        hub.save(&storage).await?;
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs a task command. Returns whether anything changed.
fn run_task(hub: &TaskHub, cmd: TaskCommand) -> Result<bool> {
    match cmd {
        TaskCommand::Add { title, description, category, assign, user_name, user_email } => {
            let category: Category = category.parse()?;
            let mut spec = NewTask::new(title, description, category);
            if let Some(user_id) = assign {
                if let Some(name) = user_name {
                    let email = user_email.unwrap_or_default();
                    hub.ensure_user(user_id.as_str(), name, email)?;
                } else if !hub.users().contains(&user_id) {
                    println!("Note: user {user_id} does not exist yet");
                }
                spec = spec.assign_to(user_id);
            }
            let task = hub.create_task(spec)?;
            println!("Added task: {} - {}", task.id, task.title);
            Ok(true)
        }
        TaskCommand::List { user, category, status, search } => {
            let filter = TaskFilter {
                assigned_to: user.map(Into::into),
                category: category.map(|c| c.parse::<Category>()).transpose()?,
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                keyword: search,
            };
            let mut tasks = hub.tasks().find_tasks(&filter);
            tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            print_tasks(&tasks);
            Ok(false)
        }
        TaskCommand::Show { id } => {
            let Some(task) = hub.tasks().get_task_by_id(&id) else {
                bail!("task not found: {id}");
            };
            println!("Task: {}", task.id);
            println!("  Title: {}", task.title);
            println!("  Description: {}", task.description);
            println!("  Category: {}", task.category);
            println!("  Status: {}", task.status);
            match &task.assigned_to {
                Some(user_id) => match hub.users().get_user(user_id.as_str()) {
                    Some(user) => println!("  Assigned to: {user_id} ({user})"),
                    None => println!("  Assigned to: {user_id} (unknown user)"),
                },
                None => println!("  Assigned to: -"),
            }
            println!("  Created: {}", task.created_at);
            println!("  Updated: {}", task.updated_at);
            Ok(false)
        }
        TaskCommand::Start { id } => {
            let task = hub.tasks().start_task(&id)?;
            println!("Started: {task}");
            Ok(true)
        }
        TaskCommand::Complete { id } => {
            let task = hub.tasks().complete_task(&id)?;
            println!("Completed: {task}");
            Ok(true)
        }
        TaskCommand::Update { id, title, description, category, status, assign, unassign } => {
            let update = TaskUpdate {
                title,
                description,
                category: category.map(|c| c.parse::<Category>()).transpose()?,
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                assigned_to: if unassign { Some(None) } else { assign.map(|u| Some(u.into())) },
            };
            if update.is_empty() {
                bail!("nothing to update");
            }
            let task = hub.update_task(&id, &update)?;
            println!("Updated: {task}");
            Ok(true)
        }
        TaskCommand::Remove { id } => {
            if hub.tasks().remove_task(&id) {
                println!("Removed task {id}");
                Ok(true)
            } else {
                println!("No task with id {id}");
                Ok(false)
            }
        }
    }
}

/// Runs a user command. Returns whether anything changed.
fn run_user(hub: &TaskHub, cmd: UserCommand) -> Result<bool> {
    match cmd {
        UserCommand::Add { id, name, email } => {
            let existed = hub.users().contains(&id);
            hub.users().add_user(User::new(id.as_str(), name, email))?;
            println!("{} user {id}", if existed { "Overwrote" } else { "Added" });
            Ok(true)
        }
        UserCommand::List => {
            let mut users = hub.users().get_all_users();
            users.sort_by(|a, b| a.id.cmp(&b.id));
            println!("Users ({})", users.len());
            for user in users {
                println!("  {:<12} | {:<20} | {}", user.id, user.name, user.email);
            }
            Ok(false)
        }
        UserCommand::Show { id } => {
            let Some(user) = hub.users().get_user(&id) else {
                bail!("user not found: {id}");
            };
            println!("User: {}", user.id);
            println!("  Name: {}", user.name);
            println!("  Email: {}", user.email);
            let mut tasks = hub.tasks().get_tasks_by_user(id.as_str());
            tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            print_tasks(&tasks);
            Ok(false)
        }
        UserCommand::Update { id, name, email } => {
            let user = hub.users().update_user(&id, &UserUpdate { name, email })?;
            println!("Updated: {} - {user}", user.id);
            Ok(true)
        }
        UserCommand::Remove { id } => {
            if hub.users().remove_user(&id) {
                let orphaned = hub.tasks().get_tasks_by_user(id.as_str()).len();
                println!("Removed user {id}");
                if orphaned > 0 {
                    println!("  {orphaned} task(s) still reference {id}");
                }
                Ok(true)
            } else {
                println!("No user with id {id}");
                Ok(false)
            }
        }
    }
}

fn print_tasks(tasks: &[Task]) {
    println!("Tasks ({})", tasks.len());
    for task in tasks {
        println!(
            "  {} | {:<11} | {:<8} | {:<12} | {}",
            task.id,
            task.status.as_str(),
            task.category.as_str(),
            task.assigned_to.as_ref().map_or("-", |u| u.as_str()),
            task.title,
        );
    }
}

fn stress(workers: usize, per_worker: usize) -> Result<()> {
    let hub = TaskHub::new();
    let started = Instant::now();

    std::thread::scope(|s| {
        for worker in 0..workers {
            let hub = &hub;
            s.spawn(move || {
                for i in 0..per_worker {
                    let spec = NewTask::new(format!("ThreadTask-{worker}-{i}"), "stress", Category::Work)
                        .assign_to(format!("worker{worker}"));
                    if let Err(e) = hub.create_task(spec) {
                        tracing::error!(worker, error = %e, "create failed");
                    }
                }
            });
        }
    });

    let tasks = hub.tasks().get_all_tasks();
    let unique: std::collections::HashSet<_> = tasks.iter().map(|t| &t.id).collect();
    let expected = workers * per_worker;
    info!(expected, stored = tasks.len(), unique = unique.len(), elapsed = ?started.elapsed(), "Stress run finished");

    println!("Workers: {workers}, tasks each: {per_worker}");
    println!("Stored: {} (unique ids: {})", tasks.len(), unique.len());
    println!("Elapsed: {:?}", started.elapsed());
    if tasks.len() != expected || unique.len() != expected {
        bail!("expected {expected} tasks with unique ids");
    }
    println!("OK");
    Ok(())
}
