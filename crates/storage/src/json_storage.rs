//! JSON file storage implementation.
//!
//! Keeps one file per record kind under a root directory:
//!
//! ```text
//! <root>/
//! ├── tasks.json   # {"tasks": [...], "lastModified": "<RFC 3339>"}
//! └── users.json   # {"users": [...], "lastModified": "<RFC 3339>"}
//! ```
//!
//! Writes go to a uniquely named `.<file>.<ulid>.tmp` in the same directory
//! and are renamed into place, so a crash mid-write never leaves a truncated
//! snapshot behind and writers sharing a directory never share a temp file.

use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use taskhub_core::{Task, User};
use super::{Storage, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use ulid::Ulid;

const TASKS_FILE: &str = "tasks.json";
const USERS_FILE: &str = "users.json";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    // Orders saves made through this instance.
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Opened JSON storage");

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the snapshot files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_tasks(&self) -> Result<Vec<Task>> {
        read_snapshot(&self.tasks_path(), "tasks").await
    }

    async fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_snapshot(&self.tasks_path(), "tasks", tasks).await
    }

    async fn load_users(&self) -> Result<Vec<User>> {
        read_snapshot(&self.users_path(), "users").await
    }

    async fn save_users(&self, users: &[User]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_snapshot(&self.users_path(), "users", users).await
    }
}

/// Read the array stored under `field`.
///
/// Missing files load as empty. So do files that are not valid JSON or
/// that lack the array; those are reported with a warning.
async fn read_snapshot<T: DeserializeOwned>(path: &Path, field: &str) -> Result<Vec<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut doc: serde_json::Value = match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid JSON in snapshot file, starting empty");
            return Ok(Vec::new());
        }
    };

    match doc.get_mut(field).map(serde_json::Value::take) {
        Some(items @ serde_json::Value::Array(_)) => {
            let items: Vec<T> = serde_json::from_value(items)?;
            debug!(path = %path.display(), count = items.len(), "Loaded snapshot");
            Ok(items)
        }
        _ => {
            warn!(path = %path.display(), field, "Invalid snapshot structure, starting empty");
            Ok(Vec::new())
        }
    }
}

async fn write_snapshot<T: Serialize>(path: &Path, field: &str, items: &[T]) -> Result<()> {
    let mut doc = serde_json::Map::new();
    doc.insert(field.to_string(), serde_json::to_value(items)?);
    doc.insert(
        "lastModified".to_string(),
        serde_json::to_value(chrono::Utc::now())?,
    );
    let json = serde_json::to_string_pretty(&doc)?;

    let tmp = temp_path(path);
    if let Err(e) = replace_file(&tmp, path, json.as_bytes()).await {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            debug!(path = %tmp.display(), error = %cleanup, "Temp file not removed");
        }
        return Err(e.into());
    }

    debug!(path = %path.display(), count = items.len(), "Saved snapshot");
    Ok(())
}

/// A temp path next to `path` that no other writer will pick.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", Ulid::new()))
}

async fn replace_file(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(tmp, bytes).await?;
    fs::rename(tmp, path).await
}
