//! Configuration for the taskhub binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taskhub_work::AssigneePolicy;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "taskhub.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the JSON snapshots
    pub data_dir: PathBuf,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Reject tasks assigned to unknown users
    pub require_known_assignee: bool,

    /// Seed two demo users into an empty user store
    pub seed_users: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".taskhub"),
            log_level: "info".to_string(),
            require_known_assignee: false,
            seed_users: true,
        }
    }
}

impl Config {
    /// Load config from `path`, else `taskhub.json` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::read(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            return Self::read(fallback);
        }

        Ok(Config::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn assignee_policy(&self) -> AssigneePolicy {
        if self.require_known_assignee {
            AssigneePolicy::RequireExisting
        } else {
            AssigneePolicy::Permissive
        }
    }
}
