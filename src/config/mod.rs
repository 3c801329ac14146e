//! Configuration loading and data directory resolution
//!
//! Handles loading from config files and CLI/env overrides with proper
//! precedence (CLI/Env > File > Defaults).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::StorePaths;

pub mod loader;
pub mod paths;

pub use loader::load_config;
pub use paths::resolve_data_dir;

pub const DEFAULT_QUOTA_FILE_NAME: &str = "AIAssistantQuotaManager2.xml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory holding the database and legacy files; probed when unset.
    pub data_dir: Option<PathBuf>,
    pub database_file: String,
    pub legacy_history_file: String,
    pub legacy_config_file: String,
    /// Rows shown by `history` when no limit is given.
    pub history_limit: usize,
    /// Paths offered by `recommend` and the interactive picker.
    pub recommend_count: usize,
    /// Newest history rows considered when ranking paths.
    pub recommend_window: usize,
    /// Loopback port bound by the interactive session as an instance lock.
    pub lock_port: u16,
    pub quota_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "database.db".to_string(),
            legacy_history_file: "history.json".to_string(),
            legacy_config_file: "config.json".to_string(),
            history_limit: 10,
            recommend_count: 5,
            recommend_window: 100,
            lock_port: 12345,
            quota_file_name: DEFAULT_QUOTA_FILE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    pub fn store_paths(&self, data_dir: &Path) -> StorePaths {
        StorePaths {
            database: data_dir.join(&self.database_file),
            legacy_history: data_dir.join(&self.legacy_history_file),
            legacy_config: data_dir.join(&self.legacy_config_file),
        }
    }
}
