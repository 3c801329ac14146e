//! One-time import of the JSON files that predate the SQLite store.

use super::history::insert_record;
use super::settings::RECENT_PATHS_KEY;
use super::{QuotaStore, StoreError};
use crate::domain::{LegacyEntry, RecentPathList};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
struct LegacyConfig {
    #[serde(default)]
    recent_paths: Vec<String>,
}

impl QuotaStore {
    /// Import the legacy JSON history when, and only when, the history table is
    /// empty. Once any row exists this is a no-op forever, so repeated calls
    /// never duplicate rows. Returns the number of rows imported.
    pub fn migrate_legacy_history(&mut self, legacy_path: &Path) -> Result<usize, StoreError> {
        let conn = self.connection()?;
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        if existing > 0 {
            debug!("History table already populated; skipping legacy migration");
            return Ok(0);
        }

        let entries = load_legacy_history(legacy_path);
        if entries.is_empty() {
            return Ok(0);
        }
        info!("Migrating {} legacy history entries from {}", entries.len(), legacy_path.display());

        let tx = conn.transaction()?;
        let mut migrated = 0usize;
        for entry in entries {
            match entry.into_record() {
                Some(record) => {
                    insert_record(&tx, &record)?;
                    migrated += 1;
                }
                None => warn!("Skipping legacy history entry without a file path"),
            }
        }
        tx.commit()?;
        Ok(migrated)
    }

    /// Seed the recent-path list from the legacy `config.json` when no list
    /// has been stored yet.
    pub fn import_legacy_recent_paths(&mut self, legacy_config: &Path) -> Result<usize, StoreError> {
        if self.setting(RECENT_PATHS_KEY)?.is_some() {
            return Ok(0);
        }
        let Some(config) = read_json::<LegacyConfig>(legacy_config) else {
            return Ok(0);
        };
        if config.recent_paths.is_empty() {
            return Ok(0);
        }

        let list = RecentPathList::from_paths(config.recent_paths);
        self.store_recent_paths(&list)?;
        Ok(list.len())
    }
}

/// Entries of the legacy history file. A missing or unreadable file yields an
/// empty list; individual malformed entries are skipped.
pub fn load_legacy_history(path: &Path) -> Vec<LegacyEntry> {
    let Some(values) = read_json::<Vec<Value>>(path) else {
        return Vec::new();
    };
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<LegacyEntry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping malformed legacy history entry: {}", err);
                None
            }
        })
        .collect()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read {}: {}", path.display(), err);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Failed to parse {}: {}", path.display(), err);
            None
        }
    }
}
