//! Key/value settings and the recent-path list stored in the `config` table.

use super::{QuotaStore, StoreError};
use crate::domain::{RecentPathList, SourcePath};
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use tracing::warn;

pub const RECENT_PATHS_KEY: &str = "recent_paths";

impl QuotaStore {
    pub fn setting(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.connection()?;
        let value = conn
            .query_row("SELECT value FROM config WHERE key = ?1", params![key], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(value.flatten())
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO config(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Stored recent paths, most recent first. A corrupt value reads as empty.
    pub fn recent_paths(&mut self) -> Result<RecentPathList, StoreError> {
        let Some(raw) = self.setting(RECENT_PATHS_KEY)? else {
            return Ok(RecentPathList::default());
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(paths) => Ok(RecentPathList::from_paths(paths)),
            Err(err) => {
                warn!("Ignoring corrupt recent path list: {}", err);
                Ok(RecentPathList::default())
            }
        }
    }

    /// Record an explicit user selection and return the updated list.
    pub fn add_recent_path(&mut self, path: &Path) -> Result<RecentPathList, StoreError> {
        let mut list = self.recent_paths()?;
        list.push(SourcePath::resolve(path).as_str());
        self.store_recent_paths(&list)?;
        Ok(list)
    }

    pub(crate) fn store_recent_paths(&mut self, list: &RecentPathList) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(list)
            .map_err(|source| StoreError::Encode { key: RECENT_PATHS_KEY.to_string(), source })?;
        self.set_setting(RECENT_PATHS_KEY, &encoded)
    }
}
