//! SQLite-backed quota history
//!
//! [`QuotaStore`] owns the connection lifecycle. Every public operation runs a
//! cheap self-check first and transparently reconnects (re-running schema
//! initialization) when the connection has gone away, so a store can be held
//! across long idle periods. When the on-disk database cannot be opened the
//! store degrades to an in-memory database; [`QuotaStore::is_memory_fallback`]
//! reports that state so callers can warn that nothing will be persisted.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod history;
pub mod migrate;
pub mod schema;
pub mod settings;

pub use schema::init_schema;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no database connection available")]
    Unavailable,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("purge verification failed: {remaining} row(s) remained and the delete was rolled back")]
    IntegrityCheck { remaining: i64 },

    #[error("failed to encode setting {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OnDisk,
    /// Transient database; contents are lost when the process exits.
    MemoryFallback,
}

/// Files the store reads and writes.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub database: PathBuf,
    pub legacy_history: PathBuf,
    pub legacy_config: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            database: dir.join("database.db"),
            legacy_history: dir.join("history.json"),
            legacy_config: dir.join("config.json"),
        }
    }
}

pub struct QuotaStore {
    db_path: PathBuf,
    conn: Option<Connection>,
    backend: Backend,
}

impl QuotaStore {
    /// Connect and initialize the schema without touching legacy files.
    pub fn connect(db_path: &Path) -> Self {
        let mut store = Self { db_path: db_path.to_path_buf(), conn: None, backend: Backend::OnDisk };
        store.reconnect();
        store
    }

    /// Startup entry point: connect, then run the one-time legacy imports.
    pub fn open(paths: &StorePaths) -> Self {
        let mut store = Self::connect(&paths.database);

        match store.migrate_legacy_history(&paths.legacy_history) {
            Ok(0) => {}
            Ok(migrated) => info!("Migrated {} legacy history entries", migrated),
            Err(err) => warn!("Legacy history migration failed: {}", err),
        }
        if let Err(err) = store.import_legacy_recent_paths(&paths.legacy_config) {
            warn!("Legacy recent path import failed: {}", err);
        }

        store
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn is_memory_fallback(&self) -> bool {
        self.conn.is_some() && self.backend == Backend::MemoryFallback
    }

    pub fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Verify the connection with `SELECT 1`, reconnecting when it fails.
    pub fn ensure_connection(&mut self) -> Result<(), StoreError> {
        self.connection().map(|_| ())
    }

    /// Release the connection. Safe to call repeatedly; the next operation
    /// reconnects.
    pub fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close() {
            Ok(()) => debug!("Closed database connection to {}", self.db_path.display()),
            Err((_, err)) => warn!("Error while closing database connection: {}", err),
        }
    }

    pub(crate) fn connection(&mut self) -> Result<&mut Connection, StoreError> {
        let healthy = self
            .conn
            .as_ref()
            .is_some_and(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok());
        if !healthy {
            if self.conn.take().is_some() {
                warn!("Database connection check failed; reconnecting");
            }
            self.reconnect();
        }
        self.conn.as_mut().ok_or(StoreError::Unavailable)
    }

    fn reconnect(&mut self) {
        match open_on_disk(&self.db_path) {
            Ok(conn) => {
                debug!("Connected to database {}", self.db_path.display());
                self.conn = Some(conn);
                self.backend = Backend::OnDisk;
            }
            Err(err) => {
                warn!(
                    "Failed to open database {}: {}; falling back to an in-memory database",
                    self.db_path.display(),
                    err
                );
                match open_in_memory() {
                    Ok(conn) => {
                        self.conn = Some(conn);
                        self.backend = Backend::MemoryFallback;
                    }
                    Err(err) => {
                        warn!("In-memory database is unavailable too: {}", err);
                        self.conn = None;
                    }
                }
            }
        }
    }
}

fn open_on_disk(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}
