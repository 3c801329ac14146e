//! SQLite schema for quota history.

use rusqlite::Connection;

/// Column layout mirrors the record fields in declaration order. `history` is
/// append-only and carries no uniqueness constraint beyond its key.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT,
        current REAL,
        maximum REAL,
        until TEXT,
        percentage REAL,
        refill_type TEXT,
        next_refill TEXT,
        refill_amount REAL,
        refill_duration TEXT,
        timestamp TEXT,
        file_path TEXT
    );

    CREATE TABLE IF NOT EXISTS config (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT UNIQUE,
        value TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_history_file_path ON history(file_path);
    CREATE INDEX IF NOT EXISTS idx_history_timestamp ON history(timestamp);
";

/// Create both tables if absent. Safe to call on every (re)connect; existing
/// tables are never dropped or altered.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
