//! Append-only history rows: insert, lookup by path, distinct paths and purge.

use super::{QuotaStore, StoreError};
use crate::domain::{QuotaRecord, Refill, SourcePath, UNKNOWN};
use crate::rank::recommended_paths;
use rusqlite::{params, Connection, Row};
use std::path::{Path, MAIN_SEPARATOR};
use tracing::{debug, warn};

const RECORD_COLUMNS: &str = "type, current, maximum, until, percentage, refill_type, \
     next_refill, refill_amount, refill_duration, timestamp, file_path";

/// How a history path filter matches `file_path`, decided from the filesystem
/// at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// The filter names an existing directory: match it and everything below.
    Prefix(String),
    /// A file, or a path that does not currently exist.
    Exact(String),
}

impl PathMatch {
    pub fn for_filter(filter: &Path) -> Self {
        let resolved = SourcePath::resolve(filter).as_str().to_string();
        if filter.is_dir() {
            let mut prefix = resolved;
            if !prefix.ends_with(MAIN_SEPARATOR) {
                prefix.push(MAIN_SEPARATOR);
            }
            PathMatch::Prefix(prefix)
        } else {
            PathMatch::Exact(resolved)
        }
    }
}

impl QuotaStore {
    /// Append one record and return its row id.
    pub fn append(&mut self, record: &QuotaRecord) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        insert_record(conn, record).map_err(|err| {
            warn!("Failed to save history record for {}: {}", record.source_path(), err);
            StoreError::from(err)
        })
    }

    /// Up to `limit` records, newest first, optionally restricted by path.
    pub fn query_history(
        &mut self,
        limit: usize,
        path_filter: Option<&Path>,
    ) -> Result<Vec<QuotaRecord>, StoreError> {
        let path_match = path_filter.map(PathMatch::for_filter);
        let conn = self.connection()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let (sql, filter_value) = match &path_match {
            Some(PathMatch::Prefix(prefix)) => (
                format!(
                    "SELECT {RECORD_COLUMNS} FROM history
                     WHERE substr(file_path, 1, length(?1)) = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT ?2"
                ),
                Some(prefix.as_str()),
            ),
            Some(PathMatch::Exact(path)) => (
                format!(
                    "SELECT {RECORD_COLUMNS} FROM history
                     WHERE file_path = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT ?2"
                ),
                Some(path.as_str()),
            ),
            None => (
                format!(
                    "SELECT {RECORD_COLUMNS} FROM history
                     ORDER BY timestamp DESC, id DESC LIMIT ?1"
                ),
                None,
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = match filter_value {
            Some(value) => stmt.query_map(params![value, limit], record_from_row)?,
            None => stmt.query_map(params![limit], record_from_row)?,
        };

        let mut records = Vec::new();
        for row in rows {
            match row? {
                Some(record) => records.push(record),
                None => continue,
            }
        }
        debug!("Loaded {} history records", records.len());
        Ok(records)
    }

    /// Sorted unique non-empty source paths across all history rows.
    pub fn distinct_paths(&mut self) -> Result<Vec<String>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT file_path FROM history
             WHERE file_path IS NOT NULL AND file_path != ''
             ORDER BY file_path",
        )?;
        let paths = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(paths.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete every row, or the rows whose path equals `path_filter` exactly.
    ///
    /// The delete is verified by re-counting inside the same transaction; rows
    /// left behind roll the whole delete back. Returns the number of rows removed.
    pub fn purge(&mut self, path_filter: Option<&Path>) -> Result<usize, StoreError> {
        let target = path_filter.map(SourcePath::resolve);
        let conn = self.connection()?;
        let tx = conn.transaction()?;

        let table_exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'history'",
            [],
            |row| row.get(0),
        )?;
        if table_exists == 0 {
            return Ok(0);
        }

        let count = count_rows(&tx, target.as_ref())?;
        if count == 0 {
            return Ok(0);
        }

        match &target {
            Some(path) => tx.execute("DELETE FROM history WHERE file_path = ?1", params![path.as_str()])?,
            None => tx.execute("DELETE FROM history", [])?,
        };

        let remaining = count_rows(&tx, target.as_ref())?;
        if remaining > 0 {
            tx.rollback()?;
            warn!("Purge left {} rows behind; rolled back", remaining);
            return Err(StoreError::IntegrityCheck { remaining });
        }
        tx.commit()?;

        debug!("Purged {} history rows", count);
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Rank paths from the newest `window` history rows and the stored recent list.
    pub fn recommended_paths(
        &mut self,
        max_count: usize,
        window: usize,
    ) -> Result<Vec<String>, StoreError> {
        let history = self.query_history(window, None)?;
        let recent = self.recent_paths()?;
        Ok(recommended_paths(&history, &recent, max_count))
    }

    pub fn row_count(&mut self) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?)
    }
}

pub(crate) fn insert_record(conn: &Connection, record: &QuotaRecord) -> rusqlite::Result<i64> {
    let refill = record.refill();
    conn.execute(
        &format!(
            "INSERT INTO history ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            record.quota_type(),
            record.current(),
            record.maximum(),
            record.valid_until(),
            record.percentage(),
            refill.kind(),
            refill.next(),
            refill.amount(),
            refill.duration(),
            record.timestamp(),
            record.source_path().as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn count_rows(conn: &Connection, path: Option<&SourcePath>) -> rusqlite::Result<i64> {
    match path {
        Some(path) => conn.query_row(
            "SELECT COUNT(*) FROM history WHERE file_path = ?1",
            params![path.as_str()],
            |row| row.get(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0)),
    }
}

/// Rebuild a record from a row. The stored percentage (column 4) is ignored and
/// recomputed; rows with a missing or relative path are skipped.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Option<QuotaRecord>> {
    let file_path: Option<String> = row.get(10)?;
    let source = match SourcePath::from_stored(file_path.as_deref().unwrap_or_default()) {
        Ok(source) => source,
        Err(err) => {
            warn!("Skipping history row: {}", err);
            return Ok(None);
        }
    };

    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };
    let number = |idx: usize| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or_default())
    };

    let quota_type = row.get::<_, Option<String>>(0)?.unwrap_or_else(|| UNKNOWN.to_string());
    let refill_type = row.get::<_, Option<String>>(5)?.unwrap_or_else(|| UNKNOWN.to_string());
    let refill = Refill::new(&refill_type, &text(6)?, number(7)?, &text(8)?);

    Ok(Some(
        QuotaRecord::with_timestamp(source, text(9)?)
            .with_quota(&quota_type, number(1)?, number(2)?, &text(3)?)
            .with_refill(refill),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecentPathList;
    use std::fs;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> QuotaStore {
        QuotaStore::connect(&tmp.path().join("database.db"))
    }

    fn record(path: &Path, timestamp: &str) -> QuotaRecord {
        QuotaRecord::with_timestamp(SourcePath::resolve(path), timestamp.to_string())
            .with_quota("Available", 25.0, 100.0, "2025-01-01")
            .with_refill(Refill::new("Known", "2024-12-01", 100.0, "PT720H"))
    }

    #[test]
    fn append_then_query_round_trips() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let path = tmp.path().join("q.xml");
        fs::write(&path, "<application/>").expect("write file");
        let original = record(&path, "2024-05-01T10:00:00.000000");

        store.append(&original).expect("append");
        let loaded = store.query_history(1, Some(&path)).expect("query");
        assert_eq!(loaded, vec![original]);
    }

    #[test]
    fn dotted_and_clean_spellings_share_one_source_path() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let ide = tmp.path().join("ide");
        fs::create_dir_all(&ide).expect("mkdir");
        let clean = ide.join("q.xml");
        fs::write(&clean, "<application/>").expect("write file");
        let dotted = ide.join("..").join("ide").join(".").join("q.xml");

        store.append(&record(&dotted, "2024-05-01T10:00:00")).expect("append");
        assert_eq!(store.query_history(10, Some(&clean)).expect("query").len(), 1);
        assert_eq!(store.distinct_paths().expect("distinct"), vec![SourcePath::resolve(&clean).to_string()]);
        assert_eq!(store.purge(Some(&clean)).expect("purge"), 1);
    }

    #[test]
    fn query_orders_newest_first_and_limits() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let path = Path::new("/a/q.xml");
        for ts in ["2024-01-02T00:00:00", "2024-01-03T00:00:00", "2024-01-01T00:00:00"] {
            store.append(&record(path, ts)).expect("append");
        }

        let loaded = store.query_history(2, None).expect("query");
        let stamps: Vec<&str> = loaded.iter().map(QuotaRecord::timestamp).collect();
        assert_eq!(stamps, vec!["2024-01-03T00:00:00", "2024-01-02T00:00:00"]);
    }

    #[test]
    fn directory_filter_matches_nested_paths_and_file_filter_is_exact() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let dir_b = tmp.path().join("a").join("b");
        fs::create_dir_all(dir_b.join("c")).expect("mkdir");
        let f1 = dir_b.join("f1.xml");
        let f2 = dir_b.join("c").join("f2.xml");
        fs::write(&f1, "").expect("write f1");
        fs::write(&f2, "").expect("write f2");
        let sibling = tmp.path().join("a").join("bb.xml");

        store.append(&record(&f1, "2024-01-01T00:00:00")).expect("append f1");
        store.append(&record(&f2, "2024-01-02T00:00:00")).expect("append f2");
        store.append(&record(&sibling, "2024-01-03T00:00:00")).expect("append sibling");

        let under_dir = store.query_history(10, Some(&dir_b)).expect("dir query");
        assert_eq!(under_dir.len(), 2);

        let exact = store.query_history(10, Some(&f1)).expect("file query");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].source_path(), &SourcePath::resolve(&f1));
    }

    // A directory filter is classified against the filesystem when the query
    // runs: once the directory is gone the same filter becomes an exact match.
    #[test]
    fn deleted_directory_filter_degrades_to_exact_match() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let dir = tmp.path().join("ide");
        fs::create_dir_all(&dir).expect("mkdir");
        store.append(&record(&dir.join("q.xml"), "2024-01-01T00:00:00")).expect("append");

        assert_eq!(store.query_history(10, Some(&dir)).expect("query").len(), 1);

        fs::remove_dir_all(&dir).expect("remove dir");
        assert!(matches!(PathMatch::for_filter(&dir), PathMatch::Exact(_)));
        assert!(store.query_history(10, Some(&dir)).expect("query").is_empty());
    }

    #[test]
    fn prefix_filter_treats_like_wildcards_literally() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let dir = tmp.path().join("a_b");
        fs::create_dir_all(&dir).expect("mkdir");
        store.append(&record(&dir.join("q.xml"), "2024-01-01T00:00:00")).expect("append");
        store
            .append(&record(&tmp.path().join("axb").join("q.xml"), "2024-01-02T00:00:00"))
            .expect("append");

        assert_eq!(store.query_history(10, Some(&dir)).expect("query").len(), 1);
    }

    #[test]
    fn distinct_paths_are_sorted_and_unique() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        for path in ["/z/q.xml", "/a/q.xml", "/z/q.xml"] {
            store.append(&record(Path::new(path), "2024-01-01T00:00:00")).expect("append");
        }
        let expected: Vec<String> = ["/a/q.xml", "/z/q.xml"]
            .iter()
            .map(|p| SourcePath::resolve(Path::new(p)).as_str().to_string())
            .collect();
        assert_eq!(store.distinct_paths().expect("paths"), expected);
    }

    #[test]
    fn purge_all_empties_history() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        store.append(&record(Path::new("/a/q.xml"), "2024-01-01T00:00:00")).expect("append");
        store.append(&record(Path::new("/b/q.xml"), "2024-01-01T00:00:00")).expect("append");

        assert_eq!(store.purge(None).expect("purge"), 2);
        assert!(store.distinct_paths().expect("paths").is_empty());
    }

    #[test]
    fn purge_by_path_keeps_other_rows() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let a = Path::new("/a/q.xml");
        let b = Path::new("/b/q.xml");
        store.append(&record(a, "2024-01-01T00:00:00")).expect("append");
        store.append(&record(a, "2024-01-02T00:00:00")).expect("append");
        store.append(&record(b, "2024-01-01T00:00:00")).expect("append");

        assert_eq!(store.purge(Some(a)).expect("purge"), 2);
        let remaining = store.distinct_paths().expect("paths");
        assert_eq!(remaining, vec![SourcePath::resolve(b).as_str().to_string()]);
    }

    #[test]
    fn purge_with_nothing_to_delete_succeeds() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        assert_eq!(store.purge(None).expect("purge empty"), 0);
        assert_eq!(store.purge(Some(Path::new("/missing.xml"))).expect("purge path"), 0);
    }

    #[test]
    fn purge_rolls_back_when_rows_survive() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        store.append(&record(Path::new("/a/q.xml"), "2024-01-01T00:00:00")).expect("append");
        store
            .connection()
            .expect("conn")
            .execute_batch(
                "CREATE TRIGGER keep_history BEFORE DELETE ON history
                 BEGIN SELECT RAISE(IGNORE); END;",
            )
            .expect("install trigger");

        let err = store.purge(None).expect_err("rows survive the delete");
        assert!(matches!(err, StoreError::IntegrityCheck { remaining: 1 }));
        assert_eq!(store.row_count().expect("count"), 1);
    }

    #[test]
    fn rows_with_relative_paths_are_skipped() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        store
            .connection()
            .expect("conn")
            .execute("INSERT INTO history(type, timestamp, file_path) VALUES('x', '1', 'rel/q.xml')", [])
            .expect("seed");
        store.append(&record(Path::new("/a/q.xml"), "0")).expect("append");

        assert_eq!(store.query_history(10, None).expect("query").len(), 1);
    }

    #[test]
    fn recommended_paths_combine_history_and_recent_list() {
        let tmp = TempDir::new().expect("tmp");
        let mut store = store(&tmp);
        let a = Path::new("/a/q.xml");
        let b = Path::new("/b/q.xml");
        for _ in 0..4 {
            store.append(&record(a, "2024-01-01T00:00:00")).expect("append a");
        }
        store.append(&record(b, "2024-01-01T00:00:00")).expect("append b");
        store.add_recent_path(b).expect("recent");

        let recent = store.recent_paths().expect("recent paths");
        assert_eq!(recent, RecentPathList::from_paths([SourcePath::resolve(b).as_str()]));

        let ranked = store.recommended_paths(2, 100).expect("recommend");
        assert_eq!(
            ranked,
            vec![SourcePath::resolve(a).as_str().to_string(), SourcePath::resolve(b).as_str().to_string()]
        );
    }
}
