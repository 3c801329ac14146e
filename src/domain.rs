//! Core data model: quota records, source paths and the recent-path list.

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Label used by the vendor when a quota or refill category is absent.
pub const UNKNOWN: &str = "Unknown";

/// Maximum number of entries kept in a [`RecentPathList`].
pub const RECENT_PATHS_CAP: usize = 10;

/// Timestamp layout for records. Lexicographic order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Absolute path of the file a record was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourcePath(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourcePathError {
    #[error("source path is empty")]
    Empty,
    #[error("source path is not absolute: {0}")]
    Relative(String),
}

impl SourcePath {
    /// Normalize user input to an absolute path against the current directory.
    ///
    /// `.` and `..` are folded lexically so one file always maps to one string.
    /// Symlinks are left unresolved.
    pub fn resolve(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self(normalize_lexically(&absolute).to_string_lossy().into_owned())
    }

    /// Accept a persisted value. Relative values are ambiguous for exact-match
    /// lookups and are rejected instead of guessed.
    pub fn from_stored(value: &str) -> Result<Self, SourcePathError> {
        if value.is_empty() {
            return Err(SourcePathError::Empty);
        }
        if !Path::new(value).is_absolute() {
            return Err(SourcePathError::Relative(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root or a prefix.
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduled replenishment of quota capacity.
///
/// When `kind` is [`UNKNOWN`] the remaining fields always hold their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Refill {
    kind: String,
    next: String,
    amount: f64,
    duration: String,
}

impl Default for Refill {
    fn default() -> Self {
        Self { kind: UNKNOWN.to_string(), next: String::new(), amount: 0.0, duration: String::new() }
    }
}

impl Refill {
    pub fn new(kind: &str, next: &str, amount: f64, duration: &str) -> Self {
        if kind == UNKNOWN {
            return Self::default();
        }
        Self {
            kind: kind.to_string(),
            next: next.to_string(),
            amount,
            duration: duration.to_string(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn next(&self) -> &str {
        &self.next
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }
}

/// One timestamped snapshot of quota state.
///
/// Records are append-only history: there are no setters, and the derived
/// `percentage` is computed from `current` and `maximum` on every construction.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaRecord {
    quota_type: String,
    current: f64,
    maximum: f64,
    percentage: f64,
    valid_until: String,
    refill: Refill,
    timestamp: String,
    source_path: SourcePath,
}

impl QuotaRecord {
    /// Empty record for `source_path`, stamped with the current time.
    pub fn new(source_path: SourcePath) -> Self {
        Self::with_timestamp(source_path, now_timestamp())
    }

    pub fn with_timestamp(source_path: SourcePath, timestamp: String) -> Self {
        Self {
            quota_type: UNKNOWN.to_string(),
            current: 0.0,
            maximum: 0.0,
            percentage: 0.0,
            valid_until: String::new(),
            refill: Refill::default(),
            timestamp,
            source_path,
        }
    }

    pub fn with_quota(mut self, quota_type: &str, current: f64, maximum: f64, until: &str) -> Self {
        self.quota_type = quota_type.to_string();
        self.valid_until = until.to_string();
        self.with_usage(current, maximum)
    }

    pub fn with_usage(mut self, current: f64, maximum: f64) -> Self {
        self.current = current;
        self.maximum = maximum;
        self.percentage = usage_percentage(current, maximum);
        self
    }

    pub fn with_refill(mut self, refill: Refill) -> Self {
        self.refill = refill;
        self
    }

    pub fn quota_type(&self) -> &str {
        &self.quota_type
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn valid_until(&self) -> &str {
        &self.valid_until
    }

    pub fn refill(&self) -> &Refill {
        &self.refill
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn source_path(&self) -> &SourcePath {
        &self.source_path
    }

    /// True when nothing beyond the defaults was recovered from the source.
    pub fn is_empty(&self) -> bool {
        self.quota_type == UNKNOWN
            && self.current == 0.0
            && self.maximum == 0.0
            && self.valid_until.is_empty()
            && self.refill.kind == UNKNOWN
    }
}

/// `current / maximum * 100`, or 0 when there is no maximum. Not clamped.
pub fn usage_percentage(current: f64, maximum: f64) -> f64 {
    if maximum > 0.0 {
        current / maximum * 100.0
    } else {
        0.0
    }
}

/// Entry of the flat-file history that predates the SQLite store.
///
/// The stored `percentage` is read but never trusted; it is recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEntry {
    #[serde(rename = "type", default = "unknown_label")]
    pub quota_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub maximum: f64,
    #[serde(default)]
    pub until: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage: f64,
    #[serde(default = "unknown_label")]
    pub refill_type: String,
    #[serde(default)]
    pub next_refill: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub refill_amount: f64,
    #[serde(default)]
    pub refill_duration: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub file_path: String,
}

impl LegacyEntry {
    /// Convert to a record. Entries without a source path cannot be looked up
    /// later and yield `None`.
    pub fn into_record(self) -> Option<QuotaRecord> {
        if self.file_path.trim().is_empty() {
            return None;
        }
        let source = SourcePath::resolve(Path::new(&self.file_path));
        let timestamp = self.timestamp.filter(|t| !t.is_empty()).unwrap_or_else(now_timestamp);
        let refill = Refill::new(
            &self.refill_type,
            &self.next_refill,
            self.refill_amount,
            &self.refill_duration,
        );
        Some(
            QuotaRecord::with_timestamp(source, timestamp)
                .with_quota(&self.quota_type, self.current, self.maximum, &self.until)
                .with_refill(refill),
        )
    }
}

fn unknown_label() -> String {
    UNKNOWN.to_string()
}

/// Accept a JSON number, a numeric string, or null (as 0).
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
        Null(()),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrString::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        NumberOrString::Null(()) => Ok(0.0),
    }
}

/// Most-recent-first list of explicitly selected paths, de-duplicated and capped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentPathList(Vec<String>);

impl RecentPathList {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        let collected: Vec<String> = paths.into_iter().map(Into::into).collect();
        for path in collected.into_iter().rev() {
            list.push(path);
        }
        list
    }

    /// Move `path` to the front, dropping any older occurrence and the tail beyond the cap.
    pub fn push(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.0.retain(|existing| existing != &path);
        self.0.insert(0, path);
        self.0.truncate(RECENT_PATHS_CAP);
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.0.iter().position(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
