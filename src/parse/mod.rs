//! Quota file parsing
//!
//! Extracts a [`QuotaRecord`](crate::domain::QuotaRecord) from the XML options
//! file the IDE writes, where the interesting data sits in JSON payloads
//! embedded in `<option value="...">` attributes.

use std::path::PathBuf;
use thiserror::Error;

pub mod quota_xml;

pub use quota_xml::{parse, try_parse};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read quota file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {reason}")]
    MalformedXml { path: PathBuf, reason: String },

    #[error("no quotaInfo option found in {0}")]
    MissingQuotaInfo(PathBuf),

    #[error("invalid quotaInfo payload in {path}: {source}")]
    InvalidQuotaInfo {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
