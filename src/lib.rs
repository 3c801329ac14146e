//! quota-analyzer: track JetBrains AI Assistant quota usage over time
//!
//! Quota snapshots are parsed from the IDE's `AIAssistantQuotaManager2.xml`,
//! appended to a local SQLite history, and ranked so frequently analyzed
//! files are offered first.

pub mod cli;
pub mod config;
pub mod discover;
pub mod domain;
pub mod parse;
pub mod rank;
pub mod render;
pub mod store;
