//! quota-analyzer: inspect JetBrains AI Assistant quota files
//!
//! Analyzes quota snapshots, keeps a history of them in SQLite and suggests
//! the paths you check most often.

use anyhow::Result;

fn main() -> Result<()> {
    quota_analyzer::cli::run()
}
