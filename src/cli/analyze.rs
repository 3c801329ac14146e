//! Analyze and find commands

use anyhow::{bail, Result};
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use super::AppContext;
use crate::discover::{find_quota_files, jetbrains_config_root, resolve_quota_file};
use crate::domain::QuotaRecord;
use crate::parse::parse;
use crate::render::quota_details;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Quota file or IDE config directory; analyzes every auto-found file when omitted
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct FindArgs {
    /// Analyze every file that was found
    #[arg(long)]
    pub all: bool,

    /// JetBrains config root to search instead of the platform default
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

pub fn run(ctx: &mut AppContext, args: AnalyzeArgs) -> Result<()> {
    match args.path {
        Some(path) => {
            let record = analyze_path(ctx, &path)?;
            remember_selection(ctx, &record);
            println!("{}", quota_details(&record));
            Ok(())
        }
        None => analyze_all(ctx, &found_files(ctx, None)),
    }
}

pub fn run_find(ctx: &mut AppContext, args: FindArgs) -> Result<()> {
    let files = found_files(ctx, args.root.as_deref());
    if files.is_empty() {
        println!("{}", style("No quota files found").blue().bold());
        return Ok(());
    }

    println!("{}", style(format!("Found {} quota file(s):", files.len())).blue().bold());
    for (index, file) in files.iter().enumerate() {
        println!("  {}. {}", index + 1, file.display());
    }

    if args.all {
        println!();
        analyze_all(ctx, &files)?;
    }
    Ok(())
}

/// Resolve `path` to a quota file, parse it and append it to history.
pub(crate) fn analyze_path(ctx: &mut AppContext, path: &Path) -> Result<QuotaRecord> {
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }
    let Some(file) = resolve_quota_file(path, &ctx.config.quota_file_name) else {
        bail!("No {} found under {}", ctx.config.quota_file_name, path.display());
    };

    let record = parse(&file);
    if let Err(err) = ctx.store.append(&record) {
        eprintln!("{}", style(format!("warning: failed to save history record: {err}")).yellow());
    }
    Ok(record)
}

/// Push an explicitly chosen file onto the recent-path list. Bulk scans never
/// call this, so the recency bonus only reflects user choices.
pub(crate) fn remember_selection(ctx: &mut AppContext, record: &QuotaRecord) {
    remember_path(ctx, &record.source_path().to_path_buf());
}

pub(crate) fn remember_path(ctx: &mut AppContext, path: &Path) {
    if let Err(err) = ctx.store.add_recent_path(path) {
        tracing::warn!("Failed to remember recent path {}: {}", path.display(), err);
    }
}

pub(crate) fn found_files(ctx: &AppContext, root: Option<&Path>) -> Vec<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => match jetbrains_config_root() {
            Some(root) => root,
            None => return Vec::new(),
        },
    };
    tracing::debug!("Searching for quota files under {}", root.display());
    find_quota_files(&root, &ctx.config.quota_file_name)
}

pub(crate) fn analyze_all(ctx: &mut AppContext, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        println!("{}", style("No quota files found").blue().bold());
        return Ok(());
    }

    let mut analyzed = 0usize;
    for file in files {
        println!("{}", style(format!("Analyzing {}", file.display())).blue());
        match analyze_path(ctx, file) {
            Ok(record) => {
                println!("{}\n", quota_details(&record));
                analyzed += 1;
            }
            Err(err) => eprintln!("{}", style(format!("error: {err:#}")).red()),
        }
    }
    println!("{}", style(format!("Analyzed {analyzed} quota file(s)")).blue().bold());
    Ok(())
}
