//! History browsing, recommendations and clearing

use anyhow::{bail, Result};
use clap::Args;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

use super::AppContext;
use crate::render::{history_table, path_list};

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of records to show (defaults to history_limit from config)
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Only show records for this file, or for every file under this directory
    #[arg(short = 'f', long, value_name = "PATH")]
    pub filter: Option<PathBuf>,
}

#[derive(Args)]
pub struct RecommendArgs {
    /// Number of paths to suggest (defaults to recommend_count from config)
    #[arg(short = 'n', long, value_name = "N")]
    pub count: Option<usize>,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Only delete records for this exact file
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

pub fn run(ctx: &mut AppContext, args: HistoryArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.history_limit);
    let records = ctx.store.query_history(limit, args.filter.as_deref())?;

    if let Some(filter) = &args.filter {
        println!("{}", style(format!("History for {}", filter.display())).blue().bold());
    }
    println!("{}", history_table(&records, args.filter.is_none()));
    Ok(())
}

pub fn run_paths(ctx: &mut AppContext) -> Result<()> {
    let paths = ctx.store.distinct_paths()?;
    println!("{}", path_list("Recorded paths", &paths));
    Ok(())
}

pub fn run_recommend(ctx: &mut AppContext, args: RecommendArgs) -> Result<()> {
    let count = args.count.unwrap_or(ctx.config.recommend_count);
    let paths = ctx.store.recommended_paths(count, ctx.config.recommend_window)?;
    println!("{}", path_list("Recommended paths", &paths));
    Ok(())
}

pub fn run_clear(ctx: &mut AppContext, args: ClearArgs) -> Result<()> {
    let scope = match &args.path {
        Some(path) => format!("history for {}", path.display()),
        None => "all history".to_string(),
    };

    if !args.yes {
        if !Term::stdout().is_term() {
            bail!("Refusing to clear {scope} without --yes on a non-interactive terminal");
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {scope}?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Cancelled").yellow());
            return Ok(());
        }
    }

    clear_history(ctx, args.path.as_deref())
}

pub(crate) fn clear_history(ctx: &mut AppContext, path: Option<&std::path::Path>) -> Result<()> {
    let removed = ctx.store.purge(path)?;
    if removed == 0 {
        println!("{}", style("No history records to delete").blue().bold());
    } else {
        println!("{}", style(format!("Deleted {removed} history record(s)")).green().bold());
    }
    Ok(())
}
