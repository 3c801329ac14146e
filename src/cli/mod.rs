//! Command-line interface for quota-analyzer
//!
//! Subcommands analyze quota files, browse and clear the stored history, and
//! rank previously used paths. Without a subcommand an interactive menu runs.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{load_config, resolve_data_dir, AppConfig};
use crate::store::QuotaStore;

mod analyze;
mod history;
mod interactive;
mod lock;

pub use lock::InstanceLock;

/// Track JetBrains AI Assistant quota usage with a local SQLite history
#[derive(Parser)]
#[command(name = "quota-analyzer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Clone)]
pub struct GlobalArgs {
    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (quota-analyzer.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the history database
    #[arg(long, value_name = "DIR", env = "QUOTA_ANALYZER_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a quota file or IDE config directory and record the result
    Analyze(analyze::AnalyzeArgs),

    /// List quota files found in the JetBrains config directory
    Find(analyze::FindArgs),

    /// Show recorded history, newest first
    History(history::HistoryArgs),

    /// List every path that has recorded history
    Paths,

    /// Suggest paths ranked by usage frequency and recency
    Recommend(history::RecommendArgs),

    /// Delete recorded history
    Clear(history::ClearArgs),

    /// Show common quota file locations
    HelpPaths,

    /// Run the interactive menu (default)
    Interactive,
}

/// Everything a command needs: resolved configuration and an open store.
pub struct AppContext {
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub store: QuotaStore,
}

impl AppContext {
    pub fn open(config: AppConfig, global: &GlobalArgs) -> Self {
        let explicit_dir = global.data_dir.clone().or_else(|| config.data_dir.clone());
        let data_dir = resolve_data_dir(explicit_dir.as_deref());
        tracing::debug!("Using data directory {}", data_dir.display());

        let store = QuotaStore::open(&config.store_paths(&data_dir));
        if store.is_memory_fallback() {
            eprintln!(
                "{}",
                style(format!(
                    "warning: could not open {}; history is kept in memory and will be lost on exit",
                    store.db_path().display()
                ))
                .yellow()
                .bold()
            );
        }

        Self { config, data_dir, store }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.store.close();
    }
}

/// A non-empty, valid `RUST_LOG` replaces the default level entirely;
/// otherwise `--verbose` picks DEBUG over WARN.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level.as_str()))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(cli.global.verbose, rust_log.as_deref());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd, cli.global.config.as_deref())?;

    if let Some(Commands::HelpPaths) = cli.command {
        println!("{}", crate::render::common_paths_help(&config.quota_file_name));
        return Ok(());
    }

    let mut ctx = AppContext::open(config, &cli.global);
    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run(&mut ctx, args),
        Some(Commands::Find(args)) => analyze::run_find(&mut ctx, args),
        Some(Commands::History(args)) => history::run(&mut ctx, args),
        Some(Commands::Paths) => history::run_paths(&mut ctx),
        Some(Commands::Recommend(args)) => history::run_recommend(&mut ctx, args),
        Some(Commands::Clear(args)) => history::run_clear(&mut ctx, args),
        Some(Commands::HelpPaths) => Ok(()),
        Some(Commands::Interactive) | None => interactive::run(&mut ctx),
    }
}
