//! Interactive menu session.

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::path::PathBuf;

use super::analyze::{analyze_all, analyze_path, found_files, remember_path, remember_selection};
use super::history::clear_history;
use super::{AppContext, InstanceLock};
use crate::render::{common_paths_help, history_table, path_list, quota_details};

/// Recommended paths offered as shortcuts in history pickers.
const RECOMMENDED_SHORTCUTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Analyze,
    Find,
    History,
    FilteredHistory,
    Clear,
    RecordedPaths,
    CommonLocations,
    Quit,
}

static MENU: [(MenuAction, &str); 8] = [
    (MenuAction::Analyze, "Analyze a quota file"),
    (MenuAction::Find, "Find quota files"),
    (MenuAction::History, "View history"),
    (MenuAction::FilteredHistory, "View history for a path"),
    (MenuAction::Clear, "Clear history"),
    (MenuAction::RecordedPaths, "List recorded paths"),
    (MenuAction::CommonLocations, "Show common quota file locations"),
    (MenuAction::Quit, "Quit"),
];

const MANUAL_ENTRY: &str = "Enter a path...";

/// One row of a path picker.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathChoice {
    label: String,
    path: String,
}

/// Recommended shortcuts (`R1.`..) first, then every recorded path numbered,
/// with recommended ones tagged.
fn path_choices(recommended: &[String], paths: &[String]) -> Vec<PathChoice> {
    let shortcuts = recommended.iter().enumerate().map(|(index, path)| PathChoice {
        label: format!("R{}. {} [recommended]", index + 1, path),
        path: path.clone(),
    });
    let all = paths.iter().enumerate().map(|(index, path)| {
        let tag = if recommended.contains(path) { " [recommended]" } else { "" };
        PathChoice { label: format!("{}. {}{}", index + 1, path, tag), path: path.clone() }
    });
    shortcuts.chain(all).collect()
}

pub fn run(ctx: &mut AppContext) -> Result<()> {
    let _lock = InstanceLock::acquire(ctx.config.lock_port)?;

    println!("{}", style("JetBrains AI Assistant quota analyzer").cyan().bold());
    println!("{}", style(format!("Data directory: {}", ctx.data_dir.display())).dim());

    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MENU.iter().map(|(_, label)| *label).collect();
    loop {
        println!();
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .default(0)
            .items(&labels)
            .interact_opt()?;

        let action = match selection.and_then(|index| MENU.get(index)) {
            Some((action, _)) => *action,
            None => MenuAction::Quit,
        };
        if action == MenuAction::Quit {
            break;
        }
        if let Err(err) = dispatch(ctx, &theme, action) {
            eprintln!("{}", style(format!("error: {err:#}")).red());
        }
    }
    Ok(())
}

fn dispatch(ctx: &mut AppContext, theme: &ColorfulTheme, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::Analyze => {
            let Some(path) = choose_path(ctx, theme)? else {
                return Ok(());
            };
            let record = analyze_path(ctx, &path)?;
            remember_selection(ctx, &record);
            println!("{}", quota_details(&record));
        }
        MenuAction::Find => find_files(ctx, theme)?,
        MenuAction::History => view_history(ctx, theme)?,
        MenuAction::FilteredHistory => filter_history(ctx, theme)?,
        MenuAction::Clear => clear(ctx, theme)?,
        MenuAction::RecordedPaths => {
            let paths = ctx.store.distinct_paths()?;
            println!("{}", path_list("Recorded paths", &paths));
        }
        MenuAction::CommonLocations => {
            println!("{}", common_paths_help(&ctx.config.quota_file_name));
        }
        MenuAction::Quit => {}
    }
    Ok(())
}

/// Offer recommended paths first, falling back to free-form entry.
fn choose_path(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<Option<PathBuf>> {
    let count = ctx.config.recommend_count;
    let recommended = recommendations(ctx, count);

    if !recommended.is_empty() {
        let mut items: Vec<&str> = recommended.iter().map(String::as_str).collect();
        items.push(MANUAL_ENTRY);
        let Some(index) = Select::with_theme(theme)
            .with_prompt("Choose a path")
            .default(0)
            .items(&items)
            .interact_opt()?
        else {
            return Ok(None);
        };
        if let Some(path) = recommended.get(index) {
            return Ok(Some(PathBuf::from(path)));
        }
    }

    let input: String = Input::with_theme(theme)
        .with_prompt("Quota file or IDE config directory")
        .interact_text()?;
    let trimmed = input.trim().trim_matches('"');
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(trimmed)))
}

fn find_files(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    let files = found_files(ctx, None);
    if files.is_empty() {
        println!("{}", style("No quota files found").blue().bold());
        return Ok(());
    }

    let mut items = vec![format!("Analyze all {} file(s)", files.len())];
    items.extend(files.iter().map(|file| file.display().to_string()));
    let Some(index) = Select::with_theme(theme)
        .with_prompt("Choose a quota file")
        .default(0)
        .items(&items)
        .interact_opt()?
    else {
        return Ok(());
    };

    match index.checked_sub(1).and_then(|file_index| files.get(file_index)) {
        Some(file) => {
            let record = analyze_path(ctx, file)?;
            println!("{}", quota_details(&record));
        }
        None => analyze_all(ctx, &files)?,
    }
    Ok(())
}

/// All history, or the history of one recommended path picked as a shortcut.
fn view_history(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    let recommended = recommendations(ctx, RECOMMENDED_SHORTCUTS);

    let mut filter = None;
    if !recommended.is_empty() {
        let mut items = vec!["All paths".to_string()];
        items.extend(path_choices(&recommended, &[]).into_iter().map(|choice| choice.label));
        let Some(index) = Select::with_theme(theme)
            .with_prompt("Show history for")
            .default(0)
            .items(&items)
            .interact_opt()?
        else {
            return Ok(());
        };
        filter = index.checked_sub(1).and_then(|i| recommended.get(i)).map(PathBuf::from);
    }

    let limit = prompt_limit(ctx, theme)?;
    let records = ctx.store.query_history(limit, filter.as_deref())?;
    println!("{}", history_table(&records, filter.is_none()));
    if let Some(path) = &filter {
        remember_path(ctx, path);
    }
    Ok(())
}

fn filter_history(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    let Some(path) = pick_recorded_path(ctx, theme, "Show history for")? else {
        return Ok(());
    };

    let limit = prompt_limit(ctx, theme)?;
    let records = ctx.store.query_history(limit, Some(path.as_path()))?;
    println!("{}", style(format!("History for {}", path.display())).blue().bold());
    println!("{}", history_table(&records, false));
    remember_path(ctx, &path);
    Ok(())
}

fn clear(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    if ctx.store.distinct_paths()?.is_empty() {
        println!("{}", style("No history records").blue().bold());
        return Ok(());
    }

    let scopes = ["Clear all history (deletes every record)", "Clear history for one path", "Cancel"];
    let Some(scope) = Select::with_theme(theme)
        .with_prompt("What should be cleared?")
        .default(2)
        .items(&scopes)
        .interact_opt()?
    else {
        return Ok(());
    };

    let target = match scope {
        0 => None,
        1 => match pick_recorded_path(ctx, theme, "Clear history for")? {
            Some(path) => Some(path),
            None => return Ok(()),
        },
        _ => return Ok(()),
    };

    let prompt = match &target {
        Some(path) => format!("Delete all history for {}?", path.display()),
        None => "Delete all history? This cannot be undone".to_string(),
    };
    if Confirm::with_theme(theme).with_prompt(prompt).default(false).interact()? {
        clear_history(ctx, target.as_deref())?;
    } else {
        println!("{}", style("Cancelled").yellow());
    }
    Ok(())
}

/// Select one recorded path, offering recommended shortcuts first. A single
/// recorded path is used without asking.
fn pick_recorded_path(
    ctx: &mut AppContext,
    theme: &ColorfulTheme,
    prompt: &str,
) -> Result<Option<PathBuf>> {
    let paths = ctx.store.distinct_paths()?;
    match paths.as_slice() {
        [] => {
            println!("{}", style("No history records").blue().bold());
            return Ok(None);
        }
        [only] => {
            println!("{}", style(format!("Only one recorded path: {only}")).dim());
            return Ok(Some(PathBuf::from(only)));
        }
        _ => {}
    }

    let recommended = recommendations(ctx, RECOMMENDED_SHORTCUTS);
    let choices = path_choices(&recommended, &paths);
    let labels: Vec<&str> = choices.iter().map(|choice| choice.label.as_str()).collect();
    let selection = Select::with_theme(theme)
        .with_prompt(prompt)
        .default(0)
        .items(&labels)
        .interact_opt()?;
    Ok(selection.and_then(|index| choices.get(index)).map(|choice| PathBuf::from(&choice.path)))
}

fn prompt_limit(ctx: &AppContext, theme: &ColorfulTheme) -> Result<usize> {
    let limit: usize = Input::with_theme(theme)
        .with_prompt("Records to show")
        .default(ctx.config.history_limit)
        .interact_text()?;
    Ok(limit)
}

fn recommendations(ctx: &mut AppContext, count: usize) -> Vec<String> {
    let window = ctx.config.recommend_window;
    ctx.store.recommended_paths(count, window).unwrap_or_else(|err| {
        tracing::warn!("Could not rank recent paths: {}", err);
        Vec::new()
    })
}
