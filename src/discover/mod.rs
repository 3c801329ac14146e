//! Locating quota files in JetBrains configuration directories
//!
//! Every IDE product keeps its own `<product>/options/` directory under a
//! per-platform JetBrains root; the quota manager writes its state there.

use crate::config::paths::home_dir;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-platform directory holding one subdirectory per IDE product.
pub fn jetbrains_config_root() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join("JetBrains"))
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().map(|home| home.join("Library").join("Application Support").join("JetBrains"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        home_dir().map(|home| home.join(".config").join("JetBrains"))
    }
}

/// `<root>/<product>/options/<file_name>` for every product that has one, sorted.
pub fn find_quota_files(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!("JetBrains config directory unavailable {}: {}", root.display(), err);
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|product| product.is_dir())
        .map(|product| product.join("options").join(file_name))
        .filter(|candidate| candidate.is_file())
        .collect();
    found.sort();
    found
}

/// Turn a user-supplied file or directory into a quota file path.
///
/// A file is used as-is. For a directory the conventional `options/` location
/// is tried first, then the whole tree is walked in file-name order, which
/// also covers a JetBrains root holding several products.
pub fn resolve_quota_file(path: &Path, file_name: &str) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if !path.is_dir() {
        return None;
    }

    find_in_dir(path, file_name)
}

fn find_in_dir(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let conventional = dir.join("options").join(file_name);
    if conventional.is_file() {
        return Some(conventional);
    }

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}
