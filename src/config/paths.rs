//! Data directory resolution.

use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "jetbrains_ai_quota_analyzer";

/// Pick the directory for the database and legacy files.
///
/// An explicit directory wins and is created if needed. Otherwise the first
/// writable candidate is used: `~/.jetbrains_ai_quota_analyzer`, `data/` next
/// to the executable, the platform temp/cache location, then the current
/// directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        if let Err(err) = fs::create_dir_all(dir) {
            tracing::warn!("Cannot create data directory {}: {}", dir.display(), err);
        }
        return dir.to_path_buf();
    }

    for candidate in candidate_dirs() {
        if is_writable_dir(&candidate) {
            return candidate;
        }
        tracing::debug!("Data directory candidate not writable: {}", candidate.display());
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = home_dir() {
        dirs.push(home.join(format!(".{APP_DIR_NAME}")));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir.join("data"));
    }
    if let Some(fallback) = platform_fallback_dir() {
        dirs.push(fallback);
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

fn platform_fallback_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(|base| PathBuf::from(base).join("Temp").join(APP_DIR_NAME))
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().map(|home| home.join("Library").join("Caches").join(APP_DIR_NAME))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Some(std::env::temp_dir().join(APP_DIR_NAME))
    }
}

/// Create `dir` and prove it accepts writes with a throwaway probe file.
fn is_writable_dir(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".write_test");
    let writable = fs::write(&probe, "test").is_ok();
    let _ = fs::remove_file(&probe);
    writable
}
