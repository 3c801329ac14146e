//! Config file loading

use super::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 6] = [
    "quota-analyzer.toml",
    ".quota-analyzer.toml",
    "quota-analyzer.yml",
    ".quota-analyzer.yml",
    "quota-analyzer.yaml",
    ".quota-analyzer.yaml",
];

/// Load the explicit config file, or the first one discovered in `search_dir`.
///
/// An explicitly provided file must parse; an auto-discovered one that fails
/// to parse is reported and replaced by defaults.
pub fn load_config(search_dir: &Path, config_path: Option<&Path>) -> Result<AppConfig> {
    let explicit = config_path.is_some();
    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_dir),
    };

    let Some(config_file) = discovered else {
        return Ok(AppConfig::default());
    };

    match read_config(&config_file) {
        Ok(cfg) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!(
                "Failed to load auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(AppConfig::default())
        }
    }
}

fn read_config(config_file: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => toml::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid TOML config: {}", config_file.display())),
        "yaml" | "yml" => serde_yaml::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid YAML config: {}", config_file.display())),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    }
}

fn discover_config(search_dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| search_dir.join(candidate)).find(|path| path.is_file())
}
