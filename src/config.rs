//! Wordbi Configuration
//!
//! Loads and saves the configuration from `~/.wordbi/wordbi.json`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::types::{default_config, WordbiConfig};

/// Config file name within the wordbi directory.
const CONFIG_FILENAME: &str = "wordbi.json";

/// Returns the directory holding config, database and charts:
/// `~/.wordbi`.
pub fn get_wordbi_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(".wordbi")
}

/// Returns the full path to the config file: `~/.wordbi/wordbi.json`.
pub fn get_config_path() -> PathBuf {
    get_wordbi_dir().join(CONFIG_FILENAME)
}

/// Load the config from disk, merging missing fields with defaults.
///
/// Returns `None` if the config file does not exist or cannot be
/// parsed; callers fall back to `default_config()`.
pub fn load_config() -> Option<WordbiConfig> {
    let config_path = get_config_path();
    if !config_path.exists() {
        return None;
    }

    let contents = fs::read_to_string(&config_path).ok()?;
    let mut config: WordbiConfig = serde_json::from_str(&contents).ok()?;

    // Merge defaults for unset fields
    let defaults = default_config();

    if config.max_steps == 0 {
        config.max_steps = defaults.max_steps;
    }
    if config.db_path.is_empty() {
        config.db_path = defaults.db_path;
    }
    if config.charts_dir.is_empty() {
        config.charts_dir = defaults.charts_dir;
    }
    if config.default_user_id.is_empty() {
        config.default_user_id = defaults.default_user_id;
    }
    if config.default_wordbook_id.is_empty() {
        config.default_wordbook_id = defaults.default_wordbook_id;
    }

    Some(config)
}

/// Save the config to disk at `~/.wordbi/wordbi.json`, creating the
/// directory if needed.
pub fn save_config(config: &WordbiConfig) -> Result<()> {
    let dir = get_wordbi_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create wordbi directory")?;
    }

    let config_path = get_config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&config_path, &json).context("Failed to write config file")?;

    Ok(())
}

/// Resolve a path that may start with `~` to an absolute path.
pub fn resolve_path(p: &str) -> String {
    if let Some(rest) = p.strip_prefix('~') {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        home.join(rest).to_string_lossy().to_string()
    } else {
        p.to_string()
    }
}
