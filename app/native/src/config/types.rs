//! Configuration file types and loading.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.
//! Every key is optional; an absent file is equivalent to `{}`.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{APP_NAME, DEFAULT_ENDPOINT, DEFAULT_RETENTION_DAYS, DEFAULT_SCHEDULE_TIME};

/// Contents of `config.jsonc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    /// Metadata endpoint queried once per run.
    pub endpoint: String,

    /// Root directory for artifacts, state and log.
    /// Empty means the platform data directory.
    pub data_dir: String,

    /// Artifacts older than this many days are removed after a successful run.
    pub retention_days: u32,

    /// Local time (`HH:MM`) used when registering the daily task.
    pub schedule_time: String,

    /// Prefer the high resolution image when the record offers one.
    pub prefer_high_res: bool,

    /// Path to an environment file containing `NASA_API_KEY`.
    ///
    /// Relative paths are resolved against the config file directory and
    /// `~` expands to the home directory.
    pub api_keys: String,

    /// Network timeout in seconds for both the metadata call and the download.
    pub timeout_secs: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            data_dir: String::new(),
            retention_days: DEFAULT_RETENTION_DAYS,
            schedule_time: DEFAULT_SCHEDULE_TIME.to_string(),
            prefer_high_res: true,
            api_keys: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    /// `scheduleTime` is not a valid `HH:MM` value.
    #[error("Invalid schedule time '{0}', expected HH:MM")]
    InvalidScheduleTime(String),
    /// No API credential could be found.
    #[error("Missing API credential: set {0} in the environment or in the apiKeys file")]
    MissingCredential(&'static str),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/apod-wallpaper/`
/// 2. `~/.config/apod-wallpaper/`
/// 3. The platform config directory (`~/Library/Application Support` on macOS,
///    `%APPDATA%` on Windows)
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_check = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        dirs_to_check.push(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_check.push(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_check.push(config_dir.join(APP_NAME));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_check {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Loads a configuration file from an explicit path.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist, `Io` if it
/// cannot be read and `Parse` if it is not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Loads the first configuration file found in [`config_paths`].
///
/// Returns `Ok(None)` when no file exists in any location.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be read or parsed.
pub fn load_config() -> Result<Option<(FileConfig, PathBuf)>, ConfigError> {
    for path in config_paths() {
        if path.exists() {
            let config = load_config_from_path(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}
