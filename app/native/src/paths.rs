//! Filesystem locations used by the updater.
//!
//! Artifacts, the state file and the log all live under one per-user data
//! directory: `~/.local/share/apod-wallpaper` on Linux,
//! `~/Library/Application Support/apod-wallpaper` on macOS and
//! `%APPDATA%\apod-wallpaper` on Windows. When the platform reports no data
//! directory, `{tmp}/apod-wallpaper` is used instead.

use std::path::{Path, PathBuf};

use crate::constants::{APP_NAME, ARTIFACT_DIR_NAME, LOG_FILE_NAME, STATE_FILE_NAME};

/// Returns the default per-user data directory for the application.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| std::env::temp_dir().join(APP_NAME), |dir| dir.join(APP_NAME))
}

/// Directory holding downloaded and converted artifacts.
#[must_use]
pub fn artifact_dir(data_dir: &Path) -> PathBuf { data_dir.join(ARTIFACT_DIR_NAME) }

/// Location of the persisted run state.
#[must_use]
pub fn state_file(data_dir: &Path) -> PathBuf { data_dir.join(STATE_FILE_NAME) }

/// Location of the append-only run log.
#[must_use]
pub fn log_file(data_dir: &Path) -> PathBuf { data_dir.join(LOG_FILE_NAME) }

/// Expands a leading `~` and resolves relative paths against `base_dir`.
///
/// Empty input yields an empty path so callers can treat it as "unset".
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}
