//! Configuration for the updater.
//!
//! [`AppConfig`] is resolved once at startup from the optional JSONC file and
//! the environment, then passed by reference into every component. Nothing in
//! the pipeline reads the environment on its own.

pub mod env;
pub mod template;
pub mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
pub use types::{ConfigError, FileConfig, config_paths, load_config, load_config_from_path};

use crate::constants::{API_KEY_VAR, DEFAULT_SCHEDULE_TIME, MIN_RETENTION_DAYS};
use crate::paths;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Metadata endpoint.
    pub endpoint: String,
    /// API credential, if one was found.
    pub api_key: Option<String>,
    /// Root of the artifact directory, state file and log.
    pub data_dir: PathBuf,
    /// Directory owned by the artifact store.
    pub artifact_dir: PathBuf,
    /// Persisted run state.
    pub state_path: PathBuf,
    /// Append-only log file.
    pub log_path: PathBuf,
    /// Retention window for artifacts, in days.
    pub retention_days: u32,
    /// Local time of the scheduled daily run.
    pub schedule_time: NaiveTime,
    /// Prefer `hdurl` over `url`.
    pub prefer_high_res: bool,
    /// Network timeout.
    pub timeout: Duration,
    /// Config file the values were read from, if any.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from `custom_path`, or from the default search paths.
    ///
    /// A malformed file found through the default search is logged and
    /// replaced by defaults, and so is an invalid `scheduleTime` in it. A
    /// malformed file passed explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or invalid, including
    /// an unparseable `scheduleTime`.
    pub fn load(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (mut file, source) = match custom_path {
            Some(path) => (load_config_from_path(path)?, Some(path.to_path_buf())),
            None => match load_config() {
                Ok(Some((file, path))) => (file, Some(path)),
                Ok(None) => (FileConfig::default(), None),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load configuration, using defaults");
                    (FileConfig::default(), None)
                }
            },
        };

        if custom_path.is_none() && parse_schedule_time(&file.schedule_time).is_err() {
            tracing::warn!(
                value = %file.schedule_time,
                fallback = DEFAULT_SCHEDULE_TIME,
                "invalid scheduleTime, using default"
            );
            file.schedule_time = DEFAULT_SCHEDULE_TIME.to_string();
        }

        let config_dir = source.as_deref().and_then(Path::parent);
        let api_key =
            env::resolve_credential(std::env::var(API_KEY_VAR).ok(), &file.api_keys, config_dir);

        let mut config = Self::from_file(&file, config_dir, api_key)?;
        config.source = source;
        Ok(config)
    }

    /// Builds a runtime configuration from file values and a resolved credential.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidScheduleTime` if `scheduleTime` is not `HH:MM`.
    pub fn from_file(
        file: &FileConfig,
        config_dir: Option<&Path>,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let schedule_time = parse_schedule_time(&file.schedule_time)?;
        let base = config_dir.unwrap_or_else(|| Path::new("."));
        let data_dir = if file.data_dir.trim().is_empty() {
            paths::default_data_dir()
        } else {
            paths::expand_and_resolve(&file.data_dir, base)
        };

        Ok(Self {
            endpoint: file.endpoint.clone(),
            api_key,
            artifact_dir: paths::artifact_dir(&data_dir),
            state_path: paths::state_file(&data_dir),
            log_path: paths::log_file(&data_dir),
            data_dir,
            retention_days: file.retention_days.max(MIN_RETENTION_DAYS),
            schedule_time,
            prefer_high_res: file.prefer_high_res,
            timeout: Duration::from_secs(file.timeout_secs.max(1)),
            source: None,
        })
    }

    /// Default configuration rooted at `data_dir`, with the given credential.
    #[must_use]
    pub fn with_data_dir(data_dir: &Path, api_key: Option<&str>) -> Self {
        let defaults = FileConfig::default();
        Self {
            endpoint: defaults.endpoint,
            api_key: api_key.map(str::to_string),
            data_dir: data_dir.to_path_buf(),
            artifact_dir: paths::artifact_dir(data_dir),
            state_path: paths::state_file(data_dir),
            log_path: paths::log_file(data_dir),
            retention_days: defaults.retention_days,
            schedule_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            prefer_high_res: defaults.prefer_high_res,
            timeout: Duration::from_secs(defaults.timeout_secs),
            source: None,
        }
    }

    /// Returns the credential.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredential` when none was found; callers
    /// must check this before any network activity.
    pub fn credential(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingCredential(API_KEY_VAR))
    }
}

/// Parses an `HH:MM` time of day.
///
/// # Errors
///
/// Returns `ConfigError::InvalidScheduleTime` for anything else.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidScheduleTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_from_file_derives_layout_from_data_dir() {
        let file = FileConfig { data_dir: "/srv/apod".to_string(), ..FileConfig::default() };
        let config = AppConfig::from_file(&file, None, Some("key".to_string())).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/apod"));
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/apod/images"));
        assert_eq!(config.state_path, PathBuf::from("/srv/apod/state.json"));
        assert_eq!(config.log_path, PathBuf::from("/srv/apod/apod-wallpaper.log"));
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.credential().unwrap(), "key");
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_dir() {
        let file = FileConfig { data_dir: "data".to_string(), ..FileConfig::default() };
        let config = AppConfig::from_file(&file, Some(Path::new("/etc/apod")), None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/etc/apod/data"));
    }

    #[test]
    fn test_missing_credential_is_reported() {
        let config = AppConfig::with_data_dir(Path::new("/tmp/apod"), None);
        assert!(matches!(config.credential(), Err(ConfigError::MissingCredential(_))));
    }

    #[test]
    fn test_invalid_schedule_time() {
        let file = FileConfig { schedule_time: "25:99".to_string(), ..FileConfig::default() };
        let result = AppConfig::from_file(&file, None, None);
        assert!(matches!(result, Err(ConfigError::InvalidScheduleTime(_))));
    }

    #[test]
    fn test_parse_schedule_time_accepts_padding() {
        let time = parse_schedule_time(" 07:30 ").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn test_load_explicit_file_reads_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.jsonc");
        std::fs::write(
            &path,
            r#"{ "dataDir": "state", "retentionDays": 3, "scheduleTime": "06:15" }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, temp_dir.path().join("state"));
        assert_eq!(config.retention_days, 3);
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(6, 15, 0).unwrap());
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_explicit_file_with_invalid_schedule_time_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.jsonc");
        std::fs::write(&path, r#"{ "scheduleTime": "9am" }"#).unwrap();

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::InvalidScheduleTime(_))));
    }

    #[test]
    fn test_default_path_invalid_schedule_time_uses_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join(crate::constants::APP_NAME);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.jsonc"),
            r#"{ "scheduleTime": "9am", "retentionDays": 4 }"#,
        )
        .unwrap();

        let previous = std::env::var_os("XDG_CONFIG_HOME");
        // SAFETY: no other test reads or writes XDG_CONFIG_HOME.
        unsafe { std::env::set_var("XDG_CONFIG_HOME", temp_dir.path()) };
        let result = AppConfig::load(None);
        // SAFETY: see above.
        unsafe {
            match previous {
                Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        let config = result.unwrap();
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.retention_days, 4);
        assert_eq!(config.source, Some(config_dir.join("config.jsonc")));
    }

    #[test]
    fn test_zero_retention_is_raised_to_one_day() {
        let file = FileConfig { retention_days: 0, ..FileConfig::default() };
        let config = AppConfig::from_file(&file, None, None).unwrap();
        assert_eq!(config.retention_days, 1);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/apod.jsonc")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
