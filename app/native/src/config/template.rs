//! Configuration template generation.

use std::fs;
use std::path::Path;

/// Returns a JSONC template documenting every option with its default value.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// APOD Wallpaper Configuration File
// ==================================
// This file uses JSONC format (JSON with comments).
// All options are commented out and show their default values.

{
  // Metadata endpoint queried once per run
  // "endpoint": "https://api.nasa.gov/planetary/apod",

  // Root directory for downloaded images, state and log.
  // Empty uses the platform data directory.
  // "dataDir": "",

  // Images older than this many days are deleted after a successful update
  // "retentionDays": 7,

  // Local time used by --schedule to register the daily task (HH:MM)
  // "scheduleTime": "09:00",

  // Use the high resolution image when one is available
  // "preferHighRes": true,

  // Path to a .env file containing NASA_API_KEY.
  // Relative to this file; ~ expands to the home directory.
  // "apiKeys": ".env",

  // Network timeout in seconds
  // "timeoutSecs": 60
}
"#
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or the file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::types::{FileConfig, load_config_from_path};

    #[test]
    fn test_template_parses_to_defaults() {
        let template = generate_config_template();
        let reader = json_comments::StripComments::new(template.as_bytes());
        let config: FileConfig = serde_json::from_reader(reader).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_template_mentions_every_option() {
        let template = generate_config_template();
        for key in [
            "endpoint",
            "dataDir",
            "retentionDays",
            "scheduleTime",
            "preferHighRes",
            "apiKeys",
            "timeoutSecs",
        ] {
            assert!(template.contains(key), "template is missing {key}");
        }
    }

    #[test]
    fn test_create_config_file_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.jsonc");
        create_config_file(&path).unwrap();
        assert_eq!(load_config_from_path(&path).unwrap(), FileConfig::default());
    }
}
