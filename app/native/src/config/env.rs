//! API credential lookup.
//!
//! The credential is read from the process environment first. When it is not
//! set there, the `apiKeys` environment file named in the config (and then a
//! `.env` file next to the config file) is parsed with `dotenvy`. Values are
//! never exported back into the process environment.

use std::collections::HashMap;
use std::path::Path;

use crate::constants::API_KEY_VAR;
use crate::paths::expand_and_resolve;

/// Parses an environment file and returns its key-value pairs.
///
/// Returns an empty map if the file doesn't exist or can't be read.
#[must_use]
pub fn parse_env_file(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.filter_map(Result::ok).collect(),
        Err(err) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), error = %err, "failed to read env file");
            }
            HashMap::new()
        }
    }
}

/// Resolves the API credential.
///
/// # Arguments
///
/// * `from_process` - Value of `NASA_API_KEY` in the process environment, if any
/// * `api_keys_path` - The `apiKeys` config entry (may be empty)
/// * `config_dir` - Directory of the loaded config file, if one was loaded
///
/// Blank values are treated as absent at every step.
#[must_use]
pub fn resolve_credential(
    from_process: Option<String>,
    api_keys_path: &str,
    config_dir: Option<&Path>,
) -> Option<String> {
    if let Some(value) = non_blank(from_process) {
        return Some(value);
    }

    let base = config_dir.unwrap_or_else(|| Path::new("."));
    let mut candidates = Vec::new();
    if !api_keys_path.trim().is_empty() {
        candidates.push(expand_and_resolve(api_keys_path, base));
    }
    if let Some(dir) = config_dir {
        candidates.push(dir.join(".env"));
    }

    candidates
        .into_iter()
        .find_map(|path| non_blank(parse_env_file(&path).remove(API_KEY_VAR)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_process_value_wins() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "NASA_API_KEY=from_file").unwrap();

        let key = resolve_credential(Some("from_env".to_string()), "", Some(temp_dir.path()));
        assert_eq!(key.as_deref(), Some("from_env"));
    }

    #[test]
    fn test_blank_process_value_falls_through() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "NASA_API_KEY=from_file").unwrap();

        let key = resolve_credential(Some("   ".to_string()), "", Some(temp_dir.path()));
        assert_eq!(key.as_deref(), Some("from_file"));
    }

    #[test]
    fn test_api_keys_file_relative_to_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("secrets")).unwrap();
        fs::write(
            temp_dir.path().join("secrets/apod.env"),
            "# credentials\nNASA_API_KEY=\"quoted_key\"\n",
        )
        .unwrap();

        let key = resolve_credential(None, "secrets/apod.env", Some(temp_dir.path()));
        assert_eq!(key.as_deref(), Some("quoted_key"));
    }

    #[test]
    fn test_api_keys_file_takes_priority_over_dot_env() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("keys.env"), "NASA_API_KEY=primary").unwrap();
        fs::write(temp_dir.path().join(".env"), "NASA_API_KEY=secondary").unwrap();

        let key = resolve_credential(None, "keys.env", Some(temp_dir.path()));
        assert_eq!(key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_missing_everywhere() {
        let temp_dir = TempDir::new().unwrap();
        assert!(resolve_credential(None, "absent.env", Some(temp_dir.path())).is_none());
        assert!(resolve_credential(None, "", None).is_none());
    }

    #[test]
    fn test_parse_env_file_nonexistent() {
        assert!(parse_env_file(Path::new("/nonexistent/path/.env")).is_empty());
    }
}
