//! Persisted run state.
//!
//! One small JSON document per installation:
//!
//! ```json
//! { "lastUpdate": "2024-05-01", "lastImage": "/…/images/APOD_2024-05-01.png" }
//! ```
//!
//! Reading never fails: a missing or unreadable file means "never updated".
//! Writing goes through a temp file in the same directory followed by a
//! rename, so readers see either the old document or the new one.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bookkeeping for the last successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// Calendar day of the last successful apply.
    pub last_update: Option<NaiveDate>,
    /// File currently applied as the background.
    pub last_image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_title: Option<String>,
}

impl RunState {
    /// Returns `true` if an apply already succeeded on `today`.
    #[must_use]
    pub fn is_current(&self, today: NaiveDate) -> bool { self.last_update == Some(today) }
}

/// The state file on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Reads the state, falling back to the default on any failure.
    #[must_use]
    pub fn load(&self) -> RunState {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return RunState::default(),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "cannot read state file"
                );
                return RunState::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "state file is corrupt, treating as never updated"
            );
            RunState::default()
        })
    }

    /// Writes `state` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the temp file or the rename fails.
    /// The previous state file is left untouched in that case.
    pub fn save(&self, state: &RunState) -> std::io::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut temp =
            tempfile::Builder::new().prefix(".state_").suffix(".tmp").tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}
