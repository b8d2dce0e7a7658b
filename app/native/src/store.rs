//! Artifact store.
//!
//! Owns the artifact directory. Each day maps to exactly one original file,
//! `APOD_<YYYY-MM-DD>.<ext>`, and at most one converted file,
//! `APOD_<YYYY-MM-DD>_wallpaper.bmp`. Downloads stream into a hidden temp
//! file in the same directory and are renamed into place only once the
//! transfer completes, so an interrupted run never leaves a file that matches
//! the naming rule.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local, NaiveDate};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::apod::DailyRecord;
use crate::constants::{
    CONVERTED_EXTENSION, CONVERTED_SUFFIX, DEFAULT_EXTENSION, MIN_RETENTION_DAYS,
};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors raised while transferring a remote resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("server returned an empty body")]
    Empty,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record carries neither a high resolution nor a standard URL.
    #[error("record has no image URL")]
    NoImageUrl,
    /// The image could not be saved.
    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: DownloadError,
    },
}

/// Streams a remote resource into a writer.
pub trait Transport {
    /// Writes the body of `url` into `sink`, returning the number of bytes written.
    fn download<W: AsyncWrite + Unpin>(
        &self,
        url: &str,
        sink: &mut W,
    ) -> impl Future<Output = Result<u64, DownloadError>>;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    #[must_use]
    pub const fn new(http: Client) -> Self { Self { http } }
}

impl Transport for HttpTransport {
    async fn download<W: AsyncWrite + Unpin>(
        &self,
        url: &str,
        sink: &mut W,
    ) -> Result<u64, DownloadError> {
        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        if written == 0 {
            return Err(DownloadError::Empty);
        }
        Ok(written)
    }
}

/// Picks the URL to download for `record`.
///
/// With `prefer_high_res` the high resolution URL wins whenever it is
/// non-empty; otherwise the standard URL wins and the high resolution one is
/// only a fallback.
///
/// # Errors
///
/// Returns `StoreError::NoImageUrl` when both URLs are empty.
pub fn resolve_image_url(record: &DailyRecord, prefer_high_res: bool) -> Result<&str, StoreError> {
    let high = record.high_res_url.as_deref().map(str::trim).filter(|url| !url.is_empty());
    let standard = Some(record.standard_url.trim()).filter(|url| !url.is_empty());

    let chosen = if prefer_high_res { high.or(standard) } else { standard.or(high) };
    chosen.ok_or(StoreError::NoImageUrl)
}

/// Extracts a lowercase file extension from the path component of `url`.
///
/// Falls back to `jpg` when the last path segment has no plausible extension.
#[must_use]
pub fn extension_from_url(url: &str) -> String {
    let path = reqwest::Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_string(),
        |parsed| parsed.path().to_string(),
    );

    let segment = path.rsplit('/').next().unwrap_or_default();
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// A file found in the artifact directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Outcome of a retention pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub kept: usize,
    pub failed: usize,
}

/// Maps days to files in the artifact directory.
pub struct ArtifactStore<T> {
    dir: PathBuf,
    prefix: String,
    transport: T,
}

impl<T> ArtifactStore<T> {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, transport: T) -> Self {
        Self { dir: dir.into(), prefix: prefix.into(), transport }
    }

    /// Deterministic path of the original artifact for `day` downloaded from `url`.
    #[must_use]
    pub fn artifact_path(&self, url: &str, day: NaiveDate) -> PathBuf {
        let ext = extension_from_url(url);
        self.dir.join(format!("{}_{}.{ext}", self.prefix, day.format("%Y-%m-%d")))
    }

    /// Deterministic path of the converted fallback artifact for `day`.
    #[must_use]
    pub fn converted_path(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{CONVERTED_SUFFIX}.{CONVERTED_EXTENSION}",
            self.prefix,
            day.format("%Y-%m-%d")
        ))
    }

    /// Lists files currently held in the artifact directory, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<ArtifactInfo> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut artifacts: Vec<ArtifactInfo> = entries
            .flatten()
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                meta.is_file().then(|| ArtifactInfo {
                    path: entry.path(),
                    size: meta.len(),
                    modified: meta.modified().ok().map(DateTime::<Local>::from),
                })
            })
            .collect();
        artifacts.sort_by(|a, b| b.modified.cmp(&a.modified));
        artifacts
    }

    /// Deletes every file older than `retention_days`, which is raised to
    /// [`MIN_RETENTION_DAYS`] so the file just applied is never removed.
    ///
    /// Best effort: individual failures are logged and counted, never returned.
    pub fn cleanup(&self, retention_days: u32) -> CleanupReport {
        self.cleanup_at(retention_days, SystemTime::now())
    }

    fn cleanup_at(&self, retention_days: u32, now: SystemTime) -> CleanupReport {
        let mut report = CleanupReport::default();
        let days = retention_days.max(MIN_RETENTION_DAYS);
        let max_age = Duration::from_secs(u64::from(days) * SECONDS_PER_DAY);

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if self.dir.exists() {
                    tracing::warn!(
                        dir = %self.dir.display(),
                        error = %err,
                        "cannot read artifact directory"
                    );
                    report.failed += 1;
                }
                return report;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(modified) = entry
                .metadata()
                .ok()
                .filter(fs::Metadata::is_file)
                .and_then(|meta| meta.modified().ok())
            else {
                continue;
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                report.kept += 1;
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "removed expired artifact");
                    report.removed.push(path);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to remove artifact"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl<T: Transport> ArtifactStore<T> {
    /// Returns the artifact for `day`, downloading it unless a copy written
    /// today already exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Download` on any network or I/O failure. No file
    /// matching the naming rule is left behind in that case.
    pub async fn ensure_downloaded(
        &self,
        url: &str,
        day: NaiveDate,
    ) -> Result<PathBuf, StoreError> {
        let target = self.artifact_path(url, day);

        if is_fresh(&target) {
            tracing::debug!(path = %target.display(), "artifact already downloaded today");
            return Ok(target);
        }

        self.download_to(url, &target)
            .await
            .map_err(|source| StoreError::Download { url: url.to_string(), source })?;

        tracing::info!(url, path = %target.display(), "downloaded artifact");
        Ok(target)
    }

    async fn download_to(&self, url: &str, target: &Path) -> Result<u64, DownloadError> {
        fs::create_dir_all(&self.dir)?;

        // Dropping `temp_path` on any early return deletes the partial file.
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(&format!(".{}_", self.prefix))
            .suffix(".part")
            .tempfile_in(&self.dir)?
            .into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let written = self.transport.download(url, &mut file).await?;
        file.sync_all().await?;
        drop(file);

        temp_path.persist(target).map_err(|err| DownloadError::Io(err.error))?;
        Ok(written)
    }
}

/// A file counts as a cache hit only if it was written on the current local day.
fn is_fresh(path: &Path) -> bool {
    fs::metadata(path)
        .ok()
        .filter(fs::Metadata::is_file)
        .and_then(|meta| meta.modified().ok())
        .is_some_and(|modified| {
            DateTime::<Local>::from(modified).date_naive() == Local::now().date_naive()
        })
}
