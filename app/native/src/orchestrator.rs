//! The daily update run.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Idle → Checking → Fetching → Downloading → Applying
//!      → (Converting → ApplyingConverted)? → Persisting → Cleaning → Done
//! ```
//!
//! Any stage may end the run in `Aborted`. Aborts are outcomes, not errors:
//! the job is best effort, so "nothing to apply today" and "the service is
//! down" are both logged and the process exits normally. A missing
//! credential is the only condition reported as an error.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::apod::{MediaKind, MetadataSource};
use crate::applier::BackgroundApplier;
use crate::config::{AppConfig, ConfigError};
use crate::renderer::Renderer;
use crate::state::StateFile;
use crate::store::{ArtifactStore, CleanupReport, Transport, resolve_image_url};

/// Stage of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Checking,
    Fetching,
    Downloading,
    Applying,
    Converting,
    ApplyingConverted,
    Persisting,
    Cleaning,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Fetching => "fetching",
            Self::Downloading => "downloading",
            Self::Applying => "applying",
            Self::Converting => "converting",
            Self::ApplyingConverted => "applying-converted",
            Self::Persisting => "persisting",
            Self::Cleaning => "cleaning",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a run stopped before applying a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The metadata service could not be reached or answered garbage.
    Fetch,
    /// Today's media is not a picture.
    NotAnImage(MediaKind),
    /// The record has no usable URL.
    NoImageUrl,
    /// The picture could not be saved.
    Download,
    /// Direct apply failed and the picture could not be converted.
    Convert,
    /// The desktop rejected the converted picture too.
    ApplyRejected,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "metadata fetch failed"),
            Self::NotAnImage(kind) => write!(f, "today's media is a {kind}, not an image"),
            Self::NoImageUrl => write!(f, "record has no image URL"),
            Self::Download => write!(f, "download failed"),
            Self::Convert => write!(f, "conversion failed"),
            Self::ApplyRejected => write!(f, "desktop rejected the image"),
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A background was already applied today.
    UpToDate,
    /// A new background was applied.
    Applied {
        /// Day of the applied record.
        day: NaiveDate,
        /// File the desktop accepted.
        path: PathBuf,
        /// Whether `path` is the converted fallback.
        converted: bool,
        cleanup: CleanupReport,
    },
    /// The run stopped early; nothing was applied.
    Aborted(AbortReason),
}

/// Drives one update run over its collaborators.
pub struct Orchestrator<'a, M, T> {
    config: &'a AppConfig,
    source: M,
    store: ArtifactStore<T>,
    renderer: &'a dyn Renderer,
    applier: &'a dyn BackgroundApplier,
    state: StateFile,
}

impl<'a, M: MetadataSource, T: Transport> Orchestrator<'a, M, T> {
    #[must_use]
    pub fn new(
        config: &'a AppConfig,
        source: M,
        store: ArtifactStore<T>,
        renderer: &'a dyn Renderer,
        applier: &'a dyn BackgroundApplier,
    ) -> Self {
        let state = StateFile::new(&config.state_path);
        Self { config, source, store, renderer, applier, state }
    }

    /// Performs one run for `today`.
    ///
    /// Unless `force` is set, a run on a day that already saw a successful
    /// apply does nothing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredential` before any other work when no
    /// credential is configured. Every other failure is reported as
    /// [`RunOutcome::Aborted`].
    pub async fn run(&self, force: bool, today: NaiveDate) -> Result<RunOutcome, ConfigError> {
        enter(Stage::Idle);
        let credential = self.config.credential()?;

        enter(Stage::Checking);
        let mut state = self.state.load();
        if state.is_current(today) && !force {
            tracing::info!(%today, "background already updated today");
            enter(Stage::Done);
            return Ok(RunOutcome::UpToDate);
        }
        if force {
            tracing::info!("forced run, ignoring last update");
        }

        enter(Stage::Fetching);
        let record = match self.source.fetch(credential).await {
            Ok(record) => record,
            Err(err) => return Ok(abort(AbortReason::Fetch, &err)),
        };
        tracing::info!(day = %record.day, title = %record.title, "fetched daily record");
        if !record.is_image() {
            tracing::info!(media = %record.media_kind, "skipping non-image media");
            enter(Stage::Aborted);
            return Ok(RunOutcome::Aborted(AbortReason::NotAnImage(record.media_kind)));
        }

        enter(Stage::Downloading);
        let url = match resolve_image_url(&record, self.config.prefer_high_res) {
            Ok(url) => url,
            Err(err) => return Ok(abort(AbortReason::NoImageUrl, &err)),
        };
        let original = match self.store.ensure_downloaded(url, record.day).await {
            Ok(path) => path,
            Err(err) => return Ok(abort(AbortReason::Download, &err)),
        };

        enter(Stage::Applying);
        let (applied, converted) = if self.applier.apply(&original) {
            (original, false)
        } else {
            tracing::warn!(path = %original.display(), "direct apply failed, converting");

            enter(Stage::Converting);
            let target = self.store.converted_path(record.day);
            if let Err(err) = self.renderer.convert(&original, &target) {
                return Ok(abort(AbortReason::Convert, &err));
            }

            enter(Stage::ApplyingConverted);
            if !self.applier.apply(&target) {
                return Ok(abort(AbortReason::ApplyRejected, &target.display()));
            }
            (target, true)
        };
        tracing::info!(path = %applied.display(), converted, "applied background");

        enter(Stage::Persisting);
        state.last_update = Some(today);
        state.last_image = Some(applied.clone());
        state.last_title = Some(record.title.clone()).filter(|title| !title.is_empty());
        if let Err(err) = self.state.save(&state) {
            // The background is already visible; only the bookkeeping is lost.
            tracing::error!(
                path = %self.state.path().display(),
                error = %err,
                "failed to persist state"
            );
        }

        enter(Stage::Cleaning);
        let cleanup = self.store.cleanup(self.config.retention_days);
        tracing::debug!(
            removed = cleanup.removed.len(),
            kept = cleanup.kept,
            failed = cleanup.failed,
            "cleanup finished"
        );

        enter(Stage::Done);
        Ok(RunOutcome::Applied { day: record.day, path: applied, converted, cleanup })
    }
}

fn enter(stage: Stage) { tracing::debug!(%stage, "entering stage"); }

fn abort(reason: AbortReason, detail: &dyn fmt::Display) -> RunOutcome {
    tracing::warn!(%reason, detail = %detail, "run aborted");
    enter(Stage::Aborted);
    RunOutcome::Aborted(reason)
}
