//! CLI definition and command dispatch.

use std::io;
use std::path::PathBuf;

use chrono::{Local, NaiveTime};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, Shell, generate};

use super::output::print_highlighted_json;
use crate::apod::{ApodClient, FetchError, http_client};
use crate::applier::DesktopApplier;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{AppConfig, ConfigError, FileConfig, config_paths, parse_schedule_time};
use crate::constants::{APP_NAME, ARTIFACT_PREFIX};
use crate::error::ApodError;
use crate::logging;
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::renderer::BitmapRenderer;
use crate::scheduler::{SystemScheduler, schedule_and_launch};
use crate::state::StateFile;
use crate::store::{ArtifactStore, HttpTransport};

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sets the Astronomy Picture of the Day as the desktop background.
///
/// Without flags, fetches today's picture and applies it, unless that already
/// happened today. Meant to run once a day from the OS scheduler; every run
/// is appended to the log in the data directory.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = APP_VERSION, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Apply today's picture even if the background was already updated today.
    #[arg(long, short)]
    pub force: bool,

    /// Register a daily run with the OS scheduler, then start one run now.
    #[arg(long, conflicts_with = "status")]
    pub schedule: bool,

    /// Time of the scheduled daily run, as HH:MM.
    ///
    /// Defaults to `scheduleTime` from the configuration file.
    #[arg(long, value_name = "HH:MM", requires = "schedule", value_parser = parse_time_arg)]
    pub time: Option<NaiveTime>,

    /// Print the persisted state and the stored artifacts as JSON.
    #[arg(long)]
    pub status: bool,

    /// Path to a custom configuration file (JSONC).
    ///
    /// Overrides the default configuration file search paths.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print shell completions for the given shell.
    ///
    /// Usage:
    ///   eval "$(apod-wallpaper --completions zsh)"
    ///   apod-wallpaper --completions fish > ~/.config/fish/completions/apod-wallpaper.fish
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,

    /// Print the JSON Schema of the configuration file.
    #[arg(long, exclusive = true)]
    pub schema: bool,

    /// Print a documented configuration file template.
    #[arg(long, exclusive = true)]
    pub print_config_template: bool,

    /// Write the configuration template to `--config`, or to the default location.
    ///
    /// Refuses to overwrite an existing file.
    #[arg(long, conflicts_with_all = ["force", "schedule", "status"])]
    pub init_config: bool,
}

fn parse_time_arg(value: &str) -> Result<NaiveTime, String> {
    parse_schedule_time(value).map_err(|err| err.to_string())
}

impl Cli {
    /// Execute the requested command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no credential is
    /// configured, or the scheduler registration fails. Aborted update runs
    /// are not errors.
    pub fn execute(&self) -> Result<(), ApodError> {
        if let Some(shell) = self.completions {
            Self::print_completions(shell);
            return Ok(());
        }
        if self.schema {
            let schema = schemars::schema_for!(FileConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(());
        }
        if self.print_config_template {
            println!("{}", generate_config_template());
            return Ok(());
        }

        if self.init_config {
            return self.init_config_file();
        }

        let config = AppConfig::load(self.config.as_deref())?;

        if self.status {
            print_status(&config);
            return Ok(());
        }

        logging::init(Some(&config.log_path));
        if let Some(source) = &config.source {
            tracing::debug!(path = %source.display(), "loaded configuration");
        }

        if self.schedule {
            let time = self.time.unwrap_or(config.schedule_time);
            let scheduler = SystemScheduler::for_current_exe()?;
            if !schedule_and_launch(&scheduler, time) {
                return Err(ApodError::Schedule(format!(
                    "could not register the daily run at {}",
                    time.format("%H:%M")
                )));
            }
            return Ok(());
        }

        run_update(&config, self.force)
    }

    fn init_config_file(&self) -> Result<(), ApodError> {
        let path = self
            .config
            .clone()
            .or_else(|| config_paths().into_iter().next())
            .ok_or_else(|| ConfigError::NotFound("no configuration directory".to_string()))?;

        if path.exists() {
            return Err(ApodError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )));
        }

        create_config_file(&path)?;
        println!("Created {}", path.display());
        Ok(())
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}

/// Runs one update on a current-thread runtime.
fn run_update(config: &AppConfig, force: bool) -> Result<(), ApodError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    report_outcome(runtime.block_on(update_once(config, force)))
}

async fn update_once(config: &AppConfig, force: bool) -> Result<RunOutcome, ApodError> {
    let http = http_client(config).map_err(FetchError::from)?;
    let source = ApodClient::new(http.clone(), config.endpoint.clone());
    let store = ArtifactStore::new(&config.artifact_dir, ARTIFACT_PREFIX, HttpTransport::new(http));
    let orchestrator = Orchestrator::new(config, source, store, &BitmapRenderer, &DesktopApplier);

    Ok(orchestrator.run(force, Local::now().date_naive()).await?)
}

/// Logs how the run ended, including failures, before the exit code is set.
fn report_outcome(result: Result<RunOutcome, ApodError>) -> Result<(), ApodError> {
    match result {
        Ok(RunOutcome::UpToDate) => tracing::info!("nothing to do"),
        Ok(RunOutcome::Applied { day, path, .. }) => {
            tracing::info!(%day, path = %path.display(), "wallpaper updated");
        }
        Ok(RunOutcome::Aborted(reason)) => tracing::info!(%reason, "no wallpaper applied"),
        Err(err) => {
            tracing::error!(error = %err, "update failed");
            return Err(err);
        }
    }
    Ok(())
}

fn print_status(config: &AppConfig) {
    let state = StateFile::new(&config.state_path).load();
    let store = ArtifactStore::new(&config.artifact_dir, ARTIFACT_PREFIX, ());

    print_highlighted_json(&serde_json::json!({
        "configFile": config.source,
        "dataDir": config.data_dir,
        "credential": config.api_key.is_some(),
        "scheduleTime": config.schedule_time.format("%H:%M").to_string(),
        "state": state,
        "artifacts": store.list(),
    }));
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() { Cli::command().debug_assert(); }

    #[test]
    fn test_no_args_runs_update() {
        let cli = Cli::try_parse_from(["apod-wallpaper"]).unwrap();
        assert!(!cli.force);
        assert!(!cli.schedule);
        assert!(!cli.status);
    }

    #[test]
    fn test_force_flag() {
        let cli = Cli::try_parse_from(["apod-wallpaper", "--force"]).unwrap();
        assert!(cli.force);
    }

    #[test]
    fn test_schedule_with_time() {
        let cli = Cli::try_parse_from(["apod-wallpaper", "--schedule", "--time", "07:30"]).unwrap();
        assert!(cli.schedule);
        assert_eq!(cli.time, NaiveTime::from_hms_opt(7, 30, 0));
    }

    #[test]
    fn test_time_requires_schedule() {
        let err = Cli::try_parse_from(["apod-wallpaper", "--time", "07:30"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        let err =
            Cli::try_parse_from(["apod-wallpaper", "--schedule", "--time", "7pm"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::try_parse_from(["apod-wallpaper", "-c", "/etc/apod.jsonc"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/apod.jsonc")));
    }

    #[test]
    fn test_unknown_argument_is_an_error() {
        let err = Cli::try_parse_from(["apod-wallpaper", "--frobnicate"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_completions_shell() {
        let cli = Cli::try_parse_from(["apod-wallpaper", "--completions", "bash"]).unwrap();
        assert_eq!(cli.completions, Some(Shell::Bash));
    }

    #[test]
    fn test_init_config_writes_template_once() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("apod/config.jsonc");
        let cli = Cli::try_parse_from([
            "apod-wallpaper",
            "--init-config",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();

        cli.execute().unwrap();
        assert_eq!(
            crate::config::load_config_from_path(&path).unwrap(),
            FileConfig::default()
        );
        assert!(matches!(cli.execute(), Err(ApodError::Io(_))));
    }

    #[test]
    fn test_failed_update_is_logged() {
        use std::sync::Mutex;

        use tracing_subscriber::fmt;
        use tracing_subscriber::layer::SubscriberExt;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("apod-wallpaper.log");
        let file = std::fs::File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

        let result = tracing::subscriber::with_default(subscriber, || {
            report_outcome(Err(ConfigError::MissingCredential("NASA_API_KEY").into()))
        });

        assert!(matches!(result, Err(ApodError::Config(ConfigError::MissingCredential(_)))));
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("ERROR"));
        assert!(log.contains("update failed"));
        assert!(log.contains("NASA_API_KEY"));
    }

    #[test]
    fn test_aborted_update_is_not_an_error() {
        let outcome = RunOutcome::Aborted(crate::orchestrator::AbortReason::Fetch);
        assert!(report_outcome(Ok(outcome)).is_ok());
    }

    #[test]
    fn test_init_config_conflicts_with_force() {
        assert!(Cli::try_parse_from(["apod-wallpaper", "--init-config", "--force"]).is_err());
    }

    #[test]
    fn test_schema_is_exclusive() {
        assert!(Cli::try_parse_from(["apod-wallpaper", "--schema", "--force"]).is_err());
    }
}
