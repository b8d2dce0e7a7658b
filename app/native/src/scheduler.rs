//! OS scheduler integration.
//!
//! Windows registers a daily task through `schtasks`. Other platforms get a
//! tagged line in the user crontab; re-registering replaces the tagged line
//! so the entry never duplicates.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{NaiveTime, Timelike};

use crate::constants::TASK_NAME;

/// Registers the tool with the OS scheduler and launches it.
pub trait TaskScheduler {
    /// Registers a daily run at `time`. Returns `true` on success.
    fn register_daily_task(&self, time: NaiveTime) -> bool;

    /// Starts a detached run of the tool. Returns `true` if the process was spawned.
    fn launch_now(&self) -> bool;
}

/// Registers the daily task and, only if that succeeded, launches one run.
///
/// Returns `true` if both steps succeeded.
pub fn schedule_and_launch(scheduler: &dyn TaskScheduler, time: NaiveTime) -> bool {
    if !scheduler.register_daily_task(time) {
        tracing::error!(time = %time.format("%H:%M"), "failed to register daily task");
        return false;
    }
    tracing::info!(time = %time.format("%H:%M"), task = TASK_NAME, "registered daily task");

    if !scheduler.launch_now() {
        tracing::error!("failed to launch immediate run");
        return false;
    }
    true
}

/// [`TaskScheduler`] that shells out to the platform scheduler.
#[derive(Debug, Clone)]
pub struct SystemScheduler {
    exe: PathBuf,
}

impl SystemScheduler {
    #[must_use]
    pub fn new(exe: impl Into<PathBuf>) -> Self { Self { exe: exe.into() } }

    /// Scheduler for the running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the path of the current executable is unavailable.
    pub fn for_current_exe() -> std::io::Result<Self> { Ok(Self::new(std::env::current_exe()?)) }
}

impl TaskScheduler for SystemScheduler {
    #[cfg(windows)]
    fn register_daily_task(&self, time: NaiveTime) -> bool {
        let start = time.format("%H:%M").to_string();
        let status = Command::new("schtasks")
            .args(["/Create", "/SC", "DAILY", "/TN", TASK_NAME, "/TR"])
            .arg(format!("\"{}\"", self.exe.display()))
            .args(["/ST", &start, "/F"])
            .stdout(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::warn!(%status, "schtasks exited with failure");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to run schtasks");
                false
            }
        }
    }

    #[cfg(not(windows))]
    fn register_daily_task(&self, time: NaiveTime) -> bool {
        let existing = match Command::new("crontab").arg("-l").output() {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            // `crontab -l` fails when the user has no crontab yet
            Ok(_) => String::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to run crontab");
                return false;
            }
        };

        let table = merge_crontab(&existing, &cron_entry(time, &self.exe));
        match install_crontab(&table) {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("crontab rejected the new table");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install crontab");
                false
            }
        }
    }

    fn launch_now(&self) -> bool {
        match Command::new(&self.exe)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::info!(pid = child.id(), "launched immediate run");
                true
            }
            Err(err) => {
                tracing::warn!(exe = %self.exe.display(), error = %err, "failed to launch");
                false
            }
        }
    }
}

#[cfg(not(windows))]
fn install_crontab(table: &str) -> std::io::Result<bool> {
    use std::io::Write;

    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(table.as_bytes())?;
    }
    Ok(child.wait()?.success())
}

fn cron_marker() -> String { format!("# {TASK_NAME}") }

/// Crontab line running `exe` every day at `time`.
#[must_use]
pub fn cron_entry(time: NaiveTime, exe: &Path) -> String {
    format!(
        "{} {} * * * \"{}\" {}",
        time.minute(),
        time.hour(),
        exe.display(),
        cron_marker()
    )
}

/// Replaces any tagged line in `existing` with `entry`, keeping every other line.
#[must_use]
pub fn merge_crontab(existing: &str, entry: &str) -> String {
    let marker = cron_marker();
    let mut table: String = existing
        .lines()
        .filter(|line| !line.trim_end().ends_with(&marker))
        .fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push('\n');
            acc
        });
    table.push_str(entry);
    table.push('\n');
    table
}
