#![allow(clippy::multiple_crate_versions)]

//! APOD wallpaper updater.
//!
//! With no arguments, performs the daily update. See `--help` for the rest.

use std::process::ExitCode;

fn main() -> ExitCode {
    match apod_wallpaper_lib::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("apod-wallpaper: {err}");
            ExitCode::FAILURE
        }
    }
}
