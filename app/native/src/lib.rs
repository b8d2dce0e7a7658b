//! APOD wallpaper - sets the Astronomy Picture of the Day as the desktop background.
//!
//! Runs once a day, usually from the OS scheduler. A run fetches today's
//! record, downloads the picture, applies it directly or through a converted
//! bitmap, records the day so later runs become no-ops, and prunes old
//! downloads.

pub mod apod;
pub mod applier;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod renderer;
pub mod scheduler;
pub mod state;
pub mod store;

#[cfg(test)]
mod http_fixture;
