//! Desktop background capability.
//!
//! The orchestrator only needs a yes/no answer from the OS, so the capability
//! is a single predicate. Reasons for a rejection are logged here.

use std::path::Path;

/// Sets a file as the desktop background.
pub trait BackgroundApplier {
    /// Returns `true` if the OS accepted `path` as the new background.
    fn apply(&self, path: &Path) -> bool;
}

/// [`BackgroundApplier`] backed by the platform wallpaper APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopApplier;

impl BackgroundApplier for DesktopApplier {
    fn apply(&self, path: &Path) -> bool {
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "wallpaper file not found");
            return false;
        }

        let Some(path_str) = path.to_str() else {
            tracing::warn!(path = %path.display(), "wallpaper path is not valid UTF-8");
            return false;
        };

        match wallpaper::set_from_path(path_str) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "desktop rejected wallpaper");
                false
            }
        }
    }
}
