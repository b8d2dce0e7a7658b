//! Application-wide constants.

/// Directory name used under the per-user data and config roots.
pub const APP_NAME: &str = "apod-wallpaper";

/// Prefix of every artifact file name (`APOD_2024-05-01.jpg`).
pub const ARTIFACT_PREFIX: &str = "APOD";

/// Suffix appended to the day for converted fallback artifacts.
pub const CONVERTED_SUFFIX: &str = "wallpaper";

/// Extension of converted fallback artifacts.
pub const CONVERTED_EXTENSION: &str = "bmp";

/// Extension assumed when the image URL carries none.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Default Astronomy Picture of the Day endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.nasa.gov/planetary/apod";

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "NASA_API_KEY";

/// Number of days artifacts are kept before cleanup removes them.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Shortest retention accepted; today's artifacts always survive cleanup.
pub const MIN_RETENTION_DAYS: u32 = 1;

/// Time of day the scheduled task runs when none is configured.
pub const DEFAULT_SCHEDULE_TIME: &str = "09:00";

/// Scheduled task name and crontab marker.
pub const TASK_NAME: &str = "ApodWallpaper";

/// State file name inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Log file name inside the data directory.
pub const LOG_FILE_NAME: &str = "apod-wallpaper.log";

/// Artifact subdirectory inside the data directory.
pub const ARTIFACT_DIR_NAME: &str = "images";
