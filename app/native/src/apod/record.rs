//! Daily metadata record.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Kind of media published for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Maps the `media_type` wire value. Unknown values become `Other`.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Metadata describing one day's picture.
///
/// Only lives for the duration of a run; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    pub day: NaiveDate,
    pub title: String,
    pub description: String,
    pub media_kind: MediaKind,
    pub standard_url: String,
    pub high_res_url: Option<String>,
    pub service_version: String,
}

impl DailyRecord {
    /// Returns `true` when the record can be downloaded and applied.
    #[must_use]
    pub fn is_image(&self) -> bool { self.media_kind == MediaKind::Image }
}

/// JSON body returned by the service.
///
/// `media_type` is the only required field; everything else defaults to empty,
/// whether absent or `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApodResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default)]
    pub hdurl: Option<String>,
    pub media_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApodResponse {
    /// Converts the wire body into a [`DailyRecord`].
    ///
    /// A missing or unparseable `date` falls back to `fallback_day` so the
    /// artifact can still be named.
    #[must_use]
    pub fn into_record(self, fallback_day: NaiveDate) -> DailyRecord {
        let day = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
            tracing::warn!(date = %self.date, fallback = %fallback_day, "record has no date");
            fallback_day
        });

        DailyRecord {
            day,
            title: self.title,
            description: self.explanation,
            media_kind: MediaKind::from_wire(&self.media_type),
            standard_url: self.url.trim().to_string(),
            high_res_url: self
                .hdurl
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            service_version: self.service_version,
        }
    }
}
