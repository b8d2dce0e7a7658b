//! Metadata client for the Astronomy Picture of the Day service.
//!
//! - [`record`] - the typed [`DailyRecord`] and its wire representation
//! - [`client`] - the [`MetadataSource`] capability and its HTTP implementation

pub mod client;
pub mod record;

pub use client::{ApodClient, FetchError, MetadataSource, http_client, parse_record};
pub use record::{DailyRecord, MediaKind};
