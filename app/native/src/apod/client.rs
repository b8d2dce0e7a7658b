//! HTTP metadata client.

use std::future::Future;

use chrono::{Local, NaiveDate};
use reqwest::Client;
use thiserror::Error;

use super::record::{ApodResponse, DailyRecord};
use crate::config::AppConfig;

/// Errors that can occur while fetching the daily record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The body is not a valid record.
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Source of the daily metadata record.
pub trait MetadataSource {
    /// Fetches today's record, authenticating with `credential`.
    fn fetch(&self, credential: &str) -> impl Future<Output = Result<DailyRecord, FetchError>>;
}

/// Builds the HTTP client shared by the metadata client and the downloader.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(config: &AppConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Parses a response body into a record.
///
/// # Errors
///
/// Returns `FetchError::Malformed` if the body is not JSON or lacks `media_type`.
pub fn parse_record(body: &[u8], fallback_day: NaiveDate) -> Result<DailyRecord, FetchError> {
    let response: ApodResponse = serde_json::from_slice(body)?;
    Ok(response.into_record(fallback_day))
}

/// Client for the remote metadata endpoint.
pub struct ApodClient {
    http: Client,
    endpoint: String,
}

impl ApodClient {
    #[must_use]
    pub const fn new(http: Client, endpoint: String) -> Self { Self { http, endpoint } }
}

impl MetadataSource for ApodClient {
    async fn fetch(&self, credential: &str) -> Result<DailyRecord, FetchError> {
        tracing::debug!(endpoint = %self.endpoint, "requesting daily record");

        let response =
            self.http.get(&self.endpoint).query(&[("api_key", credential)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.bytes().await?;
        parse_record(&body, Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::apod::MediaKind;
    use crate::http_fixture::OneShotServer;

    fn fallback() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() }

    #[test]
    fn test_parse_record_image() {
        let body = br#"{"date":"2024-05-01","media_type":"image","url":"http://x/a-std.jpg"}"#;
        let record = parse_record(body, fallback()).unwrap();
        assert_eq!(record.media_kind, MediaKind::Image);
        assert_eq!(record.standard_url, "http://x/a-std.jpg");
    }

    #[test]
    fn test_parse_record_ignores_unknown_fields() {
        let body = br#"{"media_type":"image","copyright":"someone","thumbnail_url":"t"}"#;
        assert!(parse_record(body, fallback()).is_ok());
    }

    #[test]
    fn test_parse_record_malformed() {
        let result = parse_record(b"<html>rate limited</html>", fallback());
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status { status: 403, body: "API_KEY_INVALID".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("API_KEY_INVALID"));
    }

    fn client(base_url: &str) -> ApodClient {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::with_data_dir(temp_dir.path(), None);
        ApodClient::new(http_client(&config).unwrap(), format!("{base_url}/planetary/apod"))
    }

    #[tokio::test]
    async fn test_fetch_sends_credential_and_parses_record() {
        let server = OneShotServer::start(
            "200 OK",
            br#"{"date":"2024-05-01","media_type":"image","title":"M31","url":"http://x/a.jpg"}"#,
        )
        .await;

        let record = client(&server.base_url).fetch("DEMO_KEY").await.unwrap();

        assert_eq!(record.day, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(record.title, "M31");
        assert!(record.is_image());
        assert_eq!(server.request_line().await, "GET /planetary/apod?api_key=DEMO_KEY HTTP/1.1");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_keeps_body() {
        let server = OneShotServer::start("403 Forbidden", b"API_KEY_INVALID").await;

        let result = client(&server.base_url).fetch("bad").await;

        match result {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "API_KEY_INVALID");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
        server.request_line().await;
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = OneShotServer::start("200 OK", b"<html>maintenance</html>").await;

        let result = client(&server.base_url).fetch("DEMO_KEY").await;

        assert!(matches!(result, Err(FetchError::Malformed(_))));
        server.request_line().await;
    }
}
