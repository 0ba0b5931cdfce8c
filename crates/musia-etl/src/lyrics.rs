//! Lyrics lookup.
//!
//! Songs are matched on LRCLIB by exact track and artist name. Only the
//! plain (unsynchronised) lyrics are kept.

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{IngestError, IngestResult};
use crate::resilience::{retry_policy, RateLimiter, DEFAULT_RETRIES};

const SOURCE_NAME: &str = "lrclib";

/// Anything that can look up the lyrics of a song.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when the source has no lyrics for the song.
    async fn fetch_lyrics(&self, title: &str, artist: &str) -> IngestResult<Option<String>>;
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibRecord {
    #[serde(default)]
    plain_lyrics: Option<String>,
    #[serde(default)]
    instrumental: bool,
}

impl LrclibRecord {
    fn into_lyrics(self) -> Option<String> {
        if self.instrumental {
            return None;
        }
        self.plain_lyrics
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// LRCLIB API client.
///
/// LRCLIB asks clients to identify themselves and stay polite, so requests
/// go through a rate limiter and transient failures back off exponentially.
#[derive(Debug, Clone)]
pub struct LrclibClient {
    http: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl LrclibClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> IngestResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("musia/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(2),
        })
    }

    pub fn from_config(config: &Config) -> IngestResult<Self> {
        Self::new(
            config.lyrics_url.clone(),
            Duration::from_secs(config.lyrics_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/api/get", self.base_url)
    }

    async fn request_lyrics(&self, title: &str, artist: &str) -> IngestResult<Option<String>> {
        self.rate_limiter.acquire().await;

        log::debug!("Looking up lyrics for {title} - {artist}");
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("track_name", title), ("artist_name", artist)])
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(IngestError::RateLimited {
                    source_name: SOURCE_NAME.to_string(),
                });
            }
            s if s.is_server_error() => {
                return Err(IngestError::Http {
                    source_name: SOURCE_NAME.to_string(),
                    message: s.to_string(),
                });
            }
            s if !s.is_success() => {
                return Err(IngestError::Rejected {
                    source_name: SOURCE_NAME.to_string(),
                    status: s.as_u16(),
                });
            }
            _ => {}
        }

        let record: LrclibRecord = response.json().await.map_err(|e| IngestError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(record.into_lyrics())
    }
}

#[async_trait]
impl LyricsSource for LrclibClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_lyrics(&self, title: &str, artist: &str) -> IngestResult<Option<String>> {
        (|| self.request_lyrics(title, artist))
            .retry(retry_policy(DEFAULT_RETRIES))
            .when(IngestError::is_transient)
            .notify(|err: &IngestError, dur: Duration| {
                log::warn!("LRCLIB lookup failed ({err}), retrying in {dur:?}");
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_plain_lyrics() {
        let json = r#"{
            "id": 3396226,
            "trackName": "I Want to Live",
            "artistName": "Borislav Slavov",
            "instrumental": false,
            "plainLyrics": "I feel your breath upon my neck\n...",
            "syncedLyrics": "[00:17.12] I feel your breath upon my neck"
        }"#;

        let record: LrclibRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.into_lyrics().as_deref(),
            Some("I feel your breath upon my neck\n...")
        );
    }

    #[test]
    fn test_instrumental_has_no_lyrics() {
        let json = r#"{"instrumental": true, "plainLyrics": null}"#;
        let record: LrclibRecord = serde_json::from_str(json).unwrap();
        assert!(record.into_lyrics().is_none());
    }

    #[test]
    fn test_blank_lyrics_are_absent() {
        let json = r#"{"plainLyrics": "   \n  "}"#;
        let record: LrclibRecord = serde_json::from_str(json).unwrap();
        assert!(record.into_lyrics().is_none());
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = LrclibClient::new("https://lrclib.net/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "https://lrclib.net/api/get");
        assert_eq!(client.name(), "lrclib");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        // Port 9 on localhost is the discard port and is closed in practice.
        let client = LrclibClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let result = client.request_lyrics("Title", "Artist").await;
        assert!(matches!(result, Err(IngestError::Request(_))));
    }
}
