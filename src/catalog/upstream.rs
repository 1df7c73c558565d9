//! Client for the Google Fonts developer API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::model::{FontRecord, SortMode};

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/webfonts/v1/webfonts";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no API key configured for the font listing service")]
    MissingApiKey,

    #[error("font listing request timed out")]
    Timeout,

    #[error("font listing request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("font listing service answered {status}")]
    Status { status: u16 },

    #[error("font listing response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
            };
        }
        // The request URL carries the API key.
        Self::Transport(err.without_url())
    }
}

/// Anything that can produce a full listing for a sort mode.
pub trait FontSource: Send + Sync {
    fn fetch_listing(&self, sort: SortMode) -> BoxFuture<'_, Result<Vec<FontRecord>, UpstreamError>>;

    /// Whether requests can be attempted at all.
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Deserialize)]
struct ListingResponse {
    #[serde(default)]
    items: Vec<FontRecord>,
}

/// Fetches listings from `GET <api_url>?key=<key>&sort=<mode>`.
#[derive(Debug, Clone)]
pub struct GoogleFontsClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl GoogleFontsClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url, api_key))
    }

    pub fn with_client(client: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn fetch(&self, sort: SortMode) -> Result<Vec<FontRecord>, UpstreamError> {
        let key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        debug!(%sort, url = %self.api_url, "fetching font listing");
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("key", key), ("sort", sort.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let listing: ListingResponse = serde_json::from_str(&text)?;
        debug!(%sort, families = listing.items.len(), "font listing fetched");
        Ok(listing.items)
    }
}

impl FontSource for GoogleFontsClient {
    fn fetch_listing(&self, sort: SortMode) -> BoxFuture<'_, Result<Vec<FontRecord>, UpstreamError>> {
        Box::pin(self.fetch(sort))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> GoogleFontsClient {
        GoogleFontsClient::new(DEFAULT_API_URL, key.map(str::to_owned), DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(!client(None).is_configured());
        assert!(!client(Some("  ")).is_configured());
        assert!(client(Some("abc123")).is_configured());
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let err = client(None).fetch_listing(SortMode::Popularity).await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingApiKey));
    }

    #[test]
    fn listing_body_decodes() {
        let body = r#"{"kind":"webfonts#webfontList","items":[{"family":"Lora","category":"serif"}]}"#;
        let listing: ListingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].family, "Lora");
    }

    #[test]
    fn listing_without_items_is_empty() {
        let listing: ListingResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.items.is_empty());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        let client = GoogleFontsClient::new(
            "http://127.0.0.1:9/webfonts",
            Some("key".into()),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.fetch_listing(SortMode::Alpha).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_) | UpstreamError::Timeout));
    }
}
