use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ScraperConfig,
    extractor::{self, ExtractionOutcome},
};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Undecoded page body plus the charset hint from the response headers.
#[derive(Debug, Clone)]
pub struct RawHtml {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let timeout_secs = if config.request_timeout_secs == 0 {
            15
        } else {
            config.request_timeout_secs
        };

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build page fetcher http client")?;

        Ok(Self { client })
    }

    /// Single GET, no retries. Anything but a 2xx response is an error.
    pub async fn fetch(&self, url: &str) -> Result<RawHtml, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(%url, bytes = body.len(), "page fetched");
        Ok(RawHtml { body, content_type })
    }
}

/// Source of main article text for a URL.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// `None` when the page could not be fetched or held no usable article body.
    async fn article_text(&self, url: &str) -> Option<String>;
}

/// Fetches pages over HTTP and runs the content extractor on them.
pub struct WebContentSource {
    fetcher: PageFetcher,
}

impl WebContentSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ContentSource for WebContentSource {
    async fn article_text(&self, url: &str) -> Option<String> {
        let raw = match self.fetcher.fetch(url).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%url, error = %err, "article page fetch failed");
                return None;
            }
        };

        // The parsed DOM is not Send, so parsing stays on the blocking pool.
        let outcome = match tokio::task::spawn_blocking(move || extractor::extract(&raw)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%url, error = %err, "content extraction task failed");
                return None;
            }
        };

        match outcome {
            ExtractionOutcome::Text(extracted) => {
                info!(%url, strategy = extracted.strategy.label(), "scraped article content");
                Some(extracted.text)
            }
            ExtractionOutcome::NotFound => {
                warn!(%url, "could not find sufficient content on page");
                None
            }
        }
    }
}
