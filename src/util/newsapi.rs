use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::NewsApiConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("NEWS_API_KEY environment variable not set.")]
    MissingApiKey,
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("API returned error {code}: {message}")]
    Api { code: String, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// One article as listed by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderArticle {
    #[serde(default)]
    pub source: ProviderSource,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    status: String,
    #[serde(default)]
    articles: Vec<ProviderArticle>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn top_headlines(&self) -> Result<Vec<ProviderArticle>, ProviderError>;
    async fn search(&self, query: &str) -> Result<Vec<ProviderArticle>, ProviderError>;
}

pub struct NewsApiClient {
    http: Client,
    config: NewsApiConfig,
}

impl NewsApiClient {
    pub fn new(config: NewsApiConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let http = Client::builder()
            .user_agent(concat!("news_digest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build news api http client")?;

        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey)
    }

    async fn get_articles(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<ProviderArticle>, ProviderError> {
        let api_key = self.api_key()?;
        let base = self.config.base_url.trim_end_matches('/');
        let url = format!("{base}/{endpoint}");
        let page_size = self.config.page_size.max(1).to_string();

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("pageSize", page_size.as_str()), ("apiKey", api_key)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        parse_response(status.as_u16(), &text)
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn top_headlines(&self) -> Result<Vec<ProviderArticle>, ProviderError> {
        let articles = self
            .get_articles("top-headlines", &[("country", self.config.country.as_str())])
            .await?;
        debug!(count = articles.len(), "fetched top headlines");
        Ok(articles)
    }

    async fn search(&self, query: &str) -> Result<Vec<ProviderArticle>, ProviderError> {
        let articles = self.get_articles("everything", &[("q", query)]).await?;
        debug!(query, count = articles.len(), "fetched search results");
        Ok(articles)
    }
}

fn parse_response(status: u16, body: &str) -> Result<Vec<ProviderArticle>, ProviderError> {
    let parsed = serde_json::from_str::<ProviderResponse>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|resp| resp.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(ProviderError::Status { status, message });
    }

    let parsed = parsed.map_err(|err| ProviderError::Api {
        code: "invalidResponse".to_string(),
        message: err.to_string(),
    })?;

    if parsed.status != "ok" {
        return Err(ProviderError::Api {
            code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
            message: parsed
                .message
                .unwrap_or_else(|| format!("status {}", parsed.status)),
        });
    }

    Ok(parsed.articles)
}
