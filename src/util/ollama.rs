use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use url::Url;

use super::summarizer::SummaryModel;

const SUMMARY_PROMPT: &str = "You summarize news articles. Reply with a neutral summary of \
two to three sentences covering who, what, when and where. Do not add commentary, headings \
or quotation marks.";

pub struct OllamaModel {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaModel {
    /// Build the client and make sure the server answers and serves `model`.
    pub async fn connect(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let mut builder = Client::builder();
        if let Ok(parsed) = Url::parse(base_url) {
            let disable_proxy = parsed
                .host()
                .map(|host| match host {
                    url::Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
                    url::Host::Ipv4(addr) => addr.is_loopback(),
                    url::Host::Ipv6(addr) => addr.is_loopback(),
                })
                .unwrap_or(false);
            if disable_proxy {
                builder = builder.no_proxy();
            }
        }
        let http = builder
            .timeout(timeout)
            .build()
            .context("failed to build ollama http client")?;

        let client = Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        };
        client.ensure_model_available().await?;
        Ok(client)
    }

    async fn ensure_model_available(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow!("ollama base url not configured"));
        }

        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("ollama server unreachable")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "ollama tag listing returned non-success status {}",
                response.status()
            ));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .context("failed to parse ollama tag listing")?;

        if !has_model(&tags, &self.model) {
            return Err(anyhow!("ollama model {} is not installed", self.model));
        }
        Ok(())
    }
}

#[async_trait]
impl SummaryModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn summarize(&self, text: &str) -> Result<Option<String>> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = GenerateRequest {
            model: &self.model,
            system: SUMMARY_PROMPT,
            prompt: text,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .context("ollama summary request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "ollama summary returned non-success status {}: {}",
                status,
                body
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed to parse ollama summary response")?;

        let summary = parsed.response.trim();
        Ok((!summary.is_empty()).then(|| summary.to_string()))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

// Ollama reports "llama3.2:latest" for a model pulled as "llama3.2".
fn has_model(tags: &TagsResponse, wanted: &str) -> bool {
    tags.models.iter().any(|entry| {
        entry.name == wanted
            || (!wanted.contains(':') && entry.name.strip_suffix(":latest") == Some(wanted))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_lookup_accepts_implicit_latest_tag() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama3.2:latest"},{"name":"mistral:7b"}]}"#,
        )
        .unwrap();
        assert!(has_model(&tags, "llama3.2"));
        assert!(has_model(&tags, "mistral:7b"));
        assert!(!has_model(&tags, "mistral"));
    }

    #[tokio::test]
    async fn connect_fails_when_server_missing() {
        let result = OllamaModel::connect("http://127.0.0.1:9", "llama3.2", 1).await;
        assert!(result.is_err());
    }
}
