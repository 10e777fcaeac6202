//! Summarization adapter.
//!
//! [`Summarizer`] owns a process-wide handle to a [`SummaryModel`]. The handle is
//! created by a [`ModelLoader`] on first use and shared afterwards; concurrent
//! first callers wait on a single load. Callers only ever get a string back:
//! failures turn into [`FAILED_SUMMARY`].

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::{SummarizerConfig, SummarizerProvider};

use super::ollama::OllamaModel;

pub const EMPTY_CONTENT_SUMMARY: &str =
    "Content was empty or could not be scraped. No summary available.";
pub const FAILED_SUMMARY: &str = "Could not generate a summary for this article.";

const LOG_EXCERPT_CHARS: usize = 100;

/// A backing model. It may truncate input to its own budget.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the model produced no output.
    async fn summarize(&self, text: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn SummaryModel>>;
}

/// What the news pipeline depends on.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, text: &str) -> String;
}

pub struct Summarizer {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn SummaryModel>>,
}

impl Summarizer {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn SummaryModel>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                info!("loading summary model");
                let model = self.loader.load().await?;
                info!(model = model.name(), "summary model ready");
                Ok::<_, anyhow::Error>(model)
            })
            .await
            .context("summary model unavailable")?;
        Ok(Arc::clone(model))
    }

    async fn run_model(&self, text: &str) -> Result<Option<String>> {
        let model = self.model().await?;
        model.summarize(text).await
    }
}

#[async_trait]
impl Summarize for Summarizer {
    async fn summarize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return EMPTY_CONTENT_SUMMARY.to_string();
        }

        match self.run_model(text).await {
            Ok(Some(summary)) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                error!(excerpt = %excerpt(text), "summary model returned no output");
                FAILED_SUMMARY.to_string()
            }
            Err(err) => {
                error!(error = ?err, excerpt = %excerpt(text), "summarization failed");
                FAILED_SUMMARY.to_string()
            }
        }
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(LOG_EXCERPT_CHARS).collect()
}

/// Offline model: the lead of the text, cut at a fixed length.
pub struct LeadModel {
    max_chars: usize,
}

impl Default for LeadModel {
    fn default() -> Self {
        Self { max_chars: 150 }
    }
}

#[async_trait]
impl SummaryModel for LeadModel {
    fn name(&self) -> &str {
        "lead"
    }

    async fn summarize(&self, text: &str) -> Result<Option<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let mut summary: String = text.chars().take(self.max_chars).collect();
        if text.chars().nth(self.max_chars).is_some() {
            summary.push_str("...");
        }
        Ok(Some(summary))
    }
}

/// Loads whichever model the configuration names.
pub struct ConfiguredModelLoader {
    config: SummarizerConfig,
}

impl ConfiguredModelLoader {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for ConfiguredModelLoader {
    async fn load(&self) -> Result<Arc<dyn SummaryModel>> {
        let model: Arc<dyn SummaryModel> = match self.config.provider {
            SummarizerProvider::Lead => Arc::new(LeadModel::default()),
            SummarizerProvider::Ollama => Arc::new(
                OllamaModel::connect(
                    &self.config.base_url,
                    &self.config.model,
                    self.config.request_timeout_secs,
                )
                .await?,
            ),
        };
        Ok(model)
    }
}
