//! Builds client-facing news items from provider listings.
//!
//! Every item runs through the same chain until a step yields a summary:
//! scraped page text, then the provider's own `content`/`description`, then the
//! verbatim description, then [`NO_SUMMARY_AVAILABLE`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    error::AppResult,
    fetcher::ContentSource,
    model::NewsItemOut,
    util::{
        html::provider_text,
        newsapi::{NewsProvider, ProviderArticle},
        summarizer::Summarize,
    },
};

pub const NO_SUMMARY_AVAILABLE: &str = "No summary available.";

pub struct NewsService {
    provider: Arc<dyn NewsProvider>,
    content: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarize>,
}

impl NewsService {
    pub fn new(
        provider: Arc<dyn NewsProvider>,
        content: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarize>,
    ) -> Self {
        Self {
            provider,
            content,
            summarizer,
        }
    }

    pub async fn latest(&self) -> AppResult<Vec<NewsItemOut>> {
        let articles = self.provider.top_headlines().await?;
        info!(count = articles.len(), "building latest news");
        Ok(self.build_items(articles).await)
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<NewsItemOut>> {
        let articles = self.provider.search(query).await?;
        info!(query, count = articles.len(), "building search results");
        Ok(self.build_items(articles).await)
    }

    // One article at a time; no fan-out within a request.
    async fn build_items(&self, articles: Vec<ProviderArticle>) -> Vec<NewsItemOut> {
        let mut items = Vec::with_capacity(articles.len());
        for article in articles {
            if let Some(item) = self.build_item(article).await {
                items.push(item);
            }
        }
        items
    }

    async fn build_item(&self, article: ProviderArticle) -> Option<NewsItemOut> {
        let Some(url) = non_blank(article.url.as_deref()).map(str::to_string) else {
            debug!(title = ?article.title, "skipping provider item without url");
            return None;
        };

        let summary = self.summarize_article(&url, &article).await;

        Some(NewsItemOut {
            title: article.title.unwrap_or_default(),
            url,
            source_name: article.source.name.unwrap_or_default(),
            summary,
            published_at: article.published_at,
        })
    }

    async fn summarize_article(&self, url: &str, article: &ProviderArticle) -> String {
        let mut summary = String::new();

        match self.content.article_text(url).await {
            Some(text) if !text.trim().is_empty() => {
                summary = self.summarizer.summarize(&text).await;
            }
            _ => {
                let fallback = [article.content.as_deref(), article.description.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(provider_text)
                    .find(|text| !text.is_empty());
                if let Some(text) = fallback {
                    debug!(%url, "summarizing provider text instead of page");
                    summary = self.summarizer.summarize(&text).await;
                }
            }
        }

        if !summary.trim().is_empty() {
            return summary;
        }

        match non_blank(article.description.as_deref()) {
            Some(description) => description.to_string(),
            None => NO_SUMMARY_AVAILABLE.to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
