//! Web search providers
//!
//! The primary path is daedra (DuckDuckGo). When it errors, [`FallbackSearch`]
//! retries the same query against a plain results page scraped with
//! `scraper`, rotating the `User-Agent` on every request. Both paths return the
//! same shape: result URLs in provider ranking order.
//!
//! The scrape path depends on the results page markup and is best effort.

use crate::types::{AppError, Result};
use crate::utils::toml_config::SearchConfig;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;

/// Executes a text query against a search engine.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` result URLs, in the provider's ranking order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Search powered by daedra
pub struct DaedraSearch;

impl DaedraSearch {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DaedraSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DaedraSearch {
    fn name(&self) -> &str {
        "daedra"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: limit,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .map(|r| r.url.to_string())
            .take(limit)
            .collect())
    }
}

/// Scrapes organic result links from an HTML results page.
pub struct SerpScrapeSearch {
    client: reqwest::Client,
    endpoint: String,
    user_agents: Vec<String>,
}

impl SerpScrapeSearch {
    pub fn new(endpoint: impl Into<String>, user_agents: Vec<String>, timeout: Duration) -> Result<Self> {
        if user_agents.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one user agent is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            user_agents,
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(
            config.serp_url.clone(),
            config.user_agents.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Extract up to `limit` absolute links from `div.g` result blocks.
pub fn parse_result_links(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("div.g a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        if links.len() >= limit {
            break;
        }
        if let Some(href) = element.value().attr("href") {
            if href.starts_with("http") && !links.iter().any(|l| l == href) {
                links.push(href.to_string());
            }
        }
    }
    links
}

#[async_trait]
impl SearchProvider for SerpScrapeSearch {
    fn name(&self) -> &str {
        "serp-scrape"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let user_agent = self.pick_user_agent().to_string();
        let num = limit.to_string();
        tracing::debug!(query, user_agent = %user_agent, "Scraping results page");

        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("num", num.as_str())])
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Search(format!("HTTP error: {}", e)))?
            .text()
            .await
            .map_err(|e| AppError::Search(format!("Failed to read results page: {}", e)))?;

        Ok(parse_result_links(&body, limit))
    }
}

/// Tries `primary`, then `secondary` when the primary returns an error.
pub struct FallbackSearch {
    primary: Arc<dyn SearchProvider>,
    secondary: Option<Arc<dyn SearchProvider>>,
}

impl FallbackSearch {
    pub fn new(primary: Arc<dyn SearchProvider>, secondary: Option<Arc<dyn SearchProvider>>) -> Self {
        Self { primary, secondary }
    }

    /// daedra first, results-page scrape second (when enabled).
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let secondary: Option<Arc<dyn SearchProvider>> = if config.fallback_enabled {
            Some(Arc::new(SerpScrapeSearch::from_config(config)?))
        } else {
            None
        };
        Ok(Self::new(Arc::new(DaedraSearch::new()), secondary))
    }
}

#[async_trait]
impl SearchProvider for FallbackSearch {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        match self.primary.search(query, limit).await {
            Ok(urls) => Ok(urls),
            Err(primary_err) => {
                let Some(secondary) = &self.secondary else {
                    return Err(primary_err);
                };
                tracing::warn!(
                    "[{}] {} - falling back to {}",
                    self.primary.name(),
                    primary_err,
                    secondary.name()
                );
                secondary.search(query, limit).await
            }
        }
    }
}
