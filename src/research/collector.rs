//! Turns a batch of search queries into admitted evidence.

use crate::research::events::{ResearchEvent, SharedSink};
use crate::research::gate::RelevanceGate;
use crate::research::history::QueryHistory;
use crate::research::model::ResearchModel;
use crate::research::with_timeout;
use crate::tools::fetch::PageFetcher;
use crate::tools::search::SearchProvider;
use crate::types::EvidenceItem;
use crate::utils::toml_config::ResearchConfig;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Limits applied by [`EvidenceCollector::collect`].
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub max_results_per_query: usize,
    pub max_pages_per_query: usize,
    pub max_concurrent_fetches: usize,
    /// Minimum spacing between search calls, shared by every subtopic
    /// using the same collector
    pub search_delay: Duration,
    pub call_timeout: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self::from(&ResearchConfig::default())
    }
}

impl From<&ResearchConfig> for CollectorSettings {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            max_results_per_query: config.search_results_per_query,
            max_pages_per_query: config.pages_per_query,
            max_concurrent_fetches: config.max_concurrent_fetches,
            search_delay: config.search_delay(),
            call_timeout: config.call_timeout(),
        }
    }
}

/// Searches, fetches, scores and filters pages for one subtopic.
///
/// Failures of single searches, fetches or scoring calls are reported as
/// events and skipped. `collect` never fails.
pub struct EvidenceCollector {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    model: Arc<dyn ResearchModel>,
    gate: RelevanceGate,
    settings: CollectorSettings,
    events: SharedSink,
    last_search: Mutex<Option<Instant>>,
}

impl EvidenceCollector {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        model: Arc<dyn ResearchModel>,
        gate: RelevanceGate,
        settings: CollectorSettings,
        events: SharedSink,
    ) -> Self {
        Self {
            search,
            fetcher,
            model,
            gate,
            settings,
            events,
            last_search: Mutex::new(None),
        }
    }

    /// Collect evidence for `queries`, updating `history` as queries are
    /// issued and items accepted.
    ///
    /// Queries already in `history` are skipped. Pages are fetched and scored
    /// concurrently but admitted in search-result order, so the output order
    /// does not depend on which request finished first.
    pub async fn collect(
        &self,
        queries: &[String],
        subtopic: &str,
        history: &mut QueryHistory,
    ) -> Vec<EvidenceItem> {
        let mut accepted = Vec::new();
        let mut fetched: HashSet<String> = HashSet::new();

        for query in queries {
            if !history.record_query(query) {
                self.events.emit(&ResearchEvent::QuerySkipped {
                    subtopic: subtopic.to_string(),
                    query: query.clone(),
                });
                continue;
            }

            self.pace_search().await;
            let search = with_timeout(
                self.settings.call_timeout,
                self.search.search(query, self.settings.max_results_per_query),
            )
            .await;

            let urls = match search {
                Ok(urls) => urls,
                Err(e) => {
                    self.events.emit(&ResearchEvent::SearchFailed {
                        subtopic: subtopic.to_string(),
                        query: query.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let mut targets = Vec::new();
            for url in urls {
                if targets.len() >= self.settings.max_pages_per_query {
                    break;
                }
                if history.has_url(&url) || !fetched.insert(url.clone()) {
                    continue;
                }
                targets.push(url);
            }

            let scored: Vec<Option<EvidenceItem>> = stream::iter(targets.iter())
                .map(|url| self.fetch_and_score(subtopic, url))
                .buffered(self.settings.max_concurrent_fetches.max(1))
                .collect()
                .await;

            for candidate in scored.into_iter().flatten() {
                if self.gate.admit(&candidate, history) {
                    history.record_url(&candidate.source_url);
                    self.events.emit(&ResearchEvent::EvidenceAccepted {
                        subtopic: subtopic.to_string(),
                        url: candidate.source_url.clone(),
                        score: candidate.relevance_score,
                    });
                    accepted.push(candidate);
                } else {
                    self.events.emit(&ResearchEvent::EvidenceRejected {
                        subtopic: subtopic.to_string(),
                        url: candidate.source_url.clone(),
                        score: candidate.relevance_score,
                    });
                }
            }
        }

        accepted
    }

    /// Wait until `search_delay` has passed since the previous search started.
    ///
    /// The lock is held while sleeping, so concurrent subtopics queue up and
    /// the overall search rate stays at one call per delay.
    async fn pace_search(&self) {
        let mut last = self.last_search.lock().await;
        if let Some(at) = *last {
            tokio::time::sleep_until(at + self.settings.search_delay).await;
        }
        *last = Some(Instant::now());
    }

    async fn fetch_and_score(&self, subtopic: &str, url: &str) -> Option<EvidenceItem> {
        let content = match tokio::time::timeout(self.settings.call_timeout, self.fetcher.fetch(url)).await {
            Ok(Some(content)) => content,
            _ => {
                self.events.emit(&ResearchEvent::FetchFailed {
                    subtopic: subtopic.to_string(),
                    url: url.to_string(),
                });
                return None;
            }
        };

        match with_timeout(
            self.settings.call_timeout,
            self.model.score(subtopic, url, &content),
        )
        .await
        {
            Ok(assessment) => Some(assessment.into_evidence(url, content)),
            Err(e) => {
                self.events.emit(&ResearchEvent::ScoringFailed {
                    subtopic: subtopic.to_string(),
                    url: url.to_string(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}
