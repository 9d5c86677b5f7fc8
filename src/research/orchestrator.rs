//! Top-level research entry point.

use crate::llm::LLMClient;
use crate::research::assembler::ReportAssembler;
use crate::research::collector::{CollectorSettings, EvidenceCollector};
use crate::research::events::{ResearchEvent, SharedSink, TracingSink};
use crate::research::gate::RelevanceGate;
use crate::research::model::{LlmResearchModel, ResearchModel};
use crate::research::store::{MarkdownReportStore, ReportStore};
use crate::research::subtopic::{LoopSettings, SubtopicResearchLoop};
use crate::research::with_timeout;
use crate::tools::fetch::{DaedraFetcher, PageFetcher};
use crate::tools::search::{DaedraSearch, FallbackSearch, SearchProvider};
use crate::types::{AppError, EvidenceItem, ResearchReport, Result, SubtopicOutcome};
use crate::utils::toml_config::{DelveConfig, ResearchConfig};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// A finished run: the report and where it was stored.
#[derive(Debug, Clone)]
pub struct ResearchRun {
    pub report: ResearchReport,
    pub location: PathBuf,
}

/// Decomposes a query, researches every subtopic and assembles the report.
///
/// # Example
///
/// ```rust,ignore
/// let config = DelveConfig::load_or_default("delve.toml")?;
/// let llm = config.provider.to_provider()?.create_client().await?;
/// let orchestrator = ResearchOrchestrator::from_config(&config, llm)?;
/// let report = orchestrator.research("state of WebAssembly component model").await?;
/// ```
pub struct ResearchOrchestrator {
    model: Arc<dyn ResearchModel>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn ReportStore>,
    events: SharedSink,
    config: ResearchConfig,
}

impl ResearchOrchestrator {
    pub fn builder(model: Arc<dyn ResearchModel>) -> ResearchOrchestratorBuilder {
        ResearchOrchestratorBuilder::new(model)
    }

    /// Production wiring: LLM-backed model, daedra search with the scrape
    /// fallback, daedra page fetching, markdown store and tracing events.
    pub fn from_config(config: &DelveConfig, llm: Arc<dyn LLMClient>) -> Result<Self> {
        config.validate()?;

        let model = LlmResearchModel::new(llm)
            .with_queries_per_iteration(config.research.queries_per_iteration)
            .with_content_char_limit(config.research.content_char_limit);
        let store = MarkdownReportStore::new(config.output.directory.clone())
            .with_json(config.output.write_json);

        Ok(Self::builder(Arc::new(model))
            .search(Arc::new(FallbackSearch::from_config(&config.search)?))
            .fetcher(Arc::new(DaedraFetcher::new()))
            .store(Arc::new(store))
            .config(config.research.clone())
            .build())
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Research `query` and persist the report.
    ///
    /// Only persistence failures (and an empty query) are returned as errors.
    pub async fn research(&self, query: &str) -> Result<ResearchReport> {
        self.run(query).await.map(|run| run.report)
    }

    /// Like [`ResearchOrchestrator::research`], also returning the storage location.
    pub async fn run(&self, query: &str) -> Result<ResearchRun> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("query cannot be empty".to_string()));
        }

        let span = tracing::info_span!("research", run_id = %Uuid::new_v4(), query = %query);
        self.run_inner(query).instrument(span).await
    }

    async fn run_inner(&self, query: &str) -> Result<ResearchRun> {
        let subtopics = self.decompose(query).await;

        let collector = Arc::new(EvidenceCollector::new(
            self.search.clone(),
            self.fetcher.clone(),
            self.model.clone(),
            RelevanceGate::new(self.config.relevance_threshold),
            CollectorSettings::from(&self.config),
            self.events.clone(),
        ));
        let research_loop = SubtopicResearchLoop::new(
            collector,
            self.model.clone(),
            LoopSettings::from(&self.config),
            self.events.clone(),
        );

        // Ordered output regardless of which subtopic finishes first.
        let states: Vec<_> = stream::iter(subtopics.iter())
            .map(|subtopic| research_loop.run(subtopic))
            .buffered(self.config.max_concurrent_subtopics.max(1))
            .collect()
            .await;

        let outcomes: Vec<SubtopicOutcome> = states.iter().map(SubtopicOutcome::from).collect();
        let findings: BTreeMap<String, Vec<EvidenceItem>> = states
            .into_iter()
            .map(|state| (state.subtopic, state.accepted_evidence))
            .collect();

        let assembler = ReportAssembler::new(
            self.model.clone(),
            self.config.evidence_excerpt_cap,
            self.config.call_timeout(),
            self.events.clone(),
        );
        let report = assembler.assemble(query, &subtopics, findings).await;
        let report = ResearchReport { outcomes, ..report };

        let location = self.store.save(&report).await?;
        self.events.emit(&ResearchEvent::ReportSaved {
            location: location.clone(),
            sources: report.sources.len(),
        });

        Ok(ResearchRun { report, location })
    }

    /// Subtopics for `query`, falling back to `[query]` on failure or empty output.
    async fn decompose(&self, query: &str) -> Vec<String> {
        let result = with_timeout(self.config.call_timeout(), self.model.decompose(query)).await;

        let mut seen = HashSet::new();
        let subtopics: Vec<String> = match result {
            Ok(subtopics) => subtopics
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && seen.insert(s.clone()))
                .collect(),
            Err(e) => {
                self.events.emit(&ResearchEvent::NoSignal {
                    subtopic: query.to_string(),
                    stage: "decompose",
                    error: e.to_string(),
                });
                Vec::new()
            }
        };

        let fallback = subtopics.is_empty();
        let subtopics = if fallback {
            vec![query.to_string()]
        } else {
            subtopics
        };

        self.events.emit(&ResearchEvent::Decomposed {
            query: query.to_string(),
            subtopics: subtopics.clone(),
            fallback,
        });
        subtopics
    }
}

/// Builder for [`ResearchOrchestrator`]. Unset collaborators get the
/// production defaults.
pub struct ResearchOrchestratorBuilder {
    model: Arc<dyn ResearchModel>,
    search: Option<Arc<dyn SearchProvider>>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    store: Option<Arc<dyn ReportStore>>,
    events: Option<SharedSink>,
    config: ResearchConfig,
}

impl ResearchOrchestratorBuilder {
    fn new(model: Arc<dyn ResearchModel>) -> Self {
        Self {
            model,
            search: None,
            fetcher: None,
            store: None,
            events: None,
            config: ResearchConfig::default(),
        }
    }

    pub fn search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn events(mut self, events: SharedSink) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: ResearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ResearchOrchestrator {
        ResearchOrchestrator {
            model: self.model,
            search: self.search.unwrap_or_else(|| Arc::new(DaedraSearch::new())),
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(DaedraFetcher::new())),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MarkdownReportStore::new("."))),
            events: self.events.unwrap_or_else(|| Arc::new(TracingSink)),
            config: self.config,
        }
    }
}
