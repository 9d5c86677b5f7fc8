//! Research progress events for observability.
//!
//! The controller never prints. Every notable step is emitted as a
//! [`ResearchEvent`] to an injected [`EventSink`]; the default sink turns them
//! into structured `tracing` events.

use crate::types::TerminationReason;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted while a research run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchEvent {
    /// The query was split into subtopics
    Decomposed {
        query: String,
        subtopics: Vec<String>,
        fallback: bool,
    },
    /// A subtopic loop started
    SubtopicStarted { subtopic: String, max_loops: u32 },
    /// The query generator produced a batch
    QueriesGenerated {
        subtopic: String,
        iteration: u32,
        queries: Vec<String>,
        rationale: Option<String>,
        /// Gaps the generator says the batch is aimed at
        knowledge_gaps: Vec<String>,
    },
    /// A query was skipped because it was already issued
    QuerySkipped { subtopic: String, query: String },
    /// A search call failed (after any fallback)
    SearchFailed {
        subtopic: String,
        query: String,
        error: String,
    },
    /// A page could not be fetched or was empty
    FetchFailed { subtopic: String, url: String },
    /// Scoring a fetched page failed
    ScoringFailed {
        subtopic: String,
        url: String,
        error: String,
    },
    /// A scored page passed the relevance gate
    EvidenceAccepted {
        subtopic: String,
        url: String,
        score: f32,
    },
    /// A scored page was turned away by the relevance gate
    EvidenceRejected {
        subtopic: String,
        url: String,
        score: f32,
    },
    /// Sufficiency judgement for the current evidence
    Assessed {
        subtopic: String,
        iteration: u32,
        sufficient: bool,
        knowledge_gaps: Vec<String>,
    },
    /// An external model call gave no usable answer
    NoSignal {
        subtopic: String,
        stage: &'static str,
        error: String,
    },
    /// A subtopic loop reached its terminal state
    SubtopicFinished {
        subtopic: String,
        iterations: u32,
        evidence: usize,
        reason: TerminationReason,
    },
    /// Synthesis failed and a canned text was used instead
    SynthesisFallback { part: String, error: String },
    /// The report was written to storage
    ReportSaved { location: PathBuf, sources: usize },
}

/// Receives research events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ResearchEvent);
}

/// Shared handle to an event sink
pub type SharedSink = Arc<dyn EventSink>;

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &ResearchEvent) {}
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ResearchEvent) {
        match event {
            ResearchEvent::Decomposed {
                query,
                subtopics,
                fallback,
            } => tracing::info!(
                query = %query,
                count = subtopics.len(),
                fallback = *fallback,
                "Query decomposed into {} subtopics: {:?}",
                subtopics.len(),
                subtopics
            ),
            ResearchEvent::SubtopicStarted {
                subtopic,
                max_loops,
            } => tracing::info!(subtopic = %subtopic, max_loops = *max_loops, "Researching subtopic"),
            ResearchEvent::QueriesGenerated {
                subtopic,
                iteration,
                queries,
                rationale,
                knowledge_gaps,
            } => tracing::info!(
                subtopic = %subtopic,
                iteration = *iteration + 1,
                rationale = rationale.as_deref().unwrap_or(""),
                targets = ?knowledge_gaps,
                "Generated queries: {:?}",
                queries
            ),
            ResearchEvent::QuerySkipped { subtopic, query } => {
                tracing::debug!(subtopic = %subtopic, query = %query, "Query already issued, skipping")
            }
            ResearchEvent::SearchFailed {
                subtopic,
                query,
                error,
            } => tracing::warn!(subtopic = %subtopic, query = %query, "Search failed: {}", error),
            ResearchEvent::FetchFailed { subtopic, url } => {
                tracing::debug!(subtopic = %subtopic, url = %url, "Fetch failed")
            }
            ResearchEvent::ScoringFailed {
                subtopic,
                url,
                error,
            } => tracing::warn!(subtopic = %subtopic, url = %url, "Scoring failed: {}", error),
            ResearchEvent::EvidenceAccepted {
                subtopic,
                url,
                score,
            } => tracing::info!(subtopic = %subtopic, url = %url, score = *score, "Relevant source accepted"),
            ResearchEvent::EvidenceRejected {
                subtopic,
                url,
                score,
            } => tracing::debug!(subtopic = %subtopic, url = %url, score = *score, "Source rejected"),
            ResearchEvent::Assessed {
                subtopic,
                iteration,
                sufficient,
                knowledge_gaps,
            } => tracing::info!(
                subtopic = %subtopic,
                iteration = *iteration + 1,
                sufficient = *sufficient,
                gaps = knowledge_gaps.len(),
                "Sufficiency assessed"
            ),
            ResearchEvent::NoSignal {
                subtopic,
                stage,
                error,
            } => tracing::warn!(subtopic = %subtopic, stage = *stage, "No signal from model: {}", error),
            ResearchEvent::SubtopicFinished {
                subtopic,
                iterations,
                evidence,
                reason,
            } => tracing::info!(
                subtopic = %subtopic,
                iterations = *iterations,
                evidence = *evidence,
                reason = %reason,
                "Subtopic finished"
            ),
            ResearchEvent::SynthesisFallback { part, error } => {
                tracing::warn!(part = %part, "Synthesis failed, using fallback text: {}", error)
            }
            ResearchEvent::ReportSaved { location, sources } => {
                tracing::info!(location = ?location, sources = *sources, "Report saved")
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<ResearchEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<ResearchEvent> {
        self.events.lock().clone()
    }

    pub fn count_where(&self, predicate: impl Fn(&ResearchEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &ResearchEvent) {
        self.events.lock().push(event.clone());
    }
}
