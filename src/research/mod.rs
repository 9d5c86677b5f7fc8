//! Iterative deep research
//!
//! A query is decomposed into subtopics. Each subtopic runs its own
//! generate → collect → assess loop ([`subtopic::SubtopicResearchLoop`]) until
//! the evidence is judged sufficient, the query generator runs dry, or the
//! iteration cap is hit. The accepted evidence is then synthesized into a
//! markdown report ([`assembler::ReportAssembler`]) and persisted
//! ([`store::ReportStore`]).
//!
//! [`orchestrator::ResearchOrchestrator`] wires the pieces together.

pub mod assembler;
pub mod collector;
pub mod events;
pub mod gate;
pub mod history;
pub mod model;
pub mod orchestrator;
pub mod store;
pub mod subtopic;

pub use assembler::ReportAssembler;
pub use collector::{CollectorSettings, EvidenceCollector};
pub use events::{CollectingSink, EventSink, NoopSink, ResearchEvent, SharedSink, TracingSink};
pub use gate::RelevanceGate;
pub use history::QueryHistory;
pub use model::{LlmResearchModel, ReportDigest, ResearchModel, SectionDigest};
pub use orchestrator::{ResearchOrchestrator, ResearchOrchestratorBuilder, ResearchRun};
pub use store::{MarkdownReportStore, ReportStore};
pub use subtopic::{LoopPhase, LoopSettings, SubtopicResearchLoop};

use crate::types::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Run `fut` with an upper bound on its duration.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::Timeout(limit))?
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
