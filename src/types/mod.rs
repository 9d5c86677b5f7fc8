use crate::research::history::QueryHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============= Evidence Types =============

/// One fetched page that was scored against a subtopic.
///
/// Built once by the scoring step and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_url: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub raw_content: String,
    pub relevance_score: f32,
    pub summary: String,
    pub extracted_info: String,
}

/// Scoring verdict returned by the relevance model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceAssessment {
    pub relevance_score: f32,
    pub summary: String,
    #[serde(alias = "relevant_info")]
    pub extracted_info: String,
}

impl RelevanceAssessment {
    /// Attach the page this verdict was produced for.
    pub fn into_evidence(self, source_url: &str, raw_content: String) -> EvidenceItem {
        EvidenceItem {
            source_url: source_url.to_string(),
            raw_content,
            relevance_score: self.relevance_score.clamp(0.0, 1.0),
            summary: self.summary,
            extracted_info: self.extracted_info,
        }
    }
}

/// Batch of search strings produced by the query-generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub queries: Vec<String>,
    /// Free-form explanation of which search operators were chosen.
    #[serde(default)]
    pub operator_rationale: Option<serde_json::Value>,
    #[serde(default)]
    pub knowledge_gaps: Vec<String>,
}

/// Verdict of the sufficiency-assessment call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyVerdict {
    #[serde(alias = "has_sufficient_info")]
    pub sufficient: bool,
    #[serde(default)]
    pub missing_info: Vec<String>,
}

// ============= Subtopic Loop Types =============

/// Why a subtopic loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Sufficient,
    MaxIterations,
    NoQueriesProduced,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TerminationReason::Sufficient => "sufficient",
            TerminationReason::MaxIterations => "max_iterations",
            TerminationReason::NoQueriesProduced => "no_queries_produced",
        };
        f.write_str(label)
    }
}

/// Mutable state owned by one subtopic loop.
#[derive(Debug, Clone)]
pub struct SubtopicState {
    pub subtopic: String,
    pub iteration: u32,
    pub accepted_evidence: Vec<EvidenceItem>,
    /// Issued queries and accepted URLs for this subtopic.
    pub history: QueryHistory,
    pub knowledge_gaps: Vec<String>,
    pub terminated: bool,
    pub termination_reason: Option<TerminationReason>,
}

impl SubtopicState {
    pub fn new(subtopic: impl Into<String>) -> Self {
        Self {
            subtopic: subtopic.into(),
            iteration: 0,
            accepted_evidence: Vec::new(),
            history: QueryHistory::new(),
            knowledge_gaps: Vec::new(),
            terminated: false,
            termination_reason: None,
        }
    }

    /// Move to the terminal state. Only the first reason sticks.
    pub fn terminate(&mut self, reason: TerminationReason) {
        if !self.terminated {
            self.terminated = true;
            self.termination_reason = Some(reason);
        }
    }
}

/// Per-subtopic bookkeeping kept on the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtopicOutcome {
    pub subtopic: String,
    pub iterations: u32,
    pub termination_reason: TerminationReason,
    pub queries_issued: Vec<String>,
    pub evidence_count: usize,
}

impl From<&SubtopicState> for SubtopicOutcome {
    fn from(state: &SubtopicState) -> Self {
        Self {
            subtopic: state.subtopic.clone(),
            iterations: state.iteration,
            termination_reason: state
                .termination_reason
                .unwrap_or(TerminationReason::MaxIterations),
            queries_issued: state.history.issued_queries().to_vec(),
            evidence_count: state.accepted_evidence.len(),
        }
    }
}

// ============= Report Types =============

/// Final research output. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub query: String,
    pub subtopics: Vec<String>,
    pub findings: BTreeMap<String, Vec<EvidenceItem>>,
    pub report_text: String,
    pub generated_at: DateTime<Utc>,
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub outcomes: Vec<SubtopicOutcome>,
}

impl ResearchReport {
    /// Number of evidence items across all subtopics, duplicates included.
    pub fn evidence_count(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
