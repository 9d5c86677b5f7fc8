//! Mock implementations for testing.
//!
//! Hand-written collaborators for the research pipeline: a scripted research
//! model, search and fetch stubs, in-memory report stores and a mock LLM
//! client. All of them record how they were called so tests can assert on
//! call counts without touching the network.

#![allow(dead_code)]

use async_trait::async_trait;
use delve::llm::{LLMClient, LLMResponse};
use delve::research::{ReportDigest, ReportStore, ResearchModel};
use delve::tools::fetch::PageFetcher;
use delve::tools::search::SearchProvider;
use delve::types::{
    AppError, EvidenceItem, QueryPlan, RelevanceAssessment, ResearchReport, Result,
    SufficiencyVerdict, ToolCall, ToolDefinition,
};
use delve::utils::toml_config::ResearchConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Research settings with all pauses removed.
pub fn fast_config(max_loops: u32) -> ResearchConfig {
    ResearchConfig {
        max_loops,
        search_delay_ms: 0,
        iteration_delay_ms: 0,
        call_timeout_secs: 5,
        ..ResearchConfig::default()
    }
}

// ============= Research Model =============

/// How long a hanging mock call sleeps
const HANG: Duration = Duration::from_secs(30);

/// How the scripted model answers query generation.
#[derive(Clone, Debug)]
pub enum QueryMode {
    /// `count` new queries per call: "<subtopic> q<call>-<i>"
    Fresh(usize),
    /// The same list on every call
    Repeat(Vec<String>),
    /// Always fails
    Fail,
    /// Never answers in time; sleeps far past any test timeout
    Hang,
}

/// How the scripted model answers sufficiency assessment.
#[derive(Clone, Debug)]
pub enum AssessMode {
    /// Never sufficient; reports one gap per call
    Never,
    /// Sufficient once at least this many items were accepted
    AtLeast(usize),
    /// Always fails
    Fail,
    /// Never answers in time
    Hang,
}

/// Deterministic [`ResearchModel`] driven by simple rules.
pub struct ScriptedModel {
    pub decomposition: Option<Vec<String>>,
    pub queries: QueryMode,
    pub assessment: AssessMode,
    /// Scores by URL; anything else scores `default_score`
    pub scores: HashMap<String, f32>,
    pub default_score: f32,
    pub failing_scores: HashSet<String>,
    pub fail_synthesis: bool,
    generate_calls: Mutex<HashMap<String, u32>>,
    assess_calls: Mutex<HashMap<String, u32>>,
    seen_gaps: Mutex<Vec<Vec<String>>>,
    section_inputs: Mutex<Vec<usize>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            decomposition: None,
            queries: QueryMode::Fresh(1),
            assessment: AssessMode::Never,
            scores: HashMap::new(),
            default_score: 0.9,
            failing_scores: HashSet::new(),
            fail_synthesis: false,
            generate_calls: Mutex::new(HashMap::new()),
            assess_calls: Mutex::new(HashMap::new()),
            seen_gaps: Mutex::new(Vec::new()),
            section_inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn decomposing(mut self, subtopics: &[&str]) -> Self {
        self.decomposition = Some(subtopics.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn queries(mut self, mode: QueryMode) -> Self {
        self.queries = mode;
        self
    }

    pub fn assessment(mut self, mode: AssessMode) -> Self {
        self.assessment = mode;
        self
    }

    pub fn score(mut self, url: &str, score: f32) -> Self {
        self.scores.insert(url.to_string(), score);
        self
    }

    pub fn failing_score(mut self, url: &str) -> Self {
        self.failing_scores.insert(url.to_string());
        self
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    pub fn generate_calls(&self, subtopic: &str) -> u32 {
        self.generate_calls.lock().get(subtopic).copied().unwrap_or(0)
    }

    pub fn assess_calls(&self, subtopic: &str) -> u32 {
        self.assess_calls.lock().get(subtopic).copied().unwrap_or(0)
    }

    /// Knowledge gaps passed to each query-generation call, in call order
    pub fn seen_gaps(&self) -> Vec<Vec<String>> {
        self.seen_gaps.lock().clone()
    }

    /// Number of evidence items handed to each section synthesis call
    pub fn section_inputs(&self) -> Vec<usize> {
        self.section_inputs.lock().clone()
    }
}

#[async_trait]
impl ResearchModel for ScriptedModel {
    async fn decompose(&self, _query: &str) -> Result<Vec<String>> {
        self.decomposition
            .clone()
            .ok_or_else(|| AppError::LLM("Mock decomposition failure".to_string()))
    }

    async fn generate_queries(
        &self,
        subtopic: &str,
        knowledge_gaps: &[String],
        _history: &[String],
    ) -> Result<QueryPlan> {
        let call = {
            let mut calls = self.generate_calls.lock();
            let entry = calls.entry(subtopic.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        self.seen_gaps.lock().push(knowledge_gaps.to_vec());

        let queries = match &self.queries {
            QueryMode::Fresh(count) => (0..*count)
                .map(|i| format!("{} q{}-{}", subtopic, call, i))
                .collect(),
            QueryMode::Repeat(list) => list.clone(),
            QueryMode::Fail => return Err(AppError::LLM("Mock generation failure".to_string())),
            QueryMode::Hang => {
                tokio::time::sleep(HANG).await;
                vec![]
            }
        };

        Ok(QueryPlan {
            queries,
            operator_rationale: None,
            knowledge_gaps: vec![format!("{} planned gap {}", subtopic, call)],
        })
    }

    async fn score(&self, _subtopic: &str, url: &str, _content: &str) -> Result<RelevanceAssessment> {
        if self.failing_scores.contains(url) {
            return Err(AppError::LLM("Mock scoring failure".to_string()));
        }
        Ok(RelevanceAssessment {
            relevance_score: self.scores.get(url).copied().unwrap_or(self.default_score),
            summary: format!("summary of {}", url),
            extracted_info: format!("facts from {}", url),
        })
    }

    async fn assess(&self, subtopic: &str, evidence: &[EvidenceItem]) -> Result<SufficiencyVerdict> {
        let call = {
            let mut calls = self.assess_calls.lock();
            let entry = calls.entry(subtopic.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        match self.assessment {
            AssessMode::Never => Ok(SufficiencyVerdict {
                sufficient: false,
                missing_info: vec![format!("gap {}", call)],
            }),
            AssessMode::AtLeast(n) => Ok(SufficiencyVerdict {
                sufficient: evidence.len() >= n,
                missing_info: vec![format!("gap {}", call)],
            }),
            AssessMode::Fail => Err(AppError::LLM("Mock assessment failure".to_string())),
            AssessMode::Hang => {
                tokio::time::sleep(HANG).await;
                Ok(SufficiencyVerdict::default())
            }
        }
    }

    async fn synthesize_section(
        &self,
        subtopic: &str,
        evidence: &[EvidenceItem],
        excerpt_cap: usize,
    ) -> Result<String> {
        if self.fail_synthesis {
            return Err(AppError::LLM("Mock synthesis failure".to_string()));
        }
        let used = evidence.len().min(excerpt_cap);
        self.section_inputs.lock().push(used);
        Ok(format!("Section on {} from {} items.", subtopic, used))
    }

    async fn synthesize_summary(&self, digest: &ReportDigest) -> Result<String> {
        if self.fail_synthesis {
            return Err(AppError::LLM("Mock synthesis failure".to_string()));
        }
        Ok(format!(
            "Summary of {} across {} subtopics.",
            digest.query,
            digest.sections.len()
        ))
    }

    async fn synthesize_conclusion(&self, digest: &ReportDigest) -> Result<String> {
        if self.fail_synthesis {
            return Err(AppError::LLM("Mock synthesis failure".to_string()));
        }
        Ok(format!("Conclusion with {} sources.", digest.total_sources))
    }
}

// ============= Search & Fetch =============

type SearchFn = dyn Fn(&str) -> Result<Vec<String>> + Send + Sync;

/// Search stub answering from a closure and recording every query.
pub struct MockSearch {
    respond: Box<SearchFn>,
    calls: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new(respond: impl Fn(&str) -> Result<Vec<String>> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Same result list for every query
    pub fn fixed(urls: &[&str]) -> Self {
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        Self::new(move |_| Ok(urls.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(AppError::Search("Mock search failure".to_string())))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    fn name(&self) -> &str {
        "mock-search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.calls.lock().push(query.to_string());
        (self.respond)(query).map(|urls| urls.into_iter().take(limit).collect())
    }
}

/// Fetch stub: every URL yields text unless listed as failing.
#[derive(Default)]
pub struct MockFetcher {
    pub fail_all: bool,
    pub failing: HashSet<String>,
    /// Artificial latency per URL
    pub delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_all() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.calls.lock().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_all || self.failing.contains(url) {
            return None;
        }
        Some(format!("# Page\n\nContent of {}", url))
    }
}

// ============= Report Stores =============

/// Keeps saved reports in memory.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<ResearchReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<ResearchReport> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save(&self, report: &ResearchReport) -> Result<PathBuf> {
        self.saved.lock().push(report.clone());
        Ok(PathBuf::from("memory://report.md"))
    }
}

/// Refuses every write.
pub struct FailingStore;

#[async_trait]
impl ReportStore for FailingStore {
    async fn save(&self, _report: &ResearchReport) -> Result<PathBuf> {
        Err(AppError::Persistence("disk full".to_string()))
    }
}

// ============= LLM Client =============

/// Mock LLM client for testing with configurable responses.
///
/// Replies with a fixed text and, for tool calls, a fixed list of calls.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    tool_calls: Vec<ToolCall>,
    should_fail: bool,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            tool_calls: vec![],
            should_fail: false,
        }
    }

    /// Create a mock client that returns both a response and tool calls.
    pub fn with_tool_calls(response: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            response: response.to_string(),
            tool_calls,
            should_fail: false,
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            tool_calls: vec![],
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.generate("").await
    }

    async fn generate_with_tools(
        &self,
        _system: &str,
        _prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        let finish_reason = if self.tool_calls.is_empty() {
            "stop"
        } else {
            "tool_calls"
        };

        Ok(LLMResponse {
            content: self.response.clone(),
            tool_calls: self.tool_calls.clone(),
            finish_reason: finish_reason.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

pub fn tool_call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: "call_0".to_string(),
        name: name.to_string(),
        arguments,
    }
}
