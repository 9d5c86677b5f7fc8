//! Language-model calls made by the research loop.
//!
//! [`ResearchModel`] is the boundary between the controller and the model:
//! one method per call site. [`LlmResearchModel`] implements it on top of any
//! [`LLMClient`], offering exactly one tool per structured call and decoding
//! the reply through [`ToolInvocation`]. A reply that does not invoke the
//! expected tool becomes an `AppError::LLM` "no signal" error, which the
//! controller turns into its fallback path.

use crate::llm::LLMClient;
use crate::research::truncate_chars;
use crate::tools::schema::{self, ToolInvocation};
use crate::types::{
    AppError, EvidenceItem, QueryPlan, RelevanceAssessment, Result, SufficiencyVerdict,
    ToolDefinition,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Aggregate view of one report section, handed to summary and conclusion synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDigest {
    pub subtopic: String,
    pub source_count: usize,
    pub text: String,
}

/// Everything summary and conclusion synthesis may look at.
///
/// Deliberately holds no evidence items: only counts, names and section texts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDigest {
    pub query: String,
    pub total_sources: usize,
    pub sections: Vec<SectionDigest>,
}

/// External model calls used during research.
#[async_trait]
pub trait ResearchModel: Send + Sync {
    /// Split a query into independent subtopics.
    async fn decompose(&self, query: &str) -> Result<Vec<String>>;

    /// Propose search queries for a subtopic, steering away from `history`.
    async fn generate_queries(
        &self,
        subtopic: &str,
        knowledge_gaps: &[String],
        history: &[String],
    ) -> Result<QueryPlan>;

    /// Score one fetched page against a subtopic.
    async fn score(&self, subtopic: &str, url: &str, content: &str) -> Result<RelevanceAssessment>;

    /// Judge whether the evidence gathered so far answers the subtopic.
    async fn assess(&self, subtopic: &str, evidence: &[EvidenceItem]) -> Result<SufficiencyVerdict>;

    /// Write the report section for one subtopic from at most `excerpt_cap` items.
    async fn synthesize_section(
        &self,
        subtopic: &str,
        evidence: &[EvidenceItem],
        excerpt_cap: usize,
    ) -> Result<String>;

    async fn synthesize_summary(&self, digest: &ReportDigest) -> Result<String>;

    async fn synthesize_conclusion(&self, digest: &ReportDigest) -> Result<String>;
}

const QUERY_PLANNER_SYSTEM: &str = r#"You are an expert research assistant skilled in using web search operators.
Based on the research topic and any knowledge gaps, create diverse search queries using appropriate operators. Every query must contain the research topic.
Consider:
- Use site: for specific domains (news sites, academic sites, social media)
- Use filetype: for PDFs, docs when looking for reports/papers
- Use intitle: or inurl: for specific types of pages
- Use date operators (before:/after:) for time-sensitive information
- Use quotes for exact phrases
- Use OR for alternative terms
- Use -term to exclude irrelevant results
- Use AROUND(X) for related concepts
- Use @platform for social media searches
- Combine multiple operators for precision"#;

const ANALYST_SYSTEM: &str =
    "You are a research analyst. Analyze the website content for relevance to the research query.";

const SUFFICIENCY_SYSTEM: &str =
    "You are a research analyst. Determine if we have sufficient information.";

const PLANNER_SYSTEM: &str =
    "You are a research planner. Decompose complex queries into subcomponents.";

const SECTION_SYSTEM: &str =
    "You are an expert research analyst. Create a detailed, well-structured report section.";

const SUMMARY_SYSTEM: &str =
    "You are an expert research report writer. Create clear, concise executive summaries.";

const CONCLUSION_SYSTEM: &str =
    "You are an expert research analyst. Create insightful, synthesizing conclusions.";

/// [`ResearchModel`] backed by an [`LLMClient`].
pub struct LlmResearchModel {
    llm: Arc<dyn LLMClient>,
    queries_per_iteration: usize,
    content_char_limit: usize,
}

impl LlmResearchModel {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            queries_per_iteration: 2,
            content_char_limit: 10_000,
        }
    }

    pub fn with_queries_per_iteration(mut self, count: usize) -> Self {
        self.queries_per_iteration = count.max(1);
        self
    }

    pub fn with_content_char_limit(mut self, limit: usize) -> Self {
        self.content_char_limit = limit;
        self
    }

    async fn invoke(
        &self,
        system: &str,
        prompt: &str,
        tool: ToolDefinition,
    ) -> Result<ToolInvocation> {
        let response = self
            .llm
            .generate_with_tools(system, prompt, std::slice::from_ref(&tool))
            .await?;

        ToolInvocation::from_response(&response).ok_or_else(|| {
            AppError::LLM(format!(
                "no signal: model answered without calling '{}'",
                tool.name
            ))
        })
    }

    async fn write(&self, system: &str, prompt: &str) -> Result<String> {
        let text = self.llm.generate_with_system(system, prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::LLM("model returned an empty text".to_string()));
        }
        Ok(text.to_string())
    }
}

fn no_signal(expected: &str, got: &ToolInvocation) -> AppError {
    AppError::LLM(format!("no signal: expected '{}', got {}", expected, got.label()))
}

/// Trim, drop blanks and drop repeats while keeping order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ResearchModel for LlmResearchModel {
    async fn decompose(&self, query: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Query: {}\nIs this complex? If yes, break it into subcomponents. \
             The subcomponents should be detailed and not overlapping. \
             Each subcomponent must stay connected to the main topic.",
            query
        );

        match self.invoke(PLANNER_SYSTEM, &prompt, schema::decompose_tool()).await? {
            ToolInvocation::Decomposition(subtopics) => Ok(clean_list(subtopics)),
            other => Err(no_signal(schema::DECOMPOSE_QUERY, &other)),
        }
    }

    async fn generate_queries(
        &self,
        subtopic: &str,
        knowledge_gaps: &[String],
        history: &[String],
    ) -> Result<QueryPlan> {
        let prompt = format!(
            "Generate search queries for: {subtopic}\n\
             The queries must not deviate from: {subtopic}\n\n\
             Knowledge gaps from previous searches:\n{gaps}\n\n\
             Previous searches conducted (do not repeat them):\n{history}\n\n\
             Create only {count} queries using different operators to get comprehensive results.",
            subtopic = subtopic,
            gaps = bullet_list(knowledge_gaps),
            history = bullet_list(history),
            count = self.queries_per_iteration,
        );

        match self
            .invoke(QUERY_PLANNER_SYSTEM, &prompt, schema::search_queries_tool())
            .await?
        {
            ToolInvocation::SearchQueries(mut plan) => {
                plan.queries = clean_list(plan.queries);
                plan.queries.truncate(self.queries_per_iteration);
                Ok(plan)
            }
            other => Err(no_signal(schema::GENERATE_SEARCH_QUERIES, &other)),
        }
    }

    async fn score(&self, subtopic: &str, url: &str, content: &str) -> Result<RelevanceAssessment> {
        let prompt = format!(
            "Research query: {}\n\nWebsite URL: {}\n\nContent:\n{}",
            subtopic,
            url,
            truncate_chars(content, self.content_char_limit)
        );

        match self
            .invoke(ANALYST_SYSTEM, &prompt, schema::relevance_tool())
            .await?
        {
            ToolInvocation::Relevance(assessment) => Ok(assessment),
            other => Err(no_signal(schema::ANALYZE_WEBSITE_RELEVANCE, &other)),
        }
    }

    async fn assess(&self, subtopic: &str, evidence: &[EvidenceItem]) -> Result<SufficiencyVerdict> {
        let collected: Vec<String> = evidence.iter().map(|e| e.extracted_info.clone()).collect();
        let prompt = format!(
            "Query: {}\n\nCollected information:\n{}",
            subtopic,
            bullet_list(&collected)
        );

        match self
            .invoke(SUFFICIENCY_SYSTEM, &prompt, schema::sufficiency_tool())
            .await?
        {
            ToolInvocation::Sufficiency(mut verdict) => {
                verdict.missing_info = clean_list(verdict.missing_info);
                Ok(verdict)
            }
            other => Err(no_signal(schema::ASSESS_SUFFICIENCY, &other)),
        }
    }

    async fn synthesize_section(
        &self,
        subtopic: &str,
        evidence: &[EvidenceItem],
        excerpt_cap: usize,
    ) -> Result<String> {
        let findings = evidence
            .iter()
            .take(excerpt_cap)
            .map(|e| {
                format!(
                    "Source: {}\nSummary: {}\nKey Information: {}",
                    e.source_url, e.summary, e.extracted_info
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Create a comprehensive report section for the topic: {}\n\n\
             Based on these findings:\n{}\n\n\
             Requirements:\n\
             1. Start with a brief overview\n\
             2. List key findings with bullet points\n\
             3. Identify trends and patterns\n\
             4. Provide insights and analysis\n\
             5. Use clear headings and formatting\n\
             6. Cite sources where appropriate\n\n\
             Write in a professional but accessible style.",
            subtopic, findings
        );

        self.write(SECTION_SYSTEM, &prompt).await
    }

    async fn synthesize_summary(&self, digest: &ReportDigest) -> Result<String> {
        let subtopics: Vec<String> = digest.sections.iter().map(|s| s.subtopic.clone()).collect();
        let overview: Vec<String> = digest
            .sections
            .iter()
            .filter(|s| s.source_count > 0)
            .map(|s| format!("{}: {} relevant sources found", s.subtopic, s.source_count))
            .collect();

        let prompt = format!(
            "Create an executive summary for this research report.\n\n\
             Original Query: {}\n\n\
             Research Approach:\n\
             - Query was analyzed and broken into {} key areas\n\
             - Total of {} sources were analyzed\n\
             - Subcomponents researched:\n{}\n\n\
             Findings Overview:\n{}\n\n\
             Write a 2-3 paragraph executive summary that:\n\
             1. Restates the research objective\n\
             2. Explains the methodology briefly\n\
             3. Highlights the most significant findings\n\
             4. Sets up the detailed sections that follow\n\n\
             Keep it concise but informative.",
            digest.query,
            digest.sections.len(),
            digest.total_sources,
            bullet_list(&subtopics),
            bullet_list(&overview)
        );

        self.write(SUMMARY_SYSTEM, &prompt).await
    }

    async fn synthesize_conclusion(&self, digest: &ReportDigest) -> Result<String> {
        let sections = digest
            .sections
            .iter()
            .map(|s| format!("### {} ({} sources)\n{}", s.subtopic, s.source_count, s.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Create a conclusion for this research report on: {}\n\n\
             Total sources analyzed: {}\n\n\
             Report sections:\n{}\n\n\
             Write a conclusion that:\n\
             1. Synthesizes the key findings across all areas\n\
             2. Identifies major themes and patterns\n\
             3. Highlights the most significant insights\n\
             4. Discusses implications for the future\n\
             5. Suggests areas for further research if applicable\n\n\
             Make it comprehensive but concise (3-4 paragraphs).",
            digest.query, digest.total_sources, sections
        );

        self.write(CONCLUSION_SYSTEM, &prompt).await
    }
}
