//! Function-calling schemas for the research model calls
//!
//! Each structured model call offers exactly one of these tools and expects
//! the reply to invoke it. Replies are decoded into [`ToolInvocation`], a
//! tagged variant; anything that is not the expected variant is treated by the
//! caller as "no signal".

use crate::llm::LLMResponse;
use crate::types::{QueryPlan, RelevanceAssessment, SufficiencyVerdict, ToolCall, ToolDefinition};
use serde::Deserialize;
use serde_json::{json, Value};

pub const GENERATE_SEARCH_QUERIES: &str = "generate_search_queries";
pub const ANALYZE_WEBSITE_RELEVANCE: &str = "analyze_website_relevance";
pub const DECOMPOSE_QUERY: &str = "decompose_query";
pub const ASSESS_SUFFICIENCY: &str = "assess_sufficiency";

const OPERATOR_GUIDE: &str = r#"List of search queries using search operators:
- site: (search within specific site)
- intitle: (words in title)
- inurl: (words in URL)
- intext: (words in page content)
- filetype: (specific file types like pdf, doc)
- related: (sites similar to URL)
- link: (pages linking to URL)
- "exact phrase" (exact match)
- -word (exclude word)
- word1 OR word2 (either term)
- word1 AND word2 (both terms)
- AROUND(X) (words within X words of each other)
- define: (definitions)
- before:YYYY-MM-DD (before date)
- after:YYYY-MM-DD (after date)
- @socialmedia (search social media)
- #hashtag (search hashtags)
- $price (price search)
- number..number (number range)
Combine operators intelligently based on research needs."#;

/// Tool offered to the query-generation call.
pub fn search_queries_tool() -> ToolDefinition {
    ToolDefinition {
        name: GENERATE_SEARCH_QUERIES.to_string(),
        description: "Generate web search queries using various operators for comprehensive research"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "queries": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": OPERATOR_GUIDE
                },
                "operator_rationale": {
                    "type": "object",
                    "description": "Explanation for why specific operators were chosen",
                    "properties": {
                        "site_operators": {"type": "string"},
                        "time_operators": {"type": "string"},
                        "content_operators": {"type": "string"},
                        "file_operators": {"type": "string"}
                    }
                },
                "knowledge_gaps": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Identified knowledge gaps that need more research"
                }
            },
            "required": ["queries"]
        }),
    }
}

/// Tool offered to the page-scoring call.
pub fn relevance_tool() -> ToolDefinition {
    ToolDefinition {
        name: ANALYZE_WEBSITE_RELEVANCE.to_string(),
        description: "Analyze if website content is relevant to the research query".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "relevance_score": {
                    "type": "number",
                    "description": "Relevance score from 0 to 1"
                },
                "summary": {
                    "type": "string",
                    "description": "Brief summary of the website content"
                },
                "relevant_info": {
                    "type": "string",
                    "description": "Extracted relevant information"
                }
            },
            "required": ["relevance_score", "summary", "relevant_info"]
        }),
    }
}

/// Tool offered to the decomposition call.
pub fn decompose_tool() -> ToolDefinition {
    ToolDefinition {
        name: DECOMPOSE_QUERY.to_string(),
        description: "Break down complex queries into subcomponents".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "subcomponents": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of query subcomponents"
                }
            },
            "required": ["subcomponents"]
        }),
    }
}

/// Tool offered to the sufficiency-assessment call.
pub fn sufficiency_tool() -> ToolDefinition {
    ToolDefinition {
        name: ASSESS_SUFFICIENCY.to_string(),
        description: "Judge whether the collected information answers the research topic"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "has_sufficient_info": {
                    "type": "boolean",
                    "description": "Whether enough information was gathered"
                },
                "missing_info": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of missing information if any"
                }
            },
            "required": ["has_sufficient_info"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct Decomposition {
    #[serde(alias = "subtopics")]
    subcomponents: Vec<String>,
}

/// A decoded tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    SearchQueries(QueryPlan),
    Relevance(RelevanceAssessment),
    Decomposition(Vec<String>),
    Sufficiency(SufficiencyVerdict),
    /// The model called a tool this crate does not know.
    Unrecognized { name: String },
    /// A known tool whose arguments did not match its schema.
    Malformed { name: String, error: String },
}

impl ToolInvocation {
    /// Decode a single tool call.
    pub fn from_call(call: &ToolCall) -> Self {
        let args = normalize_arguments(&call.arguments);
        let decoded = match call.name.as_str() {
            GENERATE_SEARCH_QUERIES => {
                serde_json::from_value::<QueryPlan>(args).map(ToolInvocation::SearchQueries)
            }
            ANALYZE_WEBSITE_RELEVANCE => {
                serde_json::from_value::<RelevanceAssessment>(args).map(ToolInvocation::Relevance)
            }
            DECOMPOSE_QUERY => serde_json::from_value::<Decomposition>(args)
                .map(|d| ToolInvocation::Decomposition(d.subcomponents)),
            ASSESS_SUFFICIENCY => {
                serde_json::from_value::<SufficiencyVerdict>(args).map(ToolInvocation::Sufficiency)
            }
            other => {
                return ToolInvocation::Unrecognized {
                    name: other.to_string(),
                }
            }
        };

        decoded.unwrap_or_else(|e| ToolInvocation::Malformed {
            name: call.name.clone(),
            error: e.to_string(),
        })
    }

    /// Decode the first tool call of a response, if there is one.
    pub fn from_response(response: &LLMResponse) -> Option<Self> {
        response.tool_calls.first().map(Self::from_call)
    }

    /// Short label used in logs and "no signal" errors.
    pub fn label(&self) -> String {
        match self {
            ToolInvocation::SearchQueries(_) => GENERATE_SEARCH_QUERIES.to_string(),
            ToolInvocation::Relevance(_) => ANALYZE_WEBSITE_RELEVANCE.to_string(),
            ToolInvocation::Decomposition(_) => DECOMPOSE_QUERY.to_string(),
            ToolInvocation::Sufficiency(_) => ASSESS_SUFFICIENCY.to_string(),
            ToolInvocation::Unrecognized { name } => format!("unrecognized tool '{}'", name),
            ToolInvocation::Malformed { name, error } => {
                format!("malformed '{}' arguments: {}", name, error)
            }
        }
    }
}

/// Some providers hand back arguments as a JSON-encoded string.
fn normalize_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::String(raw) => serde_json::from_str(raw).unwrap_or(Value::Null),
        other => other.clone(),
    }
}
