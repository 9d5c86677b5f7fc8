//! Integration tests for the LLM-backed research model
//!
//! Uses `MockLLMClient` to check how tool-call replies are decoded and how the
//! pipeline behaves when the model gives no usable signal at all.

mod common;

use common::mocks::*;
use delve::research::assembler::NO_FINDINGS_PLACEHOLDER;
use delve::research::{CollectingSink, LlmResearchModel, ResearchEvent, ResearchModel, ResearchOrchestrator};
use delve::tools::schema;
use delve::types::TerminationReason;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_decompose_reads_tool_call() {
    let client = MockLLMClient::with_tool_calls(
        "",
        vec![tool_call(
            schema::DECOMPOSE_QUERY,
            json!({"subcomponents": ["history of CRDTs", " ", "CRDT deletes"]}),
        )],
    );
    let model = LlmResearchModel::new(Arc::new(client));

    let subtopics = model.decompose("CRDTs").await.unwrap();
    assert_eq!(subtopics, vec!["history of CRDTs", "CRDT deletes"]);
}

#[tokio::test]
async fn test_sufficiency_accepts_string_encoded_arguments() {
    let client = MockLLMClient::with_tool_calls(
        "",
        vec![tool_call(
            schema::ASSESS_SUFFICIENCY,
            json!(r#"{"has_sufficient_info": false, "missing_info": ["benchmarks"]}"#),
        )],
    );
    let model = LlmResearchModel::new(Arc::new(client));

    let verdict = model.assess("topic", &[]).await.unwrap();
    assert!(!verdict.sufficient);
    assert_eq!(verdict.missing_info, vec!["benchmarks"]);
}

#[tokio::test]
async fn test_mismatched_tool_is_no_signal() {
    let client = MockLLMClient::with_tool_calls(
        "",
        vec![tool_call(schema::DECOMPOSE_QUERY, json!({"subcomponents": ["a"]}))],
    );
    let model = LlmResearchModel::new(Arc::new(client));

    let err = model.generate_queries("topic", &[], &[]).await.unwrap_err();
    assert!(err.to_string().contains("no signal"));
}

#[tokio::test]
async fn test_malformed_arguments_are_no_signal() {
    let client = MockLLMClient::with_tool_calls(
        "",
        vec![tool_call(
            schema::ANALYZE_WEBSITE_RELEVANCE,
            json!({"summary": "missing the score"}),
        )],
    );
    let model = LlmResearchModel::new(Arc::new(client));

    assert!(model.score("topic", "https://a.example", "body").await.is_err());
}

#[tokio::test]
async fn test_text_only_reply_is_no_signal() {
    let model = LlmResearchModel::new(Arc::new(MockLLMClient::new("Sure, here are some queries")));
    assert!(model.generate_queries("topic", &[], &[]).await.is_err());
}

#[tokio::test]
async fn test_pipeline_with_silent_model_still_produces_report() {
    let store = Arc::new(MemoryStore::new());
    let search = Arc::new(MockSearch::fixed(&["https://a.example"]));
    let events = CollectingSink::new();
    let orchestrator = ResearchOrchestrator::builder(Arc::new(LlmResearchModel::new(Arc::new(
        MockLLMClient::failing(),
    ))))
    .search(search.clone())
    .fetcher(Arc::new(MockFetcher::new()))
    .store(store.clone())
    .events(Arc::new(events.clone()))
    .config(fast_config(2))
    .build();

    let report = orchestrator.research("quantum error correction").await.unwrap();

    assert_eq!(report.subtopics, vec!["quantum error correction"]);
    assert_eq!(report.outcomes[0].iterations, 2);
    assert_eq!(
        report.outcomes[0].termination_reason,
        TerminationReason::MaxIterations
    );
    assert!(search.calls().is_empty());
    assert!(report.report_text.contains(NO_FINDINGS_PLACEHOLDER));
    assert!(report.report_text.contains("## Executive Summary"));
    assert!(report.report_text.contains("## Conclusion"));
    assert_eq!(store.saved().len(), 1);
    assert_eq!(
        events.count_where(|e| matches!(e, ResearchEvent::SynthesisFallback { .. })),
        2
    );
}
