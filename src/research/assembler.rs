//! Report assembly
//!
//! Sections are synthesized per subtopic, then a summary and a conclusion are
//! written from a [`ReportDigest`] of those sections. Any synthesis failure is
//! replaced by a canned text built from counts and evidence excerpts, so
//! assembly itself cannot fail.

use crate::research::events::{ResearchEvent, SharedSink};
use crate::research::model::{ReportDigest, ResearchModel, SectionDigest};
use crate::research::{truncate_chars, with_timeout};
use crate::types::{EvidenceItem, ResearchReport, Result};
use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Section body used for a subtopic without accepted evidence.
pub const NO_FINDINGS_PLACEHOLDER: &str = "No relevant information found for this topic.";

const FALLBACK_BULLETS: usize = 5;
const FALLBACK_EXCERPT_CHARS: usize = 200;

pub struct ReportAssembler {
    model: Arc<dyn ResearchModel>,
    excerpt_cap: usize,
    call_timeout: Duration,
    events: SharedSink,
}

impl ReportAssembler {
    pub fn new(
        model: Arc<dyn ResearchModel>,
        excerpt_cap: usize,
        call_timeout: Duration,
        events: SharedSink,
    ) -> Self {
        Self {
            model,
            excerpt_cap,
            call_timeout,
            events,
        }
    }

    /// Build the report for `query`.
    ///
    /// `subtopics` fixes the section order; a subtopic missing from
    /// `findings` is treated as having no evidence.
    pub async fn assemble(
        &self,
        query: &str,
        subtopics: &[String],
        findings: BTreeMap<String, Vec<EvidenceItem>>,
    ) -> ResearchReport {
        let section_texts = join_all(
            subtopics
                .iter()
                .map(|subtopic| self.section(subtopic, evidence_of(&findings, subtopic))),
        )
        .await;

        let sources: BTreeSet<String> = subtopics
            .iter()
            .flat_map(|s| evidence_of(&findings, s).iter().map(|e| e.source_url.clone()))
            .collect();

        let digest = ReportDigest {
            query: query.to_string(),
            total_sources: sources.len(),
            sections: subtopics
                .iter()
                .zip(section_texts)
                .map(|(subtopic, text)| SectionDigest {
                    subtopic: subtopic.clone(),
                    source_count: evidence_of(&findings, subtopic).len(),
                    text,
                })
                .collect(),
        };

        let summary = self
            .or_fallback(
                "executive_summary",
                self.model.synthesize_summary(&digest),
                || fallback_summary(&digest),
            )
            .await;
        let conclusion = self
            .or_fallback(
                "conclusion",
                self.model.synthesize_conclusion(&digest),
                || fallback_conclusion(&digest),
            )
            .await;

        let report_text = compose_report(&digest, &summary, &conclusion);

        let findings = subtopics
            .iter()
            .map(|s| (s.clone(), evidence_of(&findings, s).to_vec()))
            .collect();

        ResearchReport {
            query: query.to_string(),
            subtopics: subtopics.to_vec(),
            findings,
            report_text,
            generated_at: Utc::now(),
            sources,
            outcomes: Vec::new(),
        }
    }

    async fn section(&self, subtopic: &str, evidence: &[EvidenceItem]) -> String {
        if evidence.is_empty() {
            return NO_FINDINGS_PLACEHOLDER.to_string();
        }

        self.or_fallback(
            &format!("section:{}", subtopic),
            self.model
                .synthesize_section(subtopic, evidence, self.excerpt_cap),
            || fallback_section(subtopic, evidence),
        )
        .await
    }

    async fn or_fallback(
        &self,
        part: &str,
        call: impl std::future::Future<Output = Result<String>>,
        fallback: impl FnOnce() -> String,
    ) -> String {
        match with_timeout(self.call_timeout, call).await {
            Ok(text) => text,
            Err(e) => {
                self.events.emit(&ResearchEvent::SynthesisFallback {
                    part: part.to_string(),
                    error: e.to_string(),
                });
                fallback()
            }
        }
    }
}

fn evidence_of<'a>(
    findings: &'a BTreeMap<String, Vec<EvidenceItem>>,
    subtopic: &str,
) -> &'a [EvidenceItem] {
    findings.get(subtopic).map(Vec::as_slice).unwrap_or(&[])
}

/// Concatenate title, summary, sections in order, and conclusion.
pub fn compose_report(digest: &ReportDigest, summary: &str, conclusion: &str) -> String {
    let mut out = format!("# Research Report: {}\n\n", digest.query);
    out.push_str("## Executive Summary\n");
    out.push_str(summary.trim());
    out.push_str("\n\n## Detailed Findings\n");

    for section in &digest.sections {
        out.push_str(&format!("\n### {}\n{}\n", section.subtopic, section.text.trim()));
    }

    out.push_str("\n## Conclusion\n");
    out.push_str(conclusion.trim());
    out.push('\n');
    out
}

pub fn fallback_section(subtopic: &str, evidence: &[EvidenceItem]) -> String {
    let bullets = evidence
        .iter()
        .take(FALLBACK_BULLETS)
        .map(|e| {
            format!(
                "- {}... (Source: {})",
                truncate_chars(&e.extracted_info, FALLBACK_EXCERPT_CHARS),
                e.source_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "**Analysis of {}**\n\nBased on {} sources analyzed:\n\n**Key Findings:**\n{}",
        subtopic,
        evidence.len(),
        bullets
    )
}

pub fn fallback_summary(digest: &ReportDigest) -> String {
    format!(
        "This report presents findings from research on \"{}\". \
         The research was conducted by breaking down the query into {} key areas \
         and analyzing {} relevant sources.",
        digest.query,
        digest.sections.len(),
        digest.total_sources
    )
}

pub fn fallback_conclusion(digest: &ReportDigest) -> String {
    format!(
        "This research on \"{}\" analyzed {} sources across {} key areas. \
         The findings provide comprehensive insights into the various aspects of the topic.",
        digest.query,
        digest.total_sources,
        digest.sections.len()
    )
}
