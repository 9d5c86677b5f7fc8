//! Durable storage for finished reports.

use crate::types::{AppError, ResearchReport, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Persists a report and returns where it was written.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, report: &ResearchReport) -> Result<PathBuf>;
}

/// Writes `research_report_YYYYMMDD_HHMMSS.md` files into a directory.
#[derive(Debug, Clone)]
pub struct MarkdownReportStore {
    directory: PathBuf,
    write_json: bool,
}

impl MarkdownReportStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_json: false,
        }
    }

    /// Also write the serialized report next to the markdown file.
    pub fn with_json(mut self, enabled: bool) -> Self {
        self.write_json = enabled;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_stem(report: &ResearchReport) -> String {
        format!(
            "research_report_{}",
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Report text followed by the numbered source list and the generation timestamp.
pub fn render_markdown(report: &ResearchReport) -> String {
    let mut out = report.report_text.trim_end().to_string();
    out.push_str("\n\n## Sources\n");
    for (i, url) in report.sources.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, url));
    }
    out.push_str(&format!(
        "\n---\n*Report generated on: {}*\n",
        report.generated_at.to_rfc3339()
    ));
    out
}

#[async_trait]
impl ReportStore for MarkdownReportStore {
    async fn save(&self, report: &ResearchReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| {
                AppError::Persistence(format!(
                    "Failed to create {}: {}",
                    self.directory.display(),
                    e
                ))
            })?;

        let stem = Self::file_stem(report);
        let path = self.directory.join(format!("{}.md", stem));
        tokio::fs::write(&path, render_markdown(report))
            .await
            .map_err(|e| {
                AppError::Persistence(format!("Failed to write {}: {}", path.display(), e))
            })?;

        if self.write_json {
            let json_path = self.directory.join(format!("{}.json", stem));
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| AppError::Persistence(format!("Failed to serialize report: {}", e)))?;
            tokio::fs::write(&json_path, json).await.map_err(|e| {
                AppError::Persistence(format!("Failed to write {}: {}", json_path.display(), e))
            })?;
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::{BTreeMap, BTreeSet};

    fn report() -> ResearchReport {
        ResearchReport {
            query: "X".to_string(),
            subtopics: vec!["X".to_string()],
            findings: BTreeMap::new(),
            report_text: "# Research Report: X\n".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap(),
            sources: BTreeSet::from([
                "https://b.example".to_string(),
                "https://a.example".to_string(),
            ]),
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn test_render_markdown_lists_sources() {
        let text = render_markdown(&report());
        assert!(text.contains("## Sources\n1. https://a.example\n2. https://b.example\n"));
        assert!(text.contains("*Report generated on: 2026-03-14T09:05:07+00:00*"));
    }

    #[tokio::test]
    async fn test_save_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkdownReportStore::new(dir.path().join("reports")).with_json(true);

        let path = store.save(&report()).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "research_report_20260314_090507.md"
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Research Report: X"));
        assert!(path.with_extension("json").exists());
    }

    #[tokio::test]
    async fn test_save_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = MarkdownReportStore::new(&blocker);
        let err = store.save(&report()).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }
}
