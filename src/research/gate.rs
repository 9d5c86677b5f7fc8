//! Admission rule for evidence.

use crate::research::history::QueryHistory;
use crate::types::EvidenceItem;

/// Default minimum relevance (exclusive) for an item to be kept.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.3;

/// Decides whether a scored page joins a subtopic's accepted evidence.
///
/// An item is admitted iff its score is strictly above the threshold and its
/// URL is not already accepted. The gate never inserts anything itself.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    threshold: f32,
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new(DEFAULT_RELEVANCE_THRESHOLD)
    }
}

impl RelevanceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn admit(&self, candidate: &EvidenceItem, history: &QueryHistory) -> bool {
        candidate.relevance_score > self.threshold && !history.has_url(&candidate.source_url)
    }
}
