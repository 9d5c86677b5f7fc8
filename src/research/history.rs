//! Per-subtopic memory of issued queries and accepted sources.

use std::collections::HashSet;

/// Queries already issued and URLs already accepted for one subtopic.
///
/// Both sets only grow. Issue order of queries is kept so it can be shown to
/// the query generator and reported at the end.
#[derive(Debug, Clone, Default)]
pub struct QueryHistory {
    queries: Vec<String>,
    query_set: HashSet<String>,
    accepted_urls: HashSet<String>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query. Returns `false` (and changes nothing) if it was already issued.
    pub fn record_query(&mut self, query: &str) -> bool {
        if self.query_set.contains(query) {
            return false;
        }
        self.query_set.insert(query.to_string());
        self.queries.push(query.to_string());
        true
    }

    pub fn has_query(&self, query: &str) -> bool {
        self.query_set.contains(query)
    }

    /// Register a URL whose evidence was accepted.
    pub fn record_url(&mut self, url: &str) -> bool {
        self.accepted_urls.insert(url.to_string())
    }

    pub fn has_url(&self, url: &str) -> bool {
        self.accepted_urls.contains(url)
    }

    /// Issued queries in issue order.
    pub fn issued_queries(&self) -> &[String] {
        &self.queries
    }

    pub fn accepted_url_count(&self) -> usize {
        self.accepted_urls.len()
    }
}
