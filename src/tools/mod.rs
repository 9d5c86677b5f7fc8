//! External collaborators used by the research loop
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search (daedra, results-page scrape fallback)
//! - [`fetch`](crate::tools::fetch) - Page retrieval as readable text
//! - [`schema`](crate::tools::schema) - Function-calling schemas for the model calls
//!
//! # Web Search
//!
//! ```ignore
//! let search = FallbackSearch::from_config(&config.search)?;
//! let urls = search.search("site:rust-lang.org async traits", 5).await?;
//! ```

/// Page fetching.
pub mod fetch;
/// Tool schemas and decoding of tool invocations.
pub mod schema;
/// Search providers.
pub mod search;
