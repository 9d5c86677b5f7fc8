//! # delve - iterative deep research
//!
//! delve takes a natural-language question, splits it into subtopics and
//! researches each one in a bounded loop: generate operator-augmented search
//! queries, fetch and score the result pages, keep what clears the relevance
//! gate, ask the model what is still missing, repeat. The accepted evidence
//! is synthesized into a markdown report with a deduplicated source list.
//!
//! ## Overview
//!
//! delve can be used in two ways:
//!
//! 1. **As a CLI** - Run the `delve` binary (`delve run "question"`)
//! 2. **As a library** - Embed [`ResearchOrchestrator`] and swap any collaborator
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use delve::{DelveConfig, ResearchOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DelveConfig::load_or_default("delve.toml")?;
//!     let llm = config.provider.to_provider()?.create_client().await?;
//!
//!     let orchestrator = ResearchOrchestrator::from_config(&config, llm)?;
//!     let report = orchestrator.research("How do CRDTs handle deletes?").await?;
//!     println!("{}", report.report_text);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Custom collaborators
//!
//! Search, page fetching, the model, report storage and progress events are
//! all traits. Tests and embedders plug in their own:
//!
//! ```rust,ignore
//! use delve::research::{CollectingSink, ResearchOrchestrator};
//! use std::sync::Arc;
//!
//! let events = CollectingSink::new();
//! let orchestrator = ResearchOrchestrator::builder(model)
//!     .search(Arc::new(my_search))
//!     .fetcher(Arc::new(my_fetcher))
//!     .store(Arc::new(my_store))
//!     .events(Arc::new(events.clone()))
//!     .build();
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI API and compatible endpoints (default) |
//! | `ollama` | Ollama local inference |
//! | `all-llm` | Both providers |
//!
//! ## Modules
//!
//! - [`research`] - Research loop, evidence collection, report assembly
//! - [`llm`] - LLM client implementations
//! - [`tools`] - Search and fetch providers, tool schemas
//! - [`types`] - Data model and error handling
//! - [`utils`] - TOML configuration
//! - [`cli`] - Command-line parsing and output

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Iterative research loop and report assembly.
pub mod research;
/// Search and fetch providers, tool (function) schemas.
pub mod tools;
/// Core types and errors.
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMResponse, Provider};
pub use research::{ResearchModel, ResearchOrchestrator};
pub use types::{AppError, EvidenceItem, ResearchReport, Result};
pub use utils::toml_config::DelveConfig;
