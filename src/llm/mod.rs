//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models that drive
//! the research loop. Provider-specific code sits behind [`LLMClient`], so the
//! research layer only ever sees prompts, tool definitions and tool calls.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API and compatible endpoints (default)
//! - `ollama` - Local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use delve::llm::Provider;
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.1".to_string(),
//! }
//! .create_client()
//! .await?;
//!
//! let answer = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, LLMResponse, Provider};
