//! TOML-based configuration for delve
//!
//! All knobs of a research run live in one TOML file (`delve.toml`). Every
//! field has a default, so an empty file (or no file at all, via
//! [`DelveConfig::default`]) is a valid configuration. Secrets are never
//! stored in the file itself; the file names the environment variable that
//! holds them.

use crate::llm::Provider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from delve.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelveConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub research: ResearchConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_model")]
        model: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::OpenAI {
            api_key_env: default_openai_key_env(),
            api_base: default_openai_base(),
            model: default_openai_model(),
        }
    }
}

impl ProviderConfig {
    /// Resolve secrets and turn this entry into a runtime [`Provider`].
    pub fn to_provider(&self) -> Result<Provider, ConfigError> {
        match self {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => {
                let api_key = std::env::var(api_key_env)
                    .map_err(|_| ConfigError::MissingEnvVar(api_key_env.clone()))?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                })
            }
            ProviderConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
        }
    }
}

// ============= Research Loop Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Upper bound on iterations per subtopic
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,

    /// How many URLs to request from the search provider per query
    #[serde(default = "default_search_results_per_query")]
    pub search_results_per_query: usize,

    /// How many of those URLs are fetched and scored
    #[serde(default = "default_pages_per_query")]
    pub pages_per_query: usize,

    /// Target number of queries generated per iteration
    #[serde(default = "default_queries_per_iteration")]
    pub queries_per_iteration: usize,

    /// Evidence is kept only when its score is strictly above this value
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Subtopic loops allowed to run at the same time (1 = sequential)
    #[serde(default = "default_max_concurrent_subtopics")]
    pub max_concurrent_subtopics: usize,

    /// Pause after every search request
    #[serde(default = "default_search_delay_ms")]
    pub search_delay_ms: u64,

    /// Pause between two iterations of the same subtopic
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,

    /// Page text beyond this many characters is not sent for scoring
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,

    /// Maximum evidence items handed to one section synthesis call
    #[serde(default = "default_evidence_excerpt_cap")]
    pub evidence_excerpt_cap: usize,

    /// Deadline for any single search, fetch or model call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_max_loops() -> u32 {
    3
}

fn default_search_results_per_query() -> usize {
    5
}

fn default_pages_per_query() -> usize {
    3
}

fn default_queries_per_iteration() -> usize {
    2
}

fn default_relevance_threshold() -> f32 {
    0.3
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_max_concurrent_subtopics() -> usize {
    1
}

fn default_search_delay_ms() -> u64 {
    600
}

fn default_iteration_delay_ms() -> u64 {
    1000
}

fn default_content_char_limit() -> usize {
    10_000
}

fn default_evidence_excerpt_cap() -> usize {
    10
}

fn default_call_timeout_secs() -> u64 {
    60
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            search_results_per_query: default_search_results_per_query(),
            pages_per_query: default_pages_per_query(),
            queries_per_iteration: default_queries_per_iteration(),
            relevance_threshold: default_relevance_threshold(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_concurrent_subtopics: default_max_concurrent_subtopics(),
            search_delay_ms: default_search_delay_ms(),
            iteration_delay_ms: default_iteration_delay_ms(),
            content_char_limit: default_content_char_limit(),
            evidence_excerpt_cap: default_evidence_excerpt_cap(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl ResearchConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fall back to scraping a results page when the primary search fails
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    #[serde(default = "default_serp_url")]
    pub serp_url: String,

    /// Client identities rotated on every fallback request
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_serp_url() -> String {
    "https://www.google.com/search".to_string()
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/125.0 Safari/537.36"
            .to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 \
         (KHTML, like Gecko) Version/17.4 Safari/605.1.15"
            .to_string(),
        "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/127.0".to_string(),
    ]
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: default_true(),
            serp_url: default_serp_url(),
            user_agents: default_user_agents(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============= Output & Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// Also write the full report as JSON next to the markdown file
    #[serde(default)]
    pub write_json: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            write_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl DelveConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Like [`DelveConfig::load`] but falls back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::debug!("No configuration at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DelveConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let research = &self.research;

        if research.max_loops == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_loops must be at least 1".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&research.relevance_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "research.relevance_threshold must be in [0, 1), got {}",
                research.relevance_threshold
            )));
        }

        let positive = [
            ("search_results_per_query", research.search_results_per_query),
            ("pages_per_query", research.pages_per_query),
            ("queries_per_iteration", research.queries_per_iteration),
            ("max_concurrent_fetches", research.max_concurrent_fetches),
            ("max_concurrent_subtopics", research.max_concurrent_subtopics),
            ("evidence_excerpt_cap", research.evidence_excerpt_cap),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "research.{} must be at least 1",
                    name
                )));
            }
        }

        if research.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "research.call_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.search.fallback_enabled && self.search.user_agents.is_empty() {
            return Err(ConfigError::ValidationError(
                "search.user_agents cannot be empty while the fallback is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration back to TOML (used by `delve config`)
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|e| format!("# failed to render: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[provider]
type = "ollama"
model = "llama3.2"

[research]
max_loops = 5
search_results_per_query = 8
relevance_threshold = 0.5

[search]
fallback_enabled = false
user_agents = []

[output]
directory = "reports"
write_json = true
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = DelveConfig::from_toml_str(&create_test_config()).unwrap();

        assert_eq!(config.research.max_loops, 5);
        assert_eq!(config.research.search_results_per_query, 8);
        assert_eq!(config.research.relevance_threshold, 0.5);
        assert_eq!(config.output.directory, PathBuf::from("reports"));
        assert!(config.output.write_json);
        assert!(matches!(
            config.provider,
            ProviderConfig::Ollama { ref base_url, ref model }
                if base_url == "http://localhost:11434" && model == "llama3.2"
        ));
    }

    #[test]
    fn test_defaults() {
        let config = DelveConfig::from_toml_str("").unwrap();

        assert_eq!(config.research.max_loops, 3);
        assert_eq!(config.research.search_results_per_query, 5);
        assert_eq!(config.research.pages_per_query, 3);
        assert_eq!(config.research.queries_per_iteration, 2);
        assert_eq!(config.research.relevance_threshold, 0.3);
        assert_eq!(config.research.search_delay(), Duration::from_millis(600));
        assert_eq!(config.search.user_agents.len(), 3);
        assert!(config.search.fallback_enabled);
        assert_eq!(config.logging.level, "info");
        assert!(matches!(config.provider, ProviderConfig::OpenAI { .. }));
    }

    #[test]
    fn test_validation_zero_loops() {
        let result = DelveConfig::from_toml_str("[research]\nmax_loops = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_threshold_out_of_range() {
        let result = DelveConfig::from_toml_str("[research]\nrelevance_threshold = 1.0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_zero_fanout() {
        let result = DelveConfig::from_toml_str("[research]\npages_per_query = 0\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("pages_per_query"));
    }

    #[test]
    fn test_validation_empty_user_agents_with_fallback() {
        let result = DelveConfig::from_toml_str("[search]\nuser_agents = []\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DelveConfig::load("/nonexistent/delve.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let config = DelveConfig::load_or_default("/nonexistent/delve.toml").unwrap();
        assert_eq!(config.research.max_loops, 3);
    }

    #[test]
    fn test_missing_api_key_env() {
        let provider = ProviderConfig::OpenAI {
            api_key_env: "DELVE_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            api_base: default_openai_base(),
            model: default_openai_model(),
        };
        let result = provider.to_provider();
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "DELVE_TEST_KEY_THAT_IS_NOT_SET"));
    }

    #[test]
    fn test_round_trip_renders_toml() {
        let config = DelveConfig::default();
        let rendered = config.to_toml_string();
        assert!(rendered.contains("max_loops = 3"));
        let reparsed = DelveConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.research.max_loops, 3);
    }
}
