//! Init command implementation
//!
//! Writes a starter `delve.toml` for the chosen provider.

use super::output::Output;
use std::fs;
use std::path::PathBuf;

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// The configuration file was written
    Success(PathBuf),
    /// delve.toml already exists and `--force` was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite an existing file
    pub force: bool,
    /// LLM provider to configure (openai or ollama)
    pub provider: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing delve");

    let template = match template(&config.provider) {
        Some(template) => template,
        None => {
            let message = format!(
                "Unknown provider '{}' (expected openai or ollama)",
                config.provider
            );
            output.error(&message);
            return InitResult::Error(message);
        }
    };

    let config_path = config.path.join("delve.toml");
    if config_path.exists() && !config.force {
        output.warning("delve.toml already exists!");
        output.hint("Use --force to overwrite it");
        return InitResult::AlreadyExists;
    }

    if let Err(e) = fs::create_dir_all(&config.path) {
        output.error(&format!("Failed to create {}: {}", config.path.display(), e));
        return InitResult::Error(e.to_string());
    }

    if let Err(e) = fs::write(&config_path, template) {
        output.error(&format!("Failed to write delve.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", &config_path.display().to_string());

    output.hint("Next steps");
    if config.provider == "openai" {
        output.command("export OPENAI_API_KEY=sk-...");
    } else {
        output.command("ollama pull llama3.1");
    }
    output.command("delve run \"your research question\"");

    InitResult::Success(config_path)
}

fn template(provider: &str) -> Option<String> {
    let provider_section = match provider {
        "openai" => {
            r#"[provider]
type = "openai"
# Name of the environment variable holding the API key (.env is loaded too)
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
"#
        }
        "ollama" => {
            r#"[provider]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.1"
"#
        }
        _ => return None,
    };

    Some(format!(
        r#"# delve configuration

{provider_section}
[research]
# Iterations per subtopic before giving up on closing the knowledge gaps
max_loops = 3
search_results_per_query = 5
pages_per_query = 3
queries_per_iteration = 2
# Pages scoring at or below this are discarded
relevance_threshold = 0.3
max_concurrent_fetches = 4
max_concurrent_subtopics = 1
search_delay_ms = 600
iteration_delay_ms = 1000
content_char_limit = 10000
evidence_excerpt_cap = 10
call_timeout_secs = 60

[search]
# Scrape a results page when the primary search errors
fallback_enabled = true
serp_url = "https://www.google.com/search"
request_timeout_secs = 10

[output]
directory = "."
write_json = false

[logging]
level = "info"
json = false
"#
    ))
}
