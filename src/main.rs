use anyhow::{bail, Context, Result};
use delve::cli::init::{self, InitConfig, InitResult};
use delve::cli::output::Output;
use delve::cli::{Cli, Commands};
use delve::research::ResearchOrchestrator;
use delve::utils::toml_config::{DelveConfig, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init {
            path,
            force,
            provider,
        } => match init::run(
            InitConfig {
                path,
                force,
                provider,
            },
            &output,
        ) {
            InitResult::Error(e) => bail!(e),
            InitResult::Success(_) | InitResult::AlreadyExists => Ok(()),
        },

        Commands::Config { validate } => show_config(&cli.config, validate, &output),

        Commands::Run {
            query,
            max_loops,
            results,
            threshold,
            output: directory,
        } => {
            let mut config = DelveConfig::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load {}", cli.config.display()))?;
            init_tracing(&config.logging, cli.verbose);

            apply_overrides(&mut config, max_loops, results, threshold, directory);
            config.validate().context("Invalid configuration")?;

            run_research(&config, &query, &output).await
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .init();
}

fn apply_overrides(
    config: &mut DelveConfig,
    max_loops: Option<u32>,
    results: Option<usize>,
    threshold: Option<f32>,
    directory: Option<PathBuf>,
) {
    if let Some(max_loops) = max_loops {
        config.research.max_loops = max_loops;
    }
    if let Some(results) = results {
        config.research.search_results_per_query = results;
    }
    if let Some(threshold) = threshold {
        config.research.relevance_threshold = threshold;
    }
    if let Some(directory) = directory {
        config.output.directory = directory;
    }
}

async fn run_research(config: &DelveConfig, query: &str, output: &Output) -> Result<()> {
    let provider = config
        .provider
        .to_provider()
        .context("Failed to resolve the LLM provider")?;

    output.banner();
    output.info(&format!(
        "Researching with {} ({})",
        provider.name(),
        provider.model()
    ));

    let llm = provider.create_client().await?;
    let orchestrator = ResearchOrchestrator::from_config(config, llm)?;

    match orchestrator.run(query).await {
        Ok(run) => {
            output.report_summary(&run.report, &run.location);
            Ok(())
        }
        Err(e) => {
            output.error(&e.to_string());
            Err(e.into())
        }
    }
}

fn show_config(path: &Path, validate: bool, output: &Output) -> Result<()> {
    if validate {
        match DelveConfig::load(path) {
            Ok(_) => {
                output.success(&format!("{} is valid", path.display()));
                Ok(())
            }
            Err(e) => {
                output.error(&e.to_string());
                bail!("configuration is invalid")
            }
        }
    } else {
        let config = DelveConfig::load_or_default(path)?;
        output.header(&format!("Effective configuration ({})", path.display()));
        println!("{}", config.to_toml_string());
        Ok(())
    }
}
