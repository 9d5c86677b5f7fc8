//! CLI module for delve
//!
//! Provides command-line interface parsing for the `delve` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// delve - iterative deep research from the command line
#[derive(Parser, Debug)]
#[command(
    name = "delve",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "delve - iterative deep research agent",
    long_about = "Decomposes a question into subtopics, searches the web with operator-augmented\n\
                  queries, scores every page it reads and keeps refining until the knowledge gaps\n\
                  close. The result is a cited markdown report.",
    after_help = "EXAMPLES:\n    \
                  delve init                                  # Write a starter delve.toml\n    \
                  delve run \"impact of RISC-V on embedded\"    # Research and save a report\n    \
                  delve run \"rust async runtimes\" -m 5 -o out # More iterations, custom output dir\n    \
                  delve config --validate                     # Check the configuration file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "delve.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a query and write the report to disk
    Run {
        /// The research question
        query: String,

        /// Iteration cap per subtopic
        #[arg(short = 'm', long)]
        max_loops: Option<u32>,

        /// Search results requested per query
        #[arg(short, long)]
        results: Option<usize>,

        /// Minimum relevance (exclusive) for a page to be kept
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Directory the report is written to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a starter delve.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing delve.toml
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (openai or ollama)
        #[arg(long, default_value = "openai")]
        provider: String,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
