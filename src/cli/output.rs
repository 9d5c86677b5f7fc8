//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the delve CLI.

use crate::types::{ResearchReport, TerminationReason};
use owo_colors::OwoColorize;
use std::path::Path;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the delve banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                "delve".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   delve v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// One line per subtopic: iterations, evidence and why it stopped.
    pub fn outcome(&self, subtopic: &str, iterations: u32, evidence: usize, reason: TerminationReason) {
        let stats = format!(
            "{} iteration{}, {} source{}",
            iterations,
            if iterations == 1 { "" } else { "s" },
            evidence,
            if evidence == 1 { "" } else { "s" }
        );

        if self.colored {
            let reason = match reason {
                TerminationReason::Sufficient => reason.to_string().green().to_string(),
                TerminationReason::MaxIterations => reason.to_string().yellow().to_string(),
                TerminationReason::NoQueriesProduced => reason.to_string().red().to_string(),
            };
            println!(
                "    {} {} {} [{}]",
                "•".blue(),
                subtopic.bright_white(),
                format!("({})", stats).dimmed(),
                reason
            );
        } else {
            println!("    - {} ({}) [{}]", subtopic, stats, reason);
        }
    }

    /// Summary printed after `delve run`
    pub fn report_summary(&self, report: &ResearchReport, location: &Path) {
        self.header("Subtopics");
        for outcome in &report.outcomes {
            self.outcome(
                &outcome.subtopic,
                outcome.iterations,
                outcome.evidence_count,
                outcome.termination_reason,
            );
        }

        self.header("Report");
        self.kv("Query", &report.query);
        self.kv("Unique sources", &report.sources.len().to_string());
        self.kv("Evidence items", &report.evidence_count().to_string());
        self.kv("Saved to", &location.display().to_string());
        println!();

        if report.sources.is_empty() {
            self.warning("No relevant sources were accepted; the report only holds placeholders");
        } else {
            self.success("Research complete");
        }
    }
}
