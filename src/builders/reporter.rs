use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::core::config::PreflightConfig;

/// Receives the user-facing events of a trigger run.
pub trait RunReporter {
    /// A trigger matched `files` and is about to run (verbose mode only).
    fn trigger_started(&self, trigger: &str, files: &[String]);

    /// A trigger would have run `argv` but dry-run mode is on.
    fn dry_run(&self, trigger: &str, argv: &[String]);
}

/// Output formats accepted by `list --format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Trigger names, one per line.
    Text,
    Json,
    Yaml,
    Toml,
}

/// A concrete implementation of `RunReporter` that writes to stderr, leaving
/// stdout to the triggered commands.
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Constructs a new `ConsoleReporter` instance.
    pub fn new() -> Self {
        Self
    }

    /// Prints the configuration in the requested format to stdout.
    pub fn print_config(&self, config: &PreflightConfig, format: ExportFormat) -> Result<()> {
        println!("{}", render_config(config, format)?.trim_end());
        Ok(())
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReporter for ConsoleReporter {
    fn trigger_started(&self, trigger: &str, files: &[String]) {
        eprintln!("{}", format_trigger_started(trigger, files));
    }

    fn dry_run(&self, trigger: &str, argv: &[String]) {
        eprintln!("{}", format_dry_run(trigger, argv));
    }
}

pub fn format_trigger_started(trigger: &str, files: &[String]) -> String {
    format!("run trigger {trigger}: {}", files.join(", "))
}

/// The line printed for a trigger in dry-run mode. Every argument is quoted
/// so the command can be pasted into a shell.
pub fn format_dry_run(trigger: &str, argv: &[String]) -> String {
    format!("would run trigger {trigger}: {}", shell_words::join(argv))
}

/// Configured trigger names in sorted order.
pub fn trigger_names(config: &PreflightConfig) -> Vec<String> {
    let mut names: Vec<String> = config.triggers.iter().map(|t| t.name.clone()).collect();
    names.sort();
    names
}

pub fn render_config(config: &PreflightConfig, format: ExportFormat) -> Result<String> {
    let content = match format {
        ExportFormat::Text => trigger_names(config).join("\n"),
        ExportFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?
        }
        ExportFormat::Yaml => serde_yaml::to_string(config).context("Failed to serialize to YAML")?,
        ExportFormat::Toml => {
            toml::to_string_pretty(config).context("Failed to serialize to TOML")?
        }
    };
    Ok(content)
}
