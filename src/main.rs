//! git-preflight runs the checks a repository declares in `.git-preflight`
//! on the files that changed, so every developer gets the same pre-commit
//! and pre-push behaviour without installing anything per checkout.
//! "Changed" means everything since the merge-base with the upstream branch,
//! plus whatever is staged or modified in the working tree.
use anyhow::Result;
use clap::{Parser, Subcommand};
use git_preflight::builders::reporter::ExportFormat;
use git_preflight::core::engine::RunOptions;
use git_preflight::utils;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "git-preflight")]
#[command(about = "Run the checks declared in .git-preflight on changed files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run triggers
    Run {
        /// Only run these triggers (all of them when omitted)
        trigger_names: Vec<String>,
        /// Increase logging
        #[arg(short = 'v')]
        verbose: bool,
        /// Use a specific commit to generate a list of changed files
        #[arg(long)]
        commit_hash: Option<String>,
        /// Log the triggers that would execute
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate config files
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the configured triggers
    List {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
    },
    /// Install pre-commit and pre-push hooks that call `git-preflight run`
    InstallHooks,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Run { verbose: true, .. } = cli.command {
        utils::enable_verbose();
    }
    utils::init_logging();

    match cli.command {
        Commands::Run {
            trigger_names,
            verbose,
            commit_hash,
            dry_run,
        } => {
            let options = RunOptions {
                trigger_names,
                dry_run,
                verbose,
            };
            utils::run_preflight(options, commit_hash.as_deref())
        }
        Commands::Validate { files } => utils::validate_configs(&files).map(|_| ExitCode::SUCCESS),
        Commands::List { format } => utils::list_triggers(format).map(|_| ExitCode::SUCCESS),
        Commands::InstallHooks => utils::install_hooks().map(|_| ExitCode::SUCCESS),
    }
}
