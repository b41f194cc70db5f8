use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::builders::hooks;
use crate::builders::reporter::{ConsoleReporter, ExportFormat};
use crate::builders::runner::ProcessRunner;
use crate::core::changes::ChangeSet;
use crate::core::config::{ConfigManager, ConfigProvider, PreflightConfig, load_config_file};
use crate::core::engine::{RunOptions, TriggerEngine};
use crate::core::git::{Git2Client, GitClient};

/// Set by `run -v`; read by the logger and inherited by trigger commands.
pub const VERBOSE_ENV: &str = "GIT_PREFLIGHT_VERBOSE";

/// Marks the process as verbose for the logger and for child processes.
pub fn enable_verbose() {
    // SAFETY: called from `main` before logging is set up and before any
    // other thread exists.
    unsafe { std::env::set_var(VERBOSE_ENV, "1") };
}

pub fn verbose_enabled() -> bool {
    std::env::var(VERBOSE_ENV).is_ok_and(|v| !v.is_empty() && v != "0")
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `info` when verbose and
/// `warn` when not.
pub fn init_logging() {
    let default_level = if verbose_enabled() { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},globset=warn")));

    // Fails only if a subscriber is already installed, as in tests.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Opens the repository containing the current directory. All subcommands
/// go through here so that submodules and linked worktrees resolve the same
/// way everywhere.
fn discover_repo() -> Result<Git2Client> {
    Git2Client::discover(".").context("Not in a Git repository")
}

fn load_repo_config(repo_root: PathBuf) -> Result<PreflightConfig> {
    let config_manager = ConfigManager::new_at(repo_root);
    info!("loading {}", config_manager.get_config_path().display());
    config_manager.load_config()
}

/// Runs the triggers of `.git-preflight` against the changed files of the
/// repository containing the current directory.
pub fn run_preflight(options: RunOptions, commit_hash: Option<&str>) -> Result<ExitCode> {
    let git = discover_repo()?;
    let workdir = git.repo_root();
    let config = load_repo_config(workdir.clone())?;

    let changes = ChangeSet::resolve(&git, commit_hash)?;

    let runner = ProcessRunner::new();
    let reporter = ConsoleReporter::new();
    let engine = TriggerEngine::new(&config, &runner, &reporter, workdir);
    let outcome = engine.run(&changes.files, &options)?;

    info!(
        "executed {} trigger(s), {} failed",
        outcome.executed.len(),
        outcome.failed.len()
    );
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Loads and validates each config file, stopping at the first invalid one.
pub fn validate_configs(files: &[PathBuf]) -> Result<()> {
    for file in files {
        info!("validating {}", file.display());
        load_config_file(file).context("validation error")?;
        println!("✓ {} is valid", file.display());
    }
    Ok(())
}

pub fn list_triggers(format: ExportFormat) -> Result<()> {
    let config = load_repo_config(discover_repo()?.repo_root())?;
    ConsoleReporter::new().print_config(&config, format)
}

pub fn install_hooks() -> Result<()> {
    hooks::install_git_hooks(&discover_repo()?.hooks_dir())?;
    println!("✓ Installed Git hooks for automatic processing");
    Ok(())
}
