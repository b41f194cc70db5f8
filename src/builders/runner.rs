use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::core::error::{PreflightError, Result};

/// Spawns trigger commands.
///
/// The engine only needs to know whether a command succeeded, so tests can
/// substitute a recorder for real processes.
pub trait CommandRunner {
    /// Runs `argv` in `cwd` and blocks until it exits.
    ///
    /// Returns `Ok(false)` when the command ran but did not succeed and an
    /// error when it could not be started at all.
    fn run(&self, argv: &[String], cwd: &Path) -> Result<bool>;
}

/// Runs commands as child processes that inherit stdio.
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> Result<bool> {
        let Some((program, args)) = argv.split_first() else {
            return Err(PreflightError::TriggerExecution {
                command: String::new(),
                message: "empty command".to_string(),
            });
        };

        debug!("executing {program} {args:?} in {}", cwd.display());
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .status()
            .map_err(|e| PreflightError::TriggerExecution {
                command: program.clone(),
                message: e.to_string(),
            })?;

        debug!("{program} exited with {status}");
        Ok(status.success())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exit_status() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new();
        assert!(runner.run(&argv(&["true"]), dir.path()).unwrap());
        assert!(!runner.run(&argv(&["false"]), dir.path()).unwrap());
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempdir().unwrap();
        let runner = ProcessRunner::new();
        assert!(runner.run(&argv(&["touch", "marker"]), dir.path()).unwrap());
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let err = ProcessRunner::new()
            .run(&argv(&["git-preflight-no-such-binary"]), dir.path())
            .unwrap_err();
        assert!(matches!(err, PreflightError::TriggerExecution { .. }));

        assert!(ProcessRunner::new().run(&[], dir.path()).is_err());
    }
}
