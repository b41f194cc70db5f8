use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::builders::patterns::{PatternMatcher, TriggerFilter};
use crate::builders::reporter::RunReporter;
use crate::builders::runner::CommandRunner;
use crate::core::config::{InputType, PreflightConfig, TriggerConfig};
use crate::core::error::{PreflightError, Result};

/// Options of a single `run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Triggers to run. Empty means every configured trigger.
    pub trigger_names: Vec<String>,
    /// Print the commands instead of executing them.
    pub dry_run: bool,
    pub verbose: bool,
}

/// What happened to the eligible triggers of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Triggers whose command was executed, successfully or not.
    pub executed: Vec<String>,
    /// Subset of `executed` whose command failed or could not be spawned.
    pub failed: Vec<String>,
    /// Triggers that would have run in dry-run mode.
    pub planned: Vec<String>,
    /// Eligible triggers that matched no changed file.
    pub skipped: Vec<String>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the configured triggers against a set of changed files.
///
/// Triggers are visited strictly in declaration order and one at a time. A
/// failing command is recorded and the remaining triggers still run.
pub struct TriggerEngine<'a> {
    config: &'a PreflightConfig,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn RunReporter,
    workdir: PathBuf,
}

impl<'a> TriggerEngine<'a> {
    pub fn new(
        config: &'a PreflightConfig,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn RunReporter,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            runner,
            reporter,
            workdir: workdir.into(),
        }
    }

    /// Resolves the requested names into the triggers to run, in declaration
    /// order regardless of the order they were requested in.
    ///
    /// Every requested name has to exist in the config.
    pub fn select_triggers(&self, names: &[String]) -> Result<Vec<&'a TriggerConfig>> {
        if names.is_empty() {
            return Ok(self.config.triggers.iter().collect());
        }

        let known: HashSet<&str> = self.config.triggers.iter().map(|t| t.name.as_str()).collect();
        if let Some(missing) = names.iter().find(|n| !known.contains(n.as_str())) {
            return Err(PreflightError::UnknownTrigger(missing.clone()));
        }

        let enabled: HashSet<&str> = names.iter().map(String::as_str).collect();
        Ok(self
            .config
            .triggers
            .iter()
            .filter(|t| enabled.contains(t.name.as_str()))
            .collect())
    }

    pub fn run(&self, changed_files: &[String], options: &RunOptions) -> Result<RunOutcome> {
        let triggers = self.select_triggers(&options.trigger_names)?;
        let mut outcome = RunOutcome::default();

        for trigger in triggers {
            let files = matching_files(trigger, changed_files)?;
            if files.is_empty() {
                debug!("trigger {} matched no changed files", trigger.name);
                outcome.skipped.push(trigger.name.clone());
                continue;
            }

            if options.verbose {
                self.reporter.trigger_started(&trigger.name, &files);
            }

            let argv = build_command(trigger, files)?;
            if options.dry_run {
                self.reporter.dry_run(&trigger.name, &argv);
                outcome.planned.push(trigger.name.clone());
                continue;
            }

            let succeeded = match self.runner.run(&argv, &self.workdir) {
                Ok(succeeded) => succeeded,
                Err(e) => {
                    warn!("trigger {}: {e}", trigger.name);
                    false
                }
            };
            outcome.executed.push(trigger.name.clone());
            if !succeeded {
                debug!("trigger {} failed", trigger.name);
                outcome.failed.push(trigger.name.clone());
            }
        }

        Ok(outcome)
    }
}

/// Changed files selected by `trigger`, sorted.
pub fn matching_files(trigger: &TriggerConfig, changed_files: &[String]) -> Result<Vec<String>> {
    let filter = TriggerFilter::new(trigger)?;
    let mut files: Vec<String> = changed_files
        .iter()
        .filter(|f| filter.matches_file(f))
        .cloned()
        .collect();
    files.sort();
    Ok(files)
}

/// The trigger's command followed by the matched files.
pub fn build_command(trigger: &TriggerConfig, files: Vec<String>) -> Result<Vec<String>> {
    match &trigger.input_type {
        InputType::Args => {
            let mut argv = Vec::with_capacity(trigger.cmd.len() + files.len());
            argv.extend(trigger.cmd.iter().cloned());
            argv.extend(files);
            Ok(argv)
        }
        InputType::Other(input_type) => Err(PreflightError::InvalidInputType {
            trigger: trigger.name.clone(),
            input_type: input_type.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Vec<String>>>,
        failing: Vec<String>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, argv: &[String], _cwd: &Path) -> Result<bool> {
            self.calls.borrow_mut().push(argv.to_vec());
            Ok(!self.failing.contains(&argv[0]))
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        lines: RefCell<Vec<String>>,
    }

    impl RunReporter for RecordingReporter {
        fn trigger_started(&self, trigger: &str, files: &[String]) {
            self.lines
                .borrow_mut()
                .push(crate::builders::reporter::format_trigger_started(trigger, files));
        }

        fn dry_run(&self, trigger: &str, argv: &[String]) {
            self.lines
                .borrow_mut()
                .push(crate::builders::reporter::format_dry_run(trigger, argv));
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn trigger(name: &str, cmd: &[&str], includes: &[&str]) -> TriggerConfig {
        TriggerConfig {
            name: name.to_string(),
            cmd: strings(cmd),
            input_type: InputType::Args,
            includes: strings(includes),
            excludes: vec![],
        }
    }

    fn config() -> PreflightConfig {
        PreflightConfig {
            triggers: vec![
                trigger("golint", &["golint"], &["*.go"]),
                trigger("mdfmt", &["mdfmt", "-w"], &["*.md"]),
                trigger("pylint", &["pylint"], &["*.py"]),
            ],
        }
    }

    #[test]
    fn test_runs_matching_triggers_in_declaration_order() {
        let config = config();
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let options = RunOptions {
            trigger_names: strings(&["mdfmt", "golint"]),
            ..RunOptions::default()
        };
        let outcome = engine
            .run(&strings(&["README.md", "a.go", "b.go", "x.py"]), &options)
            .unwrap();

        assert_eq!(
            *runner.calls.borrow(),
            vec![
                strings(&["golint", "a.go", "b.go"]),
                strings(&["mdfmt", "-w", "README.md"])
            ]
        );
        assert_eq!(outcome.executed, strings(&["golint", "mdfmt"]));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_unknown_trigger_runs_nothing() {
        let config = config();
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let options = RunOptions {
            trigger_names: strings(&["golint", "missing-trigger"]),
            ..RunOptions::default()
        };
        let err = engine.run(&strings(&["a.go"]), &options).unwrap_err();
        assert!(matches!(err, PreflightError::UnknownTrigger(name) if name == "missing-trigger"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_trigger_without_matches_is_skipped() {
        let config = config();
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let outcome = engine
            .run(&strings(&["x.py"]), &RunOptions::default())
            .unwrap();
        assert_eq!(*runner.calls.borrow(), vec![strings(&["pylint", "x.py"])]);
        assert_eq!(outcome.skipped, strings(&["golint", "mdfmt"]));
    }

    #[test]
    fn test_failure_does_not_stop_later_triggers() {
        let config = config();
        let runner = RecordingRunner {
            failing: strings(&["golint"]),
            ..RecordingRunner::default()
        };
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let outcome = engine
            .run(&strings(&["a.go", "b.md"]), &RunOptions::default())
            .unwrap();
        assert_eq!(runner.calls.borrow().len(), 2);
        assert_eq!(outcome.failed, strings(&["golint"]));
        assert_eq!(outcome.executed, strings(&["golint", "mdfmt"]));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_dry_run_spawns_nothing() {
        let config = config();
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let outcome = engine
            .run(&strings(&["a.go", "my notes.md"]), &options)
            .unwrap();

        assert!(runner.calls.borrow().is_empty());
        assert_eq!(
            *reporter.lines.borrow(),
            vec![
                "would run trigger golint: golint a.go".to_string(),
                "would run trigger mdfmt: mdfmt -w 'my notes.md'".to_string(),
            ]
        );
        assert_eq!(outcome.planned, strings(&["golint", "mdfmt"]));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_verbose_reports_matched_files() {
        let config = config();
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let options = RunOptions {
            verbose: true,
            ..RunOptions::default()
        };
        engine.run(&strings(&["b.go", "a.go"]), &options).unwrap();
        assert_eq!(
            *reporter.lines.borrow(),
            vec!["run trigger golint: a.go, b.go".to_string()]
        );
    }

    #[test]
    fn test_invalid_input_type_at_execution_is_fatal() {
        let mut tr = trigger("golint", &["golint"], &["*.go"]);
        tr.input_type = InputType::Other("stdin".to_string());
        let err = build_command(&tr, strings(&["a.go"])).unwrap_err();
        assert!(matches!(err, PreflightError::InvalidInputType { .. }));
    }

    #[test]
    fn test_glob_error_during_matching_is_fatal() {
        let config = PreflightConfig {
            triggers: vec![trigger("broken", &["x"], &["[oops"])],
        };
        let runner = RecordingRunner::default();
        let reporter = RecordingReporter::default();
        let engine = TriggerEngine::new(&config, &runner, &reporter, "/repo");

        let err = engine
            .run(&strings(&["a.go"]), &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, PreflightError::GlobSyntax { .. }));
    }
}
