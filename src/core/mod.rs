// This file is the module declaration file for the `core` module.
// It declares the submodules that make up the engine of git-preflight and
// exposes them to the rest of the crate.

// `changes` module:
// Turns the answers of the git change-source queries into one deduplicated,
// sorted list of changed files, and derives the changed directories from it.
pub mod changes;

// `config` module:
// This module is responsible for the `.git-preflight` file. It defines the
// trigger data structures (`PreflightConfig`, `TriggerConfig`), decodes the
// file and hands it to the validator, and provides the `ConfigManager` that
// locates the file at the repository root.
pub mod config;

// `engine` module:
// The `TriggerEngine` selects the requested triggers, matches the changed
// files against each of them and runs their commands in declaration order.
pub mod engine;

// `error` module:
// The error kinds shared by every other module.
pub mod error;

// `git` module:
// The `GitClient` trait is the only place the engine talks to git. The
// `Git2Client` implementation answers the queries with libgit2.
pub mod git;
