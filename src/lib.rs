//! Runs repository-declared commands on the files that changed.
//!
//! A `.git-preflight` file at the repository root lists triggers. Each
//! trigger names a command and the globs of the files it cares about.
//! `git-preflight run` collects the changed files, picks the triggers whose
//! globs match any of them and runs each trigger's command with the matched
//! files appended as arguments.

pub mod builders;
pub mod core;
pub mod utils;
