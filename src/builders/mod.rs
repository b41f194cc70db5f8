// This file is the module declaration file for the `builders` module.
// It declares and makes public all the sub-modules within the `src/builders`
// directory. These modules encapsulate the pieces the engine is built from.

// The `pub mod hooks;` declaration exposes the `hooks` module.
//
// `hooks` module:
// Installs the `pre-commit` and `pre-push` hook scripts in `.git/hooks`,
// both of which call `git-preflight run`.
pub mod hooks;

// The `pub mod patterns;` declaration exposes the `patterns` module.
//
// `patterns` module:
// Compiles a trigger's include/exclude globs into a `TriggerFilter` and
// decides, through the `PatternMatcher` trait, whether a changed file is
// selected. Patterns without a `/` are matched against the base name only.
pub mod patterns;

// The `pub mod reporter;` declaration exposes the `reporter` module.
//
// `reporter` module:
// Everything the user sees: the verbose `run trigger` lines, the dry-run
// command lines and the `list` output. Defines the `RunReporter` trait and
// its `ConsoleReporter` implementation.
pub mod reporter;

// The `pub mod runner;` declaration exposes the `runner` module.
//
// `runner` module:
// The `CommandRunner` trait spawns a trigger's command and reports whether
// it succeeded. `ProcessRunner` is the implementation backed by real
// child processes.
pub mod runner;

// The `pub mod validator;` declaration exposes the `validator` module.
//
// `validator` module:
// Checks a decoded configuration before anything runs: unique and
// well-formed trigger names, a known input type, syntactically valid
// patterns and a non-empty command.
pub mod validator;
