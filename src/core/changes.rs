use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::core::error::Result;
use crate::core::git::GitClient;

/// The files changed in this run and the directories that hold them.
///
/// Both lists are deduplicated and sorted. They are computed once and only
/// read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

impl ChangeSet {
    /// Resolves the changed files through `git` and derives the changed
    /// directories from the working tree at `git.repo_root()`.
    pub fn resolve(git: &dyn GitClient, commit_hash: Option<&str>) -> Result<Self> {
        let files = resolve_changed_files(git, commit_hash)?;
        let dirs = changed_dirs(&git.repo_root(), &files);

        info!("changedFiles: {}", files.join(", "));
        info!("changedDirs: {}", dirs.join(", "));

        Ok(Self { files, dirs })
    }
}

/// Collects the changed files for a run.
///
/// With a commit hash, exactly the files of that commit. Otherwise the union
/// of the committed changes since the merge-base, the unstaged changes and
/// the staged changes. Any failing query aborts the whole resolution.
pub fn resolve_changed_files(git: &dyn GitClient, commit_hash: Option<&str>) -> Result<Vec<String>> {
    if let Some(hash) = commit_hash.filter(|h| !h.is_empty()) {
        debug!("using changes of commit {hash}");
        return Ok(merge_changed_files([git.commit_changes(hash)?]));
    }

    let merge_base = git.merge_base()?;
    debug!("merge-base: {merge_base}");
    let committed = git.diff_changes(&merge_base)?;
    let unstaged = git.unstaged_changes()?;
    let staged = git.staged_changes()?;

    Ok(merge_changed_files([committed, unstaged, staged]))
}

/// Unions path lists into one deduplicated, lexicographically sorted list.
pub fn merge_changed_files<I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    sources
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parent directories of `files` that currently exist below `workdir`.
///
/// A top-level file contributes `.`. Directories removed from disk, for
/// example by a commit that deleted every file in them, are dropped.
pub fn changed_dirs(workdir: &Path, files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|f| parent_dir(f))
        .filter(|dir| workdir.join(dir).is_dir())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((dir, _)) => dir,
        None => ".",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_deduplicates_and_sorts() {
        let merged = merge_changed_files([
            paths(&["b.go", "a.go"]),
            paths(&["a.go", "docs/x.md"]),
            paths(&["b.go", "a.go", "Makefile"]),
        ]);
        assert_eq!(merged, paths(&["Makefile", "a.go", "b.go", "docs/x.md"]));
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert!(merge_changed_files(Vec::<Vec<String>>::new()).is_empty());
        assert!(merge_changed_files([vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("a.go"), ".");
        assert_eq!(parent_dir("src/a.go"), "src");
        assert_eq!(parent_dir("src/core/a.go"), "src/core");
    }

    #[test]
    fn test_changed_dirs_drops_missing_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/core")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();

        let files = paths(&[
            "README.md",
            "docs/a.md",
            "docs/b.md",
            "gone/deleted.go",
            "src/core/config.rs",
        ]);
        assert_eq!(
            changed_dirs(dir.path(), &files),
            paths(&[".", "docs", "src/core"])
        );
    }
}
