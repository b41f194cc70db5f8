use git2::{BranchType, Diff, ErrorCode, Oid, Repository, Tree};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::{PreflightError, Result};

/// Remote refs tried, in order, when the current branch has no upstream.
const FALLBACK_BASE_REFS: [&str; 3] = [
    "refs/remotes/origin/HEAD",
    "refs/remotes/origin/main",
    "refs/remotes/origin/master",
];

/// Trait defining the Git queries required by the engine.
/// This abstraction allows for easier testing and decoupling from specific git implementations.
///
/// Every query returns repository-relative paths with `/` separators. Order
/// and duplicates are not significant to callers.
pub trait GitClient {
    /// Returns the root of the working directory.
    fn repo_root(&self) -> PathBuf;

    /// Files changed by one specific commit.
    fn commit_changes(&self, commit_hash: &str) -> Result<Vec<String>>;

    /// Hash of the commit used as the default comparison baseline.
    fn merge_base(&self) -> Result<String>;

    /// Files changed between `base` and `HEAD`.
    fn diff_changes(&self, base: &str) -> Result<Vec<String>>;

    /// Tracked files modified in the working tree but not staged.
    fn unstaged_changes(&self) -> Result<Vec<String>>;

    /// Files staged in the index relative to `HEAD`.
    fn staged_changes(&self) -> Result<Vec<String>>;
}

/// Concrete implementation of GitClient using the git2 crate.
pub struct Git2Client {
    repo: Repository,
}

impl Git2Client {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).map_err(|e| PreflightError::change_source("open", e))?;
        Ok(Self { repo })
    }

    /// Finds the repository containing `path`, walking up parent directories.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo =
            Repository::discover(path).map_err(|e| PreflightError::change_source("discover", e))?;
        Ok(Self { repo })
    }

    /// Hook scripts directory. Linked worktrees share the one of the main
    /// repository, and submodules keep theirs under the superproject's
    /// `.git/modules`.
    pub fn hooks_dir(&self) -> PathBuf {
        self.repo.commondir().join("hooks")
    }

    /// Tree of `HEAD`, or `None` before the first commit.
    fn head_tree(&self) -> std::result::Result<Option<Tree<'_>>, git2::Error> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn upstream_oid(&self) -> Option<Oid> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        let branch = self
            .repo
            .find_branch(head.shorthand()?, BranchType::Local)
            .ok()?;
        branch.upstream().ok()?.get().target()
    }

    fn fallback_base_oid(&self) -> Option<Oid> {
        FALLBACK_BASE_REFS.iter().find_map(|name| {
            let reference = self.repo.find_reference(name).ok()?;
            reference.resolve().ok()?.target()
        })
    }
}

impl GitClient for Git2Client {
    fn repo_root(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    fn commit_changes(&self, commit_hash: &str) -> Result<Vec<String>> {
        let op = "commit changes";
        let err = |e: git2::Error| PreflightError::change_source(op, e);

        let commit = self
            .repo
            .revparse_single(commit_hash)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(err)?;
        let tree = commit.tree().map_err(err)?;
        // A root commit is compared against the empty tree.
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0).and_then(|p| p.tree()).map_err(err)?)
        } else {
            None
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(err)?;
        Ok(diff_paths(&diff))
    }

    fn merge_base(&self) -> Result<String> {
        let op = "merge-base";
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| PreflightError::change_source(op, e))?
            .id();

        let Some(base) = self.upstream_oid().or_else(|| self.fallback_base_oid()) else {
            debug!("no upstream or origin branch; using HEAD as merge-base");
            return Ok(head.to_string());
        };

        let merge_base = self
            .repo
            .merge_base(head, base)
            .map_err(|e| PreflightError::change_source(op, e))?;
        Ok(merge_base.to_string())
    }

    fn diff_changes(&self, base: &str) -> Result<Vec<String>> {
        let op = "diff changes";
        let err = |e: git2::Error| PreflightError::change_source(op, e);

        let base_tree = self
            .repo
            .revparse_single(base)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(err)?;
        let head_tree = self.head_tree().map_err(err)?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), head_tree.as_ref(), None)
            .map_err(err)?;
        Ok(diff_paths(&diff))
    }

    fn unstaged_changes(&self) -> Result<Vec<String>> {
        let diff = self
            .repo
            .diff_index_to_workdir(None, None)
            .map_err(|e| PreflightError::change_source("unstaged changes", e))?;
        Ok(diff_paths(&diff))
    }

    fn staged_changes(&self) -> Result<Vec<String>> {
        let op = "staged changes";
        let err = |e: git2::Error| PreflightError::change_source(op, e);

        let head_tree = self.head_tree().map_err(err)?;
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .map_err(err)?;
        Ok(diff_paths(&diff))
    }
}

/// Paths touched by a diff. Deleted files only have an old-side path.
fn diff_paths(diff: &Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect()
}
