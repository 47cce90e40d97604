//! Repository facade
//!
//! The release core only talks to version control through [`Repository`].
//! `SystemGit` is the production backend; tests use the in-memory fake.

pub mod system_git;
mod system_git_ops;

#[cfg(test)]
pub mod fake;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Paths with uncommitted modifications (tracked or untracked)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
  pub dirty: Vec<String>,
}

/// Version-control queries and mutations needed by a release run.
///
/// Query methods must be safe to call concurrently; the resolver issues
/// change queries for all modules in parallel.
pub trait Repository: Send + Sync {
  /// Whether any file under `path` (minus `excluded`) changed after `baseline`.
  /// `None` means since the first commit.
  fn has_changed_since(&self, path: &Path, excluded: &[PathBuf], baseline: Option<&str>) -> ReleaseResult<bool>;

  /// Whether a ref (tag, branch or commit) resolves to a commit
  fn resolves(&self, reference: &str) -> ReleaseResult<bool>;

  /// Whether a tag exists in the local repository
  fn tag_exists(&self, tag: &str) -> ReleaseResult<bool>;

  /// All tag names published on a remote
  fn remote_tags(&self, remote: &str) -> ReleaseResult<BTreeSet<String>>;

  /// Create an annotated tag at HEAD
  fn create_tag(&self, tag: &str, message: &str) -> ReleaseResult<()>;

  fn delete_tag(&self, tag: &str) -> ReleaseResult<()>;

  /// Push tags to a remote in one operation
  fn push_tags(&self, remote: &str, tags: &[String]) -> ReleaseResult<()>;

  fn working_tree_status(&self) -> ReleaseResult<WorkingTreeStatus>;

  /// Commit id of HEAD
  fn head_ref(&self) -> ReleaseResult<String>;

  /// Restore paths to their committed content
  fn revert_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()>;

  /// Stage and commit exactly these paths
  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> ReleaseResult<()>;
}
