//! In-memory repository for unit tests

use super::{Repository, WorkingTreeStatus};
use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Scriptable `Repository`: changed files, tags and dirty paths are set up by
/// the test, and every mutation is recorded for assertions.
#[derive(Default)]
pub struct FakeRepository {
  /// Files changed since any baseline
  pub changed_files: Vec<PathBuf>,
  /// Refs that no longer resolve
  pub missing_refs: HashSet<String>,
  pub remote: BTreeSet<String>,
  pub dirty: Vec<String>,
  /// Fail every change query (simulated repository outage)
  pub fail_queries: bool,
  /// Fail when creating this tag
  pub fail_tag: Option<String>,

  pub tags: Mutex<BTreeSet<String>>,
  pub queried: Mutex<Vec<PathBuf>>,
  pub pushed: Mutex<Vec<Vec<String>>>,
  pub reverted: Mutex<Vec<PathBuf>>,
  pub committed: Mutex<Vec<PathBuf>>,
}

impl FakeRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_changes(mut self, files: &[&str]) -> Self {
    self.changed_files.extend(files.iter().map(PathBuf::from));
    self
  }

  pub fn with_tags(self, tags: &[&str]) -> Self {
    if let Ok(mut existing) = self.tags.lock() {
      existing.extend(tags.iter().map(|t| t.to_string()));
    }
    self
  }

  pub fn with_remote_tags(mut self, tags: &[&str]) -> Self {
    self.remote.extend(tags.iter().map(|t| t.to_string()));
    self
  }

  pub fn with_dirty(mut self, paths: &[&str]) -> Self {
    self.dirty.extend(paths.iter().map(|p| p.to_string()));
    self
  }

  pub fn tag_names(&self) -> Vec<String> {
    self.tags.lock().unwrap().iter().cloned().collect()
  }

  pub fn query_count(&self) -> usize {
    self.queried.lock().unwrap().len()
  }
}

impl Repository for FakeRepository {
  fn has_changed_since(&self, path: &Path, excluded: &[PathBuf], _baseline: Option<&str>) -> ReleaseResult<bool> {
    self.queried.lock().unwrap().push(path.to_path_buf());
    if self.fail_queries {
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: "git rev-list".to_string(),
        stderr: "fatal: simulated failure".to_string(),
      }));
    }
    Ok(
      self
        .changed_files
        .iter()
        .any(|file| file.starts_with(path) && !excluded.iter().any(|ex| file.starts_with(ex))),
    )
  }

  fn resolves(&self, reference: &str) -> ReleaseResult<bool> {
    Ok(!self.missing_refs.contains(reference))
  }

  fn tag_exists(&self, tag: &str) -> ReleaseResult<bool> {
    Ok(self.tags.lock().unwrap().contains(tag))
  }

  fn remote_tags(&self, _remote: &str) -> ReleaseResult<BTreeSet<String>> {
    Ok(self.remote.clone())
  }

  fn create_tag(&self, tag: &str, _message: &str) -> ReleaseResult<()> {
    if self.fail_tag.as_deref() == Some(tag) {
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git tag -a {}", tag),
        stderr: "fatal: simulated failure".to_string(),
      }));
    }
    self.tags.lock().unwrap().insert(tag.to_string());
    Ok(())
  }

  fn delete_tag(&self, tag: &str) -> ReleaseResult<()> {
    self.tags.lock().unwrap().remove(tag);
    Ok(())
  }

  fn push_tags(&self, _remote: &str, tags: &[String]) -> ReleaseResult<()> {
    self.pushed.lock().unwrap().push(tags.to_vec());
    Ok(())
  }

  fn working_tree_status(&self) -> ReleaseResult<WorkingTreeStatus> {
    Ok(WorkingTreeStatus {
      dirty: self.dirty.clone(),
    })
  }

  fn head_ref(&self) -> ReleaseResult<String> {
    Ok("0000000000000000000000000000000000000000".to_string())
  }

  fn revert_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    self.reverted.lock().unwrap().extend(paths.iter().cloned());
    Ok(())
  }

  fn commit_paths(&self, paths: &[PathBuf], _message: &str) -> ReleaseResult<()> {
    self.committed.lock().unwrap().extend(paths.iter().cloned());
    Ok(())
  }
}
