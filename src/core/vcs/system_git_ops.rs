//! `Repository` implementation for SystemGit (change queries, tags, working tree)

use super::system_git::{SystemGit, command_failed};
use super::{Repository, WorkingTreeStatus};
use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::utils::path_to_git_format;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl Repository for SystemGit {
  /// Uses `git rev-list --max-count=1 <baseline>..HEAD -- <path> :(exclude)<nested>...`
  fn has_changed_since(&self, path: &Path, excluded: &[PathBuf], baseline: Option<&str>) -> ReleaseResult<bool> {
    let range = match baseline {
      Some(reference) => format!("{}..HEAD", reference),
      None => "HEAD".to_string(),
    };

    let mut args = vec![
      "rev-list".to_string(),
      "--max-count=1".to_string(),
      range,
      "--".to_string(),
      pathspec(path),
    ];
    args.extend(
      excluded
        .iter()
        .map(|p| format!(":(exclude){}", path_to_git_format(p))),
    );

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let stdout = self.run(&args)?;
    Ok(stdout.lines().any(|line| !line.trim().is_empty()))
  }

  fn resolves(&self, reference: &str) -> ReleaseResult<bool> {
    let spec = format!("{}^{{commit}}", reference);
    let output = self.output(&["rev-parse", "--verify", "--quiet", &spec])?;
    Ok(output.status.success())
  }

  fn tag_exists(&self, tag: &str) -> ReleaseResult<bool> {
    let spec = format!("refs/tags/{}", tag);
    let output = self.output(&["rev-parse", "--verify", "--quiet", &spec])?;
    Ok(output.status.success())
  }

  fn remote_tags(&self, remote: &str) -> ReleaseResult<BTreeSet<String>> {
    let stdout = self.run(&["ls-remote", "--tags", remote])?;
    Ok(parse_ls_remote_tags(&stdout))
  }

  fn create_tag(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message])?;
    Ok(())
  }

  fn delete_tag(&self, tag: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-d", tag])?;
    Ok(())
  }

  fn push_tags(&self, remote: &str, tags: &[String]) -> ReleaseResult<()> {
    if tags.is_empty() {
      return Ok(());
    }

    let refs: Vec<String> = tags.iter().map(|t| format!("refs/tags/{}", t)).collect();
    let mut args = vec!["push", remote];
    args.extend(refs.iter().map(String::as_str));

    let output = self.output(&args)?;
    if !output.status.success() {
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }
    Ok(())
  }

  fn working_tree_status(&self) -> ReleaseResult<WorkingTreeStatus> {
    // Porcelain paths are relative to the working tree root whatever the cwd
    let stdout = self.run(&["status", "--porcelain", "--untracked-files=all", "--", "."])?;
    Ok(parse_porcelain_status(&stdout, &self.prefix))
  }

  fn head_ref(&self) -> ReleaseResult<String> {
    Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
  }

  fn revert_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    if paths.is_empty() {
      return Ok(());
    }
    let specs: Vec<String> = paths.iter().map(|p| path_to_git_format(p)).collect();
    let mut args = vec!["checkout", "--"];
    args.extend(specs.iter().map(String::as_str));
    self.run(&args)?;
    Ok(())
  }

  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> ReleaseResult<()> {
    if paths.is_empty() {
      return Ok(());
    }
    let specs: Vec<String> = paths.iter().map(|p| path_to_git_format(p)).collect();

    let mut add = vec!["add", "--"];
    add.extend(specs.iter().map(String::as_str));
    self.run(&add)?;

    let mut commit = vec!["commit", "-m", message, "--"];
    commit.extend(specs.iter().map(String::as_str));
    let output = self.output(&commit)?;
    if !output.status.success() {
      return Err(command_failed(&commit, &output));
    }
    Ok(())
  }
}

/// The project root is an empty relative path; git wants "."
fn pathspec(path: &Path) -> String {
  if path.as_os_str().is_empty() {
    ".".to_string()
  } else {
    path_to_git_format(path)
  }
}

/// `<sha>\trefs/tags/<name>` lines; peeled `^{}` entries fold into their tag
fn parse_ls_remote_tags(stdout: &str) -> BTreeSet<String> {
  stdout
    .lines()
    .filter_map(|line| line.split_once('\t'))
    .filter_map(|(_, reference)| reference.strip_prefix("refs/tags/"))
    .map(|name| name.trim_end_matches("^{}").to_string())
    .collect()
}

/// Porcelain v1: `XY <path>` or `XY <old> -> <new>` for renames.
///
/// Paths are returned relative to `prefix` (the project directory inside the
/// working tree); entries outside it are dropped.
fn parse_porcelain_status(stdout: &str, prefix: &str) -> WorkingTreeStatus {
  let dirty = stdout
    .lines()
    .filter(|line| line.len() > 3)
    .filter_map(|line| {
      let entry = &line[3..];
      let path = entry.rsplit_once(" -> ").map(|(_, new)| new).unwrap_or(entry);
      path.trim_matches('"').strip_prefix(prefix).map(str::to_string)
    })
    .collect();
  WorkingTreeStatus { dirty }
}
