//! System git backend
//!
//! Shells out to the `git` binary. Every invocation goes through `git_cmd`, which
//! isolates the subprocess from the caller's environment and user config.

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using the system git binary
pub struct SystemGit {
  /// Directory git commands run in
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,

  /// `repo_path` relative to the working tree root (empty at the root)
  pub(crate) prefix: String,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel", "--show-prefix"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let work_tree = lines.next().unwrap_or_default().trim();
    let prefix = lines.next().unwrap_or_default().trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
      prefix: prefix.to_string(),
    })
  }

  /// Root of the working tree
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Location of the opened directory inside the working tree, `/`-terminated
  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Run a git command and return stdout, mapping failure to `GitError::CommandFailed`
  pub(crate) fn run(&self, args: &[&str]) -> ReleaseResult<String> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(command_failed(args, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }

  /// Run a git command and hand back the raw output (caller interprets the status)
  pub(crate) fn output(&self, args: &[&str]) -> ReleaseResult<Output> {
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.first().copied().unwrap_or_default()))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("tag.gpgSign=false");
    cmd.arg("-c").arg("commit.gpgSign=false");

    cmd
  }
}

pub(crate) fn command_failed(args: &[&str], output: &Output) -> ReleaseError {
  ReleaseError::Git(GitError::CommandFailed {
    command: format!("git {}", args.join(" ")),
    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
  })
}
