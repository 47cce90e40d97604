//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Build command that always succeeds and touches nothing
pub const PASSING_BUILD: &[&str] = &["git", "--version"];

/// Build command that always fails
pub const FAILING_BUILD: &[&str] = &["git", "no-such-subcommand"];

/// A module tree in a throwaway git repository
///
/// ```text
/// module.toml        aggregator 1.0-SNAPSHOT (modules: core, app)
/// core/module.toml   core 2.0-SNAPSHOT (parent: aggregator)
/// app/module.toml    app 3.0-SNAPSHOT (parent: aggregator, depends on core)
/// ```
pub struct TestProject {
  _root: TempDir,
  _origin: Option<TempDir>,
  pub path: PathBuf,
}

impl TestProject {
  /// Empty repository with a committer identity
  pub fn empty() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    Ok(Self {
      _root: root,
      _origin: None,
      path,
    })
  }

  /// Three-module project with a passing build, committed
  pub fn new() -> Result<Self> {
    Self::with_build(PASSING_BUILD)
  }

  /// Three-module project with the given build command, committed
  pub fn with_build(command: &[&str]) -> Result<Self> {
    let project = Self::empty()?;
    project.write_modules(APP_DEPENDENCIES)?;
    project.write_config(command, None)?;
    project.commit("Initial project")?;
    Ok(project)
  }

  /// Write the three manifests; `app_dependencies` is appended to app/module.toml
  pub fn write_modules(&self, app_dependencies: &str) -> Result<()> {
    self.write_file(
      "module.toml",
      r#"[module]
group = "com.example"
artifact = "aggregator"
version = "1.0-SNAPSHOT"
modules = ["core", "app"]
"#,
    )?;
    self.write_file(
      "core/module.toml",
      r#"[module]
artifact = "core"
version = "2.0-SNAPSHOT"

[parent]
group = "com.example"
artifact = "aggregator"
version = "1.0-SNAPSHOT"
path = ".."
"#,
    )?;
    self.write_file(
      "app/module.toml",
      &format!(
        r#"[module]
artifact = "app"
version = "3.0-SNAPSHOT"

[parent]
group = "com.example"
artifact = "aggregator"
version = "1.0-SNAPSHOT"
path = ".."
{}"#,
        app_dependencies
      ),
    )?;
    self.write_file("core/src/core.txt", "core sources\n")?;
    self.write_file("app/src/app.txt", "app sources\n")?;
    Ok(())
  }

  /// Write release.toml
  pub fn write_config(&self, command: &[&str], remote: Option<&str>) -> Result<()> {
    let argv: Vec<String> = command.iter().map(|arg| format!("\"{}\"", arg)).collect();
    let mut config = format!("[build]\ncommand = [{}]\n", argv.join(", "));
    if let Some(remote) = remote {
      config.push_str(&format!("\n[vcs]\nremote = \"{}\"\n", remote));
    }
    self.write_file("release.toml", &config)
  }

  /// Attach a bare repository as `origin` and configure it as the release remote
  pub fn add_origin(&mut self) -> Result<()> {
    let origin = TempDir::new()?;
    git(origin.path(), &["init", "--bare"])?;
    let url = origin.path().to_string_lossy().to_string();
    git(&self.path, &["remote", "add", "origin", &url])?;
    self._origin = Some(origin);

    self.write_config(PASSING_BUILD, Some("origin"))?;
    self.commit("Release to origin")?;
    Ok(())
  }

  /// Write a file, creating parent directories
  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Read a file
  pub fn read_file(&self, rel: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(rel))?)
  }

  /// Check if a file exists
  pub fn file_exists(&self, rel: &str) -> bool {
    self.path.join(rel).exists()
  }

  /// Commit everything
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    Ok(())
  }

  /// Local tags, sorted
  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(lines(&output))
  }

  /// Tags on `origin`, sorted
  pub fn remote_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["ls-remote", "--tags", "origin"])?;
    let mut tags: Vec<String> = lines(&output)
      .iter()
      .filter_map(|line| line.split_once("refs/tags/"))
      .map(|(_, name)| name.trim_end_matches("^{}").to_string())
      .collect();
    tags.sort();
    tags.dedup();
    Ok(tags)
  }

  /// `git status --porcelain` lines
  pub fn status(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["status", "--porcelain", "--untracked-files=all"])?;
    Ok(lines(&output))
  }

  /// Subject of the last commit
  pub fn last_commit_subject(&self) -> Result<String> {
    let output = git(&self.path, &["log", "-1", "--format=%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Number of commits on HEAD
  pub fn commit_count(&self) -> Result<usize> {
    let output = git(&self.path, &["rev-list", "--count", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }
}

/// The default app dependency on core
pub const APP_DEPENDENCIES: &str = r#"
[[dependencies]]
artifact = "core"
version = "2.0-SNAPSHOT"
path = "../core"
"#;

fn lines(output: &Output) -> Vec<String> {
  let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(String::from)
    .collect();
  lines.sort();
  lines
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run release-reactor and return its output whatever the exit status
pub fn run_reactor_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-reactor");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run release-reactor")
}

/// Run release-reactor, failing if it exits non-zero
pub fn run_reactor(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_reactor_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "release-reactor failed: release-reactor {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
