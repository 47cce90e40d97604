//! Integration tests for `release-reactor release`

use crate::helpers::{FAILING_BUILD, TestProject, git, run_reactor, run_reactor_raw, stderr, stdout};
use anyhow::Result;

#[test]
fn test_first_release_tags_every_module() -> Result<()> {
  let project = TestProject::new()?;
  let commits = project.commit_count()?;

  let output = run_reactor(&project.path, &["release"])?;
  let stdout = stdout(&output);
  assert!(stdout.contains("Released 3 module(s)"), "stdout: {}", stdout);

  assert_eq!(project.tags()?, vec!["aggregator-1.0", "app-3.0", "core-2.0"]);

  // Stamped manifests are restored
  assert!(project.read_file("core/module.toml")?.contains("version = \"2.0-SNAPSHOT\""));
  assert!(project.read_file("app/module.toml")?.contains("version = \"3.0-SNAPSHOT\""));
  assert!(project.status()?.is_empty(), "tree: {:?}", project.status()?);

  // The record is committed on top of the tagged commit
  assert_eq!(project.commit_count()?, commits + 1);
  assert!(project.last_commit_subject()?.starts_with("Release "));
  let record: serde_json::Value = serde_json::from_str(&project.read_file(".release-info.json")?)?;
  let modules = record["modules"].as_array().expect("modules array");
  assert_eq!(modules.len(), 3);
  assert!(modules.iter().all(|m| m["release_count"] == 1));
  Ok(())
}

#[test]
fn test_second_release_without_changes_is_a_no_op() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;
  let commits = project.commit_count()?;

  let output = run_reactor(&project.path, &["release"])?;
  assert!(stdout(&output).contains("Nothing to release"));
  assert_eq!(project.tags()?.len(), 3);
  assert_eq!(project.commit_count()?, commits);
  Ok(())
}

#[test]
fn test_incremental_release() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;

  project.write_file("core/src/core.txt", "core sources, improved\n")?;
  project.commit("Improve core")?;
  run_reactor(&project.path, &["release"])?;

  assert_eq!(
    project.tags()?,
    vec!["aggregator-1.0", "app-3.0", "app-3.1", "core-2.0", "core-2.1"]
  );
  let record: serde_json::Value = serde_json::from_str(&project.read_file(".release-info.json")?)?;
  let core = record["modules"]
    .as_array()
    .expect("modules array")
    .iter()
    .find(|m| m["artifact"] == "core")
    .expect("core recorded");
  assert_eq!(core["version"], "2.1");
  assert_eq!(core["tag"], "core-2.1");
  assert_eq!(core["release_count"], 2);
  Ok(())
}

#[test]
fn test_build_failure_leaves_no_tags() -> Result<()> {
  let project = TestProject::with_build(FAILING_BUILD)?;
  let commits = project.commit_count()?;

  let output = run_reactor_raw(&project.path, &["release"])?;
  assert_eq!(output.status.code(), Some(4));

  let stderr = stderr(&output);
  assert!(stderr.contains("Going to revert changes because there was an error"), "stderr: {}", stderr);
  assert!(stderr.contains("no-such-subcommand"));

  assert!(project.tags()?.is_empty());
  assert!(project.status()?.is_empty(), "manifests must be reverted: {:?}", project.status()?);
  assert!(!project.file_exists(".release-info.json"));
  assert_eq!(project.commit_count()?, commits);
  Ok(())
}

#[test]
fn test_local_tag_collision_aborts_before_build() -> Result<()> {
  let project = TestProject::new()?;
  git(&project.path, &["tag", "core-2.0"])?;

  let output = run_reactor_raw(&project.path, &["release"])?;
  assert_eq!(output.status.code(), Some(3));
  let stderr = stderr(&output);
  assert!(stderr.contains("tag core-2.0 already exists (local)"), "stderr: {}", stderr);

  // All or nothing: only the pre-existing tag is there
  assert_eq!(project.tags()?, vec!["core-2.0"]);
  assert!(project.status()?.is_empty());
  Ok(())
}

#[test]
fn test_tags_are_pushed_to_remote() -> Result<()> {
  let mut project = TestProject::new()?;
  project.add_origin()?;

  let output = run_reactor(&project.path, &["release"])?;
  assert!(stdout(&output).contains("Pushed 3 tag(s) to origin"));
  assert_eq!(project.remote_tags()?, vec!["aggregator-1.0", "app-3.0", "core-2.0"]);
  Ok(())
}

#[test]
fn test_no_push_keeps_tags_local() -> Result<()> {
  let mut project = TestProject::new()?;
  project.add_origin()?;

  run_reactor(&project.path, &["release", "--no-push"])?;
  assert_eq!(project.tags()?.len(), 3);
  assert!(project.remote_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_remote_tag_collision() -> Result<()> {
  let mut project = TestProject::new()?;
  project.add_origin()?;

  git(&project.path, &["tag", "app-3.0"])?;
  git(&project.path, &["push", "origin", "refs/tags/app-3.0"])?;
  git(&project.path, &["tag", "-d", "app-3.0"])?;

  let output = run_reactor_raw(&project.path, &["next"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("tag app-3.0 already exists (remote)"));
  assert!(project.tags()?.is_empty());
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_build_receives_module_list() -> Result<()> {
  let project = TestProject::with_build(&["sh", "-c", "echo $RELEASE_MODULES > built.txt"])?;

  run_reactor(&project.path, &["release"])?;
  let built = project.read_file("built.txt")?;
  assert_eq!(built.trim(), ".,core,app");
  Ok(())
}
