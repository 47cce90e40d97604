//! Integration tests for `release-reactor next`

use crate::helpers::{TestProject, run_reactor, run_reactor_raw, stdout};
use anyhow::Result;

#[test]
fn test_first_release_plan() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_reactor(&project.path, &["next"])?;
  let stdout = stdout(&output);

  assert!(stdout.contains("Release plan"), "stdout: {}", stdout);
  assert!(stdout.contains("first release"));
  for tag in ["aggregator-1.0", "core-2.0", "app-3.0"] {
    assert!(stdout.contains(tag), "missing {} in: {}", tag, stdout);
  }

  // Planning never tags or touches the tree
  assert!(project.tags()?.is_empty());
  assert!(project.status()?.is_empty());
  Ok(())
}

#[test]
fn test_next_json_is_in_build_order() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_reactor(&project.path, &["next", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  let release = json["plan"]["release"].as_array().expect("release array");
  let order: Vec<&str> = release
    .iter()
    .map(|m| m["id"]["artifact"].as_str().unwrap_or_default())
    .collect();
  let position = |name: &str| order.iter().position(|a| *a == name).expect("module in plan");
  assert_eq!(order.len(), 3);
  assert!(position("aggregator") < position("core"));
  assert!(position("core") < position("app"));

  let tags: Vec<&str> = json["tags"]
    .as_array()
    .expect("tags array")
    .iter()
    .map(|t| t["name"].as_str().unwrap_or_default())
    .collect();
  assert!(tags.contains(&"core-2.0"));
  assert!(json["plan"]["id"].as_str().is_some_and(|id| id.len() == 64));
  Ok(())
}

#[test]
fn test_change_propagates_to_dependents() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;

  project.write_file("core/src/core.txt", "core sources, improved\n")?;
  project.commit("Improve core")?;

  let output = run_reactor(&project.path, &["next"])?;
  let stdout = stdout(&output);
  assert!(stdout.contains("core-2.1"), "stdout: {}", stdout);
  assert!(stdout.contains("app-3.1"), "app depends on core: {}", stdout);
  assert!(stdout.contains("depends on core"));
  assert!(!stdout.contains("aggregator-1.1"), "a child change does not release the aggregator");
  Ok(())
}

#[test]
fn test_bugfix_increments_patch() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;

  project.write_file("app/src/app.txt", "fixed\n")?;
  project.commit("Fix app")?;

  let output = run_reactor(&project.path, &["next", "--bugfix"])?;
  let stdout = stdout(&output);
  assert!(stdout.contains("app-3.0.1"), "stdout: {}", stdout);
  assert!(!stdout.contains("core-"), "core did not change: {}", stdout);
  Ok(())
}

#[test]
fn test_forced_parent_releases_children() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;

  let output = run_reactor(&project.path, &["next", "--force", "aggregator"])?;
  let stdout = stdout(&output);
  for tag in ["aggregator-1.1", "core-2.1", "app-3.1"] {
    assert!(stdout.contains(tag), "missing {} in: {}", tag, stdout);
  }
  assert!(stdout.contains("forced"));
  Ok(())
}

#[test]
fn test_unknown_forced_module() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_reactor_raw(&project.path, &["next", "--force", "nope"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("'nope'"));
  Ok(())
}

#[test]
fn test_nothing_to_release() -> Result<()> {
  let project = TestProject::new()?;
  run_reactor(&project.path, &["release"])?;

  let output = run_reactor(&project.path, &["next"])?;
  assert!(stdout(&output).contains("Nothing to release"));

  let output = run_reactor_raw(&project.path, &["next", "--no-changes", "fail"])?;
  assert!(!output.status.success());

  let output = run_reactor(&project.path, &["next", "--no-changes", "release-all"])?;
  assert!(stdout(&output).contains("core-2.1"));
  Ok(())
}

#[test]
fn test_next_allows_dirty_tree() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("scratch.txt", "work in progress\n")?;

  let output = run_reactor(&project.path, &["next"])?;
  assert!(stdout(&output).contains("core-2.0"));
  Ok(())
}

#[test]
fn test_directory_flag() -> Result<()> {
  let project = TestProject::new()?;
  let path = project.path.to_string_lossy().to_string();

  let output = run_reactor(std::env::temp_dir().as_path(), &["-C", &path, "next"])?;
  assert!(stdout(&output).contains("app-3.0"));
  Ok(())
}
