//! Integration tests for the checks that run before anything is built

use crate::helpers::{PASSING_BUILD, TestProject, run_reactor, run_reactor_raw, stderr, stdout};
use anyhow::Result;

#[test]
fn test_untracked_files_are_all_listed() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("untracked-one.txt", "1\n")?;
  project.write_file("notes/two.txt", "2\n")?;

  let output = run_reactor_raw(&project.path, &["release"])?;
  assert_eq!(output.status.code(), Some(3));

  let stderr = stderr(&output);
  assert!(
    stderr.contains("Cannot release with uncommitted changes. Please check the following files:"),
    "stderr: {}",
    stderr
  );
  assert!(stderr.contains(" * untracked-one.txt"));
  assert!(stderr.contains(" * notes/two.txt"));
  assert!(project.tags()?.is_empty());
  Ok(())
}

#[test]
fn test_modified_manifest_blocks_release() -> Result<()> {
  let project = TestProject::new()?;
  let manifest = project.read_file("core/module.toml")?;
  project.write_file("core/module.toml", &manifest.replace("2.0-SNAPSHOT", "2.5-SNAPSHOT"))?;

  let output = run_reactor_raw(&project.path, &["release"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains(" * core/module.toml"));
  Ok(())
}

#[test]
fn test_external_snapshot_dependency_is_rejected() -> Result<()> {
  let project = TestProject::empty()?;
  project.write_modules(
    r#"
[[dependencies]]
artifact = "core"
version = "2.0-SNAPSHOT"
path = "../core"

[[dependencies]]
group = "org.external"
artifact = "json"
version = "1.0-SNAPSHOT"
"#,
  )?;
  project.write_config(PASSING_BUILD, None)?;
  project.commit("Depend on a snapshot")?;

  for command in ["next", "release"] {
    let output = run_reactor_raw(&project.path, &[command])?;
    assert_eq!(output.status.code(), Some(3), "{} must fail", command);

    let stderr = stderr(&output);
    assert!(stderr.contains("Cannot release with references to snapshot dependencies"));
    assert!(
      stderr.contains(
        "com.example:app references dependency org.external:json at a non-final version (1.0-SNAPSHOT)"
      ),
      "stderr: {}",
      stderr
    );
  }
  assert!(project.tags()?.is_empty());
  Ok(())
}

#[test]
fn test_snapshot_through_property() -> Result<()> {
  let project = TestProject::empty()?;
  project.write_modules(
    r#"
[properties]
"json.version" = "4.2-SNAPSHOT"

[[dependencies]]
group = "org.external"
artifact = "json"
version = "${json.version}"
"#,
  )?;
  project.write_config(PASSING_BUILD, None)?;
  project.commit("Depend on a snapshot property")?;

  let output = run_reactor_raw(&project.path, &["next"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("(4.2-SNAPSHOT)"));
  Ok(())
}

#[test]
fn test_released_external_dependency_is_fine() -> Result<()> {
  let project = TestProject::empty()?;
  project.write_modules(
    r#"
[[dependencies]]
group = "org.external"
artifact = "json"
version = "20231013"
"#,
  )?;
  project.write_config(PASSING_BUILD, None)?;
  project.commit("Depend on a release")?;

  run_reactor(&project.path, &["next"])?;
  Ok(())
}

#[test]
fn test_dependency_cycle() -> Result<()> {
  let project = TestProject::new()?;
  let core = project.read_file("core/module.toml")?;
  project.write_file(
    "core/module.toml",
    &format!(
      "{}\n[[dependencies]]\nartifact = \"app\"\nversion = \"3.0-SNAPSHOT\"\npath = \"../app\"\n",
      core
    ),
  )?;
  project.commit("Introduce a cycle")?;

  let output = run_reactor_raw(&project.path, &["next"])?;
  assert_eq!(output.status.code(), Some(3));
  let stderr = stderr(&output);
  assert!(stderr.contains("Dependency cycle detected"), "stderr: {}", stderr);
  assert!(stderr.contains("core -> app") || stderr.contains("app -> core"));
  Ok(())
}

#[test]
fn test_outside_git_repository() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  std::fs::write(
    dir.path().join("module.toml"),
    "[module]\ngroup = \"g\"\nartifact = \"a\"\nversion = \"1.0\"\n",
  )?;

  let output = run_reactor_raw(dir.path(), &["next"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("Git repository not found"));
  Ok(())
}

#[test]
fn test_invalid_config() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("release.toml", "[build]\ncommand = []\n")?;

  let output = run_reactor_raw(&project.path, &["next"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("build.command"));
  Ok(())
}

#[test]
fn test_project_in_repository_subdirectory() -> Result<()> {
  let project = TestProject::empty()?;
  project.write_file(
    "shop/module.toml",
    "[module]\ngroup = \"com.example\"\nartifact = \"shop\"\nversion = \"1.0-SNAPSHOT\"\n",
  )?;
  project.write_file(
    "shop/release.toml",
    "[build]\ncommand = [\"git\", \"--version\"]\n\n[vcs]\ncommit_record = false\n",
  )?;
  project.commit("Add shop")?;

  run_reactor(&project.path, &["-C", "shop", "release"])?;
  assert_eq!(project.tags()?, vec!["shop-1.0"]);
  assert!(project.file_exists("shop/.release-info.json"));

  // The uncommitted record and files outside the project do not block the next run
  project.write_file("notes.txt", "outside the project\n")?;
  let output = run_reactor(&project.path, &["-C", "shop", "release"])?;
  assert!(stdout(&output).contains("Nothing to release"), "stdout: {}", stdout(&output));

  project.write_file("shop/scratch.txt", "inside the project\n")?;
  let output = run_reactor_raw(&project.path, &["-C", "shop", "release"])?;
  assert_eq!(output.status.code(), Some(3));
  let stderr = stderr(&output);
  assert!(stderr.contains(" * scratch.txt"), "stderr: {}", stderr);
  assert!(!stderr.contains(".release-info.json"));
  Ok(())
}
