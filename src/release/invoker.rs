//! External build invocation
//!
//! The build tool runs once for the whole plan. Per-module arguments are
//! expanded in build order and the released module paths are exported as
//! `RELEASE_MODULES` (comma-separated) for tools that prefer the environment.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::release::plan::BuildPlan;
use crate::release::resolver::ReleasableModule;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Environment variable listing the module paths to build
pub const RELEASE_MODULES_ENV: &str = "RELEASE_MODULES";

/// Runs the build for a plan
pub trait BuildInvoker {
  /// Build the plan's released modules; any failure means nothing gets tagged
  fn build(&self, root: &Path, plan: &BuildPlan, skip_tests: bool) -> ReleaseResult<()>;
}

/// Build through a configured external command
#[derive(Debug, Clone)]
pub struct CommandInvoker {
  command: Vec<String>,
  module_args: Vec<String>,
  skip_tests_args: Vec<String>,
}

impl CommandInvoker {
  pub fn new(command: Vec<String>, module_args: Vec<String>, skip_tests_args: Vec<String>) -> Self {
    Self {
      command,
      module_args,
      skip_tests_args,
    }
  }

  /// Full argv for a plan (program first)
  pub fn argv(&self, plan: &BuildPlan, skip_tests: bool) -> Vec<String> {
    let mut argv = self.command.clone();
    for module in &plan.release {
      argv.extend(self.module_args.iter().map(|template| expand(template, module)));
    }
    if skip_tests {
      argv.extend(self.skip_tests_args.iter().cloned());
    }
    argv
  }
}

impl BuildInvoker for CommandInvoker {
  fn build(&self, root: &Path, plan: &BuildPlan, skip_tests: bool) -> ReleaseResult<()> {
    let argv = self.argv(plan, skip_tests);
    let Some((program, args)) = argv.split_first() else {
      return Err(ReleaseError::message("Build command is empty"));
    };
    let command_line = argv.join(" ");

    info!(command = %command_line, modules = plan.len(), "invoking build");
    let status = Command::new(program)
      .args(args)
      .current_dir(root)
      .env(RELEASE_MODULES_ENV, plan.paths_to_build().join(","))
      .status()
      .with_context(|| format!("Failed to start build command `{}`", command_line))?;
    debug!(?status, "build finished");

    if !status.success() {
      return Err(ReleaseError::Build {
        command: command_line,
        exit_code: status.code(),
      });
    }
    Ok(())
  }
}

/// Substitute `{artifact}`, `{group}`, `{path}` and `{version}`
fn expand(template: &str, module: &ReleasableModule) -> String {
  template
    .replace("{artifact}", &module.id.artifact)
    .replace("{group}", &module.id.group)
    .replace("{path}", &module.path)
    .replace("{version}", &module.new_version)
}
