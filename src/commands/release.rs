//! `release`: run a full release
//!
//! ```text
//! validate ─► plan ─► tag pre-flight ─► stamp manifests ─► build
//!                                              │
//!                          revert manifests ◄──┘ (always)
//!                                │ build ok
//!                                ▼
//!                        tag ─► push ─► save + commit record
//! ```
//!
//! Tags are created only after the build succeeded, and all of them or none.

use super::{PlanOptions, reactor_options};
use crate::core::context::RunContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::release::invoker::{BuildInvoker, CommandInvoker};
use crate::release::reactor::{self, ReactorOutput};
use crate::release::record::ReleaseInfo;
use crate::release::tags::{PlannedTag, apply_tags, names, plan_tags};
use crate::ui::progress::ModuleProgress;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Run the release command
pub fn run_release(ctx: &RunContext, options: &PlanOptions, skip_tests: bool, no_push: bool) -> ReleaseResult<()> {
  let descriptors = ctx.load_modules()?;
  let record = ctx.records.load()?;
  let reactor_options = reactor_options(ctx, options, ctx.config.vcs.require_clean);

  let output = reactor::run(descriptors, ctx.repo.as_ref(), record.as_ref(), &reactor_options)?;
  print!("{}", output.plan.to_human_readable());
  if output.plan.is_empty() {
    return Ok(());
  }

  let remote = ctx.config.vcs.remote.as_deref();
  let tags = plan_tags(&output.plan, ctx.repo.as_ref(), remote)?;
  println!();
  println!("✅ No tag collisions ({} tag(s) planned)", tags.len());

  let loader = ctx.loader.name();
  let command = ctx.config.build.command_for(loader).ok_or_else(|| {
    ReleaseError::with_help(
      format!("No build command configured for {} projects", loader),
      "Set [build].command in release.toml",
    )
  })?;
  let invoker = CommandInvoker::new(
    command,
    ctx.config.build.module_args_for(loader),
    ctx.config.build.skip_tests_args.clone(),
  );

  build_with_stamped_versions(ctx, &output, &invoker, skip_tests)?;
  println!("✅ Build succeeded");

  let head = ctx.repo.head_ref()?;
  let mut progress = ModuleProgress::new(tags.len(), "Tagging");
  apply_tags(&tags, ctx.repo.as_ref(), |_| progress.inc())?;
  println!(
    "🏷️  Created {} tag(s) at {}: {}",
    tags.len(),
    head.get(..12).unwrap_or(&head),
    names(&tags).join(", ")
  );

  if let Some(remote) = remote
    && ctx.config.vcs.push_tags
    && !no_push
  {
    ctx
      .repo
      .push_tags(remote, &names(&tags))
      .context("Tags were created locally but could not be pushed")?;
    println!("📤 Pushed {} tag(s) to {}", tags.len(), remote);
  }

  save_record(ctx, record, &output, &tags)?;
  println!("🎉 Released {} module(s)", output.plan.len());
  Ok(())
}

/// Stamp release versions into every manifest, build, then restore the manifests.
///
/// The manifests are restored whether or not the build succeeded.
fn build_with_stamped_versions(
  ctx: &RunContext,
  output: &ReactorOutput,
  invoker: &dyn BuildInvoker,
  skip_tests: bool,
) -> ReleaseResult<()> {
  let mut stamped: Vec<PathBuf> = Vec::new();
  let result = stamp_versions(ctx, output, &mut stamped).and_then(|()| invoker.build(&ctx.root, &output.plan, skip_tests));

  if result.is_err() {
    eprintln!("⚠️  Going to revert changes because there was an error");
  }
  info!(manifests = stamped.len(), "reverting stamped manifests");
  let reverted = ctx.repo.revert_paths(&stamped);

  match (result, reverted) {
    (Err(err), Err(revert_err)) => {
      warn!(error = %revert_err, "could not revert stamped manifests");
      Err(err)
    }
    (Err(err), Ok(())) => Err(err),
    (Ok(()), Err(revert_err)) => Err(revert_err.context("Build succeeded but the stamped manifests could not be reverted")),
    (Ok(()), Ok(())) => Ok(()),
  }
}

/// Every module gets the plan's versions, including unchanged modules that
/// reference released ones. Shared project files are stamped last.
fn stamp_versions(ctx: &RunContext, output: &ReactorOutput, stamped: &mut Vec<PathBuf>) -> ReleaseResult<()> {
  let stamp = output.plan.version_stamp();
  for module in output.graph.modules() {
    let manifest = ctx
      .loader
      .write_versions(&ctx.root, module, &stamp)
      .context("Unexpected error while setting the release versions")?;
    if !stamped.contains(&manifest) {
      stamped.push(manifest);
    }
  }
  let shared = ctx
    .loader
    .write_shared_versions(&ctx.root, &stamp)
    .context("Unexpected error while setting the release versions")?;
  for path in shared {
    if !stamped.contains(&path) {
      stamped.push(path);
    }
  }
  Ok(())
}

fn save_record(
  ctx: &RunContext,
  previous: Option<ReleaseInfo>,
  output: &ReactorOutput,
  tags: &[PlannedTag],
) -> ReleaseResult<()> {
  let mut info = previous.unwrap_or_default();
  let now = Utc::now();
  for tag in tags {
    info.record(&tag.module, &tag.version, &tag.name, now);
  }
  ctx.records.save(&info)?;

  if ctx.config.vcs.commit_record {
    let artifacts: Vec<&str> = output.plan.release.iter().map(|m| m.id.artifact.as_str()).collect();
    let message = format!("Release {}", artifacts.join(", "));
    ctx
      .repo
      .commit_paths(&[ctx.records.relative_path().to_path_buf()], &message)
      .context("Failed to commit the release record")?;
  }
  Ok(())
}
