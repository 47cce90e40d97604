//! `next`: report what the next release would contain
//!
//! Runs the reactor and the tag pre-flight against the current repository
//! state. Nothing is built, stamped or tagged, and a dirty working tree is
//! allowed so the report can be produced while work is in progress.

use super::{PlanOptions, reactor_options};
use crate::core::context::RunContext;
use crate::core::error::ReleaseResult;
use crate::release::{BuildPlan, reactor};
use crate::release::tags::{PlannedTag, plan_tags};
use serde::Serialize;

#[derive(Serialize)]
struct NextReport<'a> {
  plan: &'a BuildPlan,
  tags: &'a [PlannedTag],
}

/// Run the next command
pub fn run_next(ctx: &RunContext, options: &PlanOptions, json: bool) -> ReleaseResult<()> {
  let descriptors = ctx.load_modules()?;
  let record = ctx.records.load()?;
  let reactor_options = reactor_options(ctx, options, false);

  let output = reactor::run(descriptors, ctx.repo.as_ref(), record.as_ref(), &reactor_options)?;
  let tags = plan_tags(&output.plan, ctx.repo.as_ref(), ctx.config.vcs.remote.as_deref())?;

  if json {
    let report = NextReport {
      plan: &output.plan,
      tags: &tags,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  print!("{}", output.plan.to_human_readable());
  if !tags.is_empty() {
    println!();
    println!("🏷️  Tags to create ({}):", tags.len());
    for tag in &tags {
      println!("   {}", tag.name);
    }
  }

  Ok(())
}
