//! The reactor: one pass from module descriptors to a validated build plan
//!
//! ```text
//! descriptors ─► graph ─► validation (dirty tree + snapshot references)
//!                               │ any problem: fail with all of them
//!                               ▼
//!                          resolution ─► BuildPlan (possibly empty)
//! ```
//!
//! Everything here is a pure computation over one snapshot of repository
//! state; re-running the reactor is the retry strategy.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::Repository;
use crate::graph::DependencyGraph;
use crate::project::ModuleDescriptor;
use crate::release::plan::BuildPlan;
use crate::release::record::ReleaseInfo;
use crate::release::resolver::{ResolveOptions, resolve};
use crate::release::validator::{ValidationResult, check_working_tree, validate_snapshots};
use tracing::info;

/// Options for one reactor run
#[derive(Debug, Clone, Default)]
pub struct ReactorOptions {
  pub resolve: ResolveOptions,
  /// Reject uncommitted and untracked files
  pub require_clean: bool,
}

/// Graph and plan of a successful run
pub struct ReactorOutput {
  pub graph: DependencyGraph,
  pub plan: BuildPlan,
}

/// Run the reactor.
///
/// An empty plan ("nothing to release") is a successful outcome.
pub fn run(
  descriptors: Vec<ModuleDescriptor>,
  repo: &dyn Repository,
  record: Option<&ReleaseInfo>,
  options: &ReactorOptions,
) -> ReleaseResult<ReactorOutput> {
  let graph = DependencyGraph::build(descriptors)?;

  let mut problems = ValidationResult::new();
  if options.require_clean {
    problems.merge(check_working_tree(repo, &options.resolve.ignored_paths));
  }
  problems.merge(validate_snapshots(&graph));
  if !problems.is_empty() {
    return Err(ReleaseError::Validation(problems));
  }

  let modules = resolve(&graph, repo, record, &options.resolve)?;
  let plan = BuildPlan::from_resolution(modules);
  info!(plan = %plan.id, release = plan.len(), unchanged = plan.unchanged.len(), "plan ready");

  Ok(ReactorOutput { graph, plan })
}
