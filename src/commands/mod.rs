//! CLI commands for release-reactor
//!
//! - **next**: compute and print the release plan, never builds or tags
//! - **release**: validate, plan, build, tag, push and record a release
//!
//! All commands accept `&RunContext` so the project is loaded once per run.

pub mod next;
pub mod release;

pub use next::run_next;
pub use release::run_release;

use crate::core::config::NoChangesPolicy;
use crate::core::context::RunContext;
use crate::release::ReactorOptions;
use crate::release::resolver::ResolveOptions;

/// Plan-shaping flags shared by `next` and `release`
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
  pub bugfix: bool,
  pub force: Vec<String>,
  pub no_changes: Option<NoChangesPolicy>,
}

/// Merge command-line flags over release.toml
fn reactor_options(ctx: &RunContext, options: &PlanOptions, require_clean: bool) -> ReactorOptions {
  let settings = &ctx.config.release;

  let mut forced = settings.force.clone();
  for name in &options.force {
    if !forced.contains(name) {
      forced.push(name.clone());
    }
  }

  ReactorOptions {
    resolve: ResolveOptions {
      forced,
      bugfix: options.bugfix || settings.bugfix,
      no_changes: options.no_changes.unwrap_or(settings.no_changes),
      ignored_paths: vec![ctx.records.relative_path().to_path_buf()],
    },
    require_clean,
  }
}
