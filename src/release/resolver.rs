//! Change and version resolution
//!
//! Decides, per module, whether it needs a release and which version it gets:
//!
//! 1. **Seed**: modules without a release record are first releases; forced
//!    modules are released; everything else asks the repository whether its
//!    files changed since the tag it was last released under.
//! 2. **Propagate**: a module whose dependency (or parent) is released is
//!    released too, repeated in build order until nothing changes.
//! 3. **Version**: released modules get their next version, the rest keep
//!    their last released one.
//!
//! Repository queries are independent per module and run in parallel; all
//! decisions are made after every query has returned.

use crate::core::config::NoChangesPolicy;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::vcs::Repository;
use crate::graph::DependencyGraph;
use crate::project::{ModuleDescriptor, ModuleId};
use crate::release::record::ReleaseInfo;
use crate::release::version::next_version;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Why a module is (or is not) part of the release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "module", rename_all = "kebab-case")]
pub enum ReleaseReason {
  /// Files under the module changed since its last release
  Changed,
  /// Requested explicitly
  Forced,
  /// Never released before
  FirstRelease,
  /// A dependency or the parent is being released
  DependencyChanged(ModuleId),
  /// Nothing changed and the project asked to release everything anyway
  ReleaseAll,
  Unchanged,
}

impl fmt::Display for ReleaseReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseReason::Changed => write!(f, "changed"),
      ReleaseReason::Forced => write!(f, "forced"),
      ReleaseReason::FirstRelease => write!(f, "first release"),
      ReleaseReason::DependencyChanged(dep) => write!(f, "depends on {}", dep.artifact),
      ReleaseReason::ReleaseAll => write!(f, "release-all"),
      ReleaseReason::Unchanged => write!(f, "unchanged"),
    }
  }
}

/// One module's release decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasableModule {
  pub id: ModuleId,
  /// Module directory relative to the project root ("." for the root)
  pub path: String,
  pub declared_version: String,
  /// Version at last release, or the declared version if never released
  pub old_version: String,
  pub previously_released: bool,
  /// Release version if `needs_release`, otherwise the kept version
  pub new_version: String,
  pub needs_release: bool,
  pub reason: ReleaseReason,
  /// Tag the change query diffed against
  #[serde(skip_serializing_if = "Option::is_none")]
  pub baseline: Option<String>,
}

/// Knobs for one resolution
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
  /// Module names (`artifact` or `group:artifact`) to release regardless of changes
  pub forced: Vec<String>,
  pub bugfix: bool,
  pub no_changes: NoChangesPolicy,
  /// Paths no module ever "changes" because of (e.g. the release record)
  pub ignored_paths: Vec<PathBuf>,
}

/// Resolve every module in build order.
pub fn resolve(
  graph: &DependencyGraph,
  repo: &dyn Repository,
  record: Option<&ReleaseInfo>,
  options: &ResolveOptions,
) -> ReleaseResult<Vec<ReleasableModule>> {
  let forced = forced_modules(graph, &options.forced)?;
  let modules: Vec<&ModuleDescriptor> = graph.in_build_order().collect();

  let seeds = modules
    .par_iter()
    .map(|module| seed(graph, repo, record, &forced, options, module))
    .collect::<ReleaseResult<Vec<_>>>()?;

  let mut reasons: HashMap<ModuleId, ReleaseReason> = modules
    .iter()
    .zip(seeds.iter())
    .map(|(module, (reason, _))| (module.id.clone(), reason.clone()))
    .collect();

  propagate(graph, &modules, &mut reasons);

  let nothing_to_do = reasons.values().all(|r| *r == ReleaseReason::Unchanged);
  if nothing_to_do {
    match options.no_changes {
      NoChangesPolicy::ReleaseNone => info!("no module changed since its last release"),
      NoChangesPolicy::ReleaseAll => {
        info!("no module changed; releasing all modules as configured");
        reasons.values_mut().for_each(|r| *r = ReleaseReason::ReleaseAll);
      }
      NoChangesPolicy::Fail => {
        return Err(ReleaseError::with_help(
          "No module has changed since its last release",
          "Commit changes first, force modules with --force, or use --no-changes release-all",
        ));
      }
    }
  }

  modules
    .iter()
    .zip(seeds)
    .map(|(module, (_, baseline))| {
      let reason = reasons.remove(&module.id).unwrap_or(ReleaseReason::Unchanged);
      releasable(module, record, reason, baseline, options.bugfix)
    })
    .collect()
}

/// Map forced names onto module ids; unknown names are a configuration error
fn forced_modules(graph: &DependencyGraph, names: &[String]) -> ReleaseResult<BTreeSet<ModuleId>> {
  let mut forced = BTreeSet::new();
  for name in names {
    let matches: Vec<&ModuleId> = graph
      .modules()
      .map(|m| &m.id)
      .filter(|id| id.matches_name(name))
      .collect();
    if matches.is_empty() {
      return Err(
        ConfigError::UnknownModule {
          name: name.clone(),
          available: graph.modules().map(|m| m.id.artifact.clone()).collect(),
        }
        .into(),
      );
    }
    forced.extend(matches.into_iter().cloned());
  }
  Ok(forced)
}

/// Initial decision for one module, plus the baseline it was checked against
fn seed(
  graph: &DependencyGraph,
  repo: &dyn Repository,
  record: Option<&ReleaseInfo>,
  forced: &BTreeSet<ModuleId>,
  options: &ResolveOptions,
  module: &ModuleDescriptor,
) -> ReleaseResult<(ReleaseReason, Option<String>)> {
  let Some(previous) = record.and_then(|r| r.find(&module.id)) else {
    debug!(module = %module.id, "no previous release");
    return Ok((ReleaseReason::FirstRelease, None));
  };
  let baseline = Some(previous.tag.clone());

  if forced.contains(&module.id) {
    debug!(module = %module.id, "forced");
    return Ok((ReleaseReason::Forced, baseline));
  }

  if !repo.resolves(&previous.tag)? {
    warn!(
      module = %module.id,
      tag = %previous.tag,
      "last release tag not found; treating module as changed"
    );
    return Ok((ReleaseReason::Changed, baseline));
  }

  let mut excluded = graph.nested_module_paths(&module.id);
  excluded.extend(options.ignored_paths.iter().cloned());

  let changed = repo.has_changed_since(&module.path, &excluded, Some(&previous.tag))?;
  debug!(module = %module.id, baseline = %previous.tag, changed, "change query");

  let reason = if changed {
    ReleaseReason::Changed
  } else {
    ReleaseReason::Unchanged
  };
  Ok((reason, baseline))
}

/// Release every module whose dependency or parent is released, until fixed point.
///
/// Walking in build order settles each module after its dependencies, so the
/// second pass only confirms the result.
fn propagate(graph: &DependencyGraph, modules: &[&ModuleDescriptor], reasons: &mut HashMap<ModuleId, ReleaseReason>) {
  loop {
    let mut updated = false;
    for module in modules {
      if reasons.get(&module.id) != Some(&ReleaseReason::Unchanged) {
        continue;
      }
      let released_dep = graph
        .dependencies(&module.id)
        .into_iter()
        .find(|dep| reasons.get(*dep).is_some_and(|r| *r != ReleaseReason::Unchanged))
        .cloned();
      if let Some(dep) = released_dep {
        info!(module = %module.id, dependency = %dep, "released because a dependency is released");
        reasons.insert(module.id.clone(), ReleaseReason::DependencyChanged(dep));
        updated = true;
      }
    }
    if !updated {
      break;
    }
  }
}

fn releasable(
  module: &ModuleDescriptor,
  record: Option<&ReleaseInfo>,
  reason: ReleaseReason,
  baseline: Option<String>,
  bugfix: bool,
) -> ReleaseResult<ReleasableModule> {
  let previous = record.and_then(|r| r.find(&module.id)).map(|p| p.version.clone());
  let needs_release = reason != ReleaseReason::Unchanged;

  let new_version = match (&previous, needs_release) {
    (Some(kept), false) => kept.clone(),
    (previous, _) => next_version(previous.as_deref(), &module.version, bugfix).map_err(|e| {
      e.context(format!("While computing the release version of {}", module.id))
    })?,
  };

  Ok(ReleasableModule {
    id: module.id.clone(),
    path: module.relative_path(),
    declared_version: module.version.clone(),
    old_version: previous.clone().unwrap_or_else(|| module.version.clone()),
    previously_released: previous.is_some(),
    new_version,
    needs_release,
    reason,
    baseline,
  })
}
