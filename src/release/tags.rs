//! Release tags: naming, pre-flight collision checks and all-or-nothing creation

use crate::core::error::{ReleaseError, ReleaseResult, TagCollision};
use crate::core::vcs::Repository;
use crate::project::ModuleId;
use crate::release::plan::BuildPlan;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Tag for one released module: `<artifact>-<version>`
pub fn tag_name(artifact: &str, version: &str) -> String {
  format!("{}-{}", artifact, version)
}

/// A tag to create once the build succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTag {
  pub module: ModuleId,
  pub version: String,
  pub name: String,
}

impl PlannedTag {
  fn message(&self) -> String {
    format!("Release {} {}", self.module, self.version)
  }
}

/// Derive every tag of the plan and fail if any of them is already taken.
///
/// Local tags are always checked; remote tags only when `remote` is set. Every
/// collision is reported, not just the first.
pub fn plan_tags(plan: &BuildPlan, repo: &dyn Repository, remote: Option<&str>) -> ReleaseResult<Vec<PlannedTag>> {
  let tags: Vec<PlannedTag> = plan
    .release
    .iter()
    .map(|m| PlannedTag {
      module: m.id.clone(),
      version: m.new_version.clone(),
      name: tag_name(&m.id.artifact, &m.new_version),
    })
    .collect();

  let remote_tags = match remote {
    Some(remote) => Some(repo.remote_tags(remote)?),
    None => None,
  };

  let mut collisions = Vec::new();
  let mut seen = HashSet::new();
  for tag in &tags {
    let location = if !seen.insert(tag.name.as_str()) {
      Some("plan")
    } else if repo.tag_exists(&tag.name)? {
      Some("local")
    } else if remote_tags.as_ref().is_some_and(|r| r.contains(&tag.name)) {
      Some("remote")
    } else {
      None
    };

    if let Some(location) = location {
      collisions.push(TagCollision {
        module: tag.module.to_string(),
        version: tag.version.clone(),
        tag: tag.name.clone(),
        location,
      });
    }
  }

  debug!(tags = tags.len(), collisions = collisions.len(), "tag pre-flight");
  if collisions.is_empty() {
    Ok(tags)
  } else {
    Err(ReleaseError::TagCollision(collisions))
  }
}

/// Create all tags, or none: a failure deletes the tags created before it.
pub fn apply_tags(tags: &[PlannedTag], repo: &dyn Repository, mut on_created: impl FnMut(&PlannedTag)) -> ReleaseResult<()> {
  let mut created: Vec<&str> = Vec::with_capacity(tags.len());

  for tag in tags {
    if let Err(err) = repo.create_tag(&tag.name, &tag.message()) {
      warn!(tag = %tag.name, "tag creation failed; removing {} tag(s) created in this run", created.len());
      for name in created.iter().rev() {
        if let Err(delete_err) = repo.delete_tag(name) {
          warn!(tag = %name, error = %delete_err, "could not remove tag");
        }
      }
      return Err(err);
    }
    created.push(&tag.name);
    on_created(tag);
  }

  Ok(())
}

/// Tag names in plan order
pub fn names(tags: &[PlannedTag]) -> Vec<String> {
  tags.iter().map(|t| t.name.clone()).collect()
}
