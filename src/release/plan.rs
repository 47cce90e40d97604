//! Build plan: the ordered, version-stamped set of modules to release
//!
//! A plan is a pure function of the resolver output. Its id is a SHA-256 over
//! the released modules and their versions, so two runs against the same
//! repository state print the same id.

use crate::project::VersionStamp;
use crate::release::resolver::ReleasableModule;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Modules to build and release, dependencies first
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub id: PlanId,
  /// Released modules in build order
  pub release: Vec<ReleasableModule>,
  /// Modules kept at their last released version
  pub unchanged: Vec<ReleasableModule>,
}

impl BuildPlan {
  /// Split resolver output (already in build order) into released and kept modules
  pub fn from_resolution(modules: Vec<ReleasableModule>) -> Self {
    let (release, unchanged): (Vec<_>, Vec<_>) = modules.into_iter().partition(|m| m.needs_release);

    let fingerprint: Vec<(String, &str)> = release
      .iter()
      .map(|m| (m.id.to_string(), m.new_version.as_str()))
      .collect();
    let id = PlanId::from_contents(&serde_json::to_vec(&fingerprint).unwrap_or_default());

    Self { id, release, unchanged }
  }

  /// True when no module needs a release
  pub fn is_empty(&self) -> bool {
    self.release.is_empty()
  }

  pub fn len(&self) -> usize {
    self.release.len()
  }

  /// Paths handed to the build tool, in build order
  pub fn paths_to_build(&self) -> Vec<String> {
    self.release.iter().map(|m| m.path.clone()).collect()
  }

  /// Version of every module for manifest stamping (released and kept)
  pub fn version_stamp(&self) -> VersionStamp {
    let mut stamp = VersionStamp::default();
    for module in self.release.iter().chain(&self.unchanged) {
      stamp.versions.insert(module.id.clone(), module.new_version.clone());
    }
    stamp
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    if self.is_empty() {
      output.push_str("📋 Nothing to release: no module changed since its last release\n");
    } else {
      output.push_str(&format!("📋 Release plan ({})\n", self.id));
      output.push_str(&format!("\n   Modules to release ({}), in build order:\n", self.release.len()));
      for (i, module) in self.release.iter().enumerate() {
        let from = if module.previously_released {
          format!("{} -> ", module.old_version)
        } else {
          String::new()
        };
        output.push_str(&format!(
          "   {}. {} {}{} ({})\n",
          i + 1,
          module.id.artifact,
          from,
          module.new_version,
          module.reason
        ));
      }
    }

    if !self.unchanged.is_empty() {
      output.push_str(&format!("\n   Unchanged ({}):\n", self.unchanged.len()));
      for module in &self.unchanged {
        output.push_str(&format!("   - {} {}\n", module.id.artifact, module.new_version));
      }
    }

    output
  }
}
