//! Project metadata: module descriptors and the loaders that populate them
//!
//! The release core never looks at a build tool's own project model. Each loader
//! reads its ecosystem's manifests once and produces plain `ModuleDescriptor`s:
//!
//! - **cargo**: Cargo workspaces via `cargo_metadata`
//! - **manifest**: native `module.toml` trees (group/artifact/parent/properties)
//!
//! Loaders also know how to stamp release versions back into their manifests,
//! which is the only write the release flow performs on project files.

use crate::core::error::{ConfigError, ReleaseResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod cargo;
pub mod manifest;

/// Identity of a module: group plus artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
  pub group: String,
  pub artifact: String,
}

impl ModuleId {
  pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
    Self {
      group: group.into(),
      artifact: artifact.into(),
    }
  }

  /// Match a user-supplied name: either `artifact` or `group:artifact`
  pub fn matches_name(&self, name: &str) -> bool {
    match name.split_once(':') {
      Some((group, artifact)) => self.group == group && self.artifact == artifact,
      None => self.artifact == name,
    }
  }
}

impl fmt::Display for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.group, self.artifact)
  }
}

/// Reference from one module to another (parent or dependency).
///
/// The target may or may not be part of the project; the graph builder decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
  pub id: ModuleId,
  /// Declared version, possibly a `${property}` expression. `None` when the
  /// version is managed elsewhere.
  pub version: Option<String>,
  /// Explicit location inside the project. A reference with a path must
  /// resolve to a project module.
  pub path: Option<PathBuf>,
}

/// Immutable facts about one module, created once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
  pub id: ModuleId,
  /// Declared version (release or snapshot)
  pub version: String,
  /// Module directory relative to the project root ("" for the root module)
  pub path: PathBuf,
  /// Manifest file relative to the project root
  pub manifest: PathBuf,
  pub parent: Option<DependencyRef>,
  pub dependencies: Vec<DependencyRef>,
  /// Version properties declared by this module
  pub properties: BTreeMap<String, String>,
}

impl ModuleDescriptor {
  /// All outgoing references: parent first, then dependencies in declaration order
  pub fn references(&self) -> impl Iterator<Item = &DependencyRef> {
    self.parent.iter().chain(self.dependencies.iter())
  }

  /// Path as passed to build tools and git (forward slashes, "." for the root)
  pub fn relative_path(&self) -> String {
    if self.path.as_os_str().is_empty() {
      ".".to_string()
    } else {
      crate::utils::path_to_git_format(&self.path)
    }
  }
}

/// Versions to stamp into manifests for one release build
#[derive(Debug, Clone, Default)]
pub struct VersionStamp {
  /// Release version of every project module (released or kept)
  pub versions: BTreeMap<ModuleId, String>,
}

impl VersionStamp {
  pub fn version_of(&self, id: &ModuleId) -> Option<&str> {
    self.versions.get(id).map(String::as_str)
  }
}

/// Ecosystem-specific project loading and manifest stamping
pub trait ProjectLoader: Send + Sync {
  /// Short name used in config and logs
  fn name(&self) -> &'static str;

  /// Detect if this loader can handle the project at `root`
  fn can_handle(&self, root: &Path) -> bool;

  /// Load every module of the project, in a stable order
  fn load(&self, root: &Path) -> ReleaseResult<Vec<ModuleDescriptor>>;

  /// Write release versions into `module`'s manifest. Returns the manifest path
  /// (relative to `root`) that was modified.
  fn write_versions(&self, root: &Path, module: &ModuleDescriptor, stamp: &VersionStamp) -> ReleaseResult<PathBuf>;

  /// Write release versions into project-level files that are not a module's
  /// own manifest. Returns the paths (relative to `root`) that were modified.
  fn write_shared_versions(&self, _root: &Path, _stamp: &VersionStamp) -> ReleaseResult<Vec<PathBuf>> {
    Ok(Vec::new())
  }
}

/// Pick a loader for the project.
///
/// `preference` is the configured loader name; "auto" tries Cargo, then the
/// native manifest format.
pub fn detect_loader(root: &Path, preference: &str) -> ReleaseResult<Box<dyn ProjectLoader>> {
  let candidates: Vec<Box<dyn ProjectLoader>> = vec![
    Box::new(cargo::CargoLoader::new()),
    Box::new(manifest::ManifestLoader::new()),
  ];

  for loader in candidates {
    if preference != "auto" {
      if loader.name() == preference {
        return Ok(loader);
      }
      continue;
    }
    if loader.can_handle(root) {
      return Ok(loader);
    }
  }

  if preference != "auto" {
    return Err(
      ConfigError::Invalid {
        field: "project.loader".to_string(),
        reason: format!("unknown loader '{}' (expected auto, cargo or manifest)", preference),
      }
      .into(),
    );
  }

  Err(
    ConfigError::UnsupportedProject {
      root: root.to_path_buf(),
    }
    .into(),
  )
}
