//! Native `module.toml` project loader
//!
//! A project is a tree of directories, each with a `module.toml`. The root
//! manifest lists child directories under `modules`, which are loaded
//! recursively (depth-first, declaration order).
//!
//! ```toml
//! [module]
//! group = "com.example"        # inherited from [parent] when omitted
//! artifact = "console-app"
//! version = "3.0-SNAPSHOT"
//! modules = []                 # child module directories
//!
//! [parent]
//! group = "com.example"
//! artifact = "parent-module"
//! version = "1.0-SNAPSHOT"
//! path = "../parent-module"    # optional: marks the parent as a project module
//!
//! [properties]
//! "core.version" = "2.0-SNAPSHOT"
//!
//! [[dependencies]]
//! group = "com.example"        # defaults to the module's group
//! artifact = "core-utils"
//! version = "${core.version}"
//! ```

use super::{DependencyRef, ModuleDescriptor, ModuleId, ProjectLoader, VersionStamp};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::utils::normalize_path;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, value};

/// Manifest file name
pub const MANIFEST_FILE: &str = "module.toml";

#[derive(Debug, Deserialize)]
struct ManifestFile {
  module: ModuleSection,
  #[serde(default)]
  parent: Option<ReferenceSection>,
  #[serde(default)]
  properties: BTreeMap<String, String>,
  #[serde(default)]
  dependencies: Vec<ReferenceSection>,
}

#[derive(Debug, Deserialize)]
struct ModuleSection {
  #[serde(default)]
  group: Option<String>,
  artifact: String,
  version: String,
  #[serde(default)]
  modules: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ReferenceSection {
  #[serde(default)]
  group: Option<String>,
  artifact: String,
  #[serde(default)]
  version: Option<String>,
  #[serde(default)]
  path: Option<PathBuf>,
}

/// Loader for `module.toml` trees
pub struct ManifestLoader;

impl ManifestLoader {
  pub fn new() -> Self {
    Self
  }

  fn load_tree(
    &self,
    root: &Path,
    relative: &Path,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<ModuleDescriptor>,
  ) -> ReleaseResult<()> {
    if !visited.insert(relative.to_path_buf()) {
      return Err(ReleaseError::message(format!(
        "Module directory {} is listed more than once",
        relative.display()
      )));
    }

    let manifest_rel = relative.join(MANIFEST_FILE);
    let manifest_abs = root.join(&manifest_rel);
    let content =
      fs::read_to_string(&manifest_abs).with_context(|| format!("Failed to read {}", manifest_abs.display()))?;
    let parsed: ManifestFile =
      toml_edit::de::from_str(&content).with_context(|| format!("Failed to parse {}", manifest_abs.display()))?;

    let group = parsed
      .module
      .group
      .clone()
      .or_else(|| parsed.parent.as_ref().and_then(|p| p.group.clone()))
      .ok_or_else(|| {
        ReleaseError::with_help(
          format!("{} declares no group", manifest_rel.display()),
          "Set [module].group or give the [parent] a group to inherit",
        )
      })?;

    let parent = parsed
      .parent
      .map(|p| to_reference(p, &group, relative))
      .transpose()?;
    let dependencies = parsed
      .dependencies
      .into_iter()
      .map(|d| to_reference(d, &group, relative))
      .collect::<ReleaseResult<Vec<_>>>()?;

    out.push(ModuleDescriptor {
      id: ModuleId::new(group, parsed.module.artifact),
      version: parsed.module.version,
      path: relative.to_path_buf(),
      manifest: manifest_rel,
      parent,
      dependencies,
      properties: parsed.properties,
    });

    for child in parsed.module.modules {
      let child_rel = normalize_path(&relative.join(&child));
      if child_rel.starts_with("..") {
        return Err(ReleaseError::message(format!(
          "Module {} lists {} which is outside the project root",
          relative.display(),
          child.display()
        )));
      }
      self.load_tree(root, &child_rel, visited, out)?;
    }

    Ok(())
  }
}

impl Default for ManifestLoader {
  fn default() -> Self {
    Self::new()
  }
}

fn to_reference(section: ReferenceSection, default_group: &str, module_dir: &Path) -> ReleaseResult<DependencyRef> {
  if let Some(version) = &section.version
    && version.trim().is_empty()
  {
    return Err(ReleaseError::message(format!(
      "Reference to {} in {} has an empty version",
      section.artifact,
      module_dir.display()
    )));
  }

  Ok(DependencyRef {
    id: ModuleId::new(section.group.unwrap_or_else(|| default_group.to_string()), section.artifact),
    version: section.version,
    path: section.path.map(|p| normalize_path(&module_dir.join(p))),
  })
}

impl ProjectLoader for ManifestLoader {
  fn name(&self) -> &'static str {
    "manifest"
  }

  fn can_handle(&self, root: &Path) -> bool {
    root.join(MANIFEST_FILE).is_file()
  }

  fn load(&self, root: &Path) -> ReleaseResult<Vec<ModuleDescriptor>> {
    let mut modules = Vec::new();
    let mut visited = HashSet::new();
    self.load_tree(root, Path::new(""), &mut visited, &mut modules)?;
    Ok(modules)
  }

  fn write_versions(&self, root: &Path, module: &ModuleDescriptor, stamp: &VersionStamp) -> ReleaseResult<PathBuf> {
    let path = root.join(&module.manifest);
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc: DocumentMut = content
      .parse()
      .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(version) = stamp.version_of(&module.id) {
      doc["module"]["version"] = value(version);
    }

    if let Some(parent) = &module.parent
      && let Some(version) = stamp.version_of(&parent.id)
      && let Some(table) = doc.get_mut("parent").and_then(Item::as_table_like_mut)
    {
      table.insert("version", value(version));
    }

    if let Some(deps) = doc.get_mut("dependencies").and_then(Item::as_array_of_tables_mut) {
      for dep in deps.iter_mut() {
        let Some(artifact) = dep.get("artifact").and_then(Item::as_str) else {
          continue;
        };
        let group = dep
          .get("group")
          .and_then(Item::as_str)
          .unwrap_or(&module.id.group);
        let id = ModuleId::new(group, artifact);
        if let Some(version) = stamp.version_of(&id) {
          dep.insert("version", value(version));
        }
      }
    }

    fs::write(&path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(module.manifest.clone())
  }
}
