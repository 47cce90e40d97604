//! Cargo workspace loader
//!
//! Workspace members become modules, grouped by the registry they publish to.
//! A path dependency is matched to the member living in that directory.
//! Dev-dependencies are not part of a published crate and are left out of the graph.
//!
//! Stamping covers member manifests (target-specific tables included) and the
//! path entries of the root `[workspace.dependencies]` table.

use super::{DependencyRef, ModuleDescriptor, ModuleId, ProjectLoader, VersionStamp};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::utils::normalize_path;
use cargo_metadata::{DependencyKind, MetadataCommand};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike, value};

/// Registry name used when a crate does not name one
pub const DEFAULT_REGISTRY: &str = "crates-io";

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "build-dependencies", "dev-dependencies"];

/// Loader for Cargo workspaces
pub struct CargoLoader;

impl CargoLoader {
  pub fn new() -> Self {
    Self
  }
}

impl Default for CargoLoader {
  fn default() -> Self {
    Self::new()
  }
}

impl ProjectLoader for CargoLoader {
  fn name(&self) -> &'static str {
    "cargo"
  }

  fn can_handle(&self, root: &Path) -> bool {
    root.join("Cargo.toml").is_file()
  }

  fn load(&self, root: &Path) -> ReleaseResult<Vec<ModuleDescriptor>> {
    let metadata = MetadataCommand::new()
      .manifest_path(root.join("Cargo.toml"))
      .no_deps()
      .exec()?;
    let workspace_root = metadata.workspace_root.clone().into_std_path_buf();

    let mut packages = metadata.workspace_packages();
    packages.sort_by(|a, b| a.manifest_path.cmp(&b.manifest_path));

    // Member directory -> identity, so path dependencies link up whatever registry they name
    let mut members: BTreeMap<PathBuf, ModuleId> = BTreeMap::new();
    for pkg in &packages {
      let manifest = relative_to(&workspace_root, pkg.manifest_path.as_std_path())?;
      let dir = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
      let group = match pkg.publish.as_deref() {
        Some([registry]) => registry.clone(),
        _ => DEFAULT_REGISTRY.to_string(),
      };
      members.insert(dir, ModuleId::new(group, pkg.name.to_string()));
    }

    let mut modules = Vec::with_capacity(packages.len());
    for pkg in packages {
      let manifest = relative_to(&workspace_root, pkg.manifest_path.as_std_path())?;
      let path = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
      let Some(id) = members.get(&path).cloned() else {
        continue;
      };

      let dependencies = pkg
        .dependencies
        .iter()
        .filter(|dep| dep.kind != DependencyKind::Development)
        .map(|dep| -> ReleaseResult<DependencyRef> {
          let dep_path = match &dep.path {
            Some(p) => Some(relative_to(&workspace_root, p.as_std_path())?),
            None => None,
          };
          let id = match dep_path.as_ref().and_then(|p| members.get(p)) {
            Some(member) => member.clone(),
            None => {
              let registry = dep.registry.clone().unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
              ModuleId::new(registry, dep.name.clone())
            }
          };
          Ok(DependencyRef {
            id,
            version: Some(dep.req.to_string()),
            path: dep_path,
          })
        })
        .collect::<ReleaseResult<Vec<_>>>()?;

      modules.push(ModuleDescriptor {
        id,
        version: pkg.version.to_string(),
        path,
        manifest,
        parent: None,
        dependencies,
        properties: BTreeMap::new(),
      });
    }

    Ok(modules)
  }

  fn write_versions(&self, root: &Path, module: &ModuleDescriptor, stamp: &VersionStamp) -> ReleaseResult<PathBuf> {
    let path = root.join(&module.manifest);
    let mut doc = read_manifest(&path)?;

    if let Some(version) = stamp.version_of(&module.id) {
      let package = doc
        .get_mut("package")
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| ReleaseError::message(format!("No [package] section in {}", module.manifest.display())))?;
      if package.get("version").is_some_and(|v| !v.is_str()) {
        return Err(ReleaseError::message(format!(
          "{} inherits its version from the workspace; release versions can only be stamped into literal versions",
          module.manifest.display()
        )));
      }
      package.insert("version", value(version));
    }

    let by_name = versions_by_name(stamp);
    for table_name in DEPENDENCY_TABLES {
      if let Some(table) = doc.get_mut(table_name).and_then(Item::as_table_like_mut) {
        stamp_path_dependencies(table, &by_name);
      }
    }
    if let Some(targets) = doc.get_mut("target").and_then(Item::as_table_like_mut) {
      for (_, target) in targets.iter_mut() {
        let Some(target) = target.as_table_like_mut() else {
          continue;
        };
        for table_name in DEPENDENCY_TABLES {
          if let Some(table) = target.get_mut(table_name).and_then(Item::as_table_like_mut) {
            stamp_path_dependencies(table, &by_name);
          }
        }
      }
    }

    fs::write(&path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(module.manifest.clone())
  }

  /// Members inheriting `dep = { workspace = true }` take the requirement from
  /// the root `[workspace.dependencies]` table, so its path entries move too.
  fn write_shared_versions(&self, root: &Path, stamp: &VersionStamp) -> ReleaseResult<Vec<PathBuf>> {
    let manifest = PathBuf::from("Cargo.toml");
    let path = root.join(&manifest);
    let mut doc = read_manifest(&path)?;

    let Some(table) = doc
      .get_mut("workspace")
      .and_then(Item::as_table_like_mut)
      .and_then(|workspace| workspace.get_mut("dependencies"))
      .and_then(Item::as_table_like_mut)
    else {
      return Ok(Vec::new());
    };
    if stamp_path_dependencies(table, &versions_by_name(stamp)) == 0 {
      return Ok(Vec::new());
    }

    fs::write(&path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(vec![manifest])
  }
}

fn read_manifest(path: &Path) -> ReleaseResult<DocumentMut> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  content
    .parse::<DocumentMut>()
    .with_context(|| format!("Failed to parse {}", path.display()))
}

fn versions_by_name(stamp: &VersionStamp) -> BTreeMap<&str, &str> {
  stamp
    .versions
    .iter()
    .map(|(id, v)| (id.artifact.as_str(), v.as_str()))
    .collect()
}

/// Set the version of every path dependency that names a stamped crate.
/// Returns how many entries were updated.
fn stamp_path_dependencies(table: &mut dyn TableLike, by_name: &BTreeMap<&str, &str>) -> usize {
  let mut stamped = 0;
  for (key, item) in table.iter_mut() {
    // Only path dependencies point at workspace members
    let Some(dep) = item.as_table_like_mut() else {
      continue;
    };
    if dep.get("path").is_none() {
      continue;
    }
    let name = dep
      .get("package")
      .and_then(Item::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| key.get().to_string());
    if let Some(version) = by_name.get(name.as_str()) {
      dep.insert("version", value(*version));
      stamped += 1;
    }
  }
  stamped
}

fn relative_to(root: &Path, path: &Path) -> ReleaseResult<PathBuf> {
  path
    .strip_prefix(root)
    .map(normalize_path)
    .map_err(|_| ReleaseError::message(format!("{} is outside the workspace root {}", path.display(), root.display())))
}
