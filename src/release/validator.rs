//! Pre-release validation
//!
//! Problems are accumulated, never short-circuited: one run reports every
//! dirty file and every bad reference together.

use crate::core::vcs::Repository;
use crate::graph::DependencyGraph;
use crate::project::{DependencyRef, ModuleDescriptor};
use crate::release::version::is_non_final;
use crate::utils::path_to_git_format;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Nesting limit for `${...}` properties that refer to other properties
const MAX_PROPERTY_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationCategory {
  UncommittedChanges,
  SnapshotReferences,
  Io,
}

impl ValidationCategory {
  fn title(self) -> &'static str {
    match self {
      ValidationCategory::UncommittedChanges => {
        "Cannot release with uncommitted changes. Please check the following files:"
      }
      ValidationCategory::SnapshotReferences => {
        "Cannot release with references to snapshot dependencies. The following dependency errors were found:"
      }
      ValidationCategory::Io => "Cannot release because the repository could not be inspected:",
    }
  }
}

/// Accumulated validation problems, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
  problems: BTreeMap<ValidationCategory, Vec<String>>,
}

impl ValidationResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, category: ValidationCategory, message: impl Into<String>) {
    self.problems.entry(category).or_default().push(message.into());
  }

  pub fn merge(&mut self, other: ValidationResult) {
    for (category, messages) in other.problems {
      self.problems.entry(category).or_default().extend(messages);
    }
  }

  /// Total number of problems across categories
  pub fn len(&self) -> usize {
    self.problems.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn messages(&self, category: ValidationCategory) -> &[String] {
    self.problems.get(&category).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn help_message(&self) -> Option<String> {
    let mut hints = Vec::new();
    if !self.messages(ValidationCategory::UncommittedChanges).is_empty() {
      hints.push("Commit, stash or delete the listed files (untracked files count too).");
    }
    if !self.messages(ValidationCategory::SnapshotReferences).is_empty() {
      hints.push("Release the referenced modules first, or point the references at released versions.");
    }
    if hints.is_empty() {
      None
    } else {
      Some(hints.join(" "))
    }
  }
}

impl fmt::Display for ValidationResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (category, messages) in &self.problems {
      if !first {
        writeln!(f)?;
      }
      first = false;
      write!(f, "{}", category.title())?;
      for message in messages {
        write!(f, "\n * {}", message)?;
      }
    }
    Ok(())
  }
}

/// Every modified, staged or untracked path is one problem, except `ignored` ones
pub fn check_working_tree(repo: &dyn Repository, ignored: &[PathBuf]) -> ValidationResult {
  let ignored: Vec<String> = ignored.iter().map(|p| path_to_git_format(p)).collect();
  let mut result = ValidationResult::new();
  match repo.working_tree_status() {
    Ok(status) => {
      for path in status.dirty.into_iter().filter(|p| !ignored.contains(p)) {
        result.add(ValidationCategory::UncommittedChanges, path);
      }
    }
    Err(err) => result.add(ValidationCategory::Io, err.to_string()),
  }
  result
}

/// Reject references to non-final versions of modules outside the project.
///
/// Versions written as `${property}` are resolved first, through the module's
/// own properties and then its in-project parent chain.
pub fn validate_snapshots(graph: &DependencyGraph) -> ValidationResult {
  let mut result = ValidationResult::new();

  for module in graph.modules() {
    let parent = module.parent.iter().map(|p| (true, p));
    let dependencies = module.dependencies.iter().map(|d| (false, d));

    for (is_parent, reference) in parent.chain(dependencies) {
      if graph.contains(&reference.id) {
        continue;
      }
      let Some(declared) = &reference.version else {
        continue;
      };

      match resolve_properties(graph, module, declared, 0) {
        Ok(version) if is_non_final(&version) => {
          result.add(
            ValidationCategory::SnapshotReferences,
            snapshot_message(module, reference, &version, is_parent),
          );
        }
        Ok(_) => {}
        Err(reason) => {
          result.add(
            ValidationCategory::SnapshotReferences,
            format!(
              "{} references dependency {} with an unresolvable version: {}",
              module.id, reference.id, reason
            ),
          );
        }
      }
    }
  }

  result
}

fn snapshot_message(module: &ModuleDescriptor, reference: &DependencyRef, version: &str, is_parent: bool) -> String {
  if is_parent {
    format!(
      "The parent of {} is {} at a non-final version ({}), but {} is not part of this release set",
      module.id, reference.id, version, reference.id
    )
  } else {
    format!(
      "{} references dependency {} at a non-final version ({}), but {} is not part of this release set",
      module.id, reference.id, version, reference.id
    )
  }
}

/// Expand every `${name}` in `text`
fn resolve_properties(
  graph: &DependencyGraph,
  module: &ModuleDescriptor,
  text: &str,
  depth: usize,
) -> Result<String, String> {
  if depth > MAX_PROPERTY_DEPTH {
    return Err(format!("properties nested too deeply while expanding '{}'", text));
  }

  let mut resolved = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(start) = rest.find("${") {
    resolved.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    let end = after
      .find('}')
      .ok_or_else(|| format!("unclosed property in '{}'", text))?;
    let name = &after[..end];
    let value = lookup_property(graph, module, name).ok_or_else(|| format!("property ${{{}}} is not defined", name))?;
    resolved.push_str(&resolve_properties(graph, module, &value, depth + 1)?);
    rest = &after[end + 1..];
  }
  resolved.push_str(rest);
  Ok(resolved)
}

fn lookup_property(graph: &DependencyGraph, module: &ModuleDescriptor, name: &str) -> Option<String> {
  if name == "project.version" {
    return Some(module.version.clone());
  }

  let mut current = Some(module);
  while let Some(m) = current {
    if let Some(value) = m.properties.get(name) {
      return Some(value.clone());
    }
    current = m.parent.as_ref().and_then(|p| graph.module(&p.id));
  }
  None
}
