//! Utility functions for cross-platform path handling

use std::path::{Component, Path, PathBuf};

/// Convert a path to Git format (always forward slashes)
///
/// Porcelain status and pathspecs both use `/`, so project-relative paths are
/// compared in this form.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Lexically normalize a relative path: drop `.` and fold `dir/..` pairs.
///
/// Leading `..` components that cannot be folded are kept, so callers can
/// detect paths escaping their base. The project root normalizes to an empty path.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut parts: Vec<Component<'_>> = Vec::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match parts.last() {
        Some(Component::Normal(_)) => {
          parts.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => parts.push(component),
      },
      other => parts.push(other),
    }
  }

  parts.iter().collect()
}

/// Whether `path` lies strictly below `ancestor` (both project-relative)
pub fn is_nested_under(path: &Path, ancestor: &Path) -> bool {
  path != ancestor && path.starts_with(ancestor)
}
