//! Version arithmetic
//!
//! Release versions are dot-separated numeric components (`2.3`, `2.3.1`,
//! `0.4.0`). Declared versions may carry a snapshot or pre-release suffix,
//! which is dropped to obtain the base version.

use crate::core::error::{ReleaseError, ReleaseResult};
use std::cmp::Ordering;
use std::fmt;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Numeric release version
#[derive(Debug, Clone)]
pub struct Version {
  components: Vec<u64>,
}

impl Version {
  /// Parse a plain release version
  pub fn parse(text: &str) -> ReleaseResult<Self> {
    let components = text
      .trim()
      .split('.')
      .map(|part| part.parse::<u64>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| {
        ReleaseError::with_help(
          format!("'{}' is not a release version", text),
          "Release versions are dot-separated numbers such as 1.0 or 2.3.1",
        )
      })?;
    Ok(Self { components })
  }

  /// Parse the base of a declared version (`2.4-SNAPSHOT` -> `2.4`, `0.3.0-rc.1` -> `0.3.0`)
  pub fn from_declared(declared: &str) -> ReleaseResult<Self> {
    Self::parse(base_of(declared))
  }

  /// Increment the component at `position`, padding with zeros and resetting later components
  fn bump(&self, position: usize) -> Self {
    let mut components = self.components.clone();
    if components.len() <= position {
      components.resize(position + 1, 0);
    }
    components[position] += 1;
    for later in components.iter_mut().skip(position + 1) {
      *later = 0;
    }
    Self { components }
  }

  fn component(&self, index: usize) -> u64 {
    self.components.get(index).copied().unwrap_or(0)
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Version {}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

/// Missing trailing components count as zero: `2.4 == 2.4.0`
impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.components.len().max(other.components.len());
    (0..len)
      .map(|i| self.component(i).cmp(&other.component(i)))
      .find(|ord| *ord != Ordering::Equal)
      .unwrap_or(Ordering::Equal)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
    write!(f, "{}", parts.join("."))
  }
}

/// Declared version without its snapshot/pre-release/build suffix
fn base_of(declared: &str) -> &str {
  let declared = declared.trim();
  let end = declared.find(['-', '+']).unwrap_or(declared.len());
  &declared[..end]
}

/// A `-SNAPSHOT` version (case-insensitive)
pub fn is_snapshot(version: &str) -> bool {
  version.trim().to_ascii_uppercase().ends_with(SNAPSHOT_SUFFIX)
}

/// Snapshot versions, and semver versions or requirements naming a pre-release
pub fn is_non_final(version: &str) -> bool {
  if is_snapshot(version) {
    return true;
  }
  version.split(',').any(|requirement| {
    let bare = requirement.trim().trim_start_matches(['=', '^', '~', '>', '<']).trim();
    semver::Version::parse(bare).is_ok_and(|v| !v.pre.is_empty())
  })
}

/// Next release version for a module.
///
/// - First release (`previous` is `None`): the declared base version.
/// - Bugfix: patch component of `previous` incremented.
/// - Otherwise: the declared base if it is ahead of `previous`, else `previous`
///   with its minor component incremented.
pub fn next_version(previous: Option<&str>, declared: &str, bugfix: bool) -> ReleaseResult<String> {
  let declared_base = Version::from_declared(declared)?;
  let Some(previous) = previous else {
    return Ok(declared_base.to_string());
  };

  let previous = Version::parse(previous)?;
  let next = if bugfix {
    previous.bump(2)
  } else if declared_base > previous {
    declared_base
  } else {
    previous.bump(1)
  };
  Ok(next.to_string())
}
