//! Release record: what was released last, and where to diff from next time
//!
//! Stored as JSON next to the project's own metadata (default
//! `.release-info.json`). Each module entry keeps the tag it was last released
//! under; that tag is the change-detection baseline for the next run.

use crate::core::error::{ReleaseResult, ResultExt};
use crate::project::ModuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Bookkeeping from previous releases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
  /// When the last release run finished
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub modules: Vec<ModuleRelease>,
}

/// Last release of one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRelease {
  pub group: String,
  pub artifact: String,
  pub version: String,
  pub tag: String,
  pub release_date: DateTime<Utc>,
  /// Number of times this module has been released
  pub release_count: u32,
}

impl ModuleRelease {
  pub fn id(&self) -> ModuleId {
    ModuleId::new(&self.group, &self.artifact)
  }
}

impl ReleaseInfo {
  pub fn find(&self, id: &ModuleId) -> Option<&ModuleRelease> {
    self.modules.iter().find(|m| m.id() == *id)
  }

  /// Record a release of `id`, replacing its previous entry
  pub fn record(&mut self, id: &ModuleId, version: &str, tag: &str, when: DateTime<Utc>) {
    match self.modules.iter_mut().find(|m| m.id() == *id) {
      Some(entry) => {
        entry.version = version.to_string();
        entry.tag = tag.to_string();
        entry.release_date = when;
        entry.release_count += 1;
      }
      None => self.modules.push(ModuleRelease {
        group: id.group.clone(),
        artifact: id.artifact.clone(),
        version: version.to_string(),
        tag: tag.to_string(),
        release_date: when,
        release_count: 1,
      }),
    }
    self.modules.sort_by(|a, b| (&a.group, &a.artifact).cmp(&(&b.group, &b.artifact)));
    self.release_date = Some(when);
  }
}

/// Load/save of the release record
pub trait ReleaseRecordStore: Send + Sync {
  /// The stored record, or `None` if nothing was ever released
  fn load(&self) -> ReleaseResult<Option<ReleaseInfo>>;

  fn save(&self, info: &ReleaseInfo) -> ReleaseResult<()>;

  /// Location relative to the project root (excluded from change detection)
  fn relative_path(&self) -> &Path;
}

/// JSON file inside the project
pub struct FileRecordStore {
  root: PathBuf,
  relative: PathBuf,
}

impl FileRecordStore {
  pub fn new(root: &Path, relative: impl Into<PathBuf>) -> Self {
    Self {
      root: root.to_path_buf(),
      relative: relative.into(),
    }
  }

  fn path(&self) -> PathBuf {
    self.root.join(&self.relative)
  }
}

impl ReleaseRecordStore for FileRecordStore {
  fn load(&self) -> ReleaseResult<Option<ReleaseInfo>> {
    let path = self.path();
    if !path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let info = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(info))
  }

  fn save(&self, info: &ReleaseInfo) -> ReleaseResult<()> {
    let path = self.path();
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(info)?;
    json.push('\n');
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
  }

  fn relative_path(&self) -> &Path {
    &self.relative
  }
}
