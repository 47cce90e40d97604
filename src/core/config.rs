//! Release configuration (release.toml)
//!
//! Every section is optional; a project without a config file releases with
//! the defaults below.
//!
//! ```toml
//! [project]
//! loader = "auto"                  # auto | cargo | manifest
//! record = ".release-info.json"
//!
//! [vcs]
//! remote = "origin"                # enables remote tag checks and pushing
//! push_tags = true
//! require_clean = true
//! commit_record = true
//!
//! [build]
//! command = ["make", "release"]
//! module_args = ["MODULE={path}"]  # {artifact} {group} {path} {version}
//! skip_tests_args = ["SKIP_TESTS=1"]
//!
//! [release]
//! bugfix = false
//! force = ["core-utils"]
//! no_changes = "release-none"      # release-none | release-all | fail
//! ```

use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Placeholders accepted in `build.module_args`
pub const PLACEHOLDERS: [&str; 4] = ["artifact", "group", "path", "version"];

const LOADERS: [&str; 3] = ["auto", "cargo", "manifest"];

/// Configuration for release-reactor
/// Searched in order: release.toml, .release.toml, .config/release.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  #[serde(default)]
  pub project: ProjectConfig,
  #[serde(default)]
  pub vcs: VcsConfig,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub release: ReleaseSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
  /// Project loader to use (default: auto-detect)
  #[serde(default = "default_loader")]
  pub loader: String,

  /// Release record location, relative to the project root
  #[serde(default = "default_record")]
  pub record: PathBuf,
}

fn default_loader() -> String {
  "auto".to_string()
}

fn default_record() -> PathBuf {
  PathBuf::from(".release-info.json")
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      loader: default_loader(),
      record: default_record(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VcsConfig {
  /// Remote to check for existing tags and push new ones to
  #[serde(default)]
  pub remote: Option<String>,

  #[serde(default = "default_true")]
  pub push_tags: bool,

  /// Refuse to release with uncommitted or untracked files
  #[serde(default = "default_true")]
  pub require_clean: bool,

  /// Commit the updated release record after tagging
  #[serde(default = "default_true")]
  pub commit_record: bool,
}

fn default_true() -> bool {
  true
}

impl Default for VcsConfig {
  fn default() -> Self {
    Self {
      remote: None,
      push_tags: true,
      require_clean: true,
      commit_record: true,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
  /// argv of the external build tool
  #[serde(default)]
  pub command: Option<Vec<String>>,

  /// Arguments appended once per released module
  #[serde(default)]
  pub module_args: Option<Vec<String>>,

  /// Arguments appended when tests are skipped
  #[serde(default)]
  pub skip_tests_args: Vec<String>,
}

impl BuildConfig {
  /// Build command for a project, falling back to `cargo build` for Cargo workspaces
  pub fn command_for(&self, loader: &str) -> Option<Vec<String>> {
    match (&self.command, loader) {
      (Some(command), _) => Some(command.clone()),
      (None, "cargo") => Some(vec!["cargo".to_string(), "build".to_string(), "--release".to_string()]),
      (None, _) => None,
    }
  }

  /// Per-module argument template, falling back to `-p {artifact}` for Cargo workspaces
  pub fn module_args_for(&self, loader: &str) -> Vec<String> {
    match (&self.module_args, loader) {
      (Some(args), _) => args.clone(),
      (None, "cargo") => vec!["-p".to_string(), "{artifact}".to_string()],
      (None, _) => Vec::new(),
    }
  }

  fn validate(&self) -> ReleaseResult<()> {
    if let Some(command) = &self.command
      && command.first().is_none_or(|program| program.trim().is_empty())
    {
      return Err(
        ConfigError::Invalid {
          field: "build.command".to_string(),
          reason: "must name a program to run".to_string(),
        }
        .into(),
      );
    }

    for arg in self.module_args.iter().flatten() {
      check_placeholders(arg).map_err(|reason| ConfigError::Invalid {
        field: "build.module_args".to_string(),
        reason,
      })?;
    }
    Ok(())
  }
}

/// What to do when no module changed and nothing was forced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NoChangesPolicy {
  /// Report "nothing to release" and exit successfully
  #[default]
  ReleaseNone,
  /// Release every module
  ReleaseAll,
  /// Treat it as an error
  Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSettings {
  /// Increment the patch component instead of the minor one
  #[serde(default)]
  pub bugfix: bool,

  /// Modules released whether or not they changed
  #[serde(default)]
  pub force: Vec<String>,

  #[serde(default)]
  pub no_changes: NoChangesPolicy,
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = [
      root.join("release.toml"),
      root.join(".release.toml"),
      root.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, or defaults when no config file exists
  pub fn load_or_default(root: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(root) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> ReleaseResult<()> {
    if !LOADERS.contains(&self.project.loader.as_str()) {
      return Err(
        ConfigError::Invalid {
          field: "project.loader".to_string(),
          reason: format!("unknown loader '{}' (expected auto, cargo or manifest)", self.project.loader),
        }
        .into(),
      );
    }

    let record = &self.project.record;
    if record.as_os_str().is_empty()
      || record
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
      return Err(
        ConfigError::Invalid {
          field: "project.record".to_string(),
          reason: format!("'{}' must be a relative path inside the project", record.display()),
        }
        .into(),
      );
    }

    if let Some(remote) = &self.vcs.remote
      && remote.trim().is_empty()
    {
      return Err(
        ConfigError::Invalid {
          field: "vcs.remote".to_string(),
          reason: "must not be empty".to_string(),
        }
        .into(),
      );
    }

    self.build.validate()
  }
}

/// Every `{name}` must be closed and name a known placeholder
fn check_placeholders(template: &str) -> Result<(), String> {
  let mut rest = template;
  while let Some(open) = rest.find('{') {
    let after = &rest[open + 1..];
    let close = after
      .find('}')
      .ok_or_else(|| format!("unclosed placeholder in '{}'", template))?;
    let name = &after[..close];
    if !PLACEHOLDERS.contains(&name) {
      return Err(format!(
        "unknown placeholder {{{}}} in '{}' (expected one of {})",
        name,
        template,
        PLACEHOLDERS.map(|p| format!("{{{}}}", p)).join(", ")
      ));
    }
    rest = &after[close + 1..];
  }
  if rest.contains('}') {
    return Err(format!("unmatched '}}' in '{}'", template));
  }
  Ok(())
}
