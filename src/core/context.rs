//! Run context - build once, pass everywhere
//!
//! A `RunContext` holds everything one invocation needs: the project root,
//! its configuration, and the collaborators the reactor talks to (repository,
//! project loader, release record). It is built in `main` and passed by
//! reference to every command; nothing else holds per-run state.
//!
//! ```text
//! main.rs:
//!   RunContext::build() -> &RunContext
//!   |
//!   v
//! commands/next.rs, release.rs:
//!   fn run_*(ctx: &RunContext, ...)
//! ```

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::vcs::{Repository, SystemGit};
use crate::project::{ModuleDescriptor, ProjectLoader, detect_loader};
use crate::release::record::{FileRecordStore, ReleaseRecordStore};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct RunContext {
  /// Project root directory (absolute path)
  pub root: PathBuf,

  /// release.toml, or defaults
  pub config: ReleaseConfig,

  pub repo: Box<dyn Repository>,

  pub loader: Box<dyn ProjectLoader>,

  pub records: Box<dyn ReleaseRecordStore>,
}

impl RunContext {
  /// Build the context for a project root.
  ///
  /// Fails when the root is not inside a git repository or no loader
  /// recognises the project layout.
  pub fn build(root: &Path) -> ReleaseResult<Self> {
    let root = root
      .canonicalize()
      .with_context(|| format!("Project root {} does not exist", root.display()))?;
    let config = ReleaseConfig::load_or_default(&root)?;
    let repo = SystemGit::open(&root)?;
    let loader = detect_loader(&root, &config.project.loader)?;
    let records = FileRecordStore::new(&root, config.project.record.clone());

    debug!(
      root = %root.display(),
      work_tree = %repo.work_tree().display(),
      prefix = repo.prefix(),
      loader = loader.name(),
      "run context ready"
    );

    Ok(Self {
      root,
      config,
      repo: Box::new(repo),
      loader,
      records: Box::new(records),
    })
  }

  /// Load every module of the project
  pub fn load_modules(&self) -> ReleaseResult<Vec<ModuleDescriptor>> {
    self
      .loader
      .load(&self.root)
      .with_context(|| format!("Failed to load {} project at {}", self.loader.name(), self.root.display()))
  }
}
