//! Error types for release-reactor with contextual messages and exit codes
//!
//! Every fatal outcome of a run maps onto one `ReleaseError` category. Categories
//! that can describe many problems at once (validation, tag collisions) carry
//! every offending item so a single run reports all of them together.

use crate::release::validator::ValidationResult;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-reactor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Validation failure (dirty tree, snapshot references, tag collisions, graph errors)
  Validation = 3,
  /// The external build tool failed
  Build = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-reactor
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// Repository access errors (diff/tag/status queries)
  Git(GitError),

  /// Dependency graph errors
  Graph(GraphError),

  /// Accumulated validation problems
  Validation(ValidationResult),

  /// One or more planned tags already exist
  TagCollision(Vec<TagCollision>),

  /// External build invocation failed
  Build { command: String, exit_code: Option<i32> },

  /// I/O errors
  Io(io::Error),

  /// Any other error, with a note on what was being done
  Context { context: String, source: Box<ReleaseError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      other => ReleaseError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Graph(_) => ExitCode::Validation,
      ReleaseError::Validation(_) => ExitCode::Validation,
      ReleaseError::TagCollision(_) => ExitCode::Validation,
      ReleaseError::Build { .. } => ExitCode::Build,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Context { source, .. } => source.exit_code(),
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Graph(e) => e.help_message(),
      ReleaseError::Validation(result) => result.help_message(),
      ReleaseError::TagCollision(_) => Some(
        "Bump the declared version of the listed modules or delete the stale tags, then re-run the release."
          .to_string(),
      ),
      ReleaseError::Build { .. } => {
        Some("Nothing was tagged. Fix the build and re-run the release; the plan is recomputed from scratch.".to_string())
      }
      ReleaseError::Context { source, .. } => source.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Graph(e) => write!(f, "{}", e),
      ReleaseError::Validation(result) => write!(f, "{}", result),
      ReleaseError::TagCollision(collisions) => {
        write!(f, "Cannot release because {} tag(s) already exist:", collisions.len())?;
        for collision in collisions {
          write!(f, "\n * {}", collision)?;
        }
        Ok(())
      }
      ReleaseError::Build { command, exit_code } => match exit_code {
        Some(code) => write!(f, "Build command `{}` returned code {}", command, code),
        None => write!(f, "Build command `{}` was terminated by a signal", command),
      },
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Context { context, source } => write!(f, "{}\n{}", source, context),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<GraphError> for ReleaseError {
  fn from(err: GraphError) -> Self {
    ReleaseError::Graph(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<cargo_metadata::Error> for ReleaseError {
  fn from(err: cargo_metadata::Error) -> Self {
    ReleaseError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Convert anyhow::Error to ReleaseError (test helpers and glue code)
impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config value is present but unusable
  Invalid { field: String, reason: String },

  /// A forced module name does not match any module in the project
  UnknownModule { name: String, available: Vec<String> },

  /// No loader recognised the project layout
  UnsupportedProject { root: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Check release.toml against the documented sections.".to_string()),
      ConfigError::UnknownModule { available, .. } => Some(format!("Known modules: {}", available.join(", "))),
      ConfigError::UnsupportedProject { .. } => Some(
        "Supported layouts: a Cargo workspace (Cargo.toml) or a module tree rooted at module.toml.".to_string(),
      ),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { field, reason } => write!(f, "Invalid configuration for `{}`: {}", field, reason),
      ConfigError::UnknownModule { name, .. } => {
        write!(f, "Module '{}' was requested for release but is not part of this project", name)
      }
      ConfigError::UnsupportedProject { root } => {
        write!(f, "Could not detect a supported project layout at {}", root.display())
      }
    }
  }
}

/// Repository access errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Pushing tags failed
  PushFailed { remote: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your credentials for the remote. Local tags were created; push them manually.".to_string())
        } else {
          Some("Local tags were created; push them manually once the remote is reachable.".to_string())
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run the release from inside a git working tree or pass -C: {}",
        path.display()
      )),
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::RepoNotFound { path } => write!(f, "Git repository not found at: {}", path.display()),
      GitError::PushFailed { remote, reason } => write!(f, "Pushing tags to {} failed: {}", remote, reason.trim_end()),
    }
  }
}

/// Dependency graph errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// Modules depend on each other in a loop; `path` starts and ends with the same module
  Cycle { path: Vec<String> },

  /// A reference marked as internal (by path) does not match any module
  UnresolvedReference { module: String, reference: String },

  /// Two modules share one identity
  DuplicateModule { id: String },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::Cycle { .. } => Some("Remove one of the dependencies in the cycle.".to_string()),
      GraphError::UnresolvedReference { .. } => {
        Some("Add the referenced module to the project or drop its path so it is treated as external.".to_string())
      }
      GraphError::DuplicateModule { .. } => Some("Every module needs a unique group and artifact.".to_string()),
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::Cycle { path } => write!(f, "Dependency cycle detected: {}", path.join(" -> ")),
      GraphError::UnresolvedReference { module, reference } => write!(
        f,
        "{} references {} as a project module, but no such module exists",
        module, reference
      ),
      GraphError::DuplicateModule { id } => write!(f, "Module {} is declared more than once", id),
    }
  }
}

/// A planned tag that already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCollision {
  pub module: String,
  pub version: String,
  pub tag: String,
  /// Where the tag was found ("local", "remote" or "plan")
  pub location: &'static str,
}

impl fmt::Display for TagCollision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {}: tag {} already exists ({})",
      self.module, self.version, self.tag, self.location
    )
  }
}

/// Result type alias for release-reactor
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
