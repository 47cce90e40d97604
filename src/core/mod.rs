//! Core plumbing shared by every command
//!
//! - **config**: release.toml parsing and validation
//! - **context**: per-run context built once in `main`
//! - **error**: error types with contextual help messages
//! - **vcs**: repository facade (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
