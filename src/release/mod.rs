//! Release planning and execution
//!
//! # Core Invariants
//!
//! 1. **A module is never built before its dependencies**
//!    - The build plan follows the graph's topological order
//!
//! 2. **A released dependency releases its dependents**
//!    - Propagation runs to a fixed point, parents included
//!
//! 3. **Tags are all-or-nothing**
//!    - Every tag is checked for collisions before the build starts
//!    - Tags are written only after the whole build succeeded
//!    - A failure while tagging removes the tags of that run
//!
//! # Pipeline
//!
//! - **validator**: uncommitted files, snapshot references
//! - **resolver**: change detection, propagation, next versions
//! - **plan**: ordered, versioned build plan
//! - **tags**: tag names, collision pre-flight, creation with rollback
//! - **invoker**: external build tool
//! - **record**: last-release bookkeeping (change-detection baselines)
//! - **reactor**: graph + validator + resolver in one pass

pub mod invoker;
pub mod plan;
pub mod reactor;
pub mod record;
pub mod resolver;
pub mod tags;
pub mod validator;
pub mod version;

pub use plan::BuildPlan;
pub use reactor::ReactorOptions;
