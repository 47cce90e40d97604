//! Progress indicators for long-running operations
//!
//! Uses `linya` progress bars (drawn on stderr)

use linya::{Bar, Progress};

/// Progress bar for per-module steps (tag creation)
pub struct ModuleProgress {
  progress: Progress,
  bar: Bar,
}

impl ModuleProgress {
  /// Create a new progress bar over `total` modules
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
