//! Diagnostic tracing
//!
//! User-facing progress is printed by the commands on stdout. Tracing is for
//! diagnostics only: stderr, compact, filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `release_reactor=debug` with `--verbose`.
///
/// ```bash
/// RUST_LOG=release_reactor=debug release-reactor next
/// ```
pub fn init(verbose: bool) {
  let default = if verbose { "release_reactor=debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
    .init();
}
