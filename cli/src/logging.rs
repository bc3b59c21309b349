//! Diagnostic logging setup.
//!
//! Action lines (`[COPIED]`, `[ERROR]`, ...) are the user-facing output and
//! are printed by the progress reporter. This subscriber only carries the
//! engine's `tracing` diagnostics, always to stderr.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,engine=info,backup=info"
    } else {
        "warn"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise warnings and errors are shown, plus
/// run-level engine events when `verbose` is on.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
