//! Log subscriber setup for the `penepma-rs` binary.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a `fmt` subscriber writing to stderr.
///
/// The filter is read from `RUST_LOG` and defaults to `info`, for example
/// `RUST_LOG=penepma_core=debug` to see forcer recalculations and the chosen
/// depth-distribution transitions.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}
