// Logging setup for the binaries
//
// Library code logs through the `log` facade. The subscriber's tracing-log
// bridge picks those records up, filtered by RUST_LOG.

use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber. `default_filter` applies when
/// RUST_LOG is unset or invalid. Calling this twice is harmless.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
