// Logging setup shared by both binaries.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when the variable is unset. Stdout is left to the interactive output.
pub fn init_subscriber(default_filter: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
