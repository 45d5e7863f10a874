use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the process-wide tracing subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();
}
