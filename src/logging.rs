//! Diagnostic logging setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding the log filter, e.g. `debug` or `shell_explain::extract=debug`.
pub const LOG_ENV: &str = "SHELL_EXPLAIN_LOG";

/// Filter used when `SHELL_EXPLAIN_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber. Calling it twice is a no-op.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init();
}
