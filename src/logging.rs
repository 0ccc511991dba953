//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber with an env filter.
/// Default level is `info`; override with the `RUST_LOG` env var.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
