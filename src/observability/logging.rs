//! Structured logging.
//!
//! Uses the tracing crate. The filter comes from `RUST_LOG` when set,
//! otherwise from the configured level scoped to this crate.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("poolstake={level},reqwest=warn")
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
