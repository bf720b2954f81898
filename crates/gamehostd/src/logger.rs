//! Logging setup for the daemon binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the tracing subscriber.
///
/// `default_level` applies to the daemon and every `gamehost` crate.
/// `RUST_LOG` overrides it entirely.
pub fn setup_logger(default_level: &str) {
    let default_filter = [
        "gamehostd",
        "gamehost",
        "gamehost_transport",
        "gamehost_protocol",
        "gamehost_store",
        "gamehost_catalog",
        "gamehost_queue",
    ]
    .iter()
    .map(|target| format!("{target}={default_level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
