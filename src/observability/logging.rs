//! Structured logging.
//!
//! Initializes the tracing subscriber from the configured level. The
//! `RUST_LOG` environment variable, when set, wins over configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
pub fn init_logging(log_level: &str) {
    let default_directive = format!("authgate={0},tower_http={0}", log_level);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
