//! Tracing subscriber setup and standard spans.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter when present.
pub fn init(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Standardized span constructors for room log observability.
pub mod spans {
    use tracing::{Span, debug_span};

    /// Span for an operation against one room's log.
    pub fn room(op: &'static str, room: &str) -> Span {
        debug_span!("room", op = op, room = %room)
    }

    /// Span for opening a backing store.
    pub fn store(backend: &str) -> Span {
        debug_span!("store", backend = %backend)
    }
}
