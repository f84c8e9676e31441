//! # Structured Logging Module
//!
//! Console-oriented structured logging for debugging compiled query plans.
//! Filtering is driven by the `PARAMQUERY_LOG` environment variable
//! (standard `EnvFilter` syntax), defaulting to `info`.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber. Idempotent: repeated calls, or a
/// subscriber already installed by the embedding application, are not
/// errors.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env("PARAMQUERY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized, continuing");
        }
    });
}
