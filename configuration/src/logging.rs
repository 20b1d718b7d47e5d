use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{AppConfig, LogFormat};

/// Installs the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
///
/// Calling it again after a subscriber is installed is a no-op, which keeps
/// test binaries that boot several applications working.
pub fn setup_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .with_current_span(false),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            level = %config.logging.level,
            format = ?config.logging.format,
            "logging initialized"
        );
    }
}
