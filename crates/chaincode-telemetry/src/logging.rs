//! Structured logging setup.
//!
//! The repository crate logs with consistent fields so lines can be filtered
//! downstream: `method` (repository method being dispatched) and `kind`
//! (install, instantiate, upgrade, invoke, query).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Install a global `tracing` subscriber.
///
/// Entry point for binaries embedding the repository crate, called once at
/// startup with [`TelemetryConfig::from_env`].
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when another subscriber
/// has been installed first, which test binaries routinely hit.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(())
}

/// Install the test subscriber, ignoring a subscriber that is already set.
pub fn init_test_logging() {
    let _ = init_logging(&TelemetryConfig::for_tests());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_already_initialized() {
        init_test_logging();
        let result = init_logging(&TelemetryConfig::for_tests());
        assert!(matches!(result, Err(TelemetryError::AlreadyInitialized(_))));
    }

    #[test]
    fn test_init_json_logging() {
        let config = TelemetryConfig {
            json_logs: true,
            with_location: true,
            ..TelemetryConfig::default()
        };

        // Another test in this binary may have installed its subscriber first.
        match init_logging(&config) {
            Ok(()) | Err(TelemetryError::AlreadyInitialized(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
        tracing::info!(method = "readMarble", kind = "query", "json line");

        let again = init_logging(&config);
        assert!(matches!(again, Err(TelemetryError::AlreadyInitialized(_))));
    }
}
