//! Logging configuration from environment variables.

use std::env;

/// Configuration for repository logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Include file and line of the call site
    pub with_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "chaincode-repository".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CC_SERVICE_NAME`: Service name (default: chaincode-repository)
    /// - `CC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CC_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `CC_LOG_LOCATION`: Include file/line in output (default: false)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CC_SERVICE_NAME")
                .unwrap_or_else(|_| "chaincode-repository".to_string()),

            log_level: env::var("CC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            with_location: env::var("CC_LOG_LOCATION")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Configuration used by test suites: debug level, plain text.
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chaincode-repository");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_for_tests() {
        let config = TelemetryConfig::for_tests();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service_name, "chaincode-repository");
    }
}
