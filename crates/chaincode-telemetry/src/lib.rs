//! # Chaincode Telemetry
//!
//! Structured logging for chaincode repositories, built on `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chaincode_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CC_SERVICE_NAME` | `chaincode-repository` | Service name in logs |
//! | `CC_LOG_LEVEL` | `info` | Log level filter |
//! | `CC_JSON_LOGS` | `false` | JSON output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}
