//! Private data collection configuration files.
//!
//! The parser is chosen by extension (case-insensitive):
//!
//! | Extension | Parser |
//! |-----------|--------|
//! | `yaml`, `yml` | `serde_yaml` |
//! | `json` | `serde_json` |

use crate::domain::entities::CollectionConfiguration;
use crate::errors::{ChaincodeError, ConfigError};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads a collection configuration file.
///
/// # Errors
///
/// `UnsupportedFormat` for any other extension (checked before reading),
/// `Config` if the file cannot be read or parsed.
pub fn load_collection_configuration(path: &Path) -> Result<CollectionConfiguration, ChaincodeError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let parse: fn(&str) -> Result<CollectionConfiguration, String> = match extension.as_str() {
        "yaml" | "yml" => parse_yaml,
        "json" => parse_json,
        _ => {
            return Err(ChaincodeError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.clone(),
            })
        }
    };

    info!(path = %path.display(), "Loading chaincode collection configuration");
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    parse(&content).map_err(|error| {
        ConfigError::Parse {
            path: path.display().to_string(),
            error,
        }
        .into()
    })
}

fn parse_json(content: &str) -> Result<CollectionConfiguration, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

fn parse_yaml(content: &str) -> Result<CollectionConfiguration, String> {
    // Go through a JSON tree so `- StaticCollectionConfig: {...}` maps read
    // the same way as in JSON files.
    let tree: serde_json::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    serde_json::from_value(tree).map_err(|e| e.to_string())
}
