//! # Serialization Bridge
//!
//! Pluggable encode/decode of domain objects, selected per method. JSON is
//! the default provider; YAML and caller-supplied providers are also
//! supported.

use crate::domain::parameters::ParamValue;
use crate::errors::{ConfigError, SerializationError};
use crate::mapping::{ChaincodeEntity, EntityType};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A serialization format for domain objects.
pub trait EntitySerialization: Send + Sync + fmt::Debug {
    /// Encodes a JSON value tree.
    fn serialize(&self, value: &Value) -> Result<String, SerializationError>;

    /// Decodes a payload into a JSON value tree.
    fn deserialize(&self, payload: &str) -> Result<Value, SerializationError>;
}

/// JSON provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerialization;

impl EntitySerialization for JsonSerialization {
    fn serialize(&self, value: &Value) -> Result<String, SerializationError> {
        serde_json::to_string(value).map_err(|e| SerializationError::Encode(e.to_string()))
    }

    fn deserialize(&self, payload: &str) -> Result<Value, SerializationError> {
        serde_json::from_str(payload).map_err(|e| SerializationError::Format(e.to_string()))
    }
}

/// YAML provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlSerialization;

impl EntitySerialization for YamlSerialization {
    fn serialize(&self, value: &Value) -> Result<String, SerializationError> {
        serde_yaml::to_string(value).map_err(|e| SerializationError::Encode(e.to_string()))
    }

    fn deserialize(&self, payload: &str) -> Result<Value, SerializationError> {
        serde_yaml::from_str(payload).map_err(|e| SerializationError::Format(e.to_string()))
    }
}

static JSON: JsonSerialization = JsonSerialization;
static YAML: YamlSerialization = YamlSerialization;

/// Provider selected by a method.
#[derive(Clone, Debug, Default)]
pub enum SerializationProvider {
    /// [`JsonSerialization`].
    #[default]
    Json,
    /// [`YamlSerialization`].
    Yaml,
    /// Caller-supplied format.
    Custom(Arc<dyn EntitySerialization>),
}

impl SerializationProvider {
    /// The format implementation.
    #[must_use]
    pub fn serialization(&self) -> &dyn EntitySerialization {
        match self {
            Self::Json => &JSON,
            Self::Yaml => &YAML,
            Self::Custom(custom) => custom.as_ref(),
        }
    }

    /// Encodes a call parameter.
    pub fn serialize_param(&self, value: &ParamValue) -> Result<String, SerializationError> {
        let json = value
            .to_json()
            .map_err(|e| SerializationError::Encode(e.to_string()))?;
        self.serialization().serialize(&json)
    }

    /// Decodes a payload into an instance of `entity_type`.
    pub fn deserialize_entity(
        &self,
        payload: &str,
        entity_type: &EntityType,
    ) -> Result<Box<dyn ChaincodeEntity>, SerializationError> {
        let value = self.serialization().deserialize(payload)?;
        entity_type
            .decode(value)
            .map_err(|e| SerializationError::Entity {
                entity: entity_type.name().to_string(),
                reason: e.to_string(),
            })
    }
}

impl FromStr for SerializationProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" | "gson" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}
