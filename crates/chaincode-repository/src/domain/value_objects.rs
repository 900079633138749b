//! # Value Objects
//!
//! Small immutable primitives shared by criteria, descriptors and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// OPERATION KIND
// =============================================================================

/// The five chaincode operations a repository method can dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Install chaincode source on peers.
    Install,
    /// Instantiate installed chaincode on a channel.
    Instantiate,
    /// Upgrade instantiated chaincode.
    Upgrade,
    /// Submit a transaction.
    Invoke,
    /// Evaluate a read-only proposal.
    Query,
}

impl OperationKind {
    /// Returns true for kinds that end in an ordered transaction.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Instantiate | Self::Upgrade | Self::Invoke)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Instantiate => "instantiate",
            Self::Upgrade => "upgrade",
            Self::Invoke => "invoke",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SERIALIZATION MODE
// =============================================================================

/// Which direction of the serialization bridge a method uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationMode {
    /// Neither parameters nor results go through the provider.
    #[default]
    None,
    /// Parameters are serialized before binding.
    Serialize,
    /// Results are deserialized with the method's provider.
    Deserialize,
    /// Both directions.
    All,
}

impl SerializationMode {
    /// Parameters are serialized before template binding.
    #[must_use]
    pub fn serializes_parameters(&self) -> bool {
        matches!(self, Self::Serialize | Self::All)
    }

    /// Results are deserialized with the method's provider.
    #[must_use]
    pub fn deserializes_result(&self) -> bool {
        matches!(self, Self::Deserialize | Self::All)
    }
}

// =============================================================================
// CHAINCODE LANGUAGE
// =============================================================================

/// Chaincode implementation language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeType {
    /// Go chaincode.
    #[default]
    Golang,
    /// Java chaincode.
    Java,
    /// Node.js chaincode.
    Node,
}

impl fmt::Display for ChaincodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Golang => f.write_str("GO_LANG"),
            Self::Java => f.write_str("JAVA"),
            Self::Node => f.write_str("NODE"),
        }
    }
}

// =============================================================================
// TRANSACTION ID
// =============================================================================

/// Transaction identifier generated for a proposal.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier bytes (UTF-8).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// REPOSITORY ID TYPE
// =============================================================================

/// Declared id type of a repository's domain entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IdType {
    /// `String` ids.
    #[default]
    String,
    /// No concrete id type.
    Untyped,
    /// Any other id type, by name.
    Other(String),
}

impl FromStr for IdType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "string" | "String" => Self::String,
            "" | "object" | "Object" | "untyped" => Self::Untyped,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Returns true when the string is empty or whitespace only.
#[must_use]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// `value` unless blank, otherwise `default`.
#[must_use]
pub fn default_if_blank<'a>(value: &'a str, default: &'a str) -> &'a str {
    if is_blank(value) {
        default
    } else {
        value
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_mode_directions() {
        assert!(!SerializationMode::None.serializes_parameters());
        assert!(!SerializationMode::None.deserializes_result());
        assert!(SerializationMode::Serialize.serializes_parameters());
        assert!(!SerializationMode::Serialize.deserializes_result());
        assert!(SerializationMode::Deserialize.deserializes_result());
        assert!(SerializationMode::All.serializes_parameters());
        assert!(SerializationMode::All.deserializes_result());
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Instantiate.to_string(), "instantiate");
        assert!(OperationKind::Invoke.is_transactional());
        assert!(!OperationKind::Query.is_transactional());
        assert!(!OperationKind::Install.is_transactional());
    }

    #[test]
    fn test_id_type_parse() {
        assert_eq!("String".parse::<IdType>().unwrap(), IdType::String);
        assert_eq!("".parse::<IdType>().unwrap(), IdType::Untyped);
        assert_eq!(
            "u64".parse::<IdType>().unwrap(),
            IdType::Other("u64".to_string())
        );
    }

    #[test]
    fn test_default_if_blank() {
        assert_eq!(default_if_blank("  ", "findById"), "findById");
        assert_eq!(default_if_blank("query", "findById"), "query");
    }

    #[test]
    fn test_transaction_id_bytes() {
        let tx = TransactionId::new("abc");
        assert_eq!(tx.as_bytes(), b"abc");
        assert_eq!(format!("{tx:?}"), "tx:abc");
    }
}
