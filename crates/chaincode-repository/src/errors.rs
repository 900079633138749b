//! # Error Types
//!
//! All error types for chaincode repository dispatch.

use crate::domain::value_objects::OperationKind;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// REPOSITORY ERRORS
// =============================================================================

/// Top-level error returned by repository methods.
#[derive(Debug, Error)]
pub enum ChaincodeError {
    /// Argument template could not be bound.
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    /// Embedded template expression could not be evaluated.
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Method shape or repository type that this layer does not dispatch.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Auxiliary configuration file with an unrecognized extension.
    #[error("unsupported configuration format '{extension}': {path}")]
    UnsupportedFormat {
        /// File that was rejected.
        path: PathBuf,
        /// Extension found on the file (may be empty).
        extension: String,
    },

    /// The chaincode operations collaborator failed.
    #[error("chaincode {kind} failed for method '{method}': {source}")]
    Operation {
        /// Repository method being executed.
        method: String,
        /// Operation kind that was dispatched.
        kind: OperationKind,
        /// Collaborator error.
        #[source]
        source: OperationError,
    },

    /// Parameter serialization or result deserialization failed.
    #[error("serialization failed for method '{method}': {source}")]
    Serialization {
        /// Repository method being executed.
        method: String,
        /// Underlying serializer error.
        #[source]
        source: SerializationError,
    },

    /// Descriptor or collection configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A user was requested but the organization lookup returned nothing.
    #[error("organization not found: channel '{channel}', org '{org}'")]
    OrganizationNotFound {
        /// Channel of the repository criteria.
        channel: String,
        /// Organization of the repository criteria.
        org: String,
    },

    /// Result entity has mapping metadata but no id property.
    #[error("entity '{entity}' has no id property for the transaction id")]
    MissingIdProperty {
        /// Entity type name.
        entity: String,
    },

    /// Id setter rejected the deserialized object.
    #[error("failed to write transaction id into '{entity}.{property}'")]
    IdBinding {
        /// Entity type name.
        entity: String,
        /// Id property name.
        property: String,
    },
}

impl ChaincodeError {
    /// Returns true if the error was raised before any remote call was made.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Binding(_)
                | Self::Evaluation(_)
                | Self::UnsupportedOperation(_)
                | Self::UnsupportedFormat { .. }
                | Self::Config(_)
        )
    }
}

// =============================================================================
// OPERATION ERRORS
// =============================================================================

/// Errors raised by the chaincode operations collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Proposal was rejected by the peers.
    #[error("proposal failed: {0}")]
    ProposalFailed(String),

    /// Not enough endorsements were collected.
    #[error("endorsement failed: {failed} of {total} peers rejected the proposal")]
    EndorsementFailed {
        /// Number of failed responses.
        failed: usize,
        /// Number of peers asked.
        total: usize,
    },

    /// Transaction event did not arrive within the wait budget.
    #[error("transaction wait timeout after {wait_ms}ms")]
    Timeout {
        /// Wait budget in milliseconds.
        wait_ms: u64,
    },

    /// Network or peer unavailable.
    #[error("chaincode network unavailable: {0}")]
    Unavailable(String),

    /// Other collaborator failure.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// BINDING ERRORS
// =============================================================================

/// Errors from ordinal placeholder substitution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// `?N` refers to a value that does not exist.
    #[error("placeholder ?{index} out of bounds: {len} values bound")]
    IndexOutOfBounds {
        /// Index in the template.
        index: usize,
        /// Number of bound values.
        len: usize,
    },

    /// `?N` digits do not fit an index.
    #[error("invalid placeholder index: ?{0}")]
    InvalidIndex(String),
}

/// Errors from `?#{...}` expression evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Expression opened but never closed.
    #[error("unterminated expression at position {position}")]
    Unterminated {
        /// Byte offset of `?#{`.
        position: usize,
    },

    /// Expression text does not parse.
    #[error("syntax error in '{expression}': {reason}")]
    Syntax {
        /// Expression source.
        expression: String,
        /// What went wrong.
        reason: String,
    },

    /// `[i]` past the end of the parameter list.
    #[error("parameter index {index} out of bounds: {len} parameters")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Parameter count.
        len: usize,
    },

    /// `#name` does not name a declared parameter.
    #[error("unknown parameter '#{0}'")]
    UnknownParameter(String),

    /// `.property` missing on the target.
    #[error("no property '{property}' on {target}")]
    NoSuchProperty {
        /// Property requested.
        property: String,
        /// Description of the target value.
        target: String,
    },

    /// Property navigation on a null value.
    #[error("cannot read property '{0}' of null")]
    NullNavigation(String),
}

// =============================================================================
// SERIALIZATION ERRORS
// =============================================================================

/// Errors from the serialization bridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Value could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Payload is not valid for the provider format.
    #[error("decode failed: {0}")]
    Format(String),

    /// Payload decoded but does not fit the declared entity.
    #[error("payload does not match entity '{entity}': {reason}")]
    Entity {
        /// Declared entity type.
        entity: String,
        /// Decoder message.
        reason: String,
    },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors loading descriptor and collection configuration files.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// File content is not valid.
    #[error("cannot parse {path}: {error}")]
    Parse {
        /// Path (or `<inline>`) of the content.
        path: String,
        /// Parser message.
        error: String,
    },

    /// Return type names an entity that was never registered.
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),

    /// Return type string not recognized.
    #[error("unknown return type '{0}'")]
    UnknownReturnType(String),

    /// Serialization provider name not recognized.
    #[error("unknown serialization provider '{0}'")]
    UnknownProvider(String),

    /// A required setting has no value.
    #[error("missing configuration: {0}")]
    Missing(String),
}

// =============================================================================
// ACCESS ERRORS
// =============================================================================

/// Soft failures reading a mapped entity field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Mapping names a field with no registered accessor.
    #[error("no accessor registered for field '{0}'")]
    MissingAccessor(String),

    /// Accessor was handed a value of another type.
    #[error("field '{field}' expects a {expected}")]
    TypeMismatch {
        /// Field being read.
        field: String,
        /// Entity type the accessor was registered for.
        expected: &'static str,
    },
}

// =============================================================================
// TESTS
// =============================================================================
