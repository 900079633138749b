//! # Return-Type Classifier
//!
//! Maps a method's declared return type to the response strategy the
//! dispatcher uses. Runs once per method when the repository is built.

use crate::domain::method::ReturnType;
use crate::domain::value_objects::OperationKind;
use crate::errors::ChaincodeError;
use crate::mapping::EntityType;

/// Response strategy of a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    /// Dispatch asynchronously, hand back the pending event.
    FutureEvent,
    /// Dispatch and wait for the commit event.
    Event,
    /// Return the result envelope as is.
    RawEnvelope,
    /// Return the per-peer proposal responses (install only).
    ProposalResponses,
    /// Text result.
    Text,
    /// Number, boolean or unit result.
    Scalar,
    /// Domain object result.
    Domain(EntityType),
}

impl ReturnShape {
    /// Returns true for the branches that produce a commit event.
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::FutureEvent | Self::Event)
    }
}

/// Classifies `return_type` for a method of the given kind.
pub fn classify(kind: OperationKind, return_type: &ReturnType) -> Result<ReturnShape, ChaincodeError> {
    let shape = match return_type {
        ReturnType::Future(inner) if **inner == ReturnType::Event => ReturnShape::FutureEvent,
        ReturnType::Future(inner) => {
            return Err(unsupported(kind, &format!("Future<{inner:?}>")));
        }
        ReturnType::Event => ReturnShape::Event,
        ReturnType::ResultSet => ReturnShape::RawEnvelope,
        ReturnType::Collection(inner) if **inner == ReturnType::ProposalResponse => {
            ReturnShape::ProposalResponses
        }
        ReturnType::Collection(_) | ReturnType::ProposalResponse => {
            return Err(unsupported(kind, &format!("{return_type:?}")));
        }
        ReturnType::String => ReturnShape::Text,
        ReturnType::Primitive | ReturnType::Unit => ReturnShape::Scalar,
        ReturnType::Entity(entity) => ReturnShape::Domain(*entity),
    };

    let allowed = match kind {
        OperationKind::Install => !shape.is_event(),
        OperationKind::Query => !shape.is_event() && shape != ReturnShape::ProposalResponses,
        OperationKind::Instantiate | OperationKind::Upgrade | OperationKind::Invoke => {
            shape != ReturnShape::ProposalResponses
        }
    };

    if allowed {
        Ok(shape)
    } else {
        Err(unsupported(kind, &format!("{return_type:?}")))
    }
}

fn unsupported(kind: OperationKind, declared: &str) -> ChaincodeError {
    ChaincodeError::UnsupportedOperation(format!("{kind} cannot return {declared}"))
}
