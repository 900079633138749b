//! # Driving Ports (API - Inbound)
//!
//! What a repository exposes per declared method: a [`RepositoryQuery`]
//! that executes with call values and yields a [`QueryOutput`].

use crate::domain::entities::{ProposalResponse, ResultSet, TransactionEvent};
use crate::domain::parameters::ParamValue;
use crate::errors::ChaincodeError;
use crate::mapping::ChaincodeEntity;
use crate::query_method::QueryMethodDescriptor;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;

/// Pending commit event returned by `Future<Event>` methods.
pub type PendingEvent = BoxFuture<'static, Result<TransactionEvent, ChaincodeError>>;

/// Value returned by a repository method, shaped by its return type.
pub enum QueryOutput {
    /// No result (missing envelope or blank payload).
    Null,
    /// Commit event still pending.
    Pending(PendingEvent),
    /// Commit event.
    Event(TransactionEvent),
    /// Raw result envelope.
    Envelope(ResultSet),
    /// Per-peer responses of an install.
    Responses(Vec<ProposalResponse>),
    /// Text payload or transaction id.
    Text(String),
    /// Domain object.
    Entity(Box<dyn ChaincodeEntity>),
}

impl QueryOutput {
    /// Returns true for [`QueryOutput::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text result, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrows the domain object as `T`.
    #[must_use]
    pub fn entity_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Entity(entity) => entity.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Takes the domain object as `T`.
    #[must_use]
    pub fn into_entity<T: 'static>(self) -> Option<T> {
        match self {
            Self::Entity(entity) => entity.into_any().downcast::<T>().ok().map(|boxed| *boxed),
            _ => None,
        }
    }

    /// Takes the envelope.
    #[must_use]
    pub fn into_envelope(self) -> Option<ResultSet> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Takes the commit event.
    #[must_use]
    pub fn into_event(self) -> Option<TransactionEvent> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    /// Takes the pending commit event.
    #[must_use]
    pub fn into_pending(self) -> Option<PendingEvent> {
        match self {
            Self::Pending(pending) => Some(pending),
            _ => None,
        }
    }

    /// Takes the per-peer responses.
    #[must_use]
    pub fn into_responses(self) -> Option<Vec<ProposalResponse>> {
        match self {
            Self::Responses(responses) => Some(responses),
            _ => None,
        }
    }
}

impl fmt::Debug for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::Envelope(envelope) => f.debug_tuple("Envelope").field(envelope).finish(),
            Self::Responses(responses) => f.debug_tuple("Responses").field(responses).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Entity(entity) => f.debug_tuple("Entity").field(entity).finish(),
        }
    }
}

/// One executable repository method.
#[async_trait]
pub trait RepositoryQuery: Send + Sync {
    /// Descriptor resolved when the repository was built.
    fn descriptor(&self) -> &QueryMethodDescriptor;

    /// Executes the method with the given call values.
    async fn execute(&self, params: &[ParamValue]) -> Result<QueryOutput, ChaincodeError>;
}
