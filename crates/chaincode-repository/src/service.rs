//! # Operation Dispatcher
//!
//! [`StringBasedChaincodeQuery`] executes one declared repository method:
//!
//! 1. serializes parameters when the method asks for it
//! 2. resolves the argument template (or passes values through)
//! 3. extracts transient data from domain-object parameters
//! 4. builds the per-kind criteria
//! 5. calls the [`ChaincodeOperations`] port
//! 6. shapes the response according to the method's [`ReturnShape`]
//!
//! Collaborator failures are wrapped in [`ChaincodeError::Operation`] with
//! the method name and kind. Nothing is retried.

use crate::binding::pass_through;
use crate::classifier::ReturnShape;
use crate::criteria_builder::OperationCriteriaBuilder;
use crate::domain::criteria::Criteria;
use crate::domain::entities::ResultSet;
use crate::domain::method::OperationAttributes;
use crate::domain::parameters::{ParamValue, ParameterAccessor};
use crate::domain::value_objects::{is_blank, TransactionId};
use crate::errors::{ChaincodeError, OperationError, SerializationError};
use crate::mapping::{ChaincodeEntity, EntityType, MappingContext};
use crate::ports::inbound::{QueryOutput, RepositoryQuery};
use crate::ports::outbound::{ChaincodeOperations, TransactionFuture};
use crate::query_method::QueryMethodDescriptor;
use crate::serialization::SerializationProvider;
use crate::transient::TransientDataExtractor;
use async_trait::async_trait;
use futures::{FutureExt, TryFutureExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Executes one repository method against the chaincode operations port.
pub struct StringBasedChaincodeQuery {
    descriptor: QueryMethodDescriptor,
    identity: Criteria,
    operations: Arc<dyn ChaincodeOperations>,
    mapping: Arc<MappingContext>,
    transient: TransientDataExtractor,
}

impl StringBasedChaincodeQuery {
    /// Creates the query for a resolved method.
    #[must_use]
    pub fn new(
        descriptor: QueryMethodDescriptor,
        identity: Criteria,
        operations: Arc<dyn ChaincodeOperations>,
        mapping: Arc<MappingContext>,
        transient: TransientDataExtractor,
    ) -> Self {
        Self {
            descriptor,
            identity,
            operations,
            mapping,
            transient,
        }
    }

    /// Final argument list for one call.
    ///
    /// # Errors
    ///
    /// `Serialization` if a parameter cannot be encoded, `Binding` or
    /// `Evaluation` if the template cannot be resolved.
    pub fn create_query(&self, params: &[ParamValue]) -> Result<Vec<String>, ChaincodeError> {
        let serialization = self.descriptor.serialization();
        let values = if serialization.mode.serializes_parameters() {
            params
                .iter()
                .map(|param| serialization.provider.serialize_param(param).map(ParamValue::Text))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| self.serialization_error(source))?
        } else {
            params.to_vec()
        };

        match self.descriptor.template() {
            Some(resolver) => resolver.resolve(&ParameterAccessor::new(self.descriptor.parameters(), &values)),
            None => Ok(pass_through(&values)),
        }
    }

    #[instrument(
        skip(self, params),
        fields(method = %self.descriptor.name(), kind = %self.descriptor.kind())
    )]
    async fn dispatch(&self, params: &[ParamValue]) -> Result<QueryOutput, ChaincodeError> {
        let args = self.create_query(params)?;
        let transient_data = self.transient.extract(params);
        let config = self.operations.config(&self.identity);
        let builder = OperationCriteriaBuilder::new(&self.identity, &config, self.operations.as_ref());

        let descriptor = &self.descriptor;
        let func = descriptor.func();
        let proposal = descriptor.proposal();
        let transaction = descriptor.transaction();

        info!(
            func,
            channel = self.identity.channel(),
            chaincode = self.identity.name(),
            args = args.len(),
            "Dispatching chaincode operation"
        );
        debug!(?args, transient_keys = transient_data.len(), "Resolved call");

        match descriptor.operation() {
            OperationAttributes::Install(install) => {
                let (criteria, source) = builder.install(install, proposal, transient_data)?;
                let envelope = self
                    .operations
                    .install_for(&criteria, &source)
                    .await
                    .map_err(|source| self.operation_error(source))?;
                self.shape_install(envelope)
            }
            OperationAttributes::Instantiate(deploy) => {
                let criteria = builder.instantiate(deploy, proposal, transaction, transient_data)?;
                match descriptor.return_shape() {
                    ReturnShape::FutureEvent => {
                        Ok(self.pending(self.operations.instantiate_async(criteria, func.to_string(), args)))
                    }
                    ReturnShape::Event => self
                        .operations
                        .instantiate_for(&criteria, func, &args)
                        .await
                        .map(QueryOutput::Event)
                        .map_err(|source| self.operation_error(source)),
                    _ => {
                        let envelope = self
                            .operations
                            .instantiate(&criteria, func, &args)
                            .await
                            .map_err(|source| self.operation_error(source))?;
                        self.shape_result(envelope)
                    }
                }
            }
            OperationAttributes::Upgrade(deploy) => {
                let criteria = builder.upgrade(deploy, proposal, transaction, transient_data)?;
                match descriptor.return_shape() {
                    ReturnShape::FutureEvent => {
                        Ok(self.pending(self.operations.upgrade_async(criteria, func.to_string(), args)))
                    }
                    ReturnShape::Event => self
                        .operations
                        .upgrade_for(&criteria, func, &args)
                        .await
                        .map(QueryOutput::Event)
                        .map_err(|source| self.operation_error(source)),
                    _ => {
                        let envelope = self
                            .operations
                            .upgrade(&criteria, func, &args)
                            .await
                            .map_err(|source| self.operation_error(source))?;
                        self.shape_result(envelope)
                    }
                }
            }
            OperationAttributes::Invoke => {
                let criteria = builder.invoke(proposal, transaction, transient_data)?;
                match descriptor.return_shape() {
                    ReturnShape::FutureEvent => {
                        Ok(self.pending(self.operations.invoke_async(criteria, func.to_string(), args)))
                    }
                    ReturnShape::Event => self
                        .operations
                        .invoke_for(&criteria, func, &args)
                        .await
                        .map(QueryOutput::Event)
                        .map_err(|source| self.operation_error(source)),
                    _ => {
                        let envelope = self
                            .operations
                            .invoke(&criteria, func, &args)
                            .await
                            .map_err(|source| self.operation_error(source))?;
                        self.shape_result(envelope)
                    }
                }
            }
            OperationAttributes::Query => {
                let criteria = builder.query(proposal, transient_data)?;
                let envelope = self
                    .operations
                    .query_for(&criteria, func, &args)
                    .await
                    .map_err(|source| self.operation_error(source))?;
                self.shape_result(envelope)
            }
        }
    }

    /// Wraps the collaborator's pending event; it is not polled here.
    fn pending(&self, future: TransactionFuture) -> QueryOutput {
        let method = self.descriptor.name().to_string();
        let kind = self.descriptor.kind();
        QueryOutput::Pending(
            future
                .map_err(move |source| ChaincodeError::Operation { method, kind, source })
                .boxed(),
        )
    }

    fn shape_install(&self, envelope: Option<ResultSet>) -> Result<QueryOutput, ChaincodeError> {
        let Some(envelope) = envelope else {
            return Ok(QueryOutput::Null);
        };

        match self.descriptor.return_shape() {
            ReturnShape::ProposalResponses => Ok(QueryOutput::Responses(envelope.responses().to_vec())),
            ReturnShape::Text => Ok(QueryOutput::Text(envelope.transaction_id().to_string())),
            ReturnShape::Domain(entity_type) => {
                self.domain_result(&envelope, entity_type, self.result_provider())
            }
            ReturnShape::RawEnvelope | ReturnShape::Scalar => Ok(QueryOutput::Envelope(envelope)),
            ReturnShape::FutureEvent | ReturnShape::Event => Err(ChaincodeError::UnsupportedOperation(
                format!("method '{}': install cannot return an event", self.descriptor.name()),
            )),
        }
    }

    fn shape_result(&self, envelope: Option<ResultSet>) -> Result<QueryOutput, ChaincodeError> {
        let Some(envelope) = envelope else {
            return Ok(QueryOutput::Null);
        };

        match self.descriptor.return_shape() {
            ReturnShape::RawEnvelope => Ok(QueryOutput::Envelope(envelope)),
            ReturnShape::Domain(entity_type) => {
                self.domain_result(&envelope, entity_type, self.result_provider())
            }
            ReturnShape::Text | ReturnShape::Scalar
                if self.descriptor.serialization().mode.deserializes_result() =>
            {
                self.scalar_result(&envelope)
            }
            _ => Ok(envelope
                .result()
                .map_or(QueryOutput::Null, |payload| QueryOutput::Text(payload.to_string()))),
        }
    }

    /// Method provider in deserialize mode, JSON otherwise.
    fn result_provider(&self) -> SerializationProvider {
        let serialization = self.descriptor.serialization();
        if serialization.mode.deserializes_result() {
            serialization.provider.clone()
        } else {
            SerializationProvider::default()
        }
    }

    /// Decodes a text or scalar payload with the method's provider.
    fn scalar_result(&self, envelope: &ResultSet) -> Result<QueryOutput, ChaincodeError> {
        let Some(payload) = envelope.payload() else {
            return Ok(QueryOutput::Null);
        };

        let value = self
            .descriptor
            .serialization()
            .provider
            .serialization()
            .deserialize(payload)
            .map_err(|source| self.serialization_error(source))?;

        Ok(match value {
            Value::Null => QueryOutput::Null,
            Value::String(text) => QueryOutput::Text(text),
            other => QueryOutput::Text(other.to_string()),
        })
    }

    fn domain_result(
        &self,
        envelope: &ResultSet,
        entity_type: &EntityType,
        provider: SerializationProvider,
    ) -> Result<QueryOutput, ChaincodeError> {
        let Some(payload) = envelope.payload() else {
            debug!(entity = entity_type.name(), "Blank payload, returning null");
            return Ok(QueryOutput::Null);
        };

        let mut entity = provider
            .deserialize_entity(payload, entity_type)
            .map_err(|source| self.serialization_error(source))?;
        self.bind_transaction_id(&mut *entity, entity_type, envelope.transaction_id())?;
        Ok(QueryOutput::Entity(entity))
    }

    /// Writes the transaction id into the entity's id property.
    ///
    /// Entities without mapping metadata are returned untouched.
    fn bind_transaction_id(
        &self,
        entity: &mut dyn ChaincodeEntity,
        entity_type: &EntityType,
        transaction_id: &TransactionId,
    ) -> Result<(), ChaincodeError> {
        let Some(persistent) = self.mapping.persistent_entity(entity_type.type_id()) else {
            debug!(entity = entity_type.name(), "No mapping metadata, transaction id not bound");
            return Ok(());
        };

        let id = persistent.id_property().ok_or_else(|| ChaincodeError::MissingIdProperty {
            entity: entity_type.name().to_string(),
        })?;

        if is_blank(transaction_id.as_str()) {
            debug!(entity = entity_type.name(), "Blank transaction id, not bound");
            return Ok(());
        }

        if id.bind(entity.as_any_mut(), transaction_id) {
            debug!(entity = entity_type.name(), property = id.name(), %transaction_id, "Bound transaction id");
            Ok(())
        } else {
            Err(ChaincodeError::IdBinding {
                entity: entity_type.name().to_string(),
                property: id.name().to_string(),
            })
        }
    }

    fn operation_error(&self, source: OperationError) -> ChaincodeError {
        ChaincodeError::Operation {
            method: self.descriptor.name().to_string(),
            kind: self.descriptor.kind(),
            source,
        }
    }

    fn serialization_error(&self, source: SerializationError) -> ChaincodeError {
        ChaincodeError::Serialization {
            method: self.descriptor.name().to_string(),
            source,
        }
    }
}

#[async_trait]
impl RepositoryQuery for StringBasedChaincodeQuery {
    fn descriptor(&self) -> &QueryMethodDescriptor {
        &self.descriptor
    }

    async fn execute(&self, params: &[ParamValue]) -> Result<QueryOutput, ChaincodeError> {
        self.dispatch(params).await
    }
}

impl std::fmt::Debug for StringBasedChaincodeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringBasedChaincodeQuery")
            .field("method", &self.descriptor.name())
            .field("kind", &self.descriptor.kind())
            .field("shape", self.descriptor.return_shape())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
