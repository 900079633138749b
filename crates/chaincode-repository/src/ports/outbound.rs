//! # Driven Ports (SPI - Outbound)
//!
//! The chaincode operations collaborator: the only component that talks to
//! the network. Adapters implement [`ChaincodeOperations`]; the repository
//! core never sends anything itself.
//!
//! - `*` methods return the result envelope of the proposal
//! - `*_for` methods wait for the commit event
//! - `*_async` methods return the pending commit event without waiting

use crate::domain::criteria::{
    Criteria, InstallCriteria, InstantiateCriteria, InvokeCriteria, QueryCriteria, UpgradeCriteria,
};
use crate::domain::entities::{ChaincodeConfig, Organization, ResultSet, TransactionEvent};
use crate::errors::OperationError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::path::Path;

/// Pending commit event, owned by the caller.
///
/// Completion, cancellation and timeout belong to the collaborator.
pub type TransactionFuture = BoxFuture<'static, Result<TransactionEvent, OperationError>>;

/// Chaincode lifecycle and transaction operations.
#[async_trait]
pub trait ChaincodeOperations: Send + Sync {
    /// Installs chaincode from `source_location`.
    async fn install_for(
        &self,
        criteria: &InstallCriteria,
        source_location: &Path,
    ) -> Result<Option<ResultSet>, OperationError>;

    /// Instantiates chaincode and returns the proposal envelope.
    async fn instantiate(
        &self,
        criteria: &InstantiateCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError>;

    /// Instantiates chaincode and waits for the commit event.
    async fn instantiate_for(
        &self,
        criteria: &InstantiateCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError>;

    /// Instantiates chaincode without waiting.
    fn instantiate_async(
        &self,
        criteria: InstantiateCriteria,
        func: String,
        args: Vec<String>,
    ) -> TransactionFuture;

    /// Upgrades chaincode and returns the proposal envelope.
    async fn upgrade(
        &self,
        criteria: &UpgradeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError>;

    /// Upgrades chaincode and waits for the commit event.
    async fn upgrade_for(
        &self,
        criteria: &UpgradeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError>;

    /// Upgrades chaincode without waiting.
    fn upgrade_async(&self, criteria: UpgradeCriteria, func: String, args: Vec<String>) -> TransactionFuture;

    /// Submits a transaction and returns the proposal envelope.
    async fn invoke(
        &self,
        criteria: &InvokeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError>;

    /// Submits a transaction and waits for the commit event.
    async fn invoke_for(
        &self,
        criteria: &InvokeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError>;

    /// Submits a transaction without waiting.
    fn invoke_async(&self, criteria: InvokeCriteria, func: String, args: Vec<String>) -> TransactionFuture;

    /// Evaluates a read-only proposal.
    async fn query_for(
        &self,
        criteria: &QueryCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError>;

    /// Organization of the criteria's channel and org, with its users.
    fn organization(&self, criteria: &Criteria) -> Option<Organization>;

    /// File-system configuration for the criteria.
    fn config(&self, criteria: &Criteria) -> ChaincodeConfig;
}
