//! # In-Memory Chaincode Operations
//!
//! Scripted [`ChaincodeOperations`] for tests and local development.
//! Records every call with its criteria and answers with scripted envelopes.
//! A production adapter would talk to peers and the orderer instead.

use crate::domain::criteria::{
    Criteria, InstallCriteria, InstantiateCriteria, InvokeCriteria, QueryCriteria, TransientData,
    UpgradeCriteria,
};
use crate::domain::entities::{ChaincodeConfig, Organization, ResultSet, TransactionEvent};
use crate::domain::value_objects::{OperationKind, TransactionId};
use crate::errors::OperationError;
use crate::ports::outbound::{ChaincodeOperations, TransactionFuture};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// How an operation was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    /// Envelope returned.
    Envelope,
    /// Waited for the commit event.
    Event,
    /// Pending commit event returned.
    Async,
}

/// Criteria a call was made with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCriteria {
    /// Install.
    Install(InstallCriteria),
    /// Instantiate.
    Instantiate(InstantiateCriteria),
    /// Upgrade.
    Upgrade(UpgradeCriteria),
    /// Invoke.
    Invoke(InvokeCriteria),
    /// Query.
    Query(QueryCriteria),
}

impl RecordedCriteria {
    /// Transient data sent with the proposal.
    #[must_use]
    pub fn transient_data(&self) -> &TransientData {
        match self {
            Self::Install(c) => &c.proposal.transient_data,
            Self::Instantiate(c) => &c.proposal.transient_data,
            Self::Upgrade(c) => &c.proposal.transient_data,
            Self::Invoke(c) => &c.proposal.transient_data,
            Self::Query(c) => &c.proposal.transient_data,
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        match self {
            Self::Install(c) => c.criteria(),
            Self::Instantiate(c) => c.criteria(),
            Self::Upgrade(c) => c.criteria(),
            Self::Invoke(c) => c.criteria(),
            Self::Query(c) => c.criteria(),
        }
    }
}

/// One recorded call.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Operation kind.
    pub kind: OperationKind,
    /// Call mode.
    pub mode: CallMode,
    /// Contract function (empty for install).
    pub func: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Install source location.
    pub source_location: Option<PathBuf>,
    /// Criteria snapshot.
    pub criteria: RecordedCriteria,
}

/// Scripted chaincode operations.
#[derive(Debug, Default)]
pub struct InMemoryChaincodeOperations {
    organization: Option<Organization>,
    config: ChaincodeConfig,
    responses: RwLock<HashMap<OperationKind, Option<ResultSet>>>,
    failure: RwLock<Option<OperationError>>,
    calls: RwLock<Vec<RecordedCall>>,
    async_gate: Option<Arc<Notify>>,
    sequence: AtomicU64,
}

impl InMemoryChaincodeOperations {
    /// Creates an adapter with no organization and empty paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the organization returned for user lookups.
    #[must_use]
    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organization = Some(organization);
        self
    }

    /// Sets the file-system configuration.
    #[must_use]
    pub fn with_config(mut self, config: ChaincodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Holds every pending event until `gate` is notified.
    #[must_use]
    pub fn with_async_gate(mut self, gate: Arc<Notify>) -> Self {
        self.async_gate = Some(gate);
        self
    }

    /// Scripts the envelope returned for `kind`.
    pub fn respond(&self, kind: OperationKind, response: Option<ResultSet>) {
        self.responses.write().insert(kind, response);
    }

    /// Makes every following call fail.
    pub fn fail_with(&self, error: OperationError) {
        *self.failure.write() = Some(error);
    }

    /// All recorded calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().clone()
    }

    /// Most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.read().last().cloned()
    }

    fn record(
        &self,
        kind: OperationKind,
        mode: CallMode,
        func: &str,
        args: &[String],
        source_location: Option<&Path>,
        criteria: RecordedCriteria,
    ) {
        self.calls.write().push(RecordedCall {
            kind,
            mode,
            func: func.to_string(),
            args: args.to_vec(),
            source_location: source_location.map(Path::to_path_buf),
            criteria,
        });
    }

    fn check_failure(&self) -> Result<(), OperationError> {
        match self.failure.read().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn envelope(&self, kind: OperationKind) -> Result<Option<ResultSet>, OperationError> {
        self.check_failure()?;
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self
            .responses
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Some(ResultSet::new(None, format!("tx-{seq}")))))
    }

    fn event(&self, kind: OperationKind, criteria: &Criteria) -> Result<TransactionEvent, OperationError> {
        let block_number = self.sequence.load(Ordering::SeqCst) + 1;
        let transaction_id = self
            .envelope(kind)?
            .map_or_else(|| TransactionId::new(format!("tx-{block_number}")), |r| r.transaction_id().clone());

        Ok(TransactionEvent {
            transaction_id,
            channel: criteria.channel().to_string(),
            block_number,
            valid: true,
            peer: "peer0".to_string(),
        })
    }

    fn pending(&self, outcome: Result<TransactionEvent, OperationError>) -> TransactionFuture {
        let gate = self.async_gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            outcome
        })
    }
}

#[async_trait]
impl ChaincodeOperations for InMemoryChaincodeOperations {
    async fn install_for(
        &self,
        criteria: &InstallCriteria,
        source_location: &Path,
    ) -> Result<Option<ResultSet>, OperationError> {
        self.record(
            OperationKind::Install,
            CallMode::Envelope,
            "",
            &[],
            Some(source_location),
            RecordedCriteria::Install(criteria.clone()),
        );
        self.envelope(OperationKind::Install)
    }

    async fn instantiate(
        &self,
        criteria: &InstantiateCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError> {
        self.record(
            OperationKind::Instantiate,
            CallMode::Envelope,
            func,
            args,
            None,
            RecordedCriteria::Instantiate(criteria.clone()),
        );
        self.envelope(OperationKind::Instantiate)
    }

    async fn instantiate_for(
        &self,
        criteria: &InstantiateCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError> {
        self.record(
            OperationKind::Instantiate,
            CallMode::Event,
            func,
            args,
            None,
            RecordedCriteria::Instantiate(criteria.clone()),
        );
        self.event(OperationKind::Instantiate, criteria.criteria())
    }

    fn instantiate_async(
        &self,
        criteria: InstantiateCriteria,
        func: String,
        args: Vec<String>,
    ) -> TransactionFuture {
        let outcome = self.event(OperationKind::Instantiate, criteria.criteria());
        self.record(
            OperationKind::Instantiate,
            CallMode::Async,
            &func,
            &args,
            None,
            RecordedCriteria::Instantiate(criteria),
        );
        self.pending(outcome)
    }

    async fn upgrade(
        &self,
        criteria: &UpgradeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError> {
        self.record(
            OperationKind::Upgrade,
            CallMode::Envelope,
            func,
            args,
            None,
            RecordedCriteria::Upgrade(criteria.clone()),
        );
        self.envelope(OperationKind::Upgrade)
    }

    async fn upgrade_for(
        &self,
        criteria: &UpgradeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError> {
        self.record(
            OperationKind::Upgrade,
            CallMode::Event,
            func,
            args,
            None,
            RecordedCriteria::Upgrade(criteria.clone()),
        );
        self.event(OperationKind::Upgrade, criteria.criteria())
    }

    fn upgrade_async(&self, criteria: UpgradeCriteria, func: String, args: Vec<String>) -> TransactionFuture {
        let outcome = self.event(OperationKind::Upgrade, criteria.criteria());
        self.record(
            OperationKind::Upgrade,
            CallMode::Async,
            &func,
            &args,
            None,
            RecordedCriteria::Upgrade(criteria),
        );
        self.pending(outcome)
    }

    async fn invoke(
        &self,
        criteria: &InvokeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError> {
        self.record(
            OperationKind::Invoke,
            CallMode::Envelope,
            func,
            args,
            None,
            RecordedCriteria::Invoke(criteria.clone()),
        );
        self.envelope(OperationKind::Invoke)
    }

    async fn invoke_for(
        &self,
        criteria: &InvokeCriteria,
        func: &str,
        args: &[String],
    ) -> Result<TransactionEvent, OperationError> {
        self.record(
            OperationKind::Invoke,
            CallMode::Event,
            func,
            args,
            None,
            RecordedCriteria::Invoke(criteria.clone()),
        );
        self.event(OperationKind::Invoke, criteria.criteria())
    }

    fn invoke_async(&self, criteria: InvokeCriteria, func: String, args: Vec<String>) -> TransactionFuture {
        let outcome = self.event(OperationKind::Invoke, criteria.criteria());
        self.record(
            OperationKind::Invoke,
            CallMode::Async,
            &func,
            &args,
            None,
            RecordedCriteria::Invoke(criteria),
        );
        self.pending(outcome)
    }

    async fn query_for(
        &self,
        criteria: &QueryCriteria,
        func: &str,
        args: &[String],
    ) -> Result<Option<ResultSet>, OperationError> {
        self.record(
            OperationKind::Query,
            CallMode::Envelope,
            func,
            args,
            None,
            RecordedCriteria::Query(criteria.clone()),
        );
        self.envelope(OperationKind::Query)
    }

    fn organization(&self, _criteria: &Criteria) -> Option<Organization> {
        self.organization.clone()
    }

    fn config(&self, _criteria: &Criteria) -> ChaincodeConfig {
        self.config.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================
