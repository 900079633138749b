//! # Operation Criteria
//!
//! Request descriptors handed to the chaincode operations port, one per
//! operation kind. The chaincode identity (`Criteria`) is fixed when the
//! repository is built; everything else is assembled per call.

use crate::domain::entities::{CollectionConfiguration, User};
use crate::domain::value_objects::ChaincodeType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Side-channel data attached to a proposal, keyed by transient key.
pub type TransientData = HashMap<String, Vec<u8>>;

// =============================================================================
// CHAINCODE IDENTITY
// =============================================================================

/// Chaincode identity shared by every call of a repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Criteria {
    channel: String,
    org: String,
    name: String,
    path: String,
    version: String,
    lang: ChaincodeType,
}

impl Criteria {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Organization name.
    #[must_use]
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Chaincode name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chaincode path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Chaincode version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Chaincode language.
    #[must_use]
    pub fn lang(&self) -> ChaincodeType {
        self.lang
    }
}

/// Builder for [`Criteria`]. Later calls overwrite earlier ones.
#[derive(Clone, Debug, Default)]
pub struct CriteriaBuilder {
    inner: Criteria,
}

impl CriteriaBuilder {
    /// Sets the channel.
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.inner.channel = channel.into();
        self
    }

    /// Sets the organization.
    #[must_use]
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.inner.org = org.into();
        self
    }

    /// Sets the chaincode name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Sets the chaincode path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self
    }

    /// Sets the chaincode version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.inner.version = version.into();
        self
    }

    /// Sets the chaincode language.
    #[must_use]
    pub fn lang(mut self, lang: ChaincodeType) -> Self {
        self.inner.lang = lang;
        self
    }

    /// Finishes the identity.
    #[must_use]
    pub fn build(self) -> Criteria {
        self.inner
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

fn wait_budget(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

/// Proposal-level options common to every kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalOptions {
    /// User the proposal is sent on behalf of.
    pub request_user: Option<User>,
    /// User set as the client context.
    pub client_user: Option<User>,
    /// Proposal wait time in milliseconds, 0 = collaborator default.
    pub proposal_wait_time: u64,
    /// Send only to the peers the collaborator selects for this chaincode.
    pub specific_peers: bool,
    /// Transient data.
    pub transient_data: TransientData,
}

impl ProposalOptions {
    /// Explicit proposal wait, if any.
    #[must_use]
    pub fn proposal_wait(&self) -> Option<Duration> {
        wait_budget(self.proposal_wait_time)
    }
}

/// Options for kinds that submit an ordered transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// User that signs the transaction.
    pub transactions_user: Option<User>,
    /// Commit wait time in milliseconds, 0 = collaborator default.
    pub transaction_wait_time: u64,
}

impl TransactionOptions {
    /// Explicit commit wait, if any.
    #[must_use]
    pub fn transaction_wait(&self) -> Option<Duration> {
        wait_budget(self.transaction_wait_time)
    }
}

// =============================================================================
// PER-KIND CRITERIA
// =============================================================================

/// Install request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallCriteria {
    criteria: Criteria,
    /// Proposal options.
    pub proposal: ProposalOptions,
    /// Version to install, when it differs from the repository version.
    pub chaincode_upgrade_version: Option<String>,
    /// Chaincode META-INF directory (couchdb indexes etc.).
    pub chaincode_meta_inf: Option<PathBuf>,
}

impl InstallCriteria {
    /// Creates an install request for the given identity.
    #[must_use]
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            proposal: ProposalOptions::default(),
            chaincode_upgrade_version: None,
            chaincode_meta_inf: None,
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Metadata path, if any.
    #[must_use]
    pub fn meta_inf(&self) -> Option<&Path> {
        self.chaincode_meta_inf.as_deref()
    }
}

/// Instantiate request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiateCriteria {
    criteria: Criteria,
    /// Proposal options.
    pub proposal: ProposalOptions,
    /// Transaction options.
    pub transaction: TransactionOptions,
    /// Endorsement policy file.
    pub endorsement_policy_file: Option<PathBuf>,
    /// Private data collections.
    pub collection_configuration: Option<CollectionConfiguration>,
}

impl InstantiateCriteria {
    /// Creates an instantiate request for the given identity.
    #[must_use]
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            proposal: ProposalOptions::default(),
            transaction: TransactionOptions::default(),
            endorsement_policy_file: None,
            collection_configuration: None,
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

/// Upgrade request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeCriteria {
    criteria: Criteria,
    /// Proposal options.
    pub proposal: ProposalOptions,
    /// Transaction options.
    pub transaction: TransactionOptions,
    /// Endorsement policy file.
    pub endorsement_policy_file: Option<PathBuf>,
    /// Private data collections.
    pub collection_configuration: Option<CollectionConfiguration>,
}

impl UpgradeCriteria {
    /// Creates an upgrade request for the given identity.
    #[must_use]
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            proposal: ProposalOptions::default(),
            transaction: TransactionOptions::default(),
            endorsement_policy_file: None,
            collection_configuration: None,
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

/// Invoke request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeCriteria {
    criteria: Criteria,
    /// Proposal options.
    pub proposal: ProposalOptions,
    /// Transaction options.
    pub transaction: TransactionOptions,
}

impl InvokeCriteria {
    /// Creates an invoke request for the given identity.
    #[must_use]
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            proposal: ProposalOptions::default(),
            transaction: TransactionOptions::default(),
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

/// Query request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryCriteria {
    criteria: Criteria,
    /// Proposal options.
    pub proposal: ProposalOptions,
}

impl QueryCriteria {
    /// Creates a query request for the given identity.
    #[must_use]
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            proposal: ProposalOptions::default(),
        }
    }

    /// Chaincode identity.
    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

// =============================================================================
// TESTS
// =============================================================================
