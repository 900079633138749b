//! # Core Domain Entities
//!
//! Users, organizations, configuration and the result types returned by the
//! chaincode operations collaborator.

use crate::domain::value_objects::TransactionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// =============================================================================
// USERS & ORGANIZATIONS
// =============================================================================

/// An enrolled user able to sign proposals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Enrollment name.
    pub name: String,
    /// MSP the user belongs to.
    pub msp_id: String,
    /// Affiliation, if any.
    pub affiliation: Option<String>,
}

impl User {
    /// Creates a user with no affiliation.
    #[must_use]
    pub fn new(name: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            affiliation: None,
        }
    }
}

/// An organization and its enrolled users.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Organization {
    /// Organization name.
    pub name: String,
    /// MSP identifier.
    pub msp_id: String,
    users: HashMap<String, User>,
}

impl Organization {
    /// Creates an organization with no users.
    #[must_use]
    pub fn new(name: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            users: HashMap::new(),
        }
    }

    /// Adds a user, keyed by its name.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.name.clone(), user);
        self
    }

    /// Looks up a user by name.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }
}

// =============================================================================
// CHAINCODE CONFIG
// =============================================================================

/// File-system roots used to resolve chaincode sources and policy files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    /// Default chaincode source location for install.
    pub chaincode_root_path: Option<PathBuf>,
    /// Prefix tried when a configured path does not exist.
    pub common_root_path: PathBuf,
    /// Default endorsement policy file.
    pub endorsement_policy_file_path: Option<PathBuf>,
}

// =============================================================================
// RESULTS
// =============================================================================

/// A single peer's response to a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    /// Peer that answered.
    pub peer: String,
    /// Chaincode response status (200 = OK).
    pub status: i32,
    /// Status message.
    pub message: String,
    /// Response payload.
    pub payload: Option<String>,
}

impl ProposalResponse {
    /// Returns true if the peer endorsed the proposal.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Raw response envelope of a chaincode call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    result: Option<String>,
    transaction_id: TransactionId,
    responses: Vec<ProposalResponse>,
}

impl ResultSet {
    /// Creates an envelope with a payload and transaction id.
    #[must_use]
    pub fn new(result: Option<String>, transaction_id: impl Into<TransactionId>) -> Self {
        Self {
            result,
            transaction_id: transaction_id.into(),
            responses: Vec::new(),
        }
    }

    /// Attaches per-peer responses.
    #[must_use]
    pub fn with_responses(mut self, responses: Vec<ProposalResponse>) -> Self {
        self.responses = responses;
        self
    }

    /// Raw payload string.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Payload when it is present and not blank.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.result.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Generated transaction id.
    #[must_use]
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Per-peer proposal responses.
    #[must_use]
    pub fn responses(&self) -> &[ProposalResponse] {
        &self.responses
    }
}

/// Event observed when a transaction is committed to a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Committed transaction.
    pub transaction_id: TransactionId,
    /// Channel the block belongs to.
    pub channel: String,
    /// Block number.
    pub block_number: u64,
    /// Whether the transaction was validated.
    pub valid: bool,
    /// Peer that delivered the event.
    pub peer: String,
}

// =============================================================================
// COLLECTION CONFIGURATION
// =============================================================================

/// A private data collection definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCollectionConfig {
    /// Collection name.
    pub name: String,
    /// Membership policy expression.
    pub policy: String,
    /// Peers that must receive the private data.
    #[serde(default)]
    pub required_peer_count: u32,
    /// Peers the data may be disseminated to.
    #[serde(default)]
    pub max_peer_count: u32,
    /// Blocks after which the data is purged (0 = never).
    #[serde(default)]
    pub block_to_live: u64,
    /// Only collection members may read.
    #[serde(default)]
    pub member_only_read: bool,
}

/// One entry of a collection configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionEntry {
    /// A static collection.
    StaticCollectionConfig(StaticCollectionConfig),
}

/// Parsed private data collection configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionConfiguration {
    entries: Vec<CollectionEntry>,
}

impl CollectionConfiguration {
    /// Wraps parsed entries.
    #[must_use]
    pub fn new(entries: Vec<CollectionEntry>) -> Self {
        Self { entries }
    }

    /// All static collections.
    pub fn collections(&self) -> impl Iterator<Item = &StaticCollectionConfig> {
        self.entries.iter().map(|entry| match entry {
            CollectionEntry::StaticCollectionConfig(config) => config,
        })
    }

    /// Number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no collection is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
