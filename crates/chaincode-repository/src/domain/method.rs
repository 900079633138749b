//! # Method Declarations
//!
//! Attribute structs describing a repository method, either written in code
//! through [`MethodDeclaration`] or loaded from a descriptor file. Both paths
//! produce the same structs.

use crate::domain::value_objects::{ChaincodeType, OperationKind, SerializationMode};
use crate::mapping::EntityType;
use crate::serialization::SerializationProvider;
use serde::Deserialize;
use std::fmt;

// =============================================================================
// REPOSITORY-LEVEL ATTRIBUTES
// =============================================================================

/// Channel the repository talks to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelAttributes {
    /// Channel name.
    pub name: String,
    /// Organization name.
    pub org: String,
}

/// Chaincode the repository dispatches to.
///
/// Blank `channel`/`org` fall back to [`ChannelAttributes`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChaincodeAttributes {
    /// Channel name.
    pub channel: String,
    /// Organization name.
    pub org: String,
    /// Chaincode name.
    pub name: String,
    /// Chaincode path.
    pub path: String,
    /// Chaincode version.
    pub version: String,
    /// Chaincode language.
    pub lang: ChaincodeType,
}

// =============================================================================
// METHOD-LEVEL ATTRIBUTES
// =============================================================================

/// Proposal attributes of a method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProposalAttributes {
    /// Contract function; blank means the method name.
    pub func: String,
    /// Argument template pieces, joined with the argument separator.
    pub args: Vec<String>,
    /// User set as client context.
    pub client_user: String,
    /// User the request is sent for.
    pub request_user: String,
    /// Send to the collaborator's specific peers only.
    pub specific_peers: bool,
    /// Proposal wait time, milliseconds.
    pub wait_time: u64,
}

/// Transaction attributes of a method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionAttributes {
    /// User that signs the transaction.
    pub user: String,
    /// Commit wait time, milliseconds.
    pub wait_time: u64,
}

/// Install-specific attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstallAttributes {
    /// Version to install; blank keeps the repository version.
    pub version: String,
    /// Chaincode source location; blank uses the configured root.
    pub chaincode_location: String,
    /// META-INF directory.
    pub meta_inf: String,
}

/// Instantiate and upgrade attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeployAttributes {
    /// Endorsement policy file; blank uses the configured default.
    pub endorsement_policy_file: String,
    /// Collection configuration file (`.json`, `.yaml`, `.yml`).
    pub collection_configuration: String,
}

/// Serialization attributes of a method.
#[derive(Clone, Debug, Default)]
pub struct SerializationAttributes {
    /// Direction(s) that go through the provider.
    pub mode: SerializationMode,
    /// Provider used in those directions.
    pub provider: SerializationProvider,
}

/// Operation marker of a method, with its kind-specific attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationAttributes {
    /// Install.
    Install(InstallAttributes),
    /// Instantiate.
    Instantiate(DeployAttributes),
    /// Upgrade.
    Upgrade(DeployAttributes),
    /// Invoke.
    Invoke,
    /// Query.
    Query,
}

impl OperationAttributes {
    /// Operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Install(_) => OperationKind::Install,
            Self::Instantiate(_) => OperationKind::Instantiate,
            Self::Upgrade(_) => OperationKind::Upgrade,
            Self::Invoke => OperationKind::Invoke,
            Self::Query => OperationKind::Query,
        }
    }
}

// =============================================================================
// RETURN TYPE
// =============================================================================

/// Declared return type of a method.
#[derive(Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// Asynchronous handle.
    Future(Box<ReturnType>),
    /// Transaction completion event.
    Event,
    /// Raw result envelope.
    ResultSet,
    /// Collection.
    Collection(Box<ReturnType>),
    /// Single peer proposal response.
    ProposalResponse,
    /// Text.
    String,
    /// Number or boolean.
    Primitive,
    /// No value.
    Unit,
    /// Domain object.
    Entity(EntityType),
}

impl ReturnType {
    /// `Future<Event>`.
    #[must_use]
    pub fn future_event() -> Self {
        Self::Future(Box::new(Self::Event))
    }

    /// `Vec<ProposalResponse>`.
    #[must_use]
    pub fn proposal_responses() -> Self {
        Self::Collection(Box::new(Self::ProposalResponse))
    }

    /// Returns true for types that carry no domain structure.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::String | Self::Primitive | Self::Unit)
    }
}

impl fmt::Debug for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Future(inner) => write!(f, "Future<{inner:?}>"),
            Self::Event => f.write_str("Event"),
            Self::ResultSet => f.write_str("ResultSet"),
            Self::Collection(inner) => write!(f, "Collection<{inner:?}>"),
            Self::ProposalResponse => f.write_str("ProposalResponse"),
            Self::String => f.write_str("String"),
            Self::Primitive => f.write_str("Primitive"),
            Self::Unit => f.write_str("Unit"),
            Self::Entity(entity) => f.write_str(entity.name()),
        }
    }
}

// =============================================================================
// METHOD DECLARATION
// =============================================================================

/// Everything declared on one repository method.
#[derive(Clone, Debug)]
pub struct MethodDeclaration {
    /// Method name, also the default contract function.
    pub name: String,
    /// Parameter names, in call order.
    pub parameters: Vec<String>,
    /// Declared return type.
    pub return_type: ReturnType,
    /// Operation marker.
    pub operation: Option<OperationAttributes>,
    /// Proposal attributes.
    pub proposal: ProposalAttributes,
    /// Transaction attributes.
    pub transaction: TransactionAttributes,
    /// Serialization attributes.
    pub serialization: SerializationAttributes,
}

impl MethodDeclaration {
    /// Declares a method with no operation attributes yet.
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: ReturnType) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            operation: None,
            proposal: ProposalAttributes::default(),
            transaction: TransactionAttributes::default(),
            serialization: SerializationAttributes::default(),
        }
    }

    /// Declares a query method.
    #[must_use]
    pub fn query(name: impl Into<String>, return_type: ReturnType) -> Self {
        Self::new(name, return_type).operation(OperationAttributes::Query)
    }

    /// Declares an invoke method.
    #[must_use]
    pub fn invoke(name: impl Into<String>, return_type: ReturnType) -> Self {
        Self::new(name, return_type).operation(OperationAttributes::Invoke)
    }

    /// Declares an install method.
    #[must_use]
    pub fn install(
        name: impl Into<String>,
        return_type: ReturnType,
        attributes: InstallAttributes,
    ) -> Self {
        Self::new(name, return_type).operation(OperationAttributes::Install(attributes))
    }

    /// Declares an instantiate method.
    #[must_use]
    pub fn instantiate(
        name: impl Into<String>,
        return_type: ReturnType,
        attributes: DeployAttributes,
    ) -> Self {
        Self::new(name, return_type).operation(OperationAttributes::Instantiate(attributes))
    }

    /// Declares an upgrade method.
    #[must_use]
    pub fn upgrade(
        name: impl Into<String>,
        return_type: ReturnType,
        attributes: DeployAttributes,
    ) -> Self {
        Self::new(name, return_type).operation(OperationAttributes::Upgrade(attributes))
    }

    /// Sets the operation attributes.
    #[must_use]
    pub fn operation(mut self, operation: OperationAttributes) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the declared parameter names, in call order.
    #[must_use]
    pub fn parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the proposal attributes.
    #[must_use]
    pub fn proposal(mut self, proposal: ProposalAttributes) -> Self {
        self.proposal = proposal;
        self
    }

    /// Sets the contract function.
    #[must_use]
    pub fn func(mut self, func: impl Into<String>) -> Self {
        self.proposal.func = func.into();
        self
    }

    /// Sets the argument template pieces.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proposal.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the transaction attributes.
    #[must_use]
    pub fn transaction(mut self, transaction: TransactionAttributes) -> Self {
        self.transaction = transaction;
        self
    }

    /// Sets the serialization mode and provider.
    #[must_use]
    pub fn serialization(mut self, mode: SerializationMode, provider: SerializationProvider) -> Self {
        self.serialization = SerializationAttributes { mode, provider };
        self
    }
}
