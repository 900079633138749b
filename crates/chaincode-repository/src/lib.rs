//! # Chaincode Repository - Declarative Chaincode Dispatch
//!
//! Turns a declared method call on a domain repository into one of five
//! chaincode operations: **install, instantiate, upgrade, invoke, query**.
//! A method declares the operation and contract function; this crate builds
//! the argument list, the criteria and the transient data, calls the
//! [`ChaincodeOperations`](ports::outbound::ChaincodeOperations) port and
//! shapes the response into the declared return type.
//!
//! ## Dispatch Flow
//!
//! ```text
//! ChaincodeRepository::execute(method, params)
//!   -> dispatch table lookup
//!   -> StringBasedChaincodeQuery
//!        create_query      (serialization, template binding)
//!        transient data    (mapped entity fields)
//!        criteria          (identity, users, paths)
//!   -> ChaincodeOperations port
//!   -> ReturnShape        (event, envelope, text, domain object)
//! ```
//!
//! ## Return Shapes
//!
//! | Declared type | Shape | Result |
//! |---------------|-------|--------|
//! | `Future<Event>` | `FutureEvent` | pending event, not awaited |
//! | `Event` | `Event` | commit event |
//! | `ResultSet` | `RawEnvelope` | envelope as is |
//! | `Collection<ProposalResponse>` | `ProposalResponses` | install responses |
//! | `String` | `Text` | payload (install: transaction id) |
//! | entity | `Domain` | deserialized, id = transaction id |
//!
//! Unsupported combinations fail when the repository is built.
//!
//! ## Argument Templates
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `?N` | N-th value |
//! | `:name` | declared parameter `name` |
//! | `?#{[0].owner + '-' + #id}` | embedded expression |
//! | `_;_` | argument separator |
//!
//! ## Usage Example
//!
//! ```ignore
//! use chaincode_repository::prelude::*;
//!
//! let repository = ChaincodeRepository::builder("CarRepository")
//!     .operations(operations)
//!     .channel(ChannelAttributes { name: "mychannel".into(), org: "peerOrg1".into() })
//!     .chaincode(ChaincodeAttributes { name: "fabcar".into(), version: "1.0".into(), ..Default::default() })
//!     .mapping(mapping)
//!     .method(MethodDeclaration::query("findById", ReturnType::Entity(EntityType::of::<Car>())).args(["?0"]))
//!     .build()?;
//!
//! let car = repository.execute("findById", &["CAR1".into()]).await?.into_entity::<Car>();
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod binding;
pub mod classifier;
pub mod conversion;
pub mod criteria_builder;
pub mod domain;
pub mod errors;
pub mod mapping;
pub mod ports;
pub mod query_method;
pub mod repository;
pub mod serialization;
pub mod service;
pub mod transient;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::criteria::{
        Criteria, InstallCriteria, InstantiateCriteria, InvokeCriteria, ProposalOptions, QueryCriteria,
        TransactionOptions, TransientData, UpgradeCriteria,
    };
    pub use crate::domain::entities::{
        ChaincodeConfig, CollectionConfiguration, Organization, ProposalResponse, ResultSet,
        TransactionEvent, User,
    };
    pub use crate::domain::method::{
        ChaincodeAttributes, ChannelAttributes, DeployAttributes, InstallAttributes, MethodDeclaration,
        OperationAttributes, ProposalAttributes, ReturnType, TransactionAttributes,
    };
    pub use crate::domain::parameters::ParamValue;
    pub use crate::domain::value_objects::{
        ChaincodeType, IdType, OperationKind, SerializationMode, TransactionId,
    };

    // Mapping and conversion
    pub use crate::conversion::ConversionRegistry;
    pub use crate::mapping::{ChaincodeEntity, EntityMapping, EntityType, FieldValue, MappingContext};
    pub use crate::serialization::{EntitySerialization, SerializationProvider};

    // Ports
    pub use crate::ports::inbound::{PendingEvent, QueryOutput, RepositoryQuery};
    pub use crate::ports::outbound::{ChaincodeOperations, TransactionFuture};

    // Repository
    pub use crate::adapters::descriptor::RepositoryDescriptor;
    pub use crate::adapters::in_memory::InMemoryChaincodeOperations;
    pub use crate::query_method::NamedQueries;
    pub use crate::repository::{ChaincodeRepository, EntityInformation, RepositoryBuilder};

    // Errors
    pub use crate::errors::{
        AccessError, BindingError, ChaincodeError, ConfigError, EvaluationError, OperationError,
        SerializationError,
    };
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
