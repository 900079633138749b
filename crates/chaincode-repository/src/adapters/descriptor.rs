//! TOML repository descriptors.
//!
//! Declares a repository without code: identity, id type, domain type,
//! named queries and methods. Parsed into the same attribute structs the
//! programmatic builder takes.
//!
//! # Descriptor File Format
//!
//! ```toml
//! name = "CarRepository"
//! id_type = "string"
//! domain = "Car"
//!
//! [channel]
//! name = "mychannel"
//! org = "peerOrg1"
//!
//! [chaincode]
//! name = "fabcar"
//! version = "1.0"
//!
//! [named_queries]
//! "CarRepository.findByOwner" = "owner_;_?0"
//!
//! [[methods]]
//! name = "findById"
//! kind = "query"
//! returns = "Car"
//! parameters = ["id"]
//! serialization = { mode = "deserialize", provider = "json" }
//! proposal = { args = ["?0"] }
//! ```
//!
//! Return types: `future<event>`, `event`, `result_set`,
//! `collection<proposal_response>`, `string`, `primitive`, `void`, or the
//! name of an entity registered in the [`MappingContext`].

use crate::domain::method::{
    ChaincodeAttributes, ChannelAttributes, DeployAttributes, InstallAttributes, MethodDeclaration,
    OperationAttributes, ProposalAttributes, ReturnType, SerializationAttributes, TransactionAttributes,
};
use crate::domain::value_objects::{IdType, OperationKind, SerializationMode};
use crate::errors::ConfigError;
use crate::mapping::{EntityType, MappingContext};
use crate::query_method::NamedQueries;
use crate::serialization::SerializationProvider;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    name: String,
    #[serde(default)]
    id_type: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    channel: ChannelAttributes,
    #[serde(default)]
    chaincode: ChaincodeAttributes,
    #[serde(default)]
    named_queries: HashMap<String, String>,
    #[serde(default)]
    methods: Vec<MethodFile>,
}

#[derive(Debug, Deserialize)]
struct MethodFile {
    name: String,
    kind: Option<OperationKind>,
    #[serde(default)]
    returns: String,
    #[serde(default)]
    parameters: Vec<String>,
    #[serde(default)]
    proposal: ProposalAttributes,
    #[serde(default)]
    transaction: TransactionAttributes,
    #[serde(default)]
    install: InstallAttributes,
    #[serde(default)]
    deploy: DeployAttributes,
    #[serde(default)]
    serialization: SerializationFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerializationFile {
    mode: SerializationMode,
    provider: String,
}

/// A repository declared in a descriptor file.
#[derive(Debug)]
pub struct RepositoryDescriptor {
    /// Repository name, also the named query prefix.
    pub name: String,
    /// Declared id type.
    pub id_type: IdType,
    /// Domain entity type, if declared.
    pub domain: Option<EntityType>,
    /// Channel attributes.
    pub channel: ChannelAttributes,
    /// Chaincode attributes.
    pub chaincode: ChaincodeAttributes,
    /// Named queries.
    pub named_queries: NamedQueries,
    /// Declared methods, in file order.
    pub methods: Vec<MethodDeclaration>,
}

impl RepositoryDescriptor {
    /// Loads a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or names an
    /// unknown entity, return type or provider.
    pub fn load<P: AsRef<Path>>(path: P, mapping: &MappingContext) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        debug!(path = %path.display(), "Loading repository descriptor");
        Self::parse_named(&content, &path.display().to_string(), mapping)
    }

    /// Parses a descriptor from a TOML string.
    ///
    /// # Errors
    ///
    /// As [`RepositoryDescriptor::load`], without the I/O part.
    pub fn parse(content: &str, mapping: &MappingContext) -> Result<Self, ConfigError> {
        Self::parse_named(content, "<inline>", mapping)
    }

    fn parse_named(content: &str, origin: &str, mapping: &MappingContext) -> Result<Self, ConfigError> {
        let file: DescriptorFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            error: e.to_string(),
        })?;

        let domain = if file.domain.trim().is_empty() {
            None
        } else {
            Some(
                mapping
                    .entity_type(file.domain.trim())
                    .ok_or_else(|| ConfigError::UnknownEntity(file.domain.clone()))?,
            )
        };

        let methods = file
            .methods
            .into_iter()
            .map(|method| method.into_declaration(mapping))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: file.name,
            id_type: file.id_type.parse().unwrap_or_default(),
            domain,
            channel: file.channel,
            chaincode: file.chaincode,
            named_queries: NamedQueries::from(file.named_queries),
            methods,
        })
    }
}

impl MethodFile {
    fn into_declaration(self, mapping: &MappingContext) -> Result<MethodDeclaration, ConfigError> {
        let operation = self.kind.map(|kind| match kind {
            OperationKind::Install => OperationAttributes::Install(self.install),
            OperationKind::Instantiate => OperationAttributes::Instantiate(self.deploy),
            OperationKind::Upgrade => OperationAttributes::Upgrade(self.deploy),
            OperationKind::Invoke => OperationAttributes::Invoke,
            OperationKind::Query => OperationAttributes::Query,
        });

        let mut declaration = MethodDeclaration::new(self.name, parse_return_type(&self.returns, mapping)?)
            .parameters(self.parameters)
            .proposal(self.proposal)
            .transaction(self.transaction);
        declaration.operation = operation;
        declaration.serialization = SerializationAttributes {
            mode: self.serialization.mode,
            provider: self.serialization.provider.parse::<SerializationProvider>()?,
        };
        Ok(declaration)
    }
}

/// Parses a return type name.
///
/// # Errors
///
/// `UnknownReturnType` for an unrecognized generic form, `UnknownEntity`
/// for a plain name that is not registered in `mapping`.
pub fn parse_return_type(name: &str, mapping: &MappingContext) -> Result<ReturnType, ConfigError> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(inner) = generic_argument(&compact, "future") {
        return Ok(ReturnType::Future(Box::new(parse_return_type(inner, mapping)?)));
    }
    if let Some(inner) = generic_argument(&compact, "collection") {
        return Ok(ReturnType::Collection(Box::new(parse_return_type(inner, mapping)?)));
    }

    Ok(match compact.to_ascii_lowercase().as_str() {
        "event" | "transaction_event" => ReturnType::Event,
        "result_set" | "resultset" => ReturnType::ResultSet,
        "proposal_response" | "proposalresponse" => ReturnType::ProposalResponse,
        "string" => ReturnType::String,
        "primitive" | "bool" | "boolean" | "int" | "long" | "number" => ReturnType::Primitive,
        "" | "void" | "unit" => ReturnType::Unit,
        _ if compact.contains(['<', '>']) => return Err(ConfigError::UnknownReturnType(compact)),
        _ => ReturnType::Entity(
            mapping
                .entity_type(&compact)
                .ok_or_else(|| ConfigError::UnknownEntity(compact.clone()))?,
        ),
    })
}

/// Argument of `outer<...>`, matched case-insensitively.
fn generic_argument<'a>(compact: &'a str, outer: &str) -> Option<&'a str> {
    let head = compact.get(..=outer.len())?;
    if !head.eq_ignore_ascii_case(&format!("{outer}<")) {
        return None;
    }
    compact[head.len()..].strip_suffix('>')
}

// =============================================================================
// TESTS
// =============================================================================
