//! # Chaincode Repository
//!
//! The dispatch table of a declared repository: method name to
//! [`RepositoryQuery`]. Every method is resolved and classified when the
//! repository is built, so misconfiguration surfaces before any remote call.

use crate::adapters::descriptor::RepositoryDescriptor;
use crate::conversion::ConversionRegistry;
use crate::domain::criteria::Criteria;
use crate::domain::method::{ChaincodeAttributes, ChannelAttributes, MethodDeclaration};
use crate::domain::parameters::ParamValue;
use crate::domain::value_objects::{default_if_blank, IdType};
use crate::errors::{ChaincodeError, ConfigError};
use crate::mapping::{EntityType, MappingContext};
use crate::ports::inbound::{QueryOutput, RepositoryQuery};
use crate::ports::outbound::ChaincodeOperations;
use crate::query_method::{NamedQueries, QueryMethodDescriptor};
use crate::service::StringBasedChaincodeQuery;
use crate::transient::TransientDataExtractor;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// ENTITY INFORMATION
// =============================================================================

/// Domain type and id property of a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityInformation {
    entity_type: EntityType,
    id_type: IdType,
    id_property: Option<String>,
}

impl EntityInformation {
    fn new(entity_type: EntityType, id_type: IdType, mapping: &MappingContext) -> Self {
        let id_property = mapping
            .persistent_entity(entity_type.type_id())
            .and_then(|entity| entity.id_property())
            .map(|id| id.name().to_string());

        Self {
            entity_type,
            id_type,
            id_property,
        }
    }

    /// Domain type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.entity_type.name()
    }

    /// Domain type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Declared id type.
    #[must_use]
    pub fn id_type(&self) -> &IdType {
        &self.id_type
    }

    /// Id property name, if the type is mapped with one.
    #[must_use]
    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }
}

// =============================================================================
// REPOSITORY
// =============================================================================

/// A built repository.
pub struct ChaincodeRepository {
    name: String,
    identity: Criteria,
    entity: Option<EntityInformation>,
    queries: BTreeMap<String, Arc<dyn RepositoryQuery>>,
}

impl ChaincodeRepository {
    /// Starts a repository declaration.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RepositoryBuilder {
        RepositoryBuilder::new(name)
    }

    /// Builds a repository from a descriptor file's content.
    ///
    /// # Errors
    ///
    /// As [`RepositoryBuilder::build`].
    pub fn from_descriptor(
        descriptor: RepositoryDescriptor,
        operations: Arc<dyn ChaincodeOperations>,
        mapping: Arc<MappingContext>,
    ) -> Result<Self, ChaincodeError> {
        let mut builder = Self::builder(descriptor.name)
            .operations(operations)
            .channel(descriptor.channel)
            .chaincode(descriptor.chaincode)
            .id_type(descriptor.id_type)
            .named_queries(descriptor.named_queries)
            .mapping(mapping)
            .methods(descriptor.methods);
        if let Some(domain) = descriptor.domain {
            builder = builder.domain(domain);
        }
        builder.build()
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chaincode identity every method runs against.
    #[must_use]
    pub fn identity(&self) -> &Criteria {
        &self.identity
    }

    /// Domain type information, if a domain type was declared.
    #[must_use]
    pub fn entity_information(&self) -> Option<&EntityInformation> {
        self.entity.as_ref()
    }

    /// Query of a method.
    #[must_use]
    pub fn query(&self, method: &str) -> Option<&dyn RepositoryQuery> {
        self.queries.get(method).map(AsRef::as_ref)
    }

    /// Declared method names, sorted.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    /// Executes a declared method.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for an undeclared method, otherwise whatever
    /// the method's query returns.
    pub async fn execute(&self, method: &str, params: &[ParamValue]) -> Result<QueryOutput, ChaincodeError> {
        let query = self.queries.get(method).ok_or_else(|| {
            ChaincodeError::UnsupportedOperation(format!(
                "repository '{}' has no method '{method}'",
                self.name
            ))
        })?;
        query.execute(params).await
    }
}

impl fmt::Debug for ChaincodeRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaincodeRepository")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("entity", &self.entity)
            .field("methods", &self.queries.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Declaration of a repository, validated by [`RepositoryBuilder::build`].
pub struct RepositoryBuilder {
    name: String,
    operations: Option<Arc<dyn ChaincodeOperations>>,
    channel: ChannelAttributes,
    chaincode: ChaincodeAttributes,
    id_type: IdType,
    domain: Option<EntityType>,
    methods: Vec<MethodDeclaration>,
    named_queries: NamedQueries,
    mapping: Arc<MappingContext>,
    conversions: Arc<ConversionRegistry>,
}

impl RepositoryBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: None,
            channel: ChannelAttributes::default(),
            chaincode: ChaincodeAttributes::default(),
            id_type: IdType::default(),
            domain: None,
            methods: Vec::new(),
            named_queries: NamedQueries::default(),
            mapping: Arc::new(MappingContext::new()),
            conversions: Arc::new(ConversionRegistry::with_defaults()),
        }
    }

    /// Chaincode operations collaborator.
    #[must_use]
    pub fn operations(mut self, operations: Arc<dyn ChaincodeOperations>) -> Self {
        self.operations = Some(operations);
        self
    }

    /// Channel attributes.
    #[must_use]
    pub fn channel(mut self, channel: ChannelAttributes) -> Self {
        self.channel = channel;
        self
    }

    /// Chaincode attributes.
    #[must_use]
    pub fn chaincode(mut self, chaincode: ChaincodeAttributes) -> Self {
        self.chaincode = chaincode;
        self
    }

    /// Declared id type.
    #[must_use]
    pub fn id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Domain entity type.
    #[must_use]
    pub fn domain(mut self, domain: EntityType) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds methods.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodDeclaration>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Named query table.
    #[must_use]
    pub fn named_queries(mut self, named_queries: NamedQueries) -> Self {
        self.named_queries = named_queries;
        self
    }

    /// Entity mapping metadata.
    #[must_use]
    pub fn mapping(mut self, mapping: Arc<MappingContext>) -> Self {
        self.mapping = mapping;
        self
    }

    /// Transient data converters. Defaults to [`ConversionRegistry::with_defaults`].
    #[must_use]
    pub fn conversions(mut self, conversions: Arc<ConversionRegistry>) -> Self {
        self.conversions = conversions;
        self
    }

    /// Resolves every method and builds the dispatch table.
    ///
    /// # Errors
    ///
    /// - `Config(Missing)` without an operations collaborator
    /// - `UnsupportedOperation` for an unsupported id type, a duplicate
    ///   method, a method without operation attributes or a return type its
    ///   kind cannot produce
    pub fn build(self) -> Result<ChaincodeRepository, ChaincodeError> {
        let operations = self
            .operations
            .ok_or_else(|| ConfigError::Missing(format!("chaincode operations for repository '{}'", self.name)))?;

        if let IdType::Other(id_type) = &self.id_type {
            return Err(ChaincodeError::UnsupportedOperation(format!(
                "repository '{}' declares id type '{id_type}', only String ids are supported",
                self.name
            )));
        }

        let identity = merge_identity(&self.channel, &self.chaincode);
        let transient = TransientDataExtractor::new(self.mapping.clone(), self.conversions.clone());

        let mut queries: BTreeMap<String, Arc<dyn RepositoryQuery>> = BTreeMap::new();
        for declaration in &self.methods {
            if queries.contains_key(&declaration.name) {
                return Err(ChaincodeError::UnsupportedOperation(format!(
                    "repository '{}' declares method '{}' twice",
                    self.name, declaration.name
                )));
            }

            let descriptor = QueryMethodDescriptor::resolve(declaration, &self.name, &self.named_queries)?;
            debug!(
                repository = %self.name,
                method = descriptor.name(),
                kind = %descriptor.kind(),
                shape = ?descriptor.return_shape(),
                "Resolved repository method"
            );

            let query = StringBasedChaincodeQuery::new(
                descriptor,
                identity.clone(),
                operations.clone(),
                self.mapping.clone(),
                transient.clone(),
            );
            queries.insert(declaration.name.clone(), Arc::new(query));
        }

        let entity = self
            .domain
            .map(|domain| EntityInformation::new(domain, self.id_type.clone(), &self.mapping));

        info!(
            repository = %self.name,
            channel = identity.channel(),
            chaincode = identity.name(),
            methods = queries.len(),
            "Built chaincode repository"
        );

        Ok(ChaincodeRepository {
            name: self.name,
            identity,
            entity,
            queries,
        })
    }
}

impl fmt::Debug for RepositoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryBuilder")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("chaincode", &self.chaincode)
            .field("id_type", &self.id_type)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// Chaincode-level channel and org fall back to the channel attributes.
fn merge_identity(channel: &ChannelAttributes, chaincode: &ChaincodeAttributes) -> Criteria {
    Criteria::builder()
        .channel(default_if_blank(&chaincode.channel, &channel.name))
        .org(default_if_blank(&chaincode.org, &channel.org))
        .name(chaincode.name.as_str())
        .path(chaincode.path.as_str())
        .version(chaincode.version.as_str())
        .lang(chaincode.lang)
        .build()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryChaincodeOperations;
    use crate::domain::method::ReturnType;
    use crate::domain::value_objects::{ChaincodeType, OperationKind};
    use crate::mapping::EntityMapping;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Asset {
        #[serde(default)]
        id: String,
        value: u64,
    }

    fn channel() -> ChannelAttributes {
        ChannelAttributes {
            name: "mychannel".into(),
            org: "peerOrg1".into(),
        }
    }

    fn chaincode() -> ChaincodeAttributes {
        ChaincodeAttributes {
            name: "assets".into(),
            version: "1.0".into(),
            ..ChaincodeAttributes::default()
        }
    }

    fn builder() -> RepositoryBuilder {
        ChaincodeRepository::builder("AssetRepository")
            .operations(Arc::new(InMemoryChaincodeOperations::new()))
            .channel(channel())
            .chaincode(chaincode())
    }

    #[test]
    fn test_identity_merge() {
        let repository = builder().build().unwrap();
        assert_eq!(repository.identity().channel(), "mychannel");
        assert_eq!(repository.identity().org(), "peerOrg1");
        assert_eq!(repository.identity().name(), "assets");
        assert_eq!(repository.identity().lang(), ChaincodeType::Golang);

        let repository = builder()
            .chaincode(ChaincodeAttributes {
                channel: "other".into(),
                ..chaincode()
            })
            .build()
            .unwrap();
        assert_eq!(repository.identity().channel(), "other");
        assert_eq!(repository.identity().org(), "peerOrg1");
    }

    #[test]
    fn test_id_type_check() {
        assert!(builder().id_type(IdType::Untyped).build().is_ok());

        let err = builder().id_type(IdType::Other("Long".into())).build().unwrap_err();
        assert!(matches!(err, ChaincodeError::UnsupportedOperation(ref msg) if msg.contains("Long")));
    }

    #[test]
    fn test_missing_operations() {
        let err = ChaincodeRepository::builder("R").build().unwrap_err();
        assert!(matches!(err, ChaincodeError::Config(ConfigError::Missing(_))));
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let err = builder()
            .method(MethodDeclaration::query("find", ReturnType::String))
            .method(MethodDeclaration::invoke("find", ReturnType::ResultSet))
            .build()
            .unwrap_err();
        assert!(matches!(err, ChaincodeError::UnsupportedOperation(ref msg) if msg.contains("twice")));
    }

    #[test]
    fn test_shape_rejected_at_build() {
        let err = builder()
            .method(MethodDeclaration::query("watch", ReturnType::Event))
            .build()
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_entity_information() {
        let mapping = Arc::new(
            MappingContext::new().with_mapped(EntityMapping::<Asset>::new().id_text("id", |a, tx| a.id = tx.to_string())),
        );
        let repository = builder()
            .mapping(mapping)
            .domain(EntityType::of::<Asset>())
            .build()
            .unwrap();

        let info = repository.entity_information().unwrap();
        assert_eq!(info.name(), "Asset");
        assert_eq!(info.id_property(), Some("id"));
        assert_eq!(info.id_type(), &IdType::String);
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let repository = builder()
            .method(MethodDeclaration::query("count", ReturnType::Primitive))
            .method(MethodDeclaration::invoke("reset", ReturnType::Unit))
            .build()
            .unwrap();

        assert_eq!(repository.methods().collect::<Vec<_>>(), vec!["count", "reset"]);
        assert_eq!(repository.query("reset").unwrap().descriptor().kind(), OperationKind::Invoke);

        assert!(repository.execute("count", &[]).await.unwrap().is_null());

        let err = repository.execute("delete", &[]).await.unwrap_err();
        assert!(matches!(err, ChaincodeError::UnsupportedOperation(ref msg) if msg.contains("delete")));
    }
}
