//! # Entity Mapping
//!
//! Persistent entity metadata for domain types passed to and returned from
//! repository methods.
//!
//! Each mapped type declares, once, at registration:
//! - the id property that receives the transaction id after a call
//! - the `field -> transient key` table, with a typed accessor per field
//!
//! The accessor table replaces getter lookup by name: extraction only calls
//! closures registered here.

use crate::domain::value_objects::TransactionId;
use crate::errors::AccessError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// =============================================================================
// CHAINCODE ENTITY
// =============================================================================

/// A domain object that can cross the repository boundary.
///
/// Implemented for every `Serialize + Debug + Send + Sync + 'static` type.
pub trait ChaincodeEntity: Any + Send + Sync + fmt::Debug {
    /// Upcast for downcasting by the caller.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast, used to write the transaction id.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast, for taking the concrete value back.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// JSON form, used for serialization and expression navigation.
    fn to_json(&self) -> Result<Value, serde_json::Error>;

    /// Short type name for logs and errors.
    fn entity_name(&self) -> &'static str;
}

impl<T> ChaincodeEntity for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn entity_name(&self) -> &'static str {
        short_type_name::<T>()
    }
}

impl dyn ChaincodeEntity {
    /// Borrows the concrete value.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if the concrete type is `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

// =============================================================================
// ENTITY TYPE
// =============================================================================

type Decoder = fn(Value) -> Result<Box<dyn ChaincodeEntity>, serde_json::Error>;

fn decode_boxed<T>(value: Value) -> Result<Box<dyn ChaincodeEntity>, serde_json::Error>
where
    T: ChaincodeEntity + DeserializeOwned,
{
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

/// A deserializable domain type, used as a declared return type.
#[derive(Clone, Copy)]
pub struct EntityType {
    name: &'static str,
    type_id: TypeId,
    decode: Decoder,
}

impl EntityType {
    /// Describes `T`.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ChaincodeEntity + DeserializeOwned,
    {
        Self {
            name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
            decode: decode_boxed::<T>,
        }
    }

    /// Short type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type id of the described type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Builds a boxed instance from its JSON form.
    pub fn decode(&self, value: Value) -> Result<Box<dyn ChaincodeEntity>, serde_json::Error> {
        (self.decode)(value)
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EntityType {}

// =============================================================================
// FIELD VALUES
// =============================================================================

/// Kind of a field value, used to select a converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// Boolean.
    Bool,
    /// Raw bytes.
    Bytes,
    /// UTC timestamp.
    DateTime,
    /// Timestamp without zone.
    LocalDateTime,
}

/// Value read from a mapped entity field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Timestamp without zone.
    LocalDateTime(NaiveDateTime),
}

impl FieldValue {
    /// Kind of this value.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::Bool(_) => FieldKind::Bool,
            Self::Bytes(_) => FieldKind::Bytes,
            Self::DateTime(_) => FieldKind::DateTime,
            Self::LocalDateTime(_) => FieldKind::LocalDateTime,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::LocalDateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::LocalDateTime(v)
    }
}

// =============================================================================
// PERSISTENT ENTITY
// =============================================================================

type FieldAccessor = Box<dyn Fn(&dyn Any) -> Option<Option<FieldValue>> + Send + Sync>;
type IdSetter = Box<dyn Fn(&mut dyn Any, &TransactionId) -> bool + Send + Sync>;

/// Id property of a mapped entity.
pub struct IdProperty {
    name: String,
    bytes: bool,
    setter: IdSetter,
}

impl IdProperty {
    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the setter takes raw bytes.
    #[must_use]
    pub fn takes_bytes(&self) -> bool {
        self.bytes
    }

    /// Writes the transaction id. Returns false on a type mismatch.
    pub fn bind(&self, target: &mut dyn Any, transaction_id: &TransactionId) -> bool {
        (self.setter)(target, transaction_id)
    }
}

impl fmt::Debug for IdProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdProperty")
            .field("name", &self.name)
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

/// Mapping metadata for one domain type.
pub struct PersistentEntity {
    name: &'static str,
    type_id: TypeId,
    id_property: Option<IdProperty>,
    transient_mappings: BTreeMap<String, String>,
    accessors: HashMap<String, FieldAccessor>,
}

impl PersistentEntity {
    /// Short type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type id of the mapped type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Id property, if declared.
    #[must_use]
    pub fn id_property(&self) -> Option<&IdProperty> {
        self.id_property.as_ref()
    }

    /// `field -> transient key` table, ordered by field.
    #[must_use]
    pub fn transient_mappings(&self) -> &BTreeMap<String, String> {
        &self.transient_mappings
    }

    /// Reads a mapped field from an instance of this entity.
    pub fn read_field(
        &self,
        field: &str,
        target: &dyn Any,
    ) -> Result<Option<FieldValue>, AccessError> {
        let accessor = self
            .accessors
            .get(field)
            .ok_or_else(|| AccessError::MissingAccessor(field.to_string()))?;

        accessor(target).ok_or_else(|| AccessError::TypeMismatch {
            field: field.to_string(),
            expected: self.name,
        })
    }
}

impl fmt::Debug for PersistentEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentEntity")
            .field("name", &self.name)
            .field("id_property", &self.id_property)
            .field("transient_mappings", &self.transient_mappings)
            .finish_non_exhaustive()
    }
}

/// Typed builder for a [`PersistentEntity`].
///
/// ```ignore
/// let mapping = EntityMapping::<Account>::new()
///     .id_text("id", |account, tx| account.id = tx.to_string())
///     .transient("secret", "account-secret", |account| account.secret.clone());
/// ```
pub struct EntityMapping<T> {
    entity: PersistentEntity,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ChaincodeEntity> Default for EntityMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ChaincodeEntity> EntityMapping<T> {
    /// Starts a mapping with no id and no transient fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entity: PersistentEntity {
                name: short_type_name::<T>(),
                type_id: TypeId::of::<T>(),
                id_property: None,
                transient_mappings: BTreeMap::new(),
                accessors: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declares a text id property.
    #[must_use]
    pub fn id_text<F>(mut self, name: &str, setter: F) -> Self
    where
        F: Fn(&mut T, &str) + Send + Sync + 'static,
    {
        self.entity.id_property = Some(IdProperty {
            name: name.to_string(),
            bytes: false,
            setter: Box::new(move |target, tx| match target.downcast_mut::<T>() {
                Some(entity) => {
                    setter(entity, tx.as_str());
                    true
                }
                None => false,
            }),
        });
        self
    }

    /// Declares a byte-array id property.
    #[must_use]
    pub fn id_bytes<F>(mut self, name: &str, setter: F) -> Self
    where
        F: Fn(&mut T, &[u8]) + Send + Sync + 'static,
    {
        self.entity.id_property = Some(IdProperty {
            name: name.to_string(),
            bytes: true,
            setter: Box::new(move |target, tx| match target.downcast_mut::<T>() {
                Some(entity) => {
                    setter(entity, tx.as_bytes());
                    true
                }
                None => false,
            }),
        });
        self
    }

    /// Maps `field` to transient `key`, read through `getter`.
    #[must_use]
    pub fn transient<V, F>(mut self, field: &str, key: &str, getter: F) -> Self
    where
        V: Into<FieldValue>,
        F: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        self.entity
            .transient_mappings
            .insert(field.to_string(), key.to_string());
        self.entity.accessors.insert(
            field.to_string(),
            Box::new(move |target| {
                target
                    .downcast_ref::<T>()
                    .map(|entity| getter(entity).map(Into::into))
            }),
        );
        self
    }

    /// Maps `field` to transient `key` without an accessor.
    ///
    /// Used when the table comes from a descriptor file; such fields are
    /// skipped at extraction time.
    #[must_use]
    pub fn transient_key(mut self, field: &str, key: &str) -> Self {
        self.entity
            .transient_mappings
            .insert(field.to_string(), key.to_string());
        self
    }

    /// Finishes the mapping.
    #[must_use]
    pub fn build(self) -> PersistentEntity {
        self.entity
    }
}

// =============================================================================
// MAPPING CONTEXT
// =============================================================================

/// Registry of mapped entities and named entity types.
#[derive(Default)]
pub struct MappingContext {
    entities: HashMap<TypeId, Arc<PersistentEntity>>,
    types: HashMap<String, EntityType>,
}

impl MappingContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers entity metadata.
    #[must_use]
    pub fn with_entity(mut self, entity: PersistentEntity) -> Self {
        self.entities.insert(entity.type_id, Arc::new(entity));
        self
    }

    /// Registers an entity type under its short name.
    #[must_use]
    pub fn with_type(mut self, entity_type: EntityType) -> Self {
        self.types.insert(entity_type.name().to_string(), entity_type);
        self
    }

    /// Registers both the metadata and the named type of `T`.
    #[must_use]
    pub fn with_mapped<T>(self, mapping: EntityMapping<T>) -> Self
    where
        T: ChaincodeEntity + DeserializeOwned,
    {
        self.with_entity(mapping.build()).with_type(EntityType::of::<T>())
    }

    /// Metadata by type id.
    #[must_use]
    pub fn persistent_entity(&self, type_id: TypeId) -> Option<&PersistentEntity> {
        self.entities.get(&type_id).map(AsRef::as_ref)
    }

    /// Metadata for the concrete type of `value`.
    #[must_use]
    pub fn persistent_entity_of(&self, value: &dyn ChaincodeEntity) -> Option<&PersistentEntity> {
        self.persistent_entity(value.as_any().type_id())
    }

    /// Named entity type.
    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<EntityType> {
        self.types.get(name).copied()
    }
}

impl fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext")
            .field("entities", &self.entities.len())
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Account {
        id: String,
        owner: String,
        secret: Option<String>,
        balance: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Receipt {
        tx: Vec<u8>,
    }

    fn account_mapping() -> EntityMapping<Account> {
        EntityMapping::<Account>::new()
            .id_text("id", |account, tx| account.id = tx.to_string())
            .transient("secret", "account-secret", |account| account.secret.clone())
            .transient("balance", "account-balance", |account| Some(account.balance))
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(EntityType::of::<Account>().name(), "Account");
        assert_eq!(Account::default().entity_name(), "Account");
    }

    #[test]
    fn test_read_mapped_field() {
        let entity = account_mapping().build();
        let account = Account {
            secret: Some("s3cret".into()),
            balance: 10,
            ..Account::default()
        };

        assert_eq!(
            entity.read_field("secret", &account).unwrap(),
            Some(FieldValue::Text("s3cret".into()))
        );
        assert_eq!(
            entity.read_field("balance", &account).unwrap(),
            Some(FieldValue::Integer(10))
        );
    }

    #[test]
    fn test_read_field_errors() {
        let entity = account_mapping().transient_key("owner", "account-owner").build();
        let account = Account::default();

        assert_eq!(
            entity.read_field("owner", &account),
            Err(AccessError::MissingAccessor("owner".into()))
        );
        assert!(matches!(
            entity.read_field("secret", &Receipt::default()),
            Err(AccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_id_binding_text_and_bytes() {
        let entity = account_mapping().build();
        let mut account = Account::default();
        let tx = TransactionId::new("tx-42");
        assert!(entity.id_property().unwrap().bind(&mut account, &tx));
        assert_eq!(account.id, "tx-42");

        let receipt_entity = EntityMapping::<Receipt>::new()
            .id_bytes("tx", |receipt, bytes| receipt.tx = bytes.to_vec())
            .build();
        let mut receipt = Receipt::default();
        let property = receipt_entity.id_property().unwrap();
        assert!(property.takes_bytes());
        assert!(property.bind(&mut receipt, &tx));
        assert_eq!(receipt.tx, b"tx-42".to_vec());

        assert!(!property.bind(&mut account, &tx));
    }

    #[test]
    fn test_mapping_context_lookup() {
        let context = MappingContext::new().with_mapped(account_mapping());
        let account: Box<dyn ChaincodeEntity> = Box::new(Account::default());

        assert!(context.persistent_entity_of(&*account).is_some());
        assert!(context.persistent_entity(TypeId::of::<Receipt>()).is_none());
        assert_eq!(context.entity_type("Account"), Some(EntityType::of::<Account>()));
    }

    #[test]
    fn test_entity_type_decode() {
        let value = serde_json::json!({"id": "", "owner": "alice", "secret": null, "balance": 5});
        let decoded = EntityType::of::<Account>().decode(value).unwrap();
        let account = decoded.downcast_ref::<Account>().unwrap();
        assert_eq!(account.owner, "alice");
        assert_eq!(account.balance, 5);
    }
}
