//! # Parameter Values
//!
//! Runtime values passed to a repository method, and the named view over them
//! used by expression evaluation.

use crate::mapping::ChaincodeEntity;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One argument of a repository method call.
#[derive(Clone)]
pub enum ParamValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Text.
    Text(String),
    /// Domain object.
    Entity(Arc<dyn ChaincodeEntity>),
}

impl ParamValue {
    /// Wraps a domain object.
    #[must_use]
    pub fn entity<T: ChaincodeEntity>(value: T) -> Self {
        Self::Entity(Arc::new(value))
    }

    /// Returns true for everything except domain objects.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Entity(_))
    }

    /// Returns true for [`ParamValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Domain object, if this is one.
    #[must_use]
    pub fn as_entity(&self) -> Option<&dyn ChaincodeEntity> {
        match self {
            Self::Entity(entity) => Some(entity.as_ref()),
            _ => None,
        }
    }

    /// String form sent to the chaincode.
    ///
    /// Domain objects use their compact JSON form, null is `"null"`.
    #[must_use]
    pub fn to_arg_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Entity(entity) => match entity.to_json() {
                Ok(json) => json.to_string(),
                Err(_) => format!("{entity:?}"),
            },
        }
    }

    /// JSON form, used for serialization and property navigation.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
            Self::Entity(entity) => entity.to_json()?,
        })
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Float(n) => write!(f, "Float({n})"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Entity(entity) => write!(f, "Entity({entity:?})"),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// PARAMETER ACCESSOR
// =============================================================================

/// Positional and named view over the values of one call.
#[derive(Clone, Copy, Debug)]
pub struct ParameterAccessor<'a> {
    names: &'a [String],
    values: &'a [ParamValue],
}

impl<'a> ParameterAccessor<'a> {
    /// Pairs declared parameter names with call values.
    ///
    /// Names may be shorter than values; extra values are positional only.
    #[must_use]
    pub fn new(names: &'a [String], values: &'a [ParamValue]) -> Self {
        Self { names, values }
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the call has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a ParamValue> {
        self.values.get(index)
    }

    /// Position of a declared parameter.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .filter(|&i| i < self.values.len())
    }

    /// Value of a declared parameter.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&'a ParamValue> {
        self.index_of(name).and_then(|i| self.values.get(i))
    }

    /// All values.
    #[must_use]
    pub fn values(&self) -> &'a [ParamValue] {
        self.values
    }
}
