//! # Query Method Descriptors
//!
//! The immutable, once-resolved view of a declared repository method: kind,
//! contract function, return shape, serialization and argument template.

use crate::binding::{join_args, ArgumentTemplateResolver};
use crate::classifier::{classify, ReturnShape};
use crate::domain::method::{
    MethodDeclaration, OperationAttributes, ProposalAttributes, ReturnType, SerializationAttributes,
    TransactionAttributes,
};
use crate::domain::value_objects::{default_if_blank, is_blank, OperationKind};
use crate::errors::ChaincodeError;
use std::collections::HashMap;

// =============================================================================
// NAMED QUERIES
// =============================================================================

/// Argument templates keyed by `Repository.method`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedQueries {
    queries: HashMap<String, String>,
}

impl NamedQueries {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query under `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.queries.insert(name.into(), query.into());
        self
    }

    /// Returns true if `name` has a query.
    #[must_use]
    pub fn has_query(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Query registered under `name`.
    #[must_use]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    /// Number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns true if there are no queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl From<HashMap<String, String>> for NamedQueries {
    fn from(queries: HashMap<String, String>) -> Self {
        Self { queries }
    }
}

/// Lookup key of a method in [`NamedQueries`].
#[must_use]
pub fn named_query_key(repository: &str, method: &str) -> String {
    format!("{repository}.{method}")
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Resolved method metadata, shared by every call of the method.
#[derive(Clone, Debug)]
pub struct QueryMethodDescriptor {
    name: String,
    func: String,
    operation: OperationAttributes,
    return_type: ReturnType,
    return_shape: ReturnShape,
    parameters: Vec<String>,
    template: Option<ArgumentTemplateResolver>,
    proposal: ProposalAttributes,
    transaction: TransactionAttributes,
    serialization: SerializationAttributes,
}

impl QueryMethodDescriptor {
    /// Resolves a declaration.
    ///
    /// Fails with `UnsupportedOperation` when the method has no operation
    /// attributes or its return type does not fit its kind.
    pub fn resolve(
        declaration: &MethodDeclaration,
        repository: &str,
        named_queries: &NamedQueries,
    ) -> Result<Self, ChaincodeError> {
        let name = declaration.name.clone();
        let operation = declaration.operation.clone().ok_or_else(|| {
            ChaincodeError::UnsupportedOperation(format!(
                "method '{name}' has no operation attributes"
            ))
        })?;

        let return_shape = classify(operation.kind(), &declaration.return_type).map_err(|e| match e {
            ChaincodeError::UnsupportedOperation(reason) => {
                ChaincodeError::UnsupportedOperation(format!("method '{name}': {reason}"))
            }
            other => other,
        })?;

        let template = named_queries
            .get_query(&named_query_key(repository, &name))
            .map(str::to_string)
            .or_else(|| {
                (!declaration.proposal.args.is_empty()).then(|| join_args(&declaration.proposal.args))
            })
            .filter(|template| !is_blank(template))
            .map(ArgumentTemplateResolver::new);

        Ok(Self {
            func: default_if_blank(&declaration.proposal.func, &name).to_string(),
            name,
            operation,
            return_type: declaration.return_type.clone(),
            return_shape,
            parameters: declaration.parameters.clone(),
            template,
            proposal: declaration.proposal.clone(),
            transaction: declaration.transaction.clone(),
            serialization: declaration.serialization.clone(),
        })
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract function.
    #[must_use]
    pub fn func(&self) -> &str {
        &self.func
    }

    /// Operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    /// Operation attributes.
    #[must_use]
    pub fn operation(&self) -> &OperationAttributes {
        &self.operation
    }

    /// Declared return type.
    #[must_use]
    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }

    /// Classified return shape.
    #[must_use]
    pub fn return_shape(&self) -> &ReturnShape {
        &self.return_shape
    }

    /// Declared parameter names.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Argument template, if any.
    #[must_use]
    pub fn template(&self) -> Option<&ArgumentTemplateResolver> {
        self.template.as_ref()
    }

    /// Proposal attributes.
    #[must_use]
    pub fn proposal(&self) -> &ProposalAttributes {
        &self.proposal
    }

    /// Transaction attributes.
    #[must_use]
    pub fn transaction(&self) -> &TransactionAttributes {
        &self.transaction
    }

    /// Serialization attributes.
    #[must_use]
    pub fn serialization(&self) -> &SerializationAttributes {
        &self.serialization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_func_defaults_to_method_name() {
        let declaration = MethodDeclaration::query("findById", ReturnType::String).args(["?0"]);
        let descriptor = QueryMethodDescriptor::resolve(&declaration, "CarRepository", &NamedQueries::new()).unwrap();

        assert_eq!(descriptor.func(), "findById");
        assert_eq!(descriptor.kind(), OperationKind::Query);
        assert_eq!(descriptor.template().unwrap().template(), "?0");
    }

    #[test]
    fn test_explicit_func() {
        let declaration = MethodDeclaration::invoke("transfer", ReturnType::ResultSet).func("move");
        let descriptor = QueryMethodDescriptor::resolve(&declaration, "R", &NamedQueries::new()).unwrap();
        assert_eq!(descriptor.func(), "move");
        assert!(descriptor.template().is_none());
    }

    #[test]
    fn test_named_query_wins() {
        let declaration = MethodDeclaration::query("findByOwner", ReturnType::String).args(["?0"]);
        let named = NamedQueries::new().with("CarRepository.findByOwner", "owner_;_?0");

        let descriptor = QueryMethodDescriptor::resolve(&declaration, "CarRepository", &named).unwrap();
        assert_eq!(descriptor.template().unwrap().template(), "owner_;_?0");
    }

    #[test]
    fn test_blank_template_is_none() {
        let declaration = MethodDeclaration::query("all", ReturnType::String).args([" "]);
        let descriptor = QueryMethodDescriptor::resolve(&declaration, "R", &NamedQueries::new()).unwrap();
        assert!(descriptor.template().is_none());
    }

    #[test]
    fn test_no_operation_rejected() {
        let declaration = MethodDeclaration::new("orphan", ReturnType::String);
        let named = NamedQueries::new().with("R.orphan", "?0");
        let err = QueryMethodDescriptor::resolve(&declaration, "R", &named).unwrap_err();
        assert!(matches!(err, ChaincodeError::UnsupportedOperation(ref msg) if msg.contains("orphan")));
    }

    #[test]
    fn test_shape_error_names_method() {
        let declaration = MethodDeclaration::query("watch", ReturnType::future_event());
        let err = QueryMethodDescriptor::resolve(&declaration, "R", &NamedQueries::new()).unwrap_err();
        assert!(err.to_string().contains("watch"));
    }
}
