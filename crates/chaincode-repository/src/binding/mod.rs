//! # Argument Template Resolver
//!
//! Turns a method's argument template into the final argument list in two
//! passes:
//!
//! 1. [`expression::bind_statement`] evaluates `?#{...}` expressions and
//!    rewrites `:name` placeholders, producing a [`BindableStatement`].
//! 2. [`placeholder::replace_placeholders`] substitutes every `?N`.
//!
//! Logical arguments are joined with [`QUERY_ARGS_SEPARATOR`]. The bound
//! template is split on it before substitution, so a value containing the
//! separator stays one argument. Empty pieces are kept.

pub mod expression;
pub mod placeholder;

use crate::domain::parameters::{ParamValue, ParameterAccessor};
use crate::errors::ChaincodeError;

/// Separator between logical arguments in a joined template.
pub const QUERY_ARGS_SEPARATOR: &str = "_;_";

/// Template plus positional values, ready for placeholder substitution.
#[derive(Clone, Debug, PartialEq)]
pub struct BindableStatement {
    template: String,
    values: Vec<ParamValue>,
}

impl BindableStatement {
    /// Pairs a rewritten template with its positional values.
    #[must_use]
    pub fn new(template: String, values: Vec<ParamValue>) -> Self {
        Self { template, values }
    }

    /// Rewritten template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Positional values, call values first.
    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }
}

/// Joins argument pieces into one template.
#[must_use]
pub fn join_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(QUERY_ARGS_SEPARATOR)
}

/// Resolver for one method's template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentTemplateResolver {
    template: String,
}

impl ArgumentTemplateResolver {
    /// Wraps a joined template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Builds a resolver from argument pieces, `None` if there are none.
    #[must_use]
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        (!args.is_empty()).then(|| Self::new(join_args(args)))
    }

    /// Joined template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolves the final argument list for one call.
    pub fn resolve(&self, params: &ParameterAccessor<'_>) -> Result<Vec<String>, ChaincodeError> {
        let statement = expression::bind_statement(&self.template, params)?;
        statement
            .template()
            .split(QUERY_ARGS_SEPARATOR)
            .map(|piece| placeholder::replace_placeholders(piece, statement.values()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ChaincodeError::from)
    }
}

/// String forms of raw call values, used when a method has no template.
#[must_use]
pub fn pass_through(values: &[ParamValue]) -> Vec<String> {
    values.iter().map(ParamValue::to_arg_string).collect()
}
