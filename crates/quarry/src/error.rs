//! Error types for the quarry crate.

use thiserror::Error;

use crate::domain::ValueDomain;
use crate::op::FilterOperator;
use crate::validation::ValidationErrors;

/// Errors that can occur when configuring or compiling search requests.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// Operator is not valid for the given value domain.
    #[error("operator '{op}' is not valid for {domain} values")]
    InvalidOperatorForDomain {
        op: FilterOperator,
        domain: ValueDomain,
    },

    /// A list value was combined with an operator other than equality.
    #[error("operator '{0}' cannot be applied to a list value")]
    InvalidListOperator(FilterOperator),

    /// A criterion value has no representation in the field's domain.
    #[error("value {value} cannot be bound to {domain} field '{field}'")]
    UnboundValue {
        field: String,
        domain: ValueDomain,
        value: String,
    },

    /// The request was rejected by validation (strict field policy).
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A process-wide handler registry was already installed.
    #[error("filter handler registry is already initialized")]
    RegistryInitialized,

    /// Decimal literal could not be parsed.
    #[error("invalid decimal literal: {0}")]
    InvalidDecimal(String),

    /// JSON configuration could not be parsed.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration could not be parsed.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
