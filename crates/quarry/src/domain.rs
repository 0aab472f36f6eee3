//! Value domains and the operator compatibility table.

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};
use crate::op::FilterOperator;

const EQUALITY_OPS: &[FilterOperator] = &[FilterOperator::Equal, FilterOperator::NotEqual];

const ORDERED_OPS: &[FilterOperator] = &[
    FilterOperator::Equal,
    FilterOperator::NotEqual,
    FilterOperator::GreaterThan,
    FilterOperator::GreaterOrEqual,
    FilterOperator::LessThan,
    FilterOperator::LessOrEqual,
];

const STRING_OPS: &[FilterOperator] = &[
    FilterOperator::Equal,
    FilterOperator::NotEqual,
    FilterOperator::Contains,
    FilterOperator::NotContains,
    FilterOperator::StartsWith,
    FilterOperator::NotStartsWith,
    FilterOperator::EndsWith,
    FilterOperator::NotEndsWith,
];

/// The value category of a searchable field.
///
/// The domain decides which operators are legal and how values compare.
/// Values never compare across domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueDomain {
    Boolean,
    Byte,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    /// 128-bit UUID identifier.
    Identifier,
    /// UTC instant.
    Timestamp,
}

impl ValueDomain {
    /// Returns the operators valid for this domain.
    pub fn allowed_operators(self) -> &'static [FilterOperator] {
        match self {
            ValueDomain::Boolean | ValueDomain::Identifier => EQUALITY_OPS,
            ValueDomain::Byte
            | ValueDomain::Int32
            | ValueDomain::Int64
            | ValueDomain::Float
            | ValueDomain::Double
            | ValueDomain::Decimal
            | ValueDomain::Timestamp => ORDERED_OPS,
            ValueDomain::String => STRING_OPS,
        }
    }

    /// Returns `true` if `op` may be compiled against this domain.
    pub fn allows(self, op: FilterOperator) -> bool {
        self.allowed_operators().contains(&op)
    }

    /// Rejects an operator/domain mismatch before compilation.
    pub fn check(self, op: FilterOperator) -> Result<()> {
        if self.allows(op) {
            Ok(())
        } else {
            Err(QuarryError::InvalidOperatorForDomain { op, domain: self })
        }
    }

    /// Returns `true` if values of this domain have a natural order usable by
    /// range operators.
    pub fn is_ordered(self) -> bool {
        self.allows(FilterOperator::GreaterThan)
    }

    /// Returns `true` for the six numeric domains.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueDomain::Byte
                | ValueDomain::Int32
                | ValueDomain::Int64
                | ValueDomain::Float
                | ValueDomain::Double
                | ValueDomain::Decimal
        )
    }

    /// Returns the display name of this domain.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueDomain::Boolean => "boolean",
            ValueDomain::Byte => "byte",
            ValueDomain::Int32 => "int32",
            ValueDomain::Int64 => "int64",
            ValueDomain::Float => "float",
            ValueDomain::Double => "double",
            ValueDomain::Decimal => "decimal",
            ValueDomain::String => "string",
            ValueDomain::Identifier => "identifier",
            ValueDomain::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
