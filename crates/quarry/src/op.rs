//! Filter operators for typed criteria.
//!
//! The [`FilterOperator`] enum is closed: every operator a handler can be
//! asked to compile is listed here. Which operators are legal for a given
//! value domain is decided by [`ValueDomain::allowed_operators`].
//!
//! [`ValueDomain::allowed_operators`]: crate::ValueDomain::allowed_operators

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Comparison operator carried by a typed criterion.
///
/// Operators fall into three families:
/// - **Equality**: `Equal`, `NotEqual` - valid for every domain
/// - **Ordering**: `GreaterThan`, `GreaterOrEqual`, `LessThan`, `LessOrEqual`
/// - **Text**: `Contains`, `StartsWith`, `EndsWith` and their negations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Exact match.
    Equal,
    /// Not an exact match.
    NotEqual,
    /// Strictly greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Strictly less than.
    LessThan,
    /// Less than or equal.
    LessOrEqual,
    /// Case-insensitive substring match.
    Contains,
    /// Negated case-insensitive substring match.
    NotContains,
    /// Case-insensitive prefix match.
    StartsWith,
    /// Negated case-insensitive prefix match.
    NotStartsWith,
    /// Case-insensitive suffix match.
    EndsWith,
    /// Negated case-insensitive suffix match.
    NotEndsWith,
}

impl FilterOperator {
    /// Every operator, in declaration order.
    pub const ALL: [FilterOperator; 12] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterOrEqual,
        FilterOperator::LessThan,
        FilterOperator::LessOrEqual,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::StartsWith,
        FilterOperator::NotStartsWith,
        FilterOperator::EndsWith,
        FilterOperator::NotEndsWith,
    ];

    /// Returns `true` for `Equal` and `NotEqual`.
    pub fn is_equality(self) -> bool {
        matches!(self, FilterOperator::Equal | FilterOperator::NotEqual)
    }

    /// Returns `true` for the four range comparisons.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::GreaterOrEqual
                | FilterOperator::LessThan
                | FilterOperator::LessOrEqual
        )
    }

    /// Returns `true` for substring, prefix and suffix operators (negated or not).
    pub fn is_text(self) -> bool {
        matches!(
            self,
            FilterOperator::Contains
                | FilterOperator::NotContains
                | FilterOperator::StartsWith
                | FilterOperator::NotStartsWith
                | FilterOperator::EndsWith
                | FilterOperator::NotEndsWith
        )
    }

    /// Returns `true` if this operator inverts the result of its positive form.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            FilterOperator::NotEqual
                | FilterOperator::NotContains
                | FilterOperator::NotStartsWith
                | FilterOperator::NotEndsWith
        )
    }

    /// Maps a negated text or equality operator to its positive form.
    ///
    /// Ordering operators are returned unchanged.
    pub fn positive(self) -> FilterOperator {
        match self {
            FilterOperator::NotEqual => FilterOperator::Equal,
            FilterOperator::NotContains => FilterOperator::Contains,
            FilterOperator::NotStartsWith => FilterOperator::StartsWith,
            FilterOperator::NotEndsWith => FilterOperator::EndsWith,
            other => other,
        }
    }

    /// Evaluates an equality or ordering operator given an ordering result.
    ///
    /// Text operators always evaluate to `false` here.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            FilterOperator::Equal => ordering == Ordering::Equal,
            FilterOperator::NotEqual => ordering != Ordering::Equal,
            FilterOperator::GreaterThan => ordering == Ordering::Greater,
            FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
            FilterOperator::LessThan => ordering == Ordering::Less,
            FilterOperator::LessOrEqual => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equal => "equal",
            FilterOperator::NotEqual => "notEqual",
            FilterOperator::GreaterThan => "greaterThan",
            FilterOperator::GreaterOrEqual => "greaterOrEqual",
            FilterOperator::LessThan => "lessThan",
            FilterOperator::LessOrEqual => "lessOrEqual",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notContains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::NotStartsWith => "notStartsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::NotEndsWith => "notEndsWith",
        }
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_families_are_disjoint() {
        for op in FilterOperator::ALL {
            let families = [op.is_equality(), op.is_ordering(), op.is_text()];
            assert_eq!(families.iter().filter(|f| **f).count(), 1, "{op}");
        }
    }

    #[test]
    fn positive_forms() {
        assert_eq!(FilterOperator::NotEqual.positive(), FilterOperator::Equal);
        assert_eq!(
            FilterOperator::NotContains.positive(),
            FilterOperator::Contains
        );
        assert_eq!(
            FilterOperator::NotStartsWith.positive(),
            FilterOperator::StartsWith
        );
        assert_eq!(
            FilterOperator::NotEndsWith.positive(),
            FilterOperator::EndsWith
        );
        assert_eq!(
            FilterOperator::GreaterThan.positive(),
            FilterOperator::GreaterThan
        );
    }

    #[test]
    fn eval_ordering() {
        use FilterOperator::*;

        assert!(Equal.eval_ordering(Ordering::Equal));
        assert!(!Equal.eval_ordering(Ordering::Less));

        assert!(NotEqual.eval_ordering(Ordering::Greater));
        assert!(!NotEqual.eval_ordering(Ordering::Equal));

        assert!(GreaterThan.eval_ordering(Ordering::Greater));
        assert!(!GreaterThan.eval_ordering(Ordering::Equal));

        assert!(GreaterOrEqual.eval_ordering(Ordering::Equal));
        assert!(!GreaterOrEqual.eval_ordering(Ordering::Less));

        assert!(LessThan.eval_ordering(Ordering::Less));
        assert!(!LessThan.eval_ordering(Ordering::Equal));

        assert!(LessOrEqual.eval_ordering(Ordering::Equal));
        assert!(!LessOrEqual.eval_ordering(Ordering::Greater));

        // Text operators never evaluate through an ordering
        assert!(!Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn wire_names_match_serde() {
        for op in FilterOperator::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }
}
