//! Runtime value types for field comparison.
//!
//! [`Value`] is what an accessor extracts from an entity: it borrows string
//! data from the source struct. [`ScalarValue`] is the owned, domain-typed
//! counterpart stored inside compiled predicates.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::decimal::Decimal;
use crate::domain::ValueDomain;

/// Runtime value of a field, borrowed from the source entity.
///
/// # Example
///
/// ```
/// use quarry::Value;
///
/// struct User {
///     email: String,
///     age: i32,
/// }
///
/// fn email(user: &User) -> Value<'_> {
///     Value::String(&user.email)
/// }
///
/// let user = User { email: "jane@acme.com".into(), age: 41 };
/// assert_eq!(email(&user).as_str(), Some("jane@acme.com"));
/// assert_eq!(Value::Int32(user.age).as_i64(), Some(41));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    /// String value (borrowed).
    String(&'a str),
    Identifier(Uuid),
    Timestamp(DateTime<Utc>),
    /// Field absent, null, or unsupported.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns the domain of this value, or `None` for [`Value::None`].
    pub fn domain(&self) -> Option<ValueDomain> {
        Some(match self {
            Value::Bool(_) => ValueDomain::Boolean,
            Value::Byte(_) => ValueDomain::Byte,
            Value::Int32(_) => ValueDomain::Int32,
            Value::Int64(_) => ValueDomain::Int64,
            Value::Float(_) => ValueDomain::Float,
            Value::Double(_) => ValueDomain::Double,
            Value::Decimal(_) => ValueDomain::Decimal,
            Value::String(_) => ValueDomain::String,
            Value::Identifier(_) => ValueDomain::Identifier,
            Value::Timestamp(_) => ValueDomain::Timestamp,
            Value::None => return None,
        })
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts any integer domain value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(n) => Some(i64::from(*n)),
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the identifier, if present.
    pub fn as_identifier(&self) -> Option<Uuid> {
        match self {
            Value::Identifier(id) => Some(*id),
            _ => None,
        }
    }

    /// Extracts the timestamp, if present.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Compares two values of the same domain.
    ///
    /// Returns `None` when the domains differ or either side is `None`.
    /// Floating point values use the IEEE total order, so the result is
    /// always defined for same-domain operands.
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Byte(a), Value::Byte(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Double(a), Value::Double(b)) => Some(a.total_cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Identifier(a), Value::Identifier(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Compares this value with an owned scalar of the same domain.
    pub fn compare_scalar(&self, scalar: &ScalarValue) -> Option<Ordering> {
        self.compare(&scalar.as_value())
    }

    /// Domain-typed equality with an owned scalar.
    ///
    /// Floats compare with `==` here, so `NaN` never equals anything.
    pub fn eq_scalar(&self, scalar: &ScalarValue) -> bool {
        match (self, scalar) {
            (Value::Float(a), ScalarValue::Float(b)) => a == b,
            (Value::Double(a), ScalarValue::Double(b)) => a == b,
            _ => self.compare_scalar(scalar) == Some(Ordering::Equal),
        }
    }
}

/// Owned, domain-typed value stored in compiled predicates.
///
/// Unlike [`Value`], which borrows from an entity, `ScalarValue` owns its data
/// so it can live inside a predicate closure.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Identifier(Uuid),
    Timestamp(DateTime<Utc>),
}

impl ScalarValue {
    /// Returns the domain of this scalar.
    pub fn domain(&self) -> ValueDomain {
        match self {
            ScalarValue::Bool(_) => ValueDomain::Boolean,
            ScalarValue::Byte(_) => ValueDomain::Byte,
            ScalarValue::Int32(_) => ValueDomain::Int32,
            ScalarValue::Int64(_) => ValueDomain::Int64,
            ScalarValue::Float(_) => ValueDomain::Float,
            ScalarValue::Double(_) => ValueDomain::Double,
            ScalarValue::Decimal(_) => ValueDomain::Decimal,
            ScalarValue::String(_) => ValueDomain::String,
            ScalarValue::Identifier(_) => ValueDomain::Identifier,
            ScalarValue::Timestamp(_) => ValueDomain::Timestamp,
        }
    }

    /// Borrows this scalar as a runtime [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Byte(n) => Value::Byte(*n),
            ScalarValue::Int32(n) => Value::Int32(*n),
            ScalarValue::Int64(n) => Value::Int64(*n),
            ScalarValue::Float(n) => Value::Float(*n),
            ScalarValue::Double(n) => Value::Double(*n),
            ScalarValue::Decimal(d) => Value::Decimal(*d),
            ScalarValue::String(s) => Value::String(s),
            ScalarValue::Identifier(id) => Value::Identifier(*id),
            ScalarValue::Timestamp(t) => Value::Timestamp(*t),
        }
    }
}

impl From<Value<'_>> for Option<ScalarValue> {
    fn from(value: Value<'_>) -> Self {
        Some(match value {
            Value::Bool(b) => ScalarValue::Bool(b),
            Value::Byte(n) => ScalarValue::Byte(n),
            Value::Int32(n) => ScalarValue::Int32(n),
            Value::Int64(n) => ScalarValue::Int64(n),
            Value::Float(n) => ScalarValue::Float(n),
            Value::Double(n) => ScalarValue::Double(n),
            Value::Decimal(d) => ScalarValue::Decimal(d),
            Value::String(s) => ScalarValue::String(s.to_string()),
            Value::Identifier(id) => ScalarValue::Identifier(id),
            Value::Timestamp(t) => ScalarValue::Timestamp(t),
            Value::None => return None,
        })
    }
}
