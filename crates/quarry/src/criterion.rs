//! Raw and typed filter criteria.
//!
//! A [`RawCriterion`] is the loosely-typed wire form of a filter: a field name
//! plus optional value slots. [`decompose`] expands it into [`TypedCriterion`]s
//! carrying exactly one operator/value pair each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Decimal;
use crate::domain::ValueDomain;
use crate::op::FilterOperator;
use crate::value::ScalarValue;

/// Wire value carried by a typed criterion.
///
/// The value is not yet bound to a domain: a `Number` becomes an `i32` for an
/// `Int32` field and a `Text` is parsed as a UUID for an `Identifier` field.
/// See [`TypedValue::bind`].
///
/// When deserialized, strings always arrive as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Identifier(Uuid),
    Timestamp(DateTime<Utc>),
    List(Vec<TypedValue>),
}

/// A criterion value bound to a field's domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(ScalarValue),
    /// Membership set from a list value.
    Set(Vec<ScalarValue>),
    /// A range bound outside every value the domain can hold: either every
    /// present value satisfies the test (`true`) or none does.
    Constant(bool),
}

impl TypedValue {
    /// Binds this value to `domain`.
    ///
    /// Returns `None` when the value has no representation in the domain,
    /// e.g. a fractional number for an integer field or an unparseable UUID.
    /// Range bounds are more lenient, see [`TypedCriterion::bind`].
    ///
    /// ```
    /// use quarry::{Operand, ScalarValue, TypedValue, ValueDomain};
    ///
    /// let bound = TypedValue::Number(42.0).bind(ValueDomain::Int32);
    /// assert_eq!(bound, Some(Operand::Single(ScalarValue::Int32(42))));
    ///
    /// assert_eq!(TypedValue::Number(4.2).bind(ValueDomain::Int32), None);
    /// assert_eq!(TypedValue::Text("x".into()).bind(ValueDomain::Identifier), None);
    /// ```
    pub fn bind(&self, domain: ValueDomain) -> Option<Operand> {
        match self {
            TypedValue::List(items) => items
                .iter()
                .map(|item| item.bind_scalar(domain))
                .collect::<Option<Vec<_>>>()
                .map(Operand::Set),
            other => other.bind_scalar(domain).map(Operand::Single),
        }
    }

    fn bind_scalar(&self, domain: ValueDomain) -> Option<ScalarValue> {
        match (self, domain) {
            (TypedValue::Bool(b), ValueDomain::Boolean) => Some(ScalarValue::Bool(*b)),

            (TypedValue::Number(n), ValueDomain::Byte) => integral(*n)
                .and_then(|n| u8::try_from(n).ok())
                .map(ScalarValue::Byte),
            (TypedValue::Number(n), ValueDomain::Int32) => integral(*n)
                .and_then(|n| i32::try_from(n).ok())
                .map(ScalarValue::Int32),
            (TypedValue::Number(n), ValueDomain::Int64) => integral(*n).map(ScalarValue::Int64),
            (TypedValue::Number(n), ValueDomain::Float) => Some(ScalarValue::Float(*n as f32)),
            (TypedValue::Number(n), ValueDomain::Double) => Some(ScalarValue::Double(*n)),
            (TypedValue::Number(n), ValueDomain::Decimal) => {
                Decimal::try_from(*n).ok().map(ScalarValue::Decimal)
            }

            (TypedValue::Text(s), ValueDomain::String) => Some(ScalarValue::String(s.clone())),
            (TypedValue::Text(s), ValueDomain::Identifier) => {
                Uuid::parse_str(s.trim()).ok().map(ScalarValue::Identifier)
            }
            (TypedValue::Text(s), ValueDomain::Timestamp) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|t| ScalarValue::Timestamp(t.with_timezone(&Utc))),
            (TypedValue::Text(s), ValueDomain::Decimal) => {
                s.parse::<Decimal>().ok().map(ScalarValue::Decimal)
            }

            (TypedValue::Identifier(id), ValueDomain::Identifier) => {
                Some(ScalarValue::Identifier(*id))
            }
            (TypedValue::Timestamp(t), ValueDomain::Timestamp) => Some(ScalarValue::Timestamp(*t)),

            _ => None,
        }
    }
}

/// Converts a whole `f64` to `i64`, rejecting fractions and out-of-range values.
fn integral(n: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<f64> for TypedValue {
    fn from(n: f64) -> Self {
        TypedValue::Number(n)
    }
}

impl From<i32> for TypedValue {
    fn from(n: i32) -> Self {
        TypedValue::Number(f64::from(n))
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::Text(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Text(s)
    }
}

impl From<Uuid> for TypedValue {
    fn from(id: Uuid) -> Self {
        TypedValue::Identifier(id)
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(t: DateTime<Utc>) -> Self {
        TypedValue::Timestamp(t)
    }
}

impl<V: Into<TypedValue>> From<Vec<V>> for TypedValue {
    fn from(items: Vec<V>) -> Self {
        TypedValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Wire-level filter: a field name plus optional value slots.
///
/// Each populated slot contributes one constraint; a criterion with no
/// populated slot contributes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCriterion {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_value: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_from: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_to: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_value: Option<Vec<TypedValue>>,
}

impl RawCriterion {
    /// Creates a criterion with no populated slot.
    pub fn new(field: impl Into<String>) -> Self {
        RawCriterion {
            field: field.into(),
            ..Default::default()
        }
    }

    /// Case-insensitive substring filter.
    pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
        RawCriterion::new(field).with_text(value)
    }

    /// Identifier equality filter.
    pub fn identifier(field: impl Into<String>, id: Uuid) -> Self {
        RawCriterion::new(field).with_identifier(id)
    }

    /// Boolean equality filter.
    pub fn boolean(field: impl Into<String>, value: bool) -> Self {
        RawCriterion::new(field).with_bool(value)
    }

    /// Inclusive numeric range; either bound may be open.
    pub fn number_range(field: impl Into<String>, from: Option<f64>, to: Option<f64>) -> Self {
        RawCriterion {
            number_from: from,
            number_to: to,
            ..RawCriterion::new(field)
        }
    }

    /// Inclusive timestamp range; either bound may be open.
    pub fn date_range(
        field: impl Into<String>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        RawCriterion {
            date_from: from,
            date_to: to,
            ..RawCriterion::new(field)
        }
    }

    /// List membership filter.
    pub fn one_of<V: Into<TypedValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        RawCriterion {
            list_value: Some(values.into_iter().map(Into::into).collect()),
            ..RawCriterion::new(field)
        }
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.string_value = Some(value.into());
        self
    }

    pub fn with_identifier(mut self, id: Uuid) -> Self {
        self.identifier_value = Some(id);
        self
    }

    pub fn with_bool(mut self, value: bool) -> Self {
        self.bool_value = Some(value);
        self
    }

    /// Returns `true` if no slot would contribute a constraint.
    ///
    /// Empty strings and empty lists count as unpopulated.
    pub fn is_empty(&self) -> bool {
        decompose(self).is_empty()
    }
}

/// One operator/value pair against one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedCriterion {
    pub field: String,
    pub operator: FilterOperator,
    pub value: TypedValue,
}

impl TypedCriterion {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<TypedValue>,
    ) -> Self {
        TypedCriterion {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Binds the value to `domain` for this criterion's operator.
    ///
    /// Equality and membership need a value the domain represents exactly.
    /// A number bounding an ordering operator on a numeric domain is instead
    /// rounded onto the values the field can hold, in the direction that
    /// keeps the comparison exact: `age >= 17.5` on an integer field becomes
    /// `age >= 18`. A bound beyond the domain's range binds to
    /// [`Operand::Constant`].
    ///
    /// ```
    /// use quarry::{FilterOperator, Operand, ScalarValue, TypedCriterion, ValueDomain};
    ///
    /// let c = TypedCriterion::new("age", FilterOperator::GreaterOrEqual, 17.5);
    /// assert_eq!(c.bind(ValueDomain::Int32), Some(Operand::Single(ScalarValue::Int32(18))));
    ///
    /// let c = TypedCriterion::new("age", FilterOperator::GreaterOrEqual, 3e9);
    /// assert_eq!(c.bind(ValueDomain::Int32), Some(Operand::Constant(false)));
    /// ```
    pub fn bind(&self, domain: ValueDomain) -> Option<Operand> {
        match self.value {
            TypedValue::Number(n) if self.operator.is_ordering() => {
                bind_bound(n, self.operator, domain)
            }
            _ => self.value.bind(domain),
        }
    }
}

/// Binds a numeric range bound. Integer, float and decimal fields hold a
/// discrete set of values, so for those values `v >= n` is `v >= ceil(n)`,
/// `v > n` is `v > floor(n)`, `v <= n` is `v <= floor(n)` and `v < n` is
/// `v < ceil(n)`.
fn bind_bound(n: f64, op: FilterOperator, domain: ValueDomain) -> Option<Operand> {
    if n.is_nan() {
        return None;
    }
    let up = matches!(
        op,
        FilterOperator::GreaterOrEqual | FilterOperator::LessThan
    );
    let greater = matches!(
        op,
        FilterOperator::GreaterOrEqual | FilterOperator::GreaterThan
    );

    // Err(above): the rounded bound lies above (or below) the whole domain
    let scalar: Result<ScalarValue, bool> = match domain {
        ValueDomain::Byte => {
            integer_bound(n, up, 0, u8::MAX.into()).map(|b| ScalarValue::Byte(b as u8))
        }
        ValueDomain::Int32 => integer_bound(n, up, i32::MIN.into(), i32::MAX.into())
            .map(|b| ScalarValue::Int32(b as i32)),
        ValueDomain::Int64 => integer_bound(n, up, i64::MIN, i64::MAX).map(ScalarValue::Int64),
        ValueDomain::Float => Ok(ScalarValue::Float(f32_bound(n, up))),
        ValueDomain::Double => Ok(ScalarValue::Double(n)),
        ValueDomain::Decimal => Decimal::bound_from_f64(n, up).map(ScalarValue::Decimal),
        _ => return None,
    };

    Some(match scalar {
        Ok(scalar) => Operand::Single(scalar),
        Err(above) => Operand::Constant(above != greater),
    })
}

fn integer_bound(n: f64, up: bool, min: i64, max: i64) -> Result<i64, bool> {
    // Saturating cast; infinities land far outside any integer domain
    let b = if up { n.ceil() } else { n.floor() } as i128;
    if b > i128::from(max) {
        Err(true)
    } else if b < i128::from(min) {
        Err(false)
    } else {
        Ok(b as i64)
    }
}

/// Nearest `f32` at or above (`up`) or at or below `n`.
fn f32_bound(n: f64, up: bool) -> f32 {
    let rounded = n as f32;
    let widened = f64::from(rounded);
    if widened == n || (widened > n) == up {
        return rounded;
    }
    if rounded == 0.0 {
        let tiny = f32::from_bits(1);
        return if up { tiny } else { -tiny };
    }
    // Adjacent floats have adjacent bit patterns within one sign
    let bits = rounded.to_bits();
    let away_from_zero = (rounded > 0.0) == up;
    f32::from_bits(if away_from_zero { bits + 1 } else { bits - 1 })
}

/// Expands a raw criterion into typed criteria, one per populated slot.
///
/// The output follows slot declaration order. The field name is copied
/// without validation.
///
/// ```
/// use quarry::{decompose, FilterOperator, RawCriterion};
///
/// let raw = RawCriterion::number_range("age", Some(18.0), Some(65.0));
/// let typed = decompose(&raw);
///
/// assert_eq!(typed.len(), 2);
/// assert_eq!(typed[0].operator, FilterOperator::GreaterOrEqual);
/// assert_eq!(typed[1].operator, FilterOperator::LessOrEqual);
///
/// assert!(decompose(&RawCriterion::new("age")).is_empty());
/// ```
pub fn decompose(raw: &RawCriterion) -> Vec<TypedCriterion> {
    let field = raw.field.as_str();
    let mut out = Vec::new();

    if let Some(s) = raw.string_value.as_deref().filter(|s| !s.is_empty()) {
        out.push(TypedCriterion::new(field, FilterOperator::Contains, s));
    }
    if let Some(id) = raw.identifier_value {
        out.push(TypedCriterion::new(field, FilterOperator::Equal, id));
    }
    if let Some(from) = raw.date_from {
        out.push(TypedCriterion::new(field, FilterOperator::GreaterOrEqual, from));
    }
    if let Some(to) = raw.date_to {
        out.push(TypedCriterion::new(field, FilterOperator::LessOrEqual, to));
    }
    if let Some(from) = raw.number_from {
        out.push(TypedCriterion::new(field, FilterOperator::GreaterOrEqual, from));
    }
    if let Some(to) = raw.number_to {
        out.push(TypedCriterion::new(field, FilterOperator::LessOrEqual, to));
    }
    if let Some(b) = raw.bool_value {
        out.push(TypedCriterion::new(field, FilterOperator::Equal, b));
    }
    if let Some(list) = raw.list_value.as_ref().filter(|l| !l.is_empty()) {
        out.push(TypedCriterion::new(
            field,
            FilterOperator::Equal,
            TypedValue::List(list.clone()),
        ));
    }

    out
}
