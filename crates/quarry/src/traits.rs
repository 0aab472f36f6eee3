//! Traits for derive macro support.
//!
//! This module provides the [`Searchable`] trait which is implemented by
//! the `#[derive(Searchable)]` macro to describe an entity's searchable
//! fields, and [`AsTimestamp`] for the timestamp conversions it relies on.

use chrono::{DateTime, TimeZone, Utc};

use crate::field::FieldDescriptor;

/// Trait for entity types that search requests can be compiled against.
///
/// This trait is typically derived using `#[derive(Searchable)]`, but can
/// also be implemented manually. The descriptor list is read once per type
/// and cached by [`FieldResolver`](crate::FieldResolver).
///
/// # Derive Usage
///
/// ```ignore
/// use quarry::{QueryCompiler, RawCriterion, SearchRequest, Searchable};
///
/// #[derive(Searchable)]
/// struct User {
///     #[search(String)]
///     email: String,
///     #[search(Int32)]
///     age: i32,
///     #[search(Boolean)]
///     active: bool,
/// }
///
/// let request = SearchRequest::new()
///     .filter(RawCriterion::text(User::EMAIL, "acme"))
///     .sort_desc(User::AGE);
///
/// let query = QueryCompiler::<User>::new().compile(&request)?;
/// ```
///
/// # Manual Implementation
///
/// ```
/// use quarry::{FieldDescriptor, Searchable, Value, ValueDomain};
///
/// struct User {
///     email: String,
///     age: i32,
/// }
///
/// impl Searchable for User {
///     fn search_fields() -> Vec<FieldDescriptor<Self>> {
///         vec![
///             FieldDescriptor::new("email", ValueDomain::String, |u: &User| {
///                 Value::String(&u.email)
///             }),
///             FieldDescriptor::new("age", ValueDomain::Int32, |u: &User| {
///                 Value::Int32(u.age)
///             }),
///         ]
///     }
/// }
///
/// assert_eq!(User::search_fields().len(), 2);
/// ```
pub trait Searchable: Sized + 'static {
    /// Returns the descriptor of every searchable field.
    ///
    /// Names must be unique ignoring case; later duplicates are ignored
    /// during resolution.
    fn search_fields() -> Vec<FieldDescriptor<Self>>;
}

/// Helper trait for converting field types to UTC timestamps.
///
/// This trait is used by the `#[derive(Searchable)]` macro when a field is
/// marked with `#[search(Timestamp)]`. Implement it for your own datetime
/// types to make them searchable.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use quarry::AsTimestamp;
///
/// struct Seconds(i64);
///
/// impl AsTimestamp for Seconds {
///     fn as_timestamp(&self) -> DateTime<Utc> {
///         DateTime::from_timestamp(self.0, 0).unwrap_or_default()
///     }
/// }
///
/// assert_eq!(Seconds(60).as_timestamp().timestamp(), 60);
/// ```
pub trait AsTimestamp {
    /// Converts this value to a UTC instant for comparison.
    fn as_timestamp(&self) -> DateTime<Utc>;
}

impl AsTimestamp for DateTime<Utc> {
    fn as_timestamp(&self) -> DateTime<Utc> {
        *self
    }
}

/// Milliseconds since the Unix epoch. Out-of-range values clamp to the epoch.
impl AsTimestamp for i64 {
    fn as_timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(*self)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueDomain;
    use crate::value::Value;

    struct TestItem {
        name: String,
        count: i32,
    }

    impl Searchable for TestItem {
        fn search_fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("name", ValueDomain::String, |i: &TestItem| {
                    Value::String(&i.name)
                }),
                FieldDescriptor::new("count", ValueDomain::Int32, |i: &TestItem| {
                    Value::Int32(i.count)
                }),
            ]
        }
    }

    #[test]
    fn searchable_manual_impl() {
        let item = TestItem {
            name: "test".to_string(),
            count: 42,
        };

        let fields = TestItem::search_fields();
        assert_eq!(fields[0].name(), "name");
        assert_eq!(fields[0].extract(&item), Value::String("test"));
        assert_eq!(fields[1].extract(&item), Value::Int32(42));
    }

    #[test]
    fn timestamp_from_millis() {
        let ts: i64 = 1_000;
        assert_eq!(ts.as_timestamp().timestamp_millis(), 1_000);
    }

    #[test]
    fn timestamp_identity() {
        let now = Utc::now();
        assert_eq!(now.as_timestamp(), now);
    }
}
