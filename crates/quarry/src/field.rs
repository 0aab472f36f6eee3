//! Field descriptors and the per-type field table cache.
//!
//! A [`FieldTable`] is built once per [`Searchable`] type from its
//! [`search_fields`](Searchable::search_fields) and then shared through
//! [`FieldResolver`], keyed by the type's `TypeId`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::domain::ValueDomain;
use crate::traits::Searchable;
use crate::value::Value;

/// Extracts a field value from an entity.
pub type Accessor<T> = for<'a> fn(&'a T) -> Value<'a>;

/// A named, typed accessor on an entity shape.
pub struct FieldDescriptor<T> {
    name: &'static str,
    domain: ValueDomain,
    accessor: Accessor<T>,
}

impl<T> FieldDescriptor<T> {
    /// Creates a descriptor.
    pub fn new(name: &'static str, domain: ValueDomain, accessor: Accessor<T>) -> Self {
        FieldDescriptor {
            name,
            domain,
            accessor,
        }
    }

    /// The canonical field name, as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    pub fn accessor(&self) -> Accessor<T> {
        self.accessor
    }

    /// Reads this field from `entity`.
    pub fn extract<'a>(&self, entity: &'a T) -> Value<'a> {
        (self.accessor)(entity)
    }
}

// Manual impls: `T` itself need not be `Clone`/`Debug`.
impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldDescriptor<T> {}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .finish()
    }
}

/// Immutable name-to-descriptor map for one entity type.
///
/// Lookups ignore case, using Unicode lowercase mapping. When two descriptors
/// collide ignoring case the first one wins.
pub struct FieldTable<T> {
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<String, usize>,
}

impl<T> FieldTable<T> {
    /// Builds a table from a descriptor list.
    pub fn new(fields: Vec<FieldDescriptor<T>>) -> Self {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            let key = field.name.to_lowercase();
            if index.contains_key(&key) {
                warn!(
                    field = field.name,
                    "duplicate searchable field name ignoring case; keeping the first"
                );
                continue;
            }
            index.insert(key, i);
        }
        FieldTable { fields, index }
    }

    /// Looks up a field by name, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.fields[i])
    }

    /// Returns `true` if `name` resolves to a field.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// All descriptors, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> fmt::Debug for FieldTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

type TableCache = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static TABLES: Lazy<RwLock<TableCache>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Process-wide resolver for searchable fields.
///
/// The first resolution for a type builds its [`FieldTable`]; later calls
/// reuse the cached table.
///
/// # Example
///
/// ```
/// use quarry::{FieldDescriptor, FieldResolver, Searchable, Value, ValueDomain};
///
/// struct User {
///     email: String,
/// }
///
/// impl Searchable for User {
///     fn search_fields() -> Vec<FieldDescriptor<Self>> {
///         vec![FieldDescriptor::new("email", ValueDomain::String, |u: &User| {
///             Value::String(&u.email)
///         })]
///     }
/// }
///
/// let field = FieldResolver::resolve::<User>("EMAIL").unwrap();
/// assert_eq!(field.name(), "email");
/// assert!(FieldResolver::resolve::<User>("phone").is_none());
/// ```
pub struct FieldResolver;

impl FieldResolver {
    /// Returns the cached field table for `T`, building it on first use.
    pub fn table<T: Searchable>() -> Arc<FieldTable<T>> {
        let key = TypeId::of::<T>();

        let cached = TABLES
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(table) = cached.and_then(downcast::<T>) {
            return table;
        }

        let mut tables = TABLES.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have built it between the two locks
        if let Some(table) = tables.get(&key).cloned().and_then(downcast::<T>) {
            return table;
        }
        let table = Arc::new(FieldTable::new(T::search_fields()));
        debug!(
            entity = std::any::type_name::<T>(),
            fields = table.len(),
            "built field table"
        );
        tables.insert(key, table.clone() as Arc<dyn Any + Send + Sync>);
        table
    }

    /// Resolves a field of `T` by name, ignoring case.
    pub fn resolve<T: Searchable>(name: &str) -> Option<FieldDescriptor<T>> {
        Self::table::<T>().resolve(name).copied()
    }
}

fn downcast<T: Searchable>(any: Arc<dyn Any + Send + Sync>) -> Option<Arc<FieldTable<T>>> {
    any.downcast::<FieldTable<T>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        name: String,
        count: i64,
    }

    impl Searchable for Item {
        fn search_fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::new("Name", ValueDomain::String, |i: &Item| {
                    Value::String(&i.name)
                }),
                FieldDescriptor::new("count", ValueDomain::Int64, |i: &Item| {
                    Value::Int64(i.count)
                }),
                FieldDescriptor::new("NAME", ValueDomain::String, |_: &Item| Value::None),
            ]
        }
    }

    #[test]
    fn resolve_ignores_case() {
        let table = FieldResolver::table::<Item>();
        assert_eq!(table.resolve("name").map(|f| f.name()), Some("Name"));
        assert_eq!(table.resolve("COUNT").map(|f| f.domain()), Some(ValueDomain::Int64));
        assert!(table.resolve("missing").is_none());
    }

    #[test]
    fn resolve_folds_non_ascii_letters() {
        let table = FieldTable::new(vec![
            FieldDescriptor::new("Öffnungszeit", ValueDomain::String, |i: &Item| {
                Value::String(&i.name)
            }),
            FieldDescriptor::new("ΣΤΟΚ", ValueDomain::Int64, |i: &Item| Value::Int64(i.count)),
        ]);
        assert_eq!(
            table.resolve("öFFNUNGSZEIT").map(|f| f.name()),
            Some("Öffnungszeit")
        );
        assert_eq!(table.resolve("στοκ").map(|f| f.name()), Some("ΣΤΟΚ"));
        assert!(table.resolve("offnungszeit").is_none());
    }

    #[test]
    fn duplicate_names_keep_first() {
        let item = Item {
            name: "widget".into(),
            count: 3,
        };
        let field = FieldResolver::resolve::<Item>("name").unwrap();
        assert_eq!(field.extract(&item), Value::String("widget"));
        assert_eq!(FieldResolver::table::<Item>().len(), 3);
    }

    #[test]
    fn table_is_cached() {
        let a = FieldResolver::table::<Item>();
        let b = FieldResolver::table::<Item>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn descriptor_debug_omits_accessor() {
        let field = FieldResolver::resolve::<Item>("count").unwrap();
        let debug = format!("{field:?}");
        assert!(debug.contains("count"));
        assert!(debug.contains("Int64"));
    }
}
