//! Sort keys and comparator compilation.
//!
//! Provides [`SortKey`] for a field and direction, and [`SortCompiler`] which
//! turns an ordered list of keys into a multi-level [`Comparator`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::{FieldDescriptor, FieldTable};
use crate::value::Value;

/// A single sort key: a field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    /// The field to sort by.
    pub field: String,
    /// `true` for smallest first.
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortKey {
    /// Creates a new ascending key for the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            ascending: true,
        }
    }

    /// Creates a new descending key for the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            ascending: false,
        }
    }

    /// Applies this key's direction to an ordering.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }

    /// Returns `"asc"` or `"desc"`.
    pub fn direction(&self) -> &'static str {
        if self.ascending {
            "asc"
        } else {
            "desc"
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction())
    }
}

/// Compares two field values for sorting.
///
/// Values of the same domain use the domain's natural order (strings are
/// ordinal, floats use the IEEE total order). Missing values sort after
/// present ones. Values of different domains compare equal.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::None, Value::None) => Ordering::Equal,
        (Value::None, _) => Ordering::Greater,
        (_, Value::None) => Ordering::Less,
        _ => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

/// Like [`compare_values`] with a direction applied. Missing values stay last
/// in descending order too.
pub fn compare_directed(a: &Value<'_>, b: &Value<'_>, ascending: bool) -> Ordering {
    let ordering = compare_values(a, b);
    if ascending || a.is_none() || b.is_none() {
        ordering
    } else {
        ordering.reverse()
    }
}

/// A compiled multi-level comparator over entities.
pub struct Comparator<T> {
    cmp: Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>,
}

impl<T: 'static> Comparator<T> {
    /// Wraps a closure as a comparator.
    pub fn new(cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        Comparator { cmp: Arc::new(cmp) }
    }

    /// The identity order: every pair compares equal, so a stable sort keeps
    /// insertion order.
    pub fn identity() -> Self {
        Comparator::new(|_, _| Ordering::Equal)
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.cmp)(a, b)
    }

    /// Stable-sorts a slice of references with this comparator.
    pub fn sort(&self, items: &mut [&T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        Comparator {
            cmp: Arc::clone(&self.cmp),
        }
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Compiles sort keys against a field table.
pub struct SortCompiler;

impl SortCompiler {
    /// Compiles `keys` into a comparator.
    ///
    /// Keys that do not resolve are skipped. The first resolved key is the
    /// primary order; each later key only breaks ties. With no resolved key
    /// the result is [`Comparator::identity`].
    ///
    /// Also returns the resolved keys, with canonical field names.
    pub fn compile<T: 'static>(
        table: &FieldTable<T>,
        keys: &[SortKey],
    ) -> (Comparator<T>, Vec<SortKey>) {
        let mut levels: Vec<(FieldDescriptor<T>, bool)> = Vec::with_capacity(keys.len());
        for key in keys {
            match table.resolve(&key.field) {
                Some(field) => levels.push((*field, key.ascending)),
                None => debug!(field = %key.field, "dropping sort key on unknown field"),
            }
        }

        let resolved: Vec<SortKey> = levels
            .iter()
            .map(|(field, ascending)| SortKey {
                field: field.name().to_string(),
                ascending: *ascending,
            })
            .collect();

        if levels.is_empty() {
            return (Comparator::identity(), resolved);
        }

        let comparator = Comparator::new(move |a, b| {
            for (field, ascending) in &levels {
                let ordering = compare_directed(&field.extract(a), &field.extract(b), *ascending);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        (comparator, resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueDomain;

    #[derive(Debug)]
    struct Item {
        name: String,
        priority: Option<i64>,
    }

    fn table() -> FieldTable<Item> {
        FieldTable::new(vec![
            FieldDescriptor::new("name", ValueDomain::String, |i: &Item| {
                Value::String(&i.name)
            }),
            FieldDescriptor::new("priority", ValueDomain::Int64, |i: &Item| {
                i.priority.map_or(Value::None, Value::Int64)
            }),
        ])
    }

    fn item(name: &str, priority: Option<i64>) -> Item {
        Item {
            name: name.to_string(),
            priority,
        }
    }

    fn names(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn sort_key_direction() {
        assert_eq!(SortKey::asc("a").apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortKey::desc("a").apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortKey::desc("name").to_string(), "name desc");
    }

    #[test]
    fn sort_key_wire_format() {
        let key: SortKey = serde_json::from_str(r#"{"field":"age"}"#).unwrap();
        assert_eq!(key, SortKey::asc("age"));
        let key: SortKey = serde_json::from_str(r#"{"field":"age","ascending":false}"#).unwrap();
        assert_eq!(key, SortKey::desc("age"));
    }

    #[test]
    fn compare_none_values() {
        let none = Value::None;
        let some = Value::String("test");

        // None sorts last
        assert_eq!(compare_values(&none, &some), Ordering::Greater);
        assert_eq!(compare_values(&some, &none), Ordering::Less);
        assert_eq!(compare_values(&none, &none), Ordering::Equal);
    }

    #[test]
    fn compare_type_mismatch_is_equal() {
        assert_eq!(
            compare_values(&Value::String("a"), &Value::Int32(1)),
            Ordering::Equal
        );
    }

    #[test]
    fn multi_level_ordering() {
        let items = vec![
            item("b", Some(1)),
            item("a", Some(2)),
            item("a", Some(1)),
            item("c", None),
        ];
        let keys = [SortKey::asc("priority"), SortKey::asc("name")];
        let (cmp, resolved) = SortCompiler::compile(&table(), &keys);
        assert_eq!(resolved.len(), 2);

        let mut refs: Vec<&Item> = items.iter().collect();
        cmp.sort(&mut refs);
        assert_eq!(names(&refs), ["a", "b", "a", "c"]);
        assert_eq!(refs[0].priority, Some(1));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let keys = [SortKey::asc("nope"), SortKey::desc("NAME")];
        let (cmp, resolved) = SortCompiler::compile(&table(), &keys);
        assert_eq!(resolved, vec![SortKey::desc("name")]);

        let items = [item("a", None), item("c", None), item("b", None)];
        let mut refs: Vec<&Item> = items.iter().collect();
        cmp.sort(&mut refs);
        assert_eq!(names(&refs), ["c", "b", "a"]);
    }

    #[test]
    fn no_resolvable_key_keeps_insertion_order() {
        let (cmp, resolved) = SortCompiler::compile(&table(), &[SortKey::asc("nope")]);
        assert!(resolved.is_empty());

        let items = [item("z", Some(3)), item("a", Some(1)), item("m", None)];
        let mut refs: Vec<&Item> = items.iter().collect();
        cmp.sort(&mut refs);
        assert_eq!(names(&refs), ["z", "a", "m"]);
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let items = [item("x", None), item("y", Some(5)), item("z", Some(9))];

        let (cmp, _) = SortCompiler::compile(&table(), &[SortKey::desc("priority")]);
        let mut refs: Vec<&Item> = items.iter().collect();
        cmp.sort(&mut refs);
        assert_eq!(names(&refs), ["z", "y", "x"]);

        let (cmp, _) = SortCompiler::compile(&table(), &[SortKey::asc("priority")]);
        cmp.sort(&mut refs);
        assert_eq!(names(&refs), ["y", "z", "x"]);
    }
}
