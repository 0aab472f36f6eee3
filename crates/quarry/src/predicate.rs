//! Predicate compilation.
//!
//! A typed criterion compiles in two steps: [`compile_test`] turns the
//! operator and bound operand into a [`ValueTest`] over a single field value,
//! then [`Predicate::bind`] attaches that test to a field accessor. Every
//! predicate for an entity type takes the same `&T`, so [`conjoin`] is a plain
//! logical AND over the fragments.

use std::fmt;
use std::sync::Arc;

use crate::criterion::{Operand, TypedCriterion};
use crate::domain::ValueDomain;
use crate::error::{QuarryError, Result};
use crate::field::FieldDescriptor;
use crate::op::FilterOperator;
use crate::value::{ScalarValue, Value};

/// A compiled test over one field value.
pub type ValueTest = Arc<dyn Fn(&Value<'_>) -> bool + Send + Sync>;

/// A compiled boolean test over an entity.
///
/// Cheap to clone, `Send + Sync`, and immutable.
pub struct Predicate<T> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: 'static> Predicate<T> {
    /// Wraps a closure as a predicate.
    pub fn new(test: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Predicate {
            test: Arc::new(test),
        }
    }

    /// A predicate that accepts every entity.
    pub fn always() -> Self {
        Predicate::new(|_| true)
    }

    /// Applies a value test to the field described by `field`.
    pub fn bind(field: FieldDescriptor<T>, test: ValueTest) -> Self {
        Predicate::new(move |entity| test(&field.extract(entity)))
    }

    /// Evaluates this predicate against an entity.
    pub fn evaluate(&self, entity: &T) -> bool {
        (self.test)(entity)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Combines predicates with logical AND.
///
/// An empty list yields a predicate that is always true; a single predicate
/// is returned as is.
///
/// ```
/// use quarry::{conjoin, Predicate};
///
/// let even = Predicate::new(|n: &i32| n % 2 == 0);
/// let positive = Predicate::new(|n: &i32| *n > 0);
///
/// let both = conjoin(vec![even, positive]);
/// assert!(both.evaluate(&4));
/// assert!(!both.evaluate(&-4));
/// assert!(!both.evaluate(&3));
///
/// assert!(conjoin(Vec::<Predicate<i32>>::new()).evaluate(&7));
/// ```
pub fn conjoin<T: 'static>(mut predicates: Vec<Predicate<T>>) -> Predicate<T> {
    match predicates.len() {
        0 => Predicate::always(),
        1 => predicates.remove(0),
        _ => Predicate::new(move |entity| predicates.iter().all(|p| p.evaluate(entity))),
    }
}

/// Compiles typed criteria against field descriptors.
pub struct PredicateCompiler;

impl PredicateCompiler {
    /// Compiles `criterion` against `field`.
    ///
    /// # Panics
    ///
    /// Panics if the operator is not valid for the field's domain or the
    /// value cannot be bound to it. Use [`PredicateCompiler::try_compile`]
    /// to reject such criteria instead.
    pub fn compile<T: 'static>(
        field: &FieldDescriptor<T>,
        criterion: &TypedCriterion,
    ) -> Predicate<T> {
        match Self::try_compile(field, criterion) {
            Ok(predicate) => predicate,
            Err(e) => panic!("cannot compile criterion on '{}': {e}", field.name()),
        }
    }

    /// Fallible form of [`PredicateCompiler::compile`].
    pub fn try_compile<T: 'static>(
        field: &FieldDescriptor<T>,
        criterion: &TypedCriterion,
    ) -> Result<Predicate<T>> {
        let operand = bind_operand(field.name(), field.domain(), criterion)?;
        let test = try_compile_test(field.domain(), criterion.operator, operand)?;
        Ok(Predicate::bind(*field, test))
    }
}

/// Binds a criterion value to `domain`, naming `field` on failure.
pub(crate) fn bind_operand(
    field: &str,
    domain: ValueDomain,
    criterion: &TypedCriterion,
) -> Result<Operand> {
    criterion
        .bind(domain)
        .ok_or_else(|| QuarryError::UnboundValue {
            field: field.to_string(),
            domain,
            value: serde_json::to_string(&criterion.value).unwrap_or_default(),
        })
}

/// Compiles an operator and bound operand into a value test.
///
/// # Panics
///
/// Panics on an operator/domain mismatch, see [`try_compile_test`].
pub fn compile_test(domain: ValueDomain, op: FilterOperator, operand: Operand) -> ValueTest {
    match try_compile_test(domain, op, operand) {
        Ok(test) => test,
        Err(e) => panic!("{e}"),
    }
}

/// Compiles an operator and bound operand into a value test.
///
/// Semantics:
/// - equality is domain-typed and exact, strings included
/// - ordering operators follow the domain's natural order
/// - text operators compare lowercased haystack and needle
/// - a set operand means membership (`NotEqual`: non-membership)
/// - a constant operand accepts every present value or none
/// - a missing field value never satisfies any test
pub fn try_compile_test(
    domain: ValueDomain,
    op: FilterOperator,
    operand: Operand,
) -> Result<ValueTest> {
    domain.check(op)?;

    let test: ValueTest = match operand {
        Operand::Set(set) => {
            if !op.is_equality() {
                return Err(QuarryError::InvalidListOperator(op));
            }
            let negated = op.is_negated();
            Arc::new(move |value: &Value<'_>| {
                !value.is_none() && set.iter().any(|s| value.eq_scalar(s)) != negated
            })
        }
        Operand::Single(ScalarValue::String(needle)) if op.is_text() => {
            let needle = needle.to_lowercase();
            let positive = op.positive();
            let negated = op.is_negated();
            Arc::new(move |value: &Value<'_>| match value.as_str() {
                Some(hay) => text_matches(positive, &hay.to_lowercase(), &needle) != negated,
                None => false,
            })
        }
        Operand::Single(scalar) if op.is_equality() => {
            let negated = op.is_negated();
            Arc::new(move |value: &Value<'_>| {
                !value.is_none() && value.eq_scalar(&scalar) != negated
            })
        }
        Operand::Single(scalar) if op.is_ordering() => Arc::new(move |value: &Value<'_>| {
            if is_nan(value) {
                return false;
            }
            value
                .compare_scalar(&scalar)
                .is_some_and(|ordering| op.eval_ordering(ordering))
        }),
        Operand::Single(_) => {
            return Err(QuarryError::InvalidOperatorForDomain { op, domain });
        }
        Operand::Constant(outcome) => {
            Arc::new(move |value: &Value<'_>| outcome && !value.is_none() && !is_nan(value))
        }
    };
    Ok(test)
}

fn text_matches(op: FilterOperator, hay: &str, needle: &str) -> bool {
    match op {
        FilterOperator::Contains => hay.contains(needle),
        FilterOperator::StartsWith => hay.starts_with(needle),
        FilterOperator::EndsWith => hay.ends_with(needle),
        _ => false,
    }
}

fn is_nan(value: &Value<'_>) -> bool {
    match value {
        Value::Float(n) => n.is_nan(),
        Value::Double(n) => n.is_nan(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(scalar: ScalarValue) -> Operand {
        Operand::Single(scalar)
    }

    fn text(s: &str) -> Operand {
        single(ScalarValue::String(s.to_string()))
    }

    #[test]
    fn contains_is_case_insensitive() {
        let test = compile_test(ValueDomain::String, FilterOperator::Contains, text("ACME"));
        assert!(test(&Value::String("jane@acme.com")));
        assert!(test(&Value::String("JANE@ACME.COM")));
        assert!(!test(&Value::String("jane@other.com")));
    }

    #[test]
    fn negated_text_operators() {
        let test = compile_test(ValueDomain::String, FilterOperator::NotStartsWith, text("Re:"));
        assert!(test(&Value::String("hello")));
        assert!(!test(&Value::String("RE: hello")));

        let test = compile_test(ValueDomain::String, FilterOperator::NotEndsWith, text(".COM"));
        assert!(test(&Value::String("acme.org")));
        assert!(!test(&Value::String("acme.com")));

        let test = compile_test(ValueDomain::String, FilterOperator::NotContains, text("x"));
        assert!(test(&Value::String("abc")));
        assert!(!test(&Value::String("xyz")));
    }

    #[test]
    fn string_equality_is_exact() {
        let test = compile_test(ValueDomain::String, FilterOperator::Equal, text("Acme"));
        assert!(test(&Value::String("Acme")));
        assert!(!test(&Value::String("acme")));
    }

    #[test]
    fn ordering_on_numbers() {
        let ge = compile_test(
            ValueDomain::Int32,
            FilterOperator::GreaterOrEqual,
            single(ScalarValue::Int32(18)),
        );
        assert!(ge(&Value::Int32(18)));
        assert!(ge(&Value::Int32(40)));
        assert!(!ge(&Value::Int32(17)));
    }

    #[test]
    fn nan_never_satisfies_ordering() {
        let gt = compile_test(
            ValueDomain::Double,
            FilterOperator::GreaterThan,
            single(ScalarValue::Double(0.0)),
        );
        assert!(!gt(&Value::Double(f64::NAN)));
        assert!(gt(&Value::Double(0.5)));
    }

    #[test]
    fn missing_values_never_match() {
        for op in ValueDomain::String.allowed_operators() {
            let test = compile_test(ValueDomain::String, *op, text("a"));
            assert!(!test(&Value::None), "{op}");
        }
        let ne = compile_test(
            ValueDomain::Boolean,
            FilterOperator::NotEqual,
            single(ScalarValue::Bool(true)),
        );
        assert!(!ne(&Value::None));
        assert!(ne(&Value::Bool(false)));
    }

    #[test]
    fn set_membership() {
        let set = Operand::Set(vec![ScalarValue::Int32(1), ScalarValue::Int32(3)]);
        let is_in = compile_test(ValueDomain::Int32, FilterOperator::Equal, set.clone());
        assert!(is_in(&Value::Int32(3)));
        assert!(!is_in(&Value::Int32(2)));

        let not_in = compile_test(ValueDomain::Int32, FilterOperator::NotEqual, set);
        assert!(not_in(&Value::Int32(2)));
        assert!(!not_in(&Value::Int32(1)));
        assert!(!not_in(&Value::None));
    }

    #[test]
    fn set_rejects_non_equality_operators() {
        let set = Operand::Set(vec![ScalarValue::Int32(1)]);
        let err = try_compile_test(ValueDomain::Int32, FilterOperator::GreaterThan, set).err();
        assert!(matches!(err, Some(QuarryError::InvalidListOperator(_))));
    }

    #[test]
    fn operator_domain_mismatch_is_rejected() {
        let err = try_compile_test(
            ValueDomain::Boolean,
            FilterOperator::GreaterThan,
            single(ScalarValue::Bool(true)),
        )
        .err();
        assert!(matches!(
            err,
            Some(QuarryError::InvalidOperatorForDomain { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "not valid for boolean values")]
    fn compile_test_panics_on_mismatch() {
        compile_test(
            ValueDomain::Boolean,
            FilterOperator::Contains,
            single(ScalarValue::Bool(true)),
        );
    }

    struct Person {
        age: i32,
    }

    fn age_field() -> FieldDescriptor<Person> {
        FieldDescriptor::new("age", ValueDomain::Int32, |p: &Person| Value::Int32(p.age))
    }

    #[test]
    fn compile_binds_wire_numbers() {
        let criterion = TypedCriterion::new("age", FilterOperator::LessThan, 30.0);
        let predicate = PredicateCompiler::compile(&age_field(), &criterion);
        assert!(predicate.evaluate(&Person { age: 29 }));
        assert!(!predicate.evaluate(&Person { age: 30 }));
    }

    #[test]
    fn try_compile_reports_unbound_values() {
        let criterion = TypedCriterion::new("age", FilterOperator::Equal, 2.5);
        let err = PredicateCompiler::try_compile(&age_field(), &criterion).err();
        assert!(matches!(err, Some(QuarryError::UnboundValue { .. })));
    }

    #[test]
    #[should_panic(expected = "cannot compile criterion on 'age'")]
    fn compile_panics_on_text_operator_for_numbers() {
        let criterion = TypedCriterion::new("age", FilterOperator::Contains, 3.0);
        PredicateCompiler::compile(&age_field(), &criterion);
    }

    #[test]
    fn closed_interval_from_two_fragments() {
        let field = age_field();
        let range = conjoin(vec![
            PredicateCompiler::compile(
                &field,
                &TypedCriterion::new("age", FilterOperator::GreaterOrEqual, 18.0),
            ),
            PredicateCompiler::compile(
                &field,
                &TypedCriterion::new("age", FilterOperator::LessOrEqual, 65.0),
            ),
        ]);
        assert!(range.evaluate(&Person { age: 18 }));
        assert!(range.evaluate(&Person { age: 65 }));
        assert!(!range.evaluate(&Person { age: 17 }));
        assert!(!range.evaluate(&Person { age: 66 }));
    }

    #[test]
    fn fractional_bounds_keep_the_interval_closed() {
        let field = age_field();
        let range = conjoin(vec![
            PredicateCompiler::compile(
                &field,
                &TypedCriterion::new("age", FilterOperator::GreaterOrEqual, 17.5),
            ),
            PredicateCompiler::compile(
                &field,
                &TypedCriterion::new("age", FilterOperator::LessOrEqual, 30.25),
            ),
        ]);
        assert!(!range.evaluate(&Person { age: 10 }));
        assert!(!range.evaluate(&Person { age: 17 }));
        assert!(range.evaluate(&Person { age: 18 }));
        assert!(range.evaluate(&Person { age: 30 }));
        assert!(!range.evaluate(&Person { age: 31 }));
    }

    #[test]
    fn out_of_range_bounds_compile_to_constants() {
        let field = age_field();
        let above = PredicateCompiler::compile(
            &field,
            &TypedCriterion::new("age", FilterOperator::GreaterOrEqual, 3e9),
        );
        assert!(!above.evaluate(&Person { age: 10 }));
        assert!(!above.evaluate(&Person { age: i32::MAX }));

        let below = PredicateCompiler::compile(
            &field,
            &TypedCriterion::new("age", FilterOperator::GreaterThan, -3e9),
        );
        assert!(below.evaluate(&Person { age: i32::MIN }));

        let test = compile_test(ValueDomain::Int32, FilterOperator::LessThan, Operand::Constant(true));
        assert!(test(&Value::Int32(5)));
        assert!(!test(&Value::None));
    }

    #[test]
    fn conjoin_single_is_identity() {
        let adult = Predicate::new(|p: &Person| p.age >= 18);
        let same = conjoin(vec![adult.clone()]);
        for age in [0, 17, 18, 99] {
            let p = Person { age };
            assert_eq!(same.evaluate(&p), adult.evaluate(&p));
        }
    }
}
