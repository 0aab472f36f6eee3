//! Pluggable filter handlers.
//!
//! A [`FilterHandler`] is one strategy for compiling typed criteria. The
//! [`FilterHandlerRegistry`] asks each handler in registration order whether it
//! [`satisfies`](FilterHandler::satisfies) a criterion and lets the first one
//! that does build the test. Handlers are expected to be mutually exclusive;
//! when two overlap, the one registered first wins.
//!
//! A process-wide registry can be installed once with
//! [`FilterHandlerRegistry::install`]. Until then [`FilterHandlerRegistry::global`]
//! lazily provides one holding the [`BuiltinHandlers`].
//!
//! # Custom handlers
//!
//! ```
//! use std::sync::Arc;
//! use quarry::{
//!     FieldTarget, FilterHandler, FilterHandlerRegistry, FilterOperator, TypedCriterion,
//!     TypedValue, Value, ValueDomain, ValueTest,
//! };
//!
//! /// Matches strings equal to the criterion text, ignoring case.
//! struct CaseFoldEquals;
//!
//! impl FilterHandler for CaseFoldEquals {
//!     fn name(&self) -> &'static str {
//!         "case-fold-equals"
//!     }
//!
//!     fn satisfies(&self, target: &FieldTarget, criterion: &TypedCriterion) -> bool {
//!         target.domain == ValueDomain::String
//!             && criterion.operator == FilterOperator::Equal
//!             && matches!(criterion.value, TypedValue::Text(_))
//!     }
//!
//!     fn build(&self, _target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest {
//!         let TypedValue::Text(text) = &criterion.value else {
//!             unreachable!("checked by satisfies")
//!         };
//!         let text = text.to_lowercase();
//!         Arc::new(move |value: &Value<'_>| {
//!             value.as_str().is_some_and(|s| s.to_lowercase() == text)
//!         })
//!     }
//! }
//!
//! let registry = FilterHandlerRegistry::new()
//!     .register(CaseFoldEquals)
//!     .scan(&quarry::BuiltinHandlers);
//!
//! assert_eq!(registry.names()[0], "case-fold-equals");
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info};

use crate::criterion::{Operand, TypedCriterion};
use crate::domain::ValueDomain;
use crate::error::{QuarryError, Result};
use crate::field::FieldDescriptor;
use crate::predicate::{bind_operand, compile_test, Predicate, ValueTest};

/// The field a criterion is compiled against, stripped of its accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldTarget {
    /// Canonical field name.
    pub name: &'static str,
    pub domain: ValueDomain,
}

impl FieldTarget {
    pub fn new(name: &'static str, domain: ValueDomain) -> Self {
        FieldTarget { name, domain }
    }

    /// Describes the field behind `descriptor`.
    pub fn of<T>(descriptor: &FieldDescriptor<T>) -> Self {
        FieldTarget::new(descriptor.name(), descriptor.domain())
    }
}

/// A domain-specific strategy for compiling typed criteria.
pub trait FilterHandler: Send + Sync {
    /// Short identifier, reported in query plans and logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if this handler can compile `criterion` against `target`.
    fn satisfies(&self, target: &FieldTarget, criterion: &TypedCriterion) -> bool;

    /// Builds the value test.
    ///
    /// Only called after [`satisfies`](FilterHandler::satisfies) returned
    /// `true` for the same arguments; implementations may panic otherwise.
    fn build(&self, target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest;
}

/// A plugin contributing an ordered list of handlers.
pub trait HandlerModule {
    fn handlers(&self) -> Vec<Arc<dyn FilterHandler>>;
}

fn bound(target: &FieldTarget, criterion: &TypedCriterion) -> Option<Operand> {
    criterion.bind(target.domain)
}

fn build_bound(target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest {
    match bind_operand(target.name, target.domain, criterion) {
        Ok(operand) => compile_test(target.domain, criterion.operator, operand),
        Err(e) => panic!("{e}"),
    }
}

/// Case-insensitive substring, prefix and suffix tests on string fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHandler;

impl FilterHandler for TextHandler {
    fn name(&self) -> &'static str {
        "text"
    }

    fn satisfies(&self, target: &FieldTarget, criterion: &TypedCriterion) -> bool {
        criterion.operator.is_text()
            && target.domain.allows(criterion.operator)
            && matches!(bound(target, criterion), Some(Operand::Single(_)))
    }

    fn build(&self, target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest {
        build_bound(target, criterion)
    }
}

/// Equality and range comparisons against a single value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarHandler;

impl FilterHandler for ScalarHandler {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn satisfies(&self, target: &FieldTarget, criterion: &TypedCriterion) -> bool {
        !criterion.operator.is_text()
            && target.domain.allows(criterion.operator)
            && matches!(
                bound(target, criterion),
                Some(Operand::Single(_) | Operand::Constant(_))
            )
    }

    fn build(&self, target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest {
        build_bound(target, criterion)
    }
}

/// Set membership for list values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipHandler;

impl FilterHandler for MembershipHandler {
    fn name(&self) -> &'static str {
        "membership"
    }

    fn satisfies(&self, target: &FieldTarget, criterion: &TypedCriterion) -> bool {
        criterion.operator.is_equality()
            && target.domain.allows(criterion.operator)
            && matches!(bound(target, criterion), Some(Operand::Set(_)))
    }

    fn build(&self, target: &FieldTarget, criterion: &TypedCriterion) -> ValueTest {
        build_bound(target, criterion)
    }
}

/// The handlers every default registry starts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinHandlers;

impl HandlerModule for BuiltinHandlers {
    fn handlers(&self) -> Vec<Arc<dyn FilterHandler>> {
        vec![
            Arc::new(TextHandler),
            Arc::new(ScalarHandler),
            Arc::new(MembershipHandler),
        ]
    }
}

static GLOBAL: OnceCell<Arc<FilterHandlerRegistry>> = OnceCell::new();

/// Ordered set of filter handlers; first satisfying handler wins.
#[derive(Clone, Default)]
pub struct FilterHandlerRegistry {
    handlers: Vec<Arc<dyn FilterHandler>>,
}

impl FilterHandlerRegistry {
    /// Creates an empty registry. It compiles nothing until handlers are added.
    pub fn new() -> Self {
        FilterHandlerRegistry::default()
    }

    /// Creates a registry holding the [`BuiltinHandlers`].
    pub fn with_builtins() -> Self {
        FilterHandlerRegistry::new().scan(&BuiltinHandlers)
    }

    /// Appends a handler.
    pub fn register(self, handler: impl FilterHandler + 'static) -> Self {
        self.register_arc(Arc::new(handler))
    }

    /// Appends a shared handler.
    pub fn register_arc(mut self, handler: Arc<dyn FilterHandler>) -> Self {
        debug!(
            handler = handler.name(),
            position = self.handlers.len(),
            "registered filter handler"
        );
        self.handlers.push(handler);
        self
    }

    /// Appends every handler of `module`, in the order the module lists them.
    pub fn scan(self, module: &dyn HandlerModule) -> Self {
        module
            .handlers()
            .into_iter()
            .fold(self, FilterHandlerRegistry::register_arc)
    }

    /// Returns the first handler that satisfies `criterion`.
    pub fn handler_for(
        &self,
        target: &FieldTarget,
        criterion: &TypedCriterion,
    ) -> Option<&dyn FilterHandler> {
        self.handlers
            .iter()
            .find(|h| h.satisfies(target, criterion))
            .map(|h| h.as_ref())
    }

    /// Compiles `criterion` against `field` with the first satisfying handler.
    ///
    /// Returns `None` when no handler satisfies the criterion.
    pub fn compile<T: 'static>(
        &self,
        field: &FieldDescriptor<T>,
        criterion: &TypedCriterion,
    ) -> Option<Predicate<T>> {
        self.compile_with_name(field, criterion)
            .map(|(predicate, _)| predicate)
    }

    /// Like [`compile`](Self::compile), also naming the handler that won.
    pub(crate) fn compile_with_name<T: 'static>(
        &self,
        field: &FieldDescriptor<T>,
        criterion: &TypedCriterion,
    ) -> Option<(Predicate<T>, &'static str)> {
        let target = FieldTarget::of(field);
        let handler = self.handler_for(&target, criterion)?;
        let test = handler.build(&target, criterion);
        Some((Predicate::bind(*field, test), handler.name()))
    }

    /// Handler names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Installs this registry as the process-wide registry.
    ///
    /// Succeeds once. Fails with [`QuarryError::RegistryInitialized`] if a
    /// registry was already installed or [`global`](Self::global) already
    /// created the default one.
    pub fn install(self) -> Result<()> {
        let names = self.names();
        GLOBAL
            .set(Arc::new(self))
            .map_err(|_| QuarryError::RegistryInitialized)?;
        info!(handlers = ?names, "installed filter handler registry");
        Ok(())
    }

    /// Returns the process-wide registry, creating the built-in one if none
    /// was installed.
    pub fn global() -> Arc<FilterHandlerRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(FilterHandlerRegistry::with_builtins()))
            .clone()
    }
}

impl fmt::Debug for FilterHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterHandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::FilterOperator;
    use crate::value::Value;

    fn target(domain: ValueDomain) -> FieldTarget {
        FieldTarget::new("f", domain)
    }

    #[test]
    fn builtins_are_mutually_exclusive() {
        let handlers = BuiltinHandlers.handlers();
        let criteria = [
            (ValueDomain::String, TypedCriterion::new("f", FilterOperator::Contains, "a")),
            (ValueDomain::String, TypedCriterion::new("f", FilterOperator::Equal, "a")),
            (ValueDomain::Int32, TypedCriterion::new("f", FilterOperator::LessThan, 3.0)),
            (
                ValueDomain::Int32,
                TypedCriterion::new("f", FilterOperator::Equal, vec![1, 2]),
            ),
            (ValueDomain::Boolean, TypedCriterion::new("f", FilterOperator::Equal, true)),
        ];
        for (domain, criterion) in &criteria {
            let satisfied = handlers
                .iter()
                .filter(|h| h.satisfies(&target(*domain), criterion))
                .count();
            assert_eq!(satisfied, 1, "{criterion:?}");
        }
    }

    #[test]
    fn routes_to_expected_handler() {
        let registry = FilterHandlerRegistry::with_builtins();
        let name = |domain, criterion: TypedCriterion| {
            registry
                .handler_for(&target(domain), &criterion)
                .map(|h| h.name())
        };

        assert_eq!(
            name(ValueDomain::String, TypedCriterion::new("f", FilterOperator::Contains, "x")),
            Some("text")
        );
        assert_eq!(
            name(ValueDomain::Double, TypedCriterion::new("f", FilterOperator::GreaterThan, 1.0)),
            Some("scalar")
        );
        assert_eq!(
            name(
                ValueDomain::String,
                TypedCriterion::new("f", FilterOperator::Equal, vec!["a", "b"])
            ),
            Some("membership")
        );
    }

    #[test]
    fn unsatisfiable_criteria_have_no_handler() {
        let registry = FilterHandlerRegistry::with_builtins();
        // Text operator on a number field
        let c = TypedCriterion::new("f", FilterOperator::Contains, "1");
        assert!(registry.handler_for(&target(ValueDomain::Int32), &c).is_none());
        // Value does not bind
        let c = TypedCriterion::new("f", FilterOperator::Equal, "not-a-uuid");
        assert!(registry
            .handler_for(&target(ValueDomain::Identifier), &c)
            .is_none());
        // Ordering on a list
        let c = TypedCriterion::new("f", FilterOperator::GreaterThan, vec![1]);
        assert!(registry.handler_for(&target(ValueDomain::Int32), &c).is_none());
    }

    #[test]
    fn empty_registry_compiles_nothing() {
        struct Item(bool);
        let field = FieldDescriptor::new("flag", ValueDomain::Boolean, |i: &Item| Value::Bool(i.0));
        let registry = FilterHandlerRegistry::new();
        assert!(registry.is_empty());
        let c = TypedCriterion::new("flag", FilterOperator::Equal, true);
        assert!(registry.compile(&field, &c).is_none());

        let p = FilterHandlerRegistry::with_builtins()
            .compile(&field, &c)
            .unwrap();
        assert!(p.evaluate(&Item(true)));
        assert!(!p.evaluate(&Item(false)));
    }

    struct Never;

    impl FilterHandler for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn satisfies(&self, _: &FieldTarget, _: &TypedCriterion) -> bool {
            true
        }

        fn build(&self, _: &FieldTarget, _: &TypedCriterion) -> ValueTest {
            Arc::new(|_: &Value<'_>| false)
        }
    }

    #[test]
    fn first_registered_wins_on_overlap() {
        let c = TypedCriterion::new("f", FilterOperator::Equal, true);
        let first = FilterHandlerRegistry::new()
            .register(Never)
            .scan(&BuiltinHandlers);
        let last = FilterHandlerRegistry::with_builtins().register(Never);

        let t = target(ValueDomain::Boolean);
        assert_eq!(first.handler_for(&t, &c).map(|h| h.name()), Some("never"));
        assert_eq!(last.handler_for(&t, &c).map(|h| h.name()), Some("scalar"));
        assert_eq!(last.names(), vec!["text", "scalar", "membership", "never"]);
    }

    #[test]
    fn global_is_shared() {
        let a = FilterHandlerRegistry::global();
        let b = FilterHandlerRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(matches!(
            FilterHandlerRegistry::new().install(),
            Err(QuarryError::RegistryInitialized)
        ));
    }
}
