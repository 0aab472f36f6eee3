//! The query compiler and its output.
//!
//! [`QueryCompiler::compile`] runs the whole pipeline for one
//! [`SearchRequest`]:
//!
//! ```text
//! filters ─ resolve field ─ decompose ─ registry handler ─┐
//!                                                        conjoin ─ predicate
//! sorts ─── SortCompiler ──────────────────────────────── comparator
//! page, pageSize ─ window ─────────────────────────────── skip/take
//! ```
//!
//! The resulting [`CompiledQuery`] executes in memory through
//! [`CompiledQuery::execute`] and friends, and exposes a serializable
//! [`QueryPlan`] for translators targeting other backends.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::CompilerConfig;
use crate::criterion::{decompose, RawCriterion, TypedValue};
use crate::domain::ValueDomain;
use crate::error::Result;
use crate::field::{FieldResolver, FieldTable};
use crate::handler::FilterHandlerRegistry;
use crate::op::FilterOperator;
use crate::ordering::{Comparator, SortCompiler, SortKey};
use crate::page::{window, PageInfo, SearchResult, Window};
use crate::predicate::{conjoin, Predicate};
use crate::request::SearchRequest;
use crate::traits::Searchable;
use crate::validation::validate;

/// Compiles search requests against entity type `T`.
///
/// # Example
///
/// ```
/// use quarry::{FieldDescriptor, QueryCompiler, SearchRequest, Searchable, Value, ValueDomain};
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
///             FieldDescriptor::new("age", ValueDomain::Int32, |u: &User| Value::Int32(u.age)),
///         ]
///     }
/// }
///
/// let users = vec![
///     User { email: "jane@acme.com".into(), age: 41 },
///     User { email: "joe@acme.com".into(), age: 29 },
///     User { email: "ann@other.com".into(), age: 35 },
/// ];
///
/// let request = SearchRequest::new().contains("email", "ACME").sort_asc("age");
/// let query = QueryCompiler::<User>::new().compile(&request).unwrap();
///
/// let result = query.execute(&users);
/// assert_eq!(result.page.total, 2);
/// assert_eq!(result.items[0].email, "joe@acme.com");
/// ```
pub struct QueryCompiler<T> {
    table: Arc<FieldTable<T>>,
    registry: Arc<FilterHandlerRegistry>,
    config: CompilerConfig,
}

impl<T: Searchable> QueryCompiler<T> {
    /// Creates a compiler using the cached field table of `T` and the
    /// process-wide handler registry.
    pub fn new() -> Self {
        QueryCompiler {
            table: FieldResolver::table::<T>(),
            registry: FilterHandlerRegistry::global(),
            config: CompilerConfig::default(),
        }
    }

    /// Uses `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<FilterHandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &FilterHandlerRegistry {
        &self.registry
    }

    /// Compiles a request.
    ///
    /// Under the default permissive policy, filters and sorts on unknown
    /// fields are dropped, as are criteria no handler satisfies. Under the
    /// strict policy the request is [validated](crate::validate()) first and
    /// any problem rejects it as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Validation`](crate::QuarryError::Validation)
    /// when strict validation fails. Never fails under the permissive policy.
    pub fn compile(&self, request: &SearchRequest) -> Result<CompiledQuery<T>> {
        if self.config.is_strict() {
            validate::<T>(request, &self.config)?;
        }

        let mut predicates = Vec::new();
        let mut conditions = Vec::new();
        let mut dropped = Vec::new();
        for raw in &request.filters {
            let (compiled, skipped) = self.compile_parts(raw);
            for (predicate, condition) in compiled {
                predicates.push(predicate);
                conditions.push(condition);
            }
            dropped.extend(skipped);
        }

        let (comparator, sorts) = SortCompiler::compile(&self.table, &request.sorts);
        let window = window(request.page, request.page_size);

        debug!(
            conditions = conditions.len(),
            sorts = sorts.len(),
            dropped = dropped.len(),
            skip = window.skip,
            take = window.take,
            "compiled search request"
        );

        Ok(CompiledQuery {
            predicate: conjoin(predicates),
            comparator,
            page: request.page.max(1),
            page_size: request.page_size,
            plan: QueryPlan {
                conditions,
                sorts,
                window,
                dropped,
            },
        })
    }

    /// Compiles one raw criterion into its predicate fragments.
    ///
    /// Returns nothing when the field is unknown or no slot is populated;
    /// typed criteria no handler satisfies are left out.
    pub fn compile_criterion(&self, raw: &RawCriterion) -> Vec<(Predicate<T>, Condition)> {
        self.compile_parts(raw).0
    }

    /// Compiles one raw criterion, also reporting every slot left out.
    fn compile_parts(
        &self,
        raw: &RawCriterion,
    ) -> (Vec<(Predicate<T>, Condition)>, Vec<Dropped>) {
        let typed = decompose(raw);
        let Some(field) = self.table.resolve(&raw.field) else {
            if !typed.is_empty() {
                debug!(field = %raw.field, "dropping filter on unknown field");
            }
            let dropped = typed
                .into_iter()
                .map(|c| Dropped {
                    field: c.field,
                    operator: c.operator,
                    value: c.value,
                    reason: DropReason::UnknownField,
                })
                .collect();
            return (Vec::new(), dropped);
        };

        let mut compiled = Vec::new();
        let mut dropped = Vec::new();
        for typed in typed {
            match self.registry.compile_with_name(field, &typed) {
                Some((predicate, handler)) => {
                    let condition = Condition {
                        field: field.name(),
                        domain: field.domain(),
                        operator: typed.operator,
                        value: typed.value,
                        handler,
                    };
                    compiled.push((predicate, condition));
                }
                None => {
                    debug!(
                        field = field.name(),
                        operator = %typed.operator,
                        "no filter handler satisfies criterion, dropping it"
                    );
                    dropped.push(Dropped {
                        field: field.name().to_string(),
                        operator: typed.operator,
                        value: typed.value,
                        reason: DropReason::NoHandler,
                    });
                }
            }
        }
        (compiled, dropped)
    }
}

impl<T: Searchable> Default for QueryCompiler<T> {
    fn default() -> Self {
        QueryCompiler::new()
    }
}

/// One resolved filter condition in a [`QueryPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Canonical field name.
    pub field: &'static str,
    pub domain: ValueDomain,
    pub operator: FilterOperator,
    pub value: TypedValue,
    /// Name of the handler that compiled this condition.
    pub handler: &'static str,
}

/// Backend-neutral description of a compiled query.
///
/// Field names are already resolved to their canonical spelling, so a
/// translator can map conditions onto a match stage and the window onto a
/// "count + skip/limit" facet without looking anything up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    /// Conditions to AND together.
    pub conditions: Vec<Condition>,
    /// Resolved sort keys, primary first.
    pub sorts: Vec<SortKey>,
    pub window: Window,
    /// Typed criteria left out of `conditions`, one entry per slot.
    pub dropped: Vec<Dropped>,
}

/// Why a typed criterion contributed no condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DropReason {
    /// The field name resolves to no searchable field.
    UnknownField,
    /// No registered handler satisfies the criterion.
    NoHandler,
}

/// A typed criterion the compiler left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dropped {
    /// Canonical field name, or the name as requested when unknown.
    pub field: String,
    pub operator: FilterOperator,
    pub value: TypedValue,
    pub reason: DropReason,
}

/// A compiled, immutable query: predicate, comparator and window.
///
/// `CompiledQuery` is `Send + Sync` and cheap to clone.
pub struct CompiledQuery<T> {
    predicate: Predicate<T>,
    comparator: Comparator<T>,
    page: u32,
    page_size: u32,
    plan: QueryPlan,
}

impl<T: 'static> CompiledQuery<T> {
    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }

    pub fn comparator(&self) -> &Comparator<T> {
        &self.comparator
    }

    pub fn window(&self) -> Window {
        self.plan.window
    }

    pub fn skip(&self) -> usize {
        self.plan.window.skip
    }

    pub fn take(&self) -> usize {
        self.plan.window.take
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests if a single item matches the filters.
    pub fn matches(&self, item: &T) -> bool {
        self.predicate.evaluate(item)
    }

    /// Returns every matching item, sorted, without windowing.
    pub fn sorted<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut results: Vec<&'a T> = items.iter().filter(|item| self.matches(item)).collect();
        self.comparator.sort(&mut results);
        results
    }

    /// Filters a slice, returning references to matching items.
    ///
    /// Results are sorted by the compiled sort keys, then the page window is
    /// applied.
    pub fn filter<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut results = self.sorted(items);
        let range = self.plan.window.range(results.len());
        results.truncate(range.end);
        results.drain(..range.start);
        results
    }

    /// Filters and clones the current page.
    pub fn filter_cloned(&self, items: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        self.filter(items).into_iter().cloned().collect()
    }

    /// Counts the number of matching items, ignoring the window.
    pub fn count(&self, items: &[T]) -> usize {
        items.iter().filter(|item| self.matches(item)).count()
    }

    /// Runs the query: counts all matches and returns the requested page.
    pub fn execute<'a>(&self, items: &'a [T]) -> SearchResult<&'a T> {
        let mut results = self.sorted(items);
        let total = results.len();
        let range = self.plan.window.range(total);
        results.truncate(range.end);
        results.drain(..range.start);
        SearchResult {
            items: results,
            page: PageInfo::new(self.page, self.page_size, total),
        }
    }
}

impl<T> Clone for CompiledQuery<T> {
    fn clone(&self) -> Self {
        CompiledQuery {
            predicate: self.predicate.clone(),
            comparator: self.comparator.clone(),
            page: self.page,
            page_size: self.page_size,
            plan: self.plan.clone(),
        }
    }
}

impl<T> std::fmt::Debug for CompiledQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}
