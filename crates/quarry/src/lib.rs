//! Quarry - Ad-hoc search request compiler for Rust struct collections.
//!
//! Quarry turns a loosely-typed, transport-friendly [`SearchRequest`] (field
//! names as strings, optional value slots, sort keys, page and page size) into
//! a strongly-typed [`CompiledQuery`]: a predicate, a multi-level comparator
//! and a skip/take window. It supports:
//!
//! - Ten value domains: booleans, four integer widths, floats, decimals,
//!   strings, UUID identifiers and UTC timestamps
//! - Per-domain operator tables, checked before compilation
//! - Case-insensitive field names, resolved once per entity type and cached
//! - A pluggable, ordered registry of filter handlers
//! - In-memory execution and a serializable [`QueryPlan`] for other backends
//!
//! # Quick Start
//!
//! ```rust
//! use quarry::{FieldDescriptor, QueryCompiler, SearchRequest, Searchable, Value, ValueDomain};
//!
//! // Define your data
//! struct Task {
//!     name: String,
//!     priority: i32,
//!     archived: bool,
//! }
//!
//! // Describe its searchable fields (or use `#[derive(Searchable)]`)
//! impl Searchable for Task {
//!     fn search_fields() -> Vec<FieldDescriptor<Self>> {
//!         vec![
//!             FieldDescriptor::new("name", ValueDomain::String, |t: &Task| {
//!                 Value::String(&t.name)
//!             }),
//!             FieldDescriptor::new("priority", ValueDomain::Int32, |t: &Task| {
//!                 Value::Int32(t.priority)
//!             }),
//!             FieldDescriptor::new("archived", ValueDomain::Boolean, |t: &Task| {
//!                 Value::Bool(t.archived)
//!             }),
//!         ]
//!     }
//! }
//!
//! let tasks = vec![
//!     Task { name: "Write docs".into(), priority: 3, archived: false },
//!     Task { name: "Fix bug".into(), priority: 5, archived: false },
//!     Task { name: "Old task".into(), priority: 1, archived: true },
//! ];
//!
//! // Usually deserialized from a request body
//! let request = SearchRequest::new()
//!     .range("priority", Some(3.0), None)
//!     .flag("archived", false)
//!     .sort_desc("priority");
//!
//! let query = QueryCompiler::<Task>::new().compile(&request).unwrap();
//! let results = query.filter(&tasks);
//! assert_eq!(results.len(), 2);
//! assert_eq!(results[0].name, "Fix bug");
//! ```
//!
//! # Criterion Slots
//!
//! Each populated slot of a [`RawCriterion`] adds one AND-ed condition:
//!
//! | Slot | Operator |
//! |------|----------|
//! | `stringValue` (non-empty) | `Contains` (case-insensitive) |
//! | `identifierValue` | `Equal` |
//! | `boolValue` | `Equal` |
//! | `dateFrom` / `numberFrom` | `GreaterOrEqual` |
//! | `dateTo` / `numberTo` | `LessOrEqual` |
//! | `listValue` (non-empty) | `Equal` (membership) |
//!
//! # Domains and Operators
//!
//! | Domain | Operators |
//! |--------|-----------|
//! | Boolean, Identifier | `Equal`, `NotEqual` |
//! | Byte, Int32, Int64, Float, Double, Decimal, Timestamp | equality and the four range operators |
//! | String | equality, `Contains`, `StartsWith`, `EndsWith` and their negations |
//!
//! Missing field values ([`Value::None`]) never satisfy a condition and sort
//! after present values.

mod compiler;
mod config;
mod criterion;
mod decimal;
mod domain;
mod error;
mod field;
mod handler;
mod op;
mod ordering;
mod page;
mod predicate;
mod request;
mod traits;
mod validation;
mod value;

// Re-export public API
pub use compiler::{
    CompiledQuery, Condition, DropReason, Dropped, QueryCompiler, QueryPlan,
};
pub use config::{CompilerConfig, FieldPolicy};
pub use criterion::{decompose, Operand, RawCriterion, TypedCriterion, TypedValue};
pub use decimal::{Decimal, MAX_SCALE};
pub use domain::ValueDomain;
pub use error::{QuarryError, Result};
pub use field::{Accessor, FieldDescriptor, FieldResolver, FieldTable};
pub use handler::{
    BuiltinHandlers, FieldTarget, FilterHandler, FilterHandlerRegistry, HandlerModule,
    MembershipHandler, ScalarHandler, TextHandler,
};
pub use op::FilterOperator;
pub use ordering::{compare_directed, compare_values, Comparator, SortCompiler, SortKey};
pub use page::{total_pages, window, PageInfo, SearchResult, Window};
pub use predicate::{
    compile_test, conjoin, try_compile_test, Predicate, PredicateCompiler, ValueTest,
};
pub use request::{SearchRequest, DEFAULT_PAGE_SIZE};
pub use traits::{AsTimestamp, Searchable};
pub use validation::{validate, FieldError, ValidationErrors};
pub use value::{ScalarValue, Value};

#[cfg(feature = "derive")]
pub use quarry_macros::Searchable;
