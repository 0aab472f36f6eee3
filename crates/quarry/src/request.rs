//! Search request data object and builder.
//!
//! A [`SearchRequest`] ties filters, sorts and the requested page together.
//! It is the single input of [`QueryCompiler::compile`](crate::QueryCompiler::compile)
//! and is never mutated by it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criterion::{RawCriterion, TypedValue};
use crate::ordering::SortKey;

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filters, sorts and page of an ad-hoc search.
///
/// # Example
///
/// ```
/// use quarry::SearchRequest;
///
/// let request = SearchRequest::new()
///     .contains("email", "acme")
///     .range("age", Some(18.0), None)
///     .sort_desc("age")
///     .sort_asc("name")
///     .page(2)
///     .page_size(25);
///
/// assert_eq!(request.filters.len(), 2);
/// assert_eq!(request.sorts.len(), 2);
/// ```
///
/// Deserializing from the wire:
///
/// ```
/// use quarry::SearchRequest;
///
/// let request: SearchRequest = serde_json::from_str(r#"{
///     "filters": [{ "field": "email", "stringValue": "acme" }],
///     "sorts": [{ "field": "age", "ascending": false }]
/// }"#).unwrap();
///
/// assert_eq!(request.page, 1);
/// assert_eq!(request.page_size, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub filters: Vec<RawCriterion>,
    pub sorts: Vec<SortKey>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            filters: Vec::new(),
            sorts: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchRequest {
    /// Creates a request for the first page with no filters or sorts.
    ///
    /// An empty request matches all items.
    pub fn new() -> Self {
        SearchRequest::default()
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Adds a raw criterion.
    pub fn filter(mut self, criterion: RawCriterion) -> Self {
        self.filters.push(criterion);
        self
    }

    /// Adds a case-insensitive substring filter.
    pub fn contains(self, field: &str, value: &str) -> Self {
        self.filter(RawCriterion::text(field, value))
    }

    /// Adds an identifier equality filter.
    pub fn identifier(self, field: &str, id: Uuid) -> Self {
        self.filter(RawCriterion::identifier(field, id))
    }

    /// Adds a boolean equality filter.
    pub fn flag(self, field: &str, value: bool) -> Self {
        self.filter(RawCriterion::boolean(field, value))
    }

    /// Adds an inclusive numeric range filter.
    pub fn range(self, field: &str, from: Option<f64>, to: Option<f64>) -> Self {
        self.filter(RawCriterion::number_range(field, from, to))
    }

    /// Adds an inclusive timestamp range filter.
    pub fn between(
        self,
        field: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.filter(RawCriterion::date_range(field, from, to))
    }

    /// Adds a list membership filter.
    pub fn one_of<V, I>(self, field: &str, values: I) -> Self
    where
        V: Into<TypedValue>,
        I: IntoIterator<Item = V>,
    {
        self.filter(RawCriterion::one_of(field, values))
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Adds a sort key. Earlier keys take precedence.
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sorts.push(key);
        self
    }

    /// Adds an ascending sort key.
    pub fn sort_asc(self, field: &str) -> Self {
        self.sort(SortKey::asc(field))
    }

    /// Adds a descending sort key.
    pub fn sort_desc(self, field: &str) -> Self {
        self.sort(SortKey::desc(field))
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Sets the 1-based page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Returns `true` if the request has no filters and no sorts.
    pub fn is_unconstrained(&self) -> bool {
        self.filters.is_empty() && self.sorts.is_empty()
    }
}
