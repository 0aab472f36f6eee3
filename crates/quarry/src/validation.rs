//! Request validation.
//!
//! [`validate`] checks a [`SearchRequest`] against an entity type and reports
//! every problem at once, one [`FieldError`] per offending entry. Compilation
//! in [`FieldPolicy::Strict`](crate::FieldPolicy::Strict) mode runs it first;
//! callers can also run it themselves to reject bad input early.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::CompilerConfig;
use crate::criterion::{decompose, Operand, RawCriterion};
use crate::field::{FieldResolver, FieldTable};
use crate::request::SearchRequest;
use crate::traits::Searchable;

/// One validation problem, located by its wire path (`filters[2]`, `pageSize`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All problems found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("invalid search request: {}", join(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Returns the errors reported for `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.path == path)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Validates `request` against the searchable fields of `T`.
///
/// Reports at most one error per filter or sort entry:
/// - unknown field names
/// - operators the field's domain does not support (e.g. a text filter on a
///   number)
/// - values that cannot be bound to the field's domain
///
/// and also checks `page >= 1`, `pageSize >= 1` and the configured
/// `maxPageSize`. Empty criteria are not errors.
///
/// ```
/// use quarry::{validate, CompilerConfig, FieldDescriptor, SearchRequest, Searchable};
/// use quarry::{Value, ValueDomain};
///
/// struct User {
///     age: i32,
/// }
///
/// impl Searchable for User {
///     fn search_fields() -> Vec<FieldDescriptor<Self>> {
///         vec![FieldDescriptor::new("age", ValueDomain::Int32, |u: &User| {
///             Value::Int32(u.age)
///         })]
///     }
/// }
///
/// let request = SearchRequest::new()
///     .range("age", Some(18.0), None)
///     .contains("nickname", "bob");
///
/// let errors = validate::<User>(&request, &CompilerConfig::default()).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors.iter().next().unwrap().path, "filters[1]");
/// ```
pub fn validate<T: Searchable>(
    request: &SearchRequest,
    config: &CompilerConfig,
) -> Result<(), ValidationErrors> {
    let table = FieldResolver::table::<T>();
    let mut errors = ValidationErrors::new();

    for (i, criterion) in request.filters.iter().enumerate() {
        if let Some(message) = check_filter(&table, criterion) {
            errors.push(FieldError::new(format!("filters[{i}]"), message));
        }
    }

    for (i, key) in request.sorts.iter().enumerate() {
        if !table.contains(&key.field) {
            errors.push(FieldError::new(
                format!("sorts[{i}]"),
                format!("unknown field '{}'", key.field),
            ));
        }
    }

    if request.page < 1 {
        errors.push(FieldError::new("page", "must be at least 1"));
    }
    if request.page_size < 1 {
        errors.push(FieldError::new("pageSize", "must be at least 1"));
    }
    if let Some(max) = config.max_page_size {
        if request.page_size > max {
            errors.push(FieldError::new("pageSize", format!("must not exceed {max}")));
        }
    }

    errors.into_result()
}

/// Returns the first problem with one filter entry.
fn check_filter<T>(table: &FieldTable<T>, criterion: &RawCriterion) -> Option<String> {
    let Some(field) = table.resolve(&criterion.field) else {
        return Some(format!("unknown field '{}'", criterion.field));
    };
    let domain = field.domain();

    decompose(criterion).into_iter().find_map(|typed| {
        if !domain.allows(typed.operator) {
            return Some(format!(
                "operator '{}' is not valid for {} field '{}'",
                typed.operator,
                domain,
                field.name()
            ));
        }
        match typed.bind(domain) {
            None => Some(format!(
                "value {} cannot be bound to {} field '{}'",
                serde_json::to_string(&typed.value).unwrap_or_default(),
                domain,
                field.name()
            )),
            Some(Operand::Set(_)) if !typed.operator.is_equality() => Some(format!(
                "operator '{}' cannot be applied to a list value",
                typed.operator
            )),
            Some(_) => None,
        }
    })
}
