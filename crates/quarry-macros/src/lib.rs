//! Proc macros for Quarry.
//!
//! This crate provides the [`Searchable`] derive, which builds a struct's
//! searchable field table from field annotations. It is re-exported by
//! `quarry` under the default `derive` feature, so most users never depend
//! on it directly.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod search;

/// Derives the `Searchable` trait for structs that can be queried by
/// ad-hoc search requests.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[search(String)]` | Text field (`String`, `&str`, anything `AsRef<str>`) |
/// | `#[search(Boolean)]` | Boolean field |
/// | `#[search(Byte)]`, `#[search(Int32)]`, `#[search(Int64)]` | Integer fields |
/// | `#[search(Float)]`, `#[search(Double)]` | Floating point fields |
/// | `#[search(Decimal)]` | `quarry::Decimal` field |
/// | `#[search(Identifier)]` | `uuid::Uuid` field |
/// | `#[search(Timestamp)]` | Any type implementing `AsTimestamp` |
/// | `#[search(ty = "int64")]` | Domain given as a string |
/// | `#[search(..., optional)]` | `Option<_>` field; `None` is a missing value |
/// | `#[search(..., rename = "x")]` | Field name used in requests |
/// | `#[search(skip)]` | Exclude the field |
///
/// Fields without a `#[search(...)]` attribute are not searchable. Domain
/// names are also accepted in lowercase, plus the aliases `Bool` and `Uuid`.
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Field name constants (e.g., `User::EMAIL`, `User::CREATED_AT`)
/// 2. Implementation of `Searchable::search_fields()`, one descriptor per
///    annotated field, in declaration order
///
/// Integer and float fields are widened with `Into`, so a `u8` field may be
/// declared `Int32` and an `i32` field `Int64`.
///
/// # Example
///
/// ```ignore
/// use chrono::{DateTime, Utc};
/// use quarry::{QueryCompiler, SearchRequest, Searchable};
///
/// #[derive(Searchable)]
/// struct User {
///     #[search(String)]
///     email: String,
///     #[search(Int32)]
///     age: i32,
///     #[search(Timestamp, optional, rename = "lastLogin")]
///     last_login: Option<DateTime<Utc>>,
///     password_hash: String,
/// }
///
/// let request = SearchRequest::new()
///     .contains(User::EMAIL, "acme")
///     .sort_desc(User::AGE);
///
/// let query = QueryCompiler::<User>::new().compile(&request)?;
/// let matches = query.filter(&users);
/// ```
#[proc_macro_derive(Searchable, attributes(search))]
pub fn searchable_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    search::searchable_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
