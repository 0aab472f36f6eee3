//! Implementation of the `#[derive(Searchable)]` macro.
//!
//! Generates the field descriptor table and field name constants from
//! struct annotations.

mod attrs;
mod derive;

pub use derive::searchable_derive_impl;
