//! Attribute parsing for the Searchable derive macro.
//!
//! This module provides parsers for the `#[search(...)]` field attributes
//! used by the `Searchable` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

const EXPECTED_DOMAINS: &str =
    "Boolean, Byte, Int32, Int64, Float, Double, Decimal, String, Identifier, Timestamp";

/// The value domain of a searchable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Boolean,
    Byte,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    Identifier,
    Timestamp,
}

impl Domain {
    /// Parse a domain from a name, accepting both `PascalCase` and lowercase.
    pub fn from_name(name: &str, span: Span) -> Result<Self> {
        match name {
            "Boolean" | "boolean" | "Bool" => Ok(Domain::Boolean),
            "Byte" | "byte" => Ok(Domain::Byte),
            "Int32" | "int32" => Ok(Domain::Int32),
            "Int64" | "int64" => Ok(Domain::Int64),
            "Float" | "float" => Ok(Domain::Float),
            "Double" | "double" => Ok(Domain::Double),
            "Decimal" | "decimal" => Ok(Domain::Decimal),
            "String" | "string" => Ok(Domain::String),
            "Identifier" | "identifier" | "Uuid" | "uuid" => Ok(Domain::Identifier),
            "Timestamp" | "timestamp" => Ok(Domain::Timestamp),
            other => Err(Error::new(
                span,
                format!("unknown search domain: '{other}'. Expected one of: {EXPECTED_DOMAINS}"),
            )),
        }
    }

    /// Parse a domain from an identifier.
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        Self::from_name(&ident.to_string(), ident.span())
    }

    /// The matching `quarry::ValueDomain` / `quarry::Value` variant name.
    pub fn domain_variant(self) -> &'static str {
        match self {
            Domain::Boolean => "Boolean",
            Domain::Byte => "Byte",
            Domain::Int32 => "Int32",
            Domain::Int64 => "Int64",
            Domain::Float => "Float",
            Domain::Double => "Double",
            Domain::Decimal => "Decimal",
            Domain::String => "String",
            Domain::Identifier => "Identifier",
            Domain::Timestamp => "Timestamp",
        }
    }

    /// The `quarry::Value` variant carrying this domain.
    pub fn value_variant(self) -> &'static str {
        match self {
            Domain::Boolean => "Bool",
            other => other.domain_variant(),
        }
    }
}

/// Field-level attributes from `#[search(...)]`.
#[derive(Debug, Clone, Default)]
pub struct SearchAttr {
    /// The domain of this searchable field.
    pub domain: Option<Domain>,
    /// The field is an `Option<_>`; `None` reads as a missing value.
    pub optional: bool,
    /// Skip this field.
    pub skip: bool,
    /// Custom field name for requests (default: field name).
    pub rename: Option<String>,
}

fn string_literal<'a>(value: &'a syn::Expr, what: &str) -> Result<&'a syn::LitStr> {
    match value {
        syn::Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s),
        other => Err(Error::new(
            other.span(),
            format!("{what} must be a string literal"),
        )),
    }
}

impl Parse for SearchAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SearchAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // Domain identifier or flag: search(String), search(optional), ...
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if p.is_ident("optional") {
                        attr.optional = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.domain = Some(Domain::from_ident(ident)?);
                    } else {
                        return Err(Error::new(
                            p.span(),
                            format!("expected search domain ({EXPECTED_DOMAINS}), optional, or skip"),
                        ));
                    }
                }

                // rename = "custom_name" or ty = "int32"
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(string_literal(&nv.value, "rename")?.value());
                    } else if nv.path.is_ident("ty") {
                        let s = string_literal(&nv.value, "ty")?;
                        attr.domain = Some(Domain::from_name(&s.value(), s.span())?);
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or ty",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown search attribute. Expected a domain, optional, skip, rename = \"...\", or ty = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[search(...)]` attributes from a field's attributes.
pub fn parse_search_attrs(attrs: &[Attribute]) -> Result<SearchAttr> {
    for attr in attrs {
        if attr.path().is_ident("search") {
            return attr.parse_args::<SearchAttr>();
        }
    }
    Ok(SearchAttr::default())
}
