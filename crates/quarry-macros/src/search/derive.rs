//! Implementation of the `#[derive(Searchable)]` macro.
//!
//! This macro generates an implementation of the `Searchable` trait and
//! field name constants for building requests without string typos.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_search_attrs, Domain};

/// Main implementation of the Searchable derive macro.
pub fn searchable_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Searchable cannot be derived for generic structs",
        ));
    }

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Searchable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Searchable can only be derived for structs",
            ))
        }
    };

    let mut accessors: Vec<TokenStream> = Vec::new();
    let mut descriptors: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let search_attrs = parse_search_attrs(&field.attrs)?;

        if search_attrs.skip {
            continue;
        }

        // Fields without a domain are not searchable
        let domain = match search_attrs.domain {
            Some(d) => d,
            None => continue,
        };

        let query_name = search_attrs
            .rename
            .unwrap_or_else(|| field_name.to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));

        field_constants.push(quote! {
            /// Searchable field name.
            pub const #const_name: &'static str = #query_name;
        });

        let read = read_expr(domain);
        let body = if search_attrs.optional {
            quote! {
                match &entity.#field_name {
                    ::core::option::Option::Some(r) => #read,
                    ::core::option::Option::None => ::quarry::Value::None,
                }
            }
        } else {
            quote! {
                let r = &entity.#field_name;
                #read
            }
        };

        let accessor = format_ident!("__quarry_{}", field_name);
        accessors.push(quote! {
            fn #accessor(entity: &#struct_name) -> ::quarry::Value<'_> {
                #body
            }
        });

        let domain_variant = format_ident!("{}", domain.domain_variant());
        descriptors.push(quote! {
            ::quarry::FieldDescriptor::new(
                #query_name,
                ::quarry::ValueDomain::#domain_variant,
                #accessor,
            )
        });
    }

    let expanded = quote! {
        impl #struct_name {
            #(#field_constants)*
        }

        impl ::quarry::Searchable for #struct_name {
            #[allow(non_snake_case)]
            fn search_fields() -> ::std::vec::Vec<::quarry::FieldDescriptor<Self>> {
                #(#accessors)*

                ::std::vec![#(#descriptors),*]
            }
        }
    };

    Ok(expanded)
}

/// Expression reading `r: &FieldType` as a `quarry::Value`.
fn read_expr(domain: Domain) -> TokenStream {
    let variant = format_ident!("{}", domain.value_variant());
    match domain {
        Domain::String => quote! {
            ::quarry::Value::String(::core::convert::AsRef::<str>::as_ref(r))
        },
        Domain::Timestamp => quote! {
            ::quarry::Value::Timestamp(::quarry::AsTimestamp::as_timestamp(r))
        },
        _ => quote! {
            ::quarry::Value::#variant(::core::convert::Into::into(
                ::core::clone::Clone::clone(r)
            ))
        },
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
