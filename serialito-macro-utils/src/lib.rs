//! Shared utilities for serialito procedural macros
//!
//! This crate provides the attribute parsing and code generation helpers
//! used by `serialito-macros`.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{punctuated::Punctuated, Attribute, Expr, Generics, Ident, MetaNameValue, Token};

/// Parsed `#[registered(...)]` attributes
#[derive(Debug, Default)]
pub struct RegisteredAttributes {
    pub custom_name: Option<String>,
}

/// Parse the `name` attribute
///
/// The value must be a non-empty string literal, since it becomes the
/// persisted type descriptor.
pub fn parse_name_attribute(nv: &MetaNameValue) -> Result<String, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Str(s) => {
                let val = s.value();
                if val.trim().is_empty() {
                    Err(quote! { compile_error!("Invalid `name`: type descriptor must not be empty") })
                } else {
                    Ok(val)
                }
            }
            _ => Err(quote! { compile_error!("Invalid literal for `name`: expected string") }),
        },
        _ => Err(quote! { compile_error!("Invalid syntax for `name`: expected `name = \"...\"`") }),
    }
}

/// Parse every `#[registered(...)]` attribute attached to a type definition
///
/// Attributes with other paths (`#[serde(...)]`, `#[derive(...)]`, ...) are ignored.
/// Unknown keys inside `registered(...)` are rejected with a compile error.
pub fn parse_registered_attributes(
    attrs: &[Attribute],
) -> Result<RegisteredAttributes, TokenStream2> {
    let mut parsed = RegisteredAttributes::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("registered")) {
        let args = attr
            .parse_args_with(Punctuated::<MetaNameValue, Token![,]>::parse_terminated)
            .map_err(|e| {
                let msg = format!("Failed to parse attributes: {}", e);
                quote! { compile_error!(#msg) }
            })?;

        for nv in args {
            if nv.path.is_ident("name") {
                parsed.custom_name = Some(parse_name_attribute(&nv)?);
            } else {
                let path = &nv.path;
                let msg = format!(
                    "Unknown `registered` attribute `{}`: expected `name`",
                    quote!(#path)
                );
                return Err(quote! { compile_error!(#msg) });
            }
        }
    }

    Ok(parsed)
}

/// Generate the `Registered` implementation for a type
pub fn generate_registered_impl(
    ident: &Ident,
    generics: &Generics,
    type_name: &str,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics serialito_core::Registered for #ident #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;
        }
    }
}
