//! Mediator type to Rust type mapping.
//!
//! Used where generated code carries static types: typedef aliases, function
//! signatures and function locals. Automaton state is dynamically typed at
//! run time and never goes through this mapping.

use crate::error::{GeneratorError, Result};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use transformer::{ConcreteType, TypeRef};

/// Rust spelling of a type reference. Abstract names map to themselves and
/// must be bound by a generic parameter at the use site; `context` names the
/// declaration for the error message when the caller forbids them.
pub fn rust_type(ty: &TypeRef, allow_abstract: bool, context: &str) -> Result<TokenStream> {
    match ty {
        TypeRef::Abstract { name } => {
            if allow_abstract {
                let ident = format_ident!("{name}");
                Ok(quote! { #ident })
            } else {
                Err(GeneratorError::UnboundTypeParameter {
                    context: context.to_string(),
                    name: name.clone(),
                })
            }
        }
        TypeRef::Concrete { ty } => match ty {
            ConcreteType::Named(name) => Ok(named_type(name)),
            ConcreteType::Array { element, size: _ } => {
                let element = rust_type(element, allow_abstract, context)?;
                Ok(quote! { Vec<#element> })
            }
        },
    }
}

fn named_type(name: &str) -> TokenStream {
    match name {
        "int" => quote! { i64 },
        "real" => quote! { f64 },
        "bool" => quote! { bool },
        "char" => quote! { String },
        "string" => quote! { String },
        "void" => quote! { () },
        other => {
            let ident = format_ident!("{other}");
            quote! { #ident }
        }
    }
}

/// True when the type spells `()`, so signatures can omit the return arrow.
pub fn is_void(ty: &TypeRef) -> bool {
    matches!(
        ty,
        TypeRef::Concrete {
            ty: ConcreteType::Named(name)
        } if name == "void"
    )
}
