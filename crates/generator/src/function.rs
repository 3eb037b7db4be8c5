//! Function emission.
//!
//! Mediator functions become plain Rust functions with statically mapped
//! types. Abstract template parameters become generic type parameters,
//! concrete ones become leading value arguments.

use crate::error::{GeneratorError, Result};
use crate::rewrite::{self, RewriteContext};
use crate::target_type::{is_void, rust_type};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use transformer::Function;

pub fn emit(function: &Function) -> Result<TokenStream> {
    let name = function.name();
    let context = format!("function '{name}'");
    let rw = RewriteContext::plain();

    let fn_name = format_ident!("{name}");
    let generics: Vec<TokenStream> = function
        .template_params()
        .iter()
        .filter(|p| p.is_abstract())
        .map(|p| {
            let ident = format_ident!("{}", p.name());
            quote! { #ident: Default }
        })
        .collect();
    let generics = if generics.is_empty() {
        quote! {}
    } else {
        quote! { <#(#generics),*> }
    };

    let mut args = Vec::new();
    for param in function.template_params() {
        if let transformer::ParamKind::Concrete(ty) = param.kind() {
            let ident = format_ident!("{}", param.name());
            let ty = rust_type(ty, true, &context)?;
            args.push(quote! { #ident: #ty });
        }
    }
    for arg in function.args() {
        let ident = format_ident!("{}", arg.name());
        let ty = rust_type(arg.ty(), true, &context)?;
        args.push(quote! { #ident: #ty });
    }

    let ret = if is_void(function.return_type()) {
        quote! {}
    } else {
        let ty = rust_type(function.return_type(), true, &context)?;
        quote! { -> #ty }
    };

    let mut body = Vec::new();
    for var in function.variables() {
        let ident = format_ident!("{}", var.name());
        let ty = rust_type(var.ty(), true, &context)?;
        let init = match var.init() {
            Some(init) => {
                let text = rewrite::rewrite_value(&rw, init, &context)?;
                parse_expr(&text, &context)?
            }
            None => quote! { Default::default() },
        };
        body.push(quote! { let mut #ident: #ty = #init; });
    }
    for statement in function.statements() {
        let text = rewrite::rewrite_statement(&rw, statement, &context)?;
        let stmt: syn::Stmt = syn::parse_str(&format!("{text};")).map_err(|e| {
            GeneratorError::MalformedExpression {
                context: context.clone(),
                expr: text.clone(),
                message: e.to_string(),
            }
        })?;
        body.push(quote! { #stmt });
    }

    let doc = doc_line(function);
    Ok(quote! {
        #[doc = #doc]
        pub fn #fn_name #generics (#(#args),*) #ret {
            #(#body)*
        }
    })
}

fn parse_expr(text: &str, context: &str) -> Result<TokenStream> {
    let expr: syn::Expr =
        syn::parse_str(text).map_err(|e| GeneratorError::MalformedExpression {
            context: context.to_string(),
            expr: text.to_string(),
            message: e.to_string(),
        })?;
    Ok(quote! { #expr })
}

fn doc_line(function: &Function) -> String {
    let mut doc = format!(" Mediator function `{}`.", function.name());
    let defaults: Vec<String> = function
        .args()
        .iter()
        .filter_map(|arg| {
            arg.default()
                .map(|d| format!("`{}` defaults to `{}`", arg.name(), d))
        })
        .collect();
    if !defaults.is_empty() {
        doc.push_str(&format!(" Defaults: {}.", defaults.join(", ")));
    }
    doc
}
