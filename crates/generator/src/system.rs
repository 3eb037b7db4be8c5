//! System constructor emission.
//!
//! A system becomes a public constructor returning a built `System` with
//! every component instantiated through its automaton constructor.
//! Connections are recorded declaratively; value routing between components
//! is left to the embedding program.

use crate::error::{GeneratorError, Result};
use crate::rewrite::{self, RewriteContext};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use transformer::{Declarations, System};

pub fn emit(system: &System, declarations: &Declarations) -> Result<TokenStream> {
    let name = system.name();
    let init_rw = RewriteContext::for_initializers(system.template_params());

    let fn_name = format_ident!("{name}");
    let args = system
        .template_params()
        .iter()
        .filter(|p| !p.is_abstract())
        .map(|p| {
            let arg = format_ident!("{}", p.name());
            quote! { #arg: Value }
        });

    let mut body = vec![quote! { let mut system = System::new(#name); }];

    for component in system.components() {
        let component_name = component.name();
        let automaton = declarations
            .automata()
            .iter()
            .find(|a| a.name() == component.automaton())
            .ok_or_else(|| GeneratorError::UnknownComponentType {
                system: name.to_string(),
                component: component_name.to_string(),
                automaton: component.automaton().to_string(),
            })?;

        let constructor = format_ident!("{}", automaton.name());
        let concrete_params: Vec<_> = automaton
            .template_params()
            .iter()
            .filter(|p| !p.is_abstract())
            .collect();

        let mut call_args = Vec::new();
        for (i, param) in concrete_params.iter().enumerate() {
            match component.args().get(i) {
                Some(arg) => {
                    let context = format!(
                        "argument '{}' of component '{component_name}' in system '{name}'",
                        param.name()
                    );
                    let text = rewrite::rewrite_value(&init_rw, arg, &context)?;
                    call_args.push(parse_expr(&text, &context)?);
                }
                // Unspecified instantiation arguments stay unset.
                None => call_args.push(quote! { Value::Null }),
            }
        }

        body.push(quote! {
            system.add_component(#component_name, #constructor(#(#call_args),*));
        });
    }

    for internal in system.internals() {
        body.push(quote! { system.add_internal(#internal); });
    }

    for connection in system.connections() {
        let from = connection.from().to_string();
        let to = connection.to().to_string();
        body.push(quote! { system.declare_connection(#from, #to); });
    }

    let doc = format!(
        " Builds the `{}` system ({} components).",
        name,
        system.components().len()
    );
    Ok(quote! {
        #[doc = #doc]
        pub fn #fn_name(#(#args),*) -> System {
            #(#body)*
            system
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
