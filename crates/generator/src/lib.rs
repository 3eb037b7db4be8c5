//! Mediator Code Generator
//!
//! Turns structured declarations into the text of a self-contained Rust
//! program. The program embeds the execution runtime as a module, defines a
//! constructor function per automaton and system, and runs the first system
//! from `main`. The emitted text is assembled as a token stream, validated
//! by parsing it back, and formatted with `prettyplease`, so the generator
//! can never produce a file it does not itself consider well-formed.

pub mod automaton;
pub mod error;
pub mod function;
pub mod rewrite;
pub mod runtime;
pub mod scaffold;
pub mod system;
pub mod target_type;

#[cfg(test)]
mod runtime_tests;

pub use error::{GeneratorError, Result};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::path::Path;
use tracing::debug;
use transformer::Declarations;

const HEADER: &str = "// Generated by medc. Do not edit.\n";

/// Generate the complete program text for `declarations`.
pub fn generate_program(declarations: &Declarations) -> Result<String> {
    debug!(decls = %declarations.summary(), "generating program");

    let runtime = scaffold::runtime_module()?;

    let mut items: Vec<TokenStream> = Vec::new();
    for typedef in declarations.typedefs() {
        let context = format!("typedef '{}'", typedef.name());
        let name = format_ident!("{}", typedef.name());
        let target = target_type::rust_type(typedef.target(), false, &context)?;
        items.push(quote! { pub type #name = #target; });
    }
    for function in declarations.functions() {
        items.push(function::emit(function)?);
    }
    for automaton in declarations.automata() {
        items.push(automaton::emit(automaton)?);
    }
    for system in declarations.systems() {
        items.push(system::emit(system, declarations)?);
    }

    let main = emit_main(declarations);
    let tokens = quote! {
        #![allow(dead_code, unused_variables, unused_imports, unused_mut, non_camel_case_types)]

        #runtime

        use runtime::{truthy, AutomatonSpec, Ctx, Direction, System, Value};

        #(#items)*

        #main
    };

    let file: syn::File =
        syn::parse2(tokens).map_err(|e| GeneratorError::Render(e.to_string()))?;
    Ok(format!("{HEADER}{}", prettyplease::unparse(&file)))
}

/// Generate the program and write it out as a runnable cargo project.
pub fn generate_project(declarations: &Declarations, dir: &Path, name: &str) -> Result<String> {
    let program = generate_program(declarations)?;
    scaffold::write_project(dir, name, &program)?;
    Ok(program)
}

/// `main` starts the first declared system, if any; otherwise it reports
/// what the program provides.
fn emit_main(declarations: &Declarations) -> TokenStream {
    if let Some(system) = declarations.systems().first() {
        let name = system.name();
        let constructor = format_ident!("{name}");
        let args = system
            .template_params()
            .iter()
            .filter(|p| !p.is_abstract())
            .map(|_| quote! { Value::Null });
        return quote! {
            fn main() {
                let mut system = #constructor(#(#args),*);
                system.start();
                println!("system '{}' running", #name);
                loop {
                    std::thread::park();
                }
            }
        };
    }

    let mut lines = Vec::new();
    for automaton in declarations.automata() {
        let line = format!("automaton {}", automaton.name());
        lines.push(quote! { println!("  {}", #line); });
    }
    for function in declarations.functions() {
        let line = format!("function {}", function.name());
        lines.push(quote! { println!("  {}", #line); });
    }
    quote! {
        fn main() {
            println!("this program provides:");
            #(#lines)*
        }
    }
}
