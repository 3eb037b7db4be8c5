//! Automaton constructor emission.
//!
//! Each automaton becomes a public constructor function returning a built
//! `AutomatonSpec`. Concrete template parameters turn into `Value` arguments
//! of the constructor; abstract ones carry no runtime representation and are
//! only mentioned in the doc comment.

use crate::error::{GeneratorError, Result};
use crate::rewrite::{self, RewriteContext};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::HashSet;
use transformer::{Automaton, Direction, Transition};

pub fn emit(automaton: &Automaton) -> Result<TokenStream> {
    let name = automaton.name();
    check_unique_ports(automaton)?;
    let rw = RewriteContext::for_automaton(automaton)?;
    let init_rw = RewriteContext::for_initializers(automaton.template_params());

    let fn_name = format_ident!("{name}");
    let args = automaton
        .template_params()
        .iter()
        .filter(|p| !p.is_abstract())
        .map(|p| {
            let arg = format_ident!("{}", p.name());
            quote! { #arg: Value }
        });

    let mut body = vec![quote! { let mut spec = AutomatonSpec::new(#name); }];

    for port in automaton.ports() {
        let port_name = port.name();
        // for_automaton above already rejected directionless ports
        let direction = match port.direction() {
            Some(Direction::In) => quote! { Direction::In },
            _ => quote! { Direction::Out },
        };
        body.push(quote! { spec.add_port(#port_name, #direction); });
        if let Some(init) = port.init() {
            let context = format!("initializer of port '{port_name}' in '{name}'");
            let value = parse_expr(&rewrite::rewrite_value(&init_rw, init, &context)?, &context)?;
            body.push(quote! { spec.init_port(#port_name, #value); });
        }
    }

    for var in automaton.variables() {
        let var_name = var.name();
        let context = format!("initializer of variable '{var_name}' in '{name}'");
        let value = match var.init() {
            Some(init) => parse_expr(&rewrite::rewrite_value(&init_rw, init, &context)?, &context)?,
            None => quote! { Value::Null },
        };
        body.push(quote! { spec.add_var(#var_name, #value); });
    }

    for param in automaton.template_params() {
        if !param.is_abstract() {
            let param_name = param.name();
            let arg = format_ident!("{param_name}");
            body.push(quote! { spec.set_param(#param_name, #arg.clone()); });
        }
    }

    for (index, transition) in automaton.transitions().iter().enumerate() {
        body.push(emit_transition(name, index, transition, &rw)?);
    }

    let doc = doc_line(automaton);
    Ok(quote! {
        #[doc = #doc]
        pub fn #fn_name(#(#args),*) -> AutomatonSpec {
            #(#body)*
            spec
        }
    })
}

fn emit_transition(
    automaton: &str,
    index: usize,
    transition: &Transition,
    rw: &RewriteContext,
) -> Result<TokenStream> {
    let guard_context = format!("guard {index} of automaton '{automaton}'");
    let guard_text = rewrite::rewrite_condition(rw, transition.guard(), &guard_context)?;
    let guard = parse_expr(&guard_text, &guard_context)?;

    let stmt_context = format!("transition {index} of automaton '{automaton}'");
    let mut statements = Vec::new();
    for statement in transition.statements() {
        statements.push(rewrite::rewrite_statement(rw, statement, &stmt_context)?);
    }
    let block_text = if statements.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {}; }}", statements.join("; "))
    };
    let action: syn::Block = syn::parse_str(&block_text).map_err(|e| {
        GeneratorError::MalformedExpression {
            context: stmt_context.clone(),
            expr: block_text.clone(),
            message: e.to_string(),
        }
    })?;

    Ok(quote! {
        spec.add_transition(|ctx: &Ctx| #guard, |ctx: &Ctx| #action);
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

fn check_unique_ports(automaton: &Automaton) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for port in automaton.ports() {
        if !seen.insert(port.name()) {
            return Err(GeneratorError::DuplicatePort {
                owner: automaton.name().to_string(),
                port: port.name().to_string(),
            });
        }
    }
    Ok(())
}

fn doc_line(automaton: &Automaton) -> String {
    let mut doc = format!(
        " Builds the `{}` automaton ({} transitions).",
        automaton.name(),
        automaton.transitions().len()
    );
    let erased: Vec<&str> = automaton
        .template_params()
        .iter()
        .filter(|p| p.is_abstract())
        .map(|p| p.name())
        .collect();
    if !erased.is_empty() {
        doc.push_str(&format!(
            " Type parameters ({}) are erased at run time.",
            erased.join(", ")
        ));
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use transformer::{ParamKind, Port, TemplateParam, TypeRef, Variable};

    fn monitor() -> Automaton {
        Automaton::new(
            "monitor",
            vec![TemplateParam::new(
                "threshold",
                ParamKind::Concrete(TypeRef::named("int")),
            )],
            vec![
                Port::new("hb", Direction::In, TypeRef::named("int"), None),
                Port::new("alarm", Direction::Out, TypeRef::named("bool"), Some("false".into())),
            ],
            vec![Variable::new("counter", TypeRef::named("int"), Some("0".into()))],
            vec![
                Transition::new("hb != null", vec!["counter := 0".into()]),
                Transition::new("counter >= threshold", vec!["alarm := true".into()]),
            ],
        )
    }

    #[test]
    fn constructor_takes_concrete_params_as_values() {
        let tokens = emit(&monitor()).unwrap().to_string();
        assert!(tokens.contains("pub fn monitor (threshold : Value)"));
        assert!(tokens.contains("spec . set_param (\"threshold\" , threshold . clone ())"));
    }

    #[test]
    fn transitions_are_added_in_declaration_order() {
        let tokens = emit(&monitor()).unwrap().to_string();
        let first = tokens.find("ctx . read (\"hb\")").unwrap();
        let second = tokens.find("ctx . param (\"threshold\")").unwrap();
        assert!(first < second);
    }

    #[test]
    fn port_initializer_is_set_without_pending() {
        let tokens = emit(&monitor()).unwrap().to_string();
        assert!(tokens.contains("spec . init_port (\"alarm\" , Value :: Bool (false))"));
    }

    #[test]
    fn directionless_port_is_rejected() {
        let automaton: Automaton = {
            let json = r#"{
                "name": "broken",
                "ports": [{"name": "p", "type": {"kind": "concrete", "ty": "int"}}],
                "transitions": [{"guard": "true"}]
            }"#;
            serde_json::from_str(json).unwrap()
        };
        let err = emit(&automaton).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::PortMissingDirection { port, .. } if port == "p"
        ));
    }

    #[test]
    fn duplicate_port_is_rejected() {
        let automaton = Automaton::new(
            "dup",
            vec![],
            vec![
                Port::new("p", Direction::In, TypeRef::named("int"), None),
                Port::new("p", Direction::Out, TypeRef::named("int"), None),
            ],
            vec![],
            vec![Transition::new("true", vec![])],
        );
        let err = emit(&automaton).unwrap_err();
        assert!(matches!(err, GeneratorError::DuplicatePort { port, .. } if port == "p"));
    }
}
