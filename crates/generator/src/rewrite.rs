//! Token-level rewriting of guards, statements and initializers.
//!
//! The grammar captures these as raw text. Rewriting works on a token
//! stream, never on substrings, so an identifier like `nullable` is not
//! corrupted by the `null` mapping and a `:=` inside a string literal is
//! left alone.
//!
//! Two modes exist. Automaton text is *value mode*: identifiers resolve
//! against the automaton's ports, variables and parameters, and literals are
//! wrapped as runtime values. Function text is *plain mode*: identifiers and
//! literals pass through and only the surface differences (`:=`, `null`)
//! are translated.

use crate::error::{GeneratorError, Result};
use std::collections::HashSet;
use transformer::{Automaton, Direction, TemplateParam};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Number(String),
    Str(String),
    Op(String),
}

/// Name resolution for one rewriting scope.
#[derive(Debug, Default)]
pub struct RewriteContext {
    in_ports: HashSet<String>,
    out_ports: HashSet<String>,
    vars: HashSet<String>,
    params: HashSet<String>,
    wrap_values: bool,
    direct_params: bool,
}

impl RewriteContext {
    /// Scope of an automaton body. Fails if a port has no direction, which
    /// can happen when declarations come from an external producer.
    pub fn for_automaton(automaton: &Automaton) -> Result<Self> {
        let mut ctx = Self {
            wrap_values: true,
            ..Self::default()
        };
        for port in automaton.ports() {
            let direction = port.direction().ok_or_else(|| {
                GeneratorError::PortMissingDirection {
                    automaton: automaton.name().to_string(),
                    port: port.name().to_string(),
                }
            })?;
            match direction {
                Direction::In => ctx.in_ports.insert(port.name().to_string()),
                Direction::Out => ctx.out_ports.insert(port.name().to_string()),
            };
        }
        for var in automaton.variables() {
            ctx.vars.insert(var.name().to_string());
        }
        for param in automaton.template_params() {
            if !param.is_abstract() {
                ctx.params.insert(param.name().to_string());
            }
        }
        Ok(ctx)
    }

    /// Scope of a function body: no runtime names, no value wrapping.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Scope of build-time initializers and instantiation arguments. There
    /// is no runtime state yet, so concrete template parameters resolve to
    /// the constructor arguments of the same name.
    pub fn for_initializers(params: &[TemplateParam]) -> Self {
        let mut ctx = Self {
            wrap_values: true,
            direct_params: true,
            ..Self::default()
        };
        for param in params {
            if !param.is_abstract() {
                ctx.params.insert(param.name().to_string());
            }
        }
        ctx
    }

    fn is_port(&self, name: &str) -> bool {
        self.in_ports.contains(name) || self.out_ports.contains(name)
    }
}

/// Rewrite a guard into a Rust boolean expression.
pub fn rewrite_condition(rw: &RewriteContext, src: &str, context: &str) -> Result<String> {
    let tokens = tokenize(src, context)?;
    if tokens.is_empty() {
        return Err(malformed(context, src, "empty condition"));
    }
    condition(rw, &tokens, context, src)
}

/// Rewrite one statement into a Rust statement, without trailing semicolon.
pub fn rewrite_statement(rw: &RewriteContext, src: &str, context: &str) -> Result<String> {
    let tokens = tokenize(src, context)?;
    match tokens.as_slice() {
        [] => Err(malformed(context, src, "empty statement")),
        [Tok::Ident(kw)] if kw == "skip" => Ok("()".to_string()),
        [Tok::Ident(kw), rest @ ..] if kw == "sync" => sync_statement(rw, rest, context, src),
        [Tok::Ident(kw), rest @ ..] if kw == "return" => {
            if rest.is_empty() {
                Ok("return".to_string())
            } else {
                Ok(format!("return {}", expression(rw, rest, context, src)?))
            }
        }
        _ => match split_assignment(&tokens) {
            Some((lhs, rhs)) => assignment(rw, lhs, rhs, context, src),
            None => expression(rw, &tokens, context, src),
        },
    }
}

/// Rewrite an initializer or argument into a Rust value expression.
pub fn rewrite_value(rw: &RewriteContext, src: &str, context: &str) -> Result<String> {
    let tokens = tokenize(src, context)?;
    if tokens.is_empty() {
        return Err(malformed(context, src, "empty expression"));
    }
    expression(rw, &tokens, context, src)
}

// ------------------------------------------------------------------------
// Statement forms
// ------------------------------------------------------------------------

fn sync_statement(rw: &RewriteContext, rest: &[Tok], context: &str, src: &str) -> Result<String> {
    if !rw.wrap_values {
        return Err(malformed(context, src, "sync is only valid inside an automaton"));
    }
    let mut calls = Vec::new();
    for chunk in rest.split(|t| *t == Tok::Op(",".to_string())) {
        match chunk {
            [Tok::Ident(name)] if rw.is_port(name) => {
                calls.push(format!("ctx.sync(\"{name}\")"));
            }
            [Tok::Ident(name)] => {
                return Err(malformed(
                    context,
                    src,
                    &format!("sync target '{name}' is not a port"),
                ))
            }
            _ => return Err(malformed(context, src, "sync expects port names")),
        }
    }
    if calls.is_empty() {
        return Err(malformed(context, src, "sync expects port names"));
    }
    Ok(calls.join("; "))
}

fn assignment(
    rw: &RewriteContext,
    lhs: &[Tok],
    rhs: &[Tok],
    context: &str,
    src: &str,
) -> Result<String> {
    if rhs.is_empty() {
        return Err(malformed(context, src, "assignment has no right-hand side"));
    }
    let value = expression(rw, rhs, context, src)?;
    match lhs {
        [Tok::Ident(name)] if rw.in_ports.contains(name) => Err(malformed(
            context,
            src,
            &format!("cannot assign to input port '{name}'"),
        )),
        [Tok::Ident(name)] if rw.out_ports.contains(name) => {
            Ok(format!("ctx.write(\"{name}\", {value})"))
        }
        [Tok::Ident(name)] if rw.vars.contains(name) => {
            Ok(format!("ctx.set_var(\"{name}\", {value})"))
        }
        [Tok::Ident(name)] if rw.params.contains(name) => Err(malformed(
            context,
            src,
            &format!("cannot assign to template parameter '{name}'"),
        )),
        [Tok::Ident(name)] if !rw.wrap_values => Ok(format!("{name} = {value}")),
        [Tok::Ident(name)] => Err(malformed(
            context,
            src,
            &format!("assignment target '{name}' is not a port or variable"),
        )),
        _ if !rw.wrap_values => {
            let target = expression(rw, lhs, context, src)?;
            Ok(format!("{target} = {value}"))
        }
        _ => Err(malformed(context, src, "unsupported assignment target")),
    }
}

/// Split at the single top-level `:=`, if present.
fn split_assignment(tokens: &[Tok]) -> Option<(&[Tok], &[Tok])> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            Tok::Op(op) if op == "(" || op == "[" => depth += 1,
            Tok::Op(op) if op == ")" || op == "]" => depth = depth.saturating_sub(1),
            Tok::Op(op) if op == ":=" && depth == 0 => {
                return Some((&tokens[..i], &tokens[i + 1..]))
            }
            _ => {}
        }
    }
    None
}

// ------------------------------------------------------------------------
// Conditions
// ------------------------------------------------------------------------

/// A condition is split at top-level `&&`/`||` and each operand coerced to
/// `bool`: comparisons already are, anything else goes through `truthy`.
fn condition(rw: &RewriteContext, tokens: &[Tok], context: &str, src: &str) -> Result<String> {
    let mut depth = 0usize;
    let mut pieces: Vec<String> = Vec::new();
    let mut start = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            Tok::Op(op) if op == "(" || op == "[" => depth += 1,
            Tok::Op(op) if op == ")" || op == "]" => depth = depth.saturating_sub(1),
            Tok::Op(op) if depth == 0 && (op == "&&" || op == "||") => {
                pieces.push(operand(rw, &tokens[start..i], context, src)?);
                pieces.push(op.clone());
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(operand(rw, &tokens[start..], context, src)?);
    Ok(pieces.join(" "))
}

fn operand(rw: &RewriteContext, tokens: &[Tok], context: &str, src: &str) -> Result<String> {
    match tokens {
        [] => Err(malformed(context, src, "empty boolean operand")),
        [Tok::Ident(lit)] if lit == "true" || lit == "false" => Ok(lit.clone()),
        [Tok::Op(op), rest @ ..] if op == "!" => {
            Ok(format!("!{}", operand(rw, rest, context, src)?))
        }
        _ if wrapped_in_parens(tokens) => Ok(format!(
            "({})",
            condition(rw, &tokens[1..tokens.len() - 1], context, src)?
        )),
        _ if has_top_level_comparison(tokens) => expression(rw, tokens, context, src),
        _ => Ok(format!("truthy({})", expression(rw, tokens, context, src)?)),
    }
}

fn wrapped_in_parens(tokens: &[Tok]) -> bool {
    if tokens.len() < 2
        || tokens.first() != Some(&Tok::Op("(".to_string()))
        || tokens.last() != Some(&Tok::Op(")".to_string()))
    {
        return false;
    }
    // The opening paren must match the final one.
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            Tok::Op(op) if op == "(" => depth += 1,
            Tok::Op(op) if op == ")" => {
                depth -= 1;
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn has_top_level_comparison(tokens: &[Tok]) -> bool {
    let mut depth = 0usize;
    for tok in tokens {
        match tok {
            Tok::Op(op) if op == "(" || op == "[" => depth += 1,
            Tok::Op(op) if op == ")" || op == "]" => depth = depth.saturating_sub(1),
            Tok::Op(op)
                if depth == 0
                    && matches!(op.as_str(), "==" | "!=" | "<" | "<=" | ">" | ">=") =>
            {
                return true
            }
            _ => {}
        }
    }
    false
}

// ------------------------------------------------------------------------
// Expressions
// ------------------------------------------------------------------------

fn expression(rw: &RewriteContext, tokens: &[Tok], context: &str, src: &str) -> Result<String> {
    let mut pieces = Vec::with_capacity(tokens.len());
    for (i, tok) in tokens.iter().enumerate() {
        let piece = match tok {
            Tok::Ident(name) if name == "null" => "Value::Null".to_string(),
            Tok::Ident(name) if name == "true" || name == "false" => {
                if rw.wrap_values {
                    format!("Value::Bool({name})")
                } else {
                    name.clone()
                }
            }
            // A call keeps its own name even if it shadows a state name.
            Tok::Ident(name) if is_call(tokens, i) => name.clone(),
            Tok::Ident(name) if rw.is_port(name) => format!("ctx.read(\"{name}\")"),
            Tok::Ident(name) if rw.vars.contains(name) => format!("ctx.var(\"{name}\")"),
            Tok::Ident(name) if rw.params.contains(name) => {
                if rw.direct_params {
                    format!("{name}.clone()")
                } else {
                    format!("ctx.param(\"{name}\")")
                }
            }
            Tok::Ident(name) => name.clone(),
            Tok::Number(text) => {
                if rw.wrap_values {
                    if text.contains('.') {
                        format!("Value::Real({text})")
                    } else {
                        format!("Value::Int({text})")
                    }
                } else {
                    text.clone()
                }
            }
            Tok::Str(text) => {
                if rw.wrap_values {
                    format!("Value::from(\"{text}\")")
                } else {
                    format!("String::from(\"{text}\")")
                }
            }
            Tok::Op(op) if op == ":=" => {
                return Err(malformed(context, src, "':=' inside an expression"))
            }
            Tok::Op(op) => op.clone(),
        };
        pieces.push(piece);
    }
    Ok(join(&pieces))
}

fn is_call(tokens: &[Tok], i: usize) -> bool {
    tokens.get(i + 1) == Some(&Tok::Op("(".to_string()))
}

/// Join pieces with single spaces, tightened around call and index syntax.
fn join(pieces: &[String]) -> String {
    let mut out = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            let prev = pieces[i - 1].as_str();
            let tight_before = matches!(piece.as_str(), ")" | "]" | "," | "." | "(" | "[");
            let tight_after = matches!(prev, "(" | "[" | ".");
            if !(tight_before || tight_after) {
                out.push(' ');
            }
        }
        out.push_str(piece);
    }
    out
}

// ------------------------------------------------------------------------
// Lexer
// ------------------------------------------------------------------------

fn tokenize(src: &str, context: &str) -> Result<Vec<Tok>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Tok::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            tokens.push(Tok::Number(chars[start..i].iter().collect()));
            continue;
        }
        if c == '"' {
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(malformed(context, src, "unterminated string literal")),
                    Some('"') => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        text.push('\\');
                        if let Some(next) = chars.get(i + 1) {
                            text.push(*next);
                        }
                        i += 2;
                    }
                    Some(other) => {
                        text.push(*other);
                        i += 1;
                    }
                }
            }
            tokens.push(Tok::Str(text));
            continue;
        }
        let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
        if matches!(two.as_str(), ":=" | "==" | "!=" | "<=" | ">=" | "&&" | "||") {
            tokens.push(Tok::Op(two));
            i += 2;
            continue;
        }
        if matches!(c, '+' | '-' | '*' | '/' | '%' | '<' | '>' | '!' | '(' | ')' | '[' | ']' | ',' | '.') {
            tokens.push(Tok::Op(c.to_string()));
            i += 1;
            continue;
        }
        return Err(malformed(context, src, &format!("unexpected character '{c}'")));
    }
    Ok(tokens)
}

fn malformed(context: &str, expr: &str, message: &str) -> GeneratorError {
    GeneratorError::MalformedExpression {
        context: context.to_string(),
        expr: expr.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transformer::{Port, Transition, TypeRef, Variable};

    fn monitor_context() -> RewriteContext {
        let automaton = Automaton::new(
            "monitor",
            vec![],
            vec![
                Port::new("hb", Direction::In, TypeRef::named("int"), None),
                Port::new("alarm", Direction::Out, TypeRef::named("bool"), None),
            ],
            vec![
                Variable::new("counter", TypeRef::named("int"), Some("0".to_string())),
                Variable::new("nullable", TypeRef::named("bool"), None),
            ],
            vec![Transition::new("true", vec![])],
        );
        RewriteContext::for_automaton(&automaton).unwrap()
    }

    #[test]
    fn ports_and_vars_resolve_through_ctx() {
        let rw = monitor_context();
        let out = rewrite_condition(&rw, "hb != null", "g").unwrap();
        assert_eq!(out, "ctx.read(\"hb\") != Value::Null");
        let out = rewrite_statement(&rw, "counter := counter + 1", "s").unwrap();
        assert_eq!(
            out,
            "ctx.set_var(\"counter\", ctx.var(\"counter\") + Value::Int(1))"
        );
    }

    #[test]
    fn null_mapping_is_token_exact() {
        let rw = monitor_context();
        // An identifier containing 'null' must survive untouched.
        let out = rewrite_condition(&rw, "nullable != null", "g").unwrap();
        assert_eq!(out, "ctx.var(\"nullable\") != Value::Null");
        // A string literal spelling 'null' is data, not the keyword.
        let out = rewrite_statement(&rw, "alarm := \"null\"", "s").unwrap();
        assert_eq!(out, "ctx.write(\"alarm\", Value::from(\"null\"))");
    }

    #[test]
    fn bare_operands_are_coerced_with_truthy() {
        let rw = monitor_context();
        let out = rewrite_condition(&rw, "hb != null && nullable", "g").unwrap();
        assert_eq!(
            out,
            "ctx.read(\"hb\") != Value::Null && truthy(ctx.var(\"nullable\"))"
        );
        assert_eq!(rewrite_condition(&rw, "true", "g").unwrap(), "true");
        assert_eq!(
            rewrite_condition(&rw, "!(nullable || counter > 3)", "g").unwrap(),
            "!(truthy(ctx.var(\"nullable\")) || ctx.var(\"counter\") > Value::Int(3))"
        );
    }

    #[test]
    fn unary_minus_survives_value_wrapping() {
        let rw = monitor_context();
        // Negation stays a unary operator on the wrapped value; the
        // runtime Value implements Neg and Not.
        let out = rewrite_statement(&rw, "counter := -1", "s").unwrap();
        assert_eq!(out, "ctx.set_var(\"counter\", - Value::Int(1))");
        let out = rewrite_value(&rw, "-counter", "init").unwrap();
        assert_eq!(out, "- ctx.var(\"counter\")");
    }

    #[test]
    fn writing_an_input_port_is_rejected() {
        let rw = monitor_context();
        let err = rewrite_statement(&rw, "hb := 1", "s").unwrap_err();
        assert!(err.to_string().contains("input port"));
    }

    #[test]
    fn sync_expands_per_port() {
        let rw = monitor_context();
        let out = rewrite_statement(&rw, "sync alarm", "s").unwrap();
        assert_eq!(out, "ctx.sync(\"alarm\")");
        let out = rewrite_statement(&rw, "sync hb, alarm", "s").unwrap();
        assert_eq!(out, "ctx.sync(\"hb\"); ctx.sync(\"alarm\")");
        assert!(rewrite_statement(&rw, "sync missing", "s").is_err());
    }

    #[test]
    fn skip_is_a_no_op() {
        let rw = monitor_context();
        assert_eq!(rewrite_statement(&rw, "skip", "s").unwrap(), "()");
    }

    #[test]
    fn plain_mode_translates_only_surface_syntax() {
        let rw = RewriteContext::plain();
        let out = rewrite_statement(&rw, "x := x + 1", "s").unwrap();
        assert_eq!(out, "x = x + 1");
        let out = rewrite_statement(&rw, "return f(x, 2)", "s").unwrap();
        assert_eq!(out, "return f(x, 2)");
        assert!(rewrite_statement(&rw, "sync p", "s").is_err());
    }

    #[test]
    fn unknown_character_is_reported_with_context() {
        let rw = monitor_context();
        let err = rewrite_condition(&rw, "counter @ 3", "guard of 'monitor'").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("guard of 'monitor'"));
        assert!(text.contains('@'));
    }

    #[test]
    fn assignment_targets_must_be_known_in_value_mode() {
        let rw = monitor_context();
        let err = rewrite_statement(&rw, "ghost := 1", "s").unwrap_err();
        assert!(err.to_string().contains("not a port or variable"));
    }
}
