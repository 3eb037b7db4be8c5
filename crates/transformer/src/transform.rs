//! Parse-tree to declarations transformation.
//!
//! The transformer walks the owned parse tree and builds the structured
//! [`Declarations`] consumed by the generator. Its one piece of real
//! analysis is template-parameter resolution: a bare type name resolves to
//! an abstract placeholder only while the declaration that binds it is being
//! processed, tracked by a lexical [`ScopeStack`]. Everything the grammar
//! captured as raw text (guards, statements, initializers) passes through
//! trimmed but otherwise untouched.

use crate::declaration::{
    Arg, Automaton, Component, Connection, Declarations, Direction, Endpoint, Function, Port,
    System, Transition, Typedef, Variable,
};
use crate::error::StructuralError;
use crate::scope::ScopeStack;
use crate::types::{ParamKind, TemplateParam, TypeRef};
use parser::ParseNode;
use std::collections::HashSet;

pub type Result<T> = std::result::Result<T, StructuralError>;

/// Builds [`Declarations`] from a parse tree.
#[derive(Debug, Default)]
pub struct Transformer {
    scopes: ScopeStack,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform a whole program tree.
    pub fn transform(&mut self, tree: &ParseNode) -> Result<Declarations> {
        expect_rule(tree, "program")?;

        let mut typedefs = Vec::new();
        let mut functions = Vec::new();
        let mut automata = Vec::new();
        let mut systems = Vec::new();

        for node in tree.children() {
            match node.name() {
                Some("typedef_decl") => typedefs.push(self.typedef(node)?),
                Some("function_decl") => functions.push(self.function(node)?),
                Some("automaton_decl") => automata.push(self.automaton(node)?),
                Some("system_decl") => systems.push(self.system(node)?),
                _ => return Err(unexpected(node, "program")),
            }
        }

        Ok(Declarations::new(typedefs, functions, automata, systems))
    }

    // --------------------------------------------------------------------
    // Declarations
    // --------------------------------------------------------------------

    fn typedef(&mut self, node: &ParseNode) -> Result<Typedef> {
        let mut target = None;
        let mut name = None;
        for child in node.children() {
            match child.name() {
                Some("array_type") | Some("type_ref") => target = Some(self.type_expr(child)?),
                Some("ident") => name = child.leaf(),
                _ => return Err(unexpected(child, "typedef")),
            }
        }
        let name = name.ok_or_else(|| missing(node, "ident"))?;
        let target = target.ok_or_else(|| missing(node, "type"))?;
        Ok(Typedef::new(name, target))
    }

    fn function(&mut self, node: &ParseNode) -> Result<Function> {
        self.scopes.push();
        let result = self.function_scoped(node);
        self.scopes.pop();
        result
    }

    fn function_scoped(&mut self, node: &ParseNode) -> Result<Function> {
        let mut template_params = Vec::new();
        let mut name = None;
        let mut args = Vec::new();
        let mut return_type = None;
        let mut variables = Vec::new();
        let mut statements = Vec::new();

        for child in node.children() {
            match child.name() {
                Some("template") => template_params = self.template(child)?,
                Some("ident") => name = child.leaf(),
                Some("arg_list") => args = self.arg_list(child)?,
                Some("array_type") | Some("type_ref") => {
                    return_type = Some(self.type_expr(child)?)
                }
                Some("variables_block") => variables = self.variables_block(child)?,
                Some("statements_block") => statements = statement_texts(child)?,
                _ => return Err(unexpected(child, "function")),
            }
        }

        let name = name.ok_or_else(|| missing(node, "ident"))?;
        let return_type = return_type.ok_or_else(|| missing(node, "return type"))?;
        Ok(Function::new(
            name,
            template_params,
            args,
            return_type,
            variables,
            statements,
        ))
    }

    fn automaton(&mut self, node: &ParseNode) -> Result<Automaton> {
        self.scopes.push();
        let result = self.automaton_scoped(node);
        self.scopes.pop();
        result
    }

    fn automaton_scoped(&mut self, node: &ParseNode) -> Result<Automaton> {
        let mut template_params = Vec::new();
        let mut name = None;
        let mut ports = Vec::new();
        let mut variables = Vec::new();
        let mut transitions = Vec::new();

        for child in node.children() {
            match child.name() {
                Some("template") => template_params = self.template(child)?,
                Some("ident") => name = child.leaf(),
                Some("port_list") => ports = self.port_list(child)?,
                Some("variables_block") => variables = self.variables_block(child)?,
                Some("transitions_block") => transitions = transitions_block(child)?,
                _ => return Err(unexpected(child, "automaton")),
            }
        }

        let name = name.ok_or_else(|| missing(node, "ident"))?;
        check_unique_ports(name, &ports, node.line())?;
        Ok(Automaton::new(
            name,
            template_params,
            ports,
            variables,
            transitions,
        ))
    }

    fn system(&mut self, node: &ParseNode) -> Result<System> {
        self.scopes.push();
        let result = self.system_scoped(node);
        self.scopes.pop();
        result
    }

    fn system_scoped(&mut self, node: &ParseNode) -> Result<System> {
        let mut template_params = Vec::new();
        let mut name = None;
        let mut components = Vec::new();
        let mut internals = Vec::new();
        let mut connections = Vec::new();

        for child in node.children() {
            match child.name() {
                Some("template") => template_params = self.template(child)?,
                Some("ident") => name = child.leaf(),
                Some("components_block") => components = components_block(child)?,
                Some("internals_decl") => internals = internals_decl(child)?,
                Some("connections_block") => connections = connections_block(child)?,
                _ => return Err(unexpected(child, "system")),
            }
        }

        let name = name.ok_or_else(|| missing(node, "ident"))?;
        Ok(System::new(
            name,
            template_params,
            Vec::new(),
            components,
            internals,
            connections,
        ))
    }

    // --------------------------------------------------------------------
    // Templates and types
    // --------------------------------------------------------------------

    /// Process a template list, declaring abstract parameters into the
    /// innermost scope as they appear. A later parameter may therefore use
    /// an earlier abstract one as its type.
    fn template(&mut self, node: &ParseNode) -> Result<Vec<TemplateParam>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut params = Vec::new();

        for child in node.children() {
            expect_rule(child, "template_param")?;
            let name_node = child
                .children()
                .first()
                .ok_or_else(|| missing(child, "ident"))?;
            let name = leaf_text(name_node, "ident")?;
            if !seen.insert(name.to_string()) {
                return Err(StructuralError::DuplicateParam {
                    name: name.to_string(),
                    line: child.line(),
                });
            }

            let kind_node = child
                .children()
                .get(1)
                .ok_or_else(|| missing(child, "parameter type"))?;
            let kind = match kind_node.name() {
                Some("abstract_type_param") => {
                    self.scopes.declare(name);
                    ParamKind::Abstract
                }
                Some("concrete_type_param") => {
                    let ty_node = kind_node
                        .children()
                        .first()
                        .ok_or_else(|| missing(kind_node, "type"))?;
                    ParamKind::Concrete(self.type_expr(ty_node)?)
                }
                _ => return Err(unexpected(kind_node, "template parameter")),
            };
            params.push(TemplateParam::new(name, kind));
        }
        Ok(params)
    }

    /// Resolve a type expression against the current scopes. A bare name is
    /// abstract exactly when an enclosing template list binds it.
    fn type_expr(&self, node: &ParseNode) -> Result<TypeRef> {
        match node.name() {
            Some("type_ref") => {
                let name_node = node
                    .children()
                    .first()
                    .ok_or_else(|| missing(node, "ident"))?;
                let name = leaf_text(name_node, "ident")?;
                if self.scopes.contains(name) {
                    Ok(TypeRef::abstract_name(name))
                } else {
                    Ok(TypeRef::named(name))
                }
            }
            Some("array_type") => {
                let element_node = node
                    .children()
                    .first()
                    .ok_or_else(|| missing(node, "element type"))?;
                let element = self.type_expr(element_node)?;
                let size_node = node
                    .children()
                    .get(1)
                    .ok_or_else(|| missing(node, "number"))?;
                let size_text = leaf_text(size_node, "number")?;
                let size = size_text
                    .parse::<u64>()
                    .map_err(|_| StructuralError::InvalidArraySize {
                        size: size_text.to_string(),
                        line: size_node.line(),
                    })?;
                Ok(TypeRef::array(element, size))
            }
            _ => Err(StructuralError::NodeShape {
                expected: "type".to_string(),
                found: describe(node),
                line: node.line(),
            }),
        }
    }

    // --------------------------------------------------------------------
    // Members
    // --------------------------------------------------------------------

    fn arg_list(&self, node: &ParseNode) -> Result<Vec<Arg>> {
        node.children()
            .iter()
            .map(|child| {
                expect_rule(child, "arg_decl")?;
                let (name, ty, default) = self.typed_member(child)?;
                Ok(Arg::new(name, ty, default))
            })
            .collect()
    }

    fn port_list(&self, node: &ParseNode) -> Result<Vec<Port>> {
        node.children()
            .iter()
            .map(|child| {
                expect_rule(child, "port_decl")?;
                self.port(child)
            })
            .collect()
    }

    fn port(&self, node: &ParseNode) -> Result<Port> {
        let mut name = None;
        let mut direction = None;
        let mut ty = None;
        let mut init = None;

        for child in node.children() {
            match child.name() {
                Some("ident") => name = child.leaf(),
                Some("direction") => {
                    let text = leaf_text(child, "direction")?;
                    direction = Some(text.parse::<Direction>().map_err(|_| {
                        StructuralError::InvalidDirection {
                            direction: text.to_string(),
                            line: child.line(),
                        }
                    })?);
                }
                Some("array_type") | Some("type_ref") => ty = Some(self.type_expr(child)?),
                Some("init_value") => init = child.leaf().map(|t| t.trim().to_string()),
                _ => return Err(unexpected(child, "port")),
            }
        }

        let name = name.ok_or_else(|| missing(node, "ident"))?;
        let direction = direction.ok_or_else(|| missing(node, "direction"))?;
        let ty = ty.ok_or_else(|| missing(node, "type"))?;
        Ok(Port::new(name, direction, ty, init))
    }

    fn variables_block(&self, node: &ParseNode) -> Result<Vec<Variable>> {
        node.children()
            .iter()
            .map(|child| {
                expect_rule(child, "variable_decl")?;
                let (name, ty, init) = self.typed_member(child)?;
                Ok(Variable::new(name, ty, init))
            })
            .collect()
    }

    /// Shared shape of `name : type (= init)?` members. The name borrows
    /// from the node, not from the transformer.
    fn typed_member<'a>(&self, node: &'a ParseNode) -> Result<(&'a str, TypeRef, Option<String>)> {
        let mut name = None;
        let mut ty = None;
        let mut init = None;
        for child in node.children() {
            match child.name() {
                Some("ident") => name = child.leaf(),
                Some("array_type") | Some("type_ref") => ty = Some(self.type_expr(child)?),
                Some("init_value") => init = child.leaf().map(|t| t.trim().to_string()),
                _ => return Err(unexpected(child, "typed member")),
            }
        }
        let name = name.ok_or_else(|| missing(node, "ident"))?;
        let ty = ty.ok_or_else(|| missing(node, "type"))?;
        Ok((name, ty, init))
    }
}

// ------------------------------------------------------------------------
// Scope-free walks
// ------------------------------------------------------------------------

fn transitions_block(node: &ParseNode) -> Result<Vec<Transition>> {
    node.children()
        .iter()
        .map(|child| {
            expect_rule(child, "transition")?;
            let guard_node = child
                .children()
                .first()
                .ok_or_else(|| missing(child, "guard"))?;
            let guard = leaf_text(guard_node, "guard")?.trim().to_string();
            let statements = child.children()[1..]
                .iter()
                .map(statement_text)
                .collect::<Result<Vec<_>>>()?;
            Ok(Transition::new(&guard, statements))
        })
        .collect()
}

fn statement_texts(node: &ParseNode) -> Result<Vec<String>> {
    node.children().iter().map(statement_text).collect()
}

fn statement_text(node: &ParseNode) -> Result<String> {
    expect_rule(node, "statement")?;
    let text_node = node
        .children()
        .first()
        .ok_or_else(|| missing(node, "stmt_text"))?;
    Ok(leaf_text(text_node, "stmt_text")?.trim().to_string())
}

fn components_block(node: &ParseNode) -> Result<Vec<Component>> {
    node.children()
        .iter()
        .map(|child| {
            expect_rule(child, "component_decl")?;
            let name_node = child
                .children()
                .first()
                .ok_or_else(|| missing(child, "ident"))?;
            let name = leaf_text(name_node, "ident")?;
            let ty_node = child
                .children()
                .get(1)
                .ok_or_else(|| missing(child, "type_ref"))?;
            expect_rule(ty_node, "type_ref")?;
            let automaton_node = ty_node
                .children()
                .first()
                .ok_or_else(|| missing(ty_node, "ident"))?;
            let automaton = leaf_text(automaton_node, "ident")?;
            Ok(Component::new(name, automaton, Vec::new()))
        })
        .collect()
}

fn internals_decl(node: &ParseNode) -> Result<Vec<String>> {
    node.children()
        .iter()
        .map(|child| Ok(leaf_text(child, "ident")?.to_string()))
        .collect()
}

fn connections_block(node: &ParseNode) -> Result<Vec<Connection>> {
    node.children()
        .iter()
        .map(|child| {
            expect_rule(child, "connection_decl")?;
            let from_node = child
                .children()
                .first()
                .ok_or_else(|| missing(child, "endpoint"))?;
            let to_node = child
                .children()
                .get(1)
                .ok_or_else(|| missing(child, "endpoint"))?;
            Ok(Connection::new(endpoint(from_node)?, endpoint(to_node)?))
        })
        .collect()
}

fn endpoint(node: &ParseNode) -> Result<Endpoint> {
    expect_rule(node, "endpoint")?;
    let first = node
        .children()
        .first()
        .ok_or_else(|| missing(node, "ident"))?;
    let first = leaf_text(first, "ident")?;
    match node.children().get(1) {
        Some(second) => Ok(Endpoint::new(Some(first), leaf_text(second, "ident")?)),
        None => Ok(Endpoint::new(None, first)),
    }
}

fn check_unique_ports(owner: &str, ports: &[Port], line: usize) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for port in ports {
        if !seen.insert(port.name()) {
            return Err(StructuralError::DuplicatePort {
                owner: owner.to_string(),
                port: port.name().to_string(),
                line,
            });
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------
// Node helpers
// ------------------------------------------------------------------------

fn expect_rule<'a>(node: &'a ParseNode, name: &str) -> Result<&'a ParseNode> {
    if node.name() == Some(name) {
        Ok(node)
    } else {
        Err(StructuralError::NodeShape {
            expected: name.to_string(),
            found: describe(node),
            line: node.line(),
        })
    }
}

fn leaf_text<'a>(node: &'a ParseNode, expected: &str) -> Result<&'a str> {
    expect_rule(node, expected)?;
    node.leaf().ok_or_else(|| missing(node, "token"))
}

fn unexpected(node: &ParseNode, context: &str) -> StructuralError {
    StructuralError::UnexpectedNode {
        node: describe(node),
        context: context.to_string(),
        line: node.line(),
    }
}

fn missing(node: &ParseNode, expected: &str) -> StructuralError {
    StructuralError::MissingChild {
        node: describe(node),
        expected: expected.to_string(),
        line: node.line(),
    }
}

fn describe(node: &ParseNode) -> String {
    match node.name() {
        Some(name) => name.to_string(),
        None => format!("token '{}'", node.token().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConcreteType;
    use parser::parse_source;

    fn declarations(source: &str) -> Declarations {
        let tree = parse_source(source).expect("source parses");
        Transformer::new().transform(&tree).expect("tree transforms")
    }

    #[test]
    fn classifies_every_declaration_kind() {
        let decls = declarations(
            r#"
            typedef int as id;
            function inc(x : int) : int { statements { return x + 1; } }
            automaton cell(p : in int) { transitions { true -> skip; } }
            system net { components { c : cell; } }
            "#,
        );
        assert_eq!(decls.typedefs().len(), 1);
        assert_eq!(decls.functions().len(), 1);
        assert_eq!(decls.automata().len(), 1);
        assert_eq!(decls.systems().len(), 1);
        assert_eq!(decls.typedefs()[0].name(), "id");
        assert_eq!(decls.systems()[0].components()[0].automaton(), "cell");
    }

    #[test]
    fn abstract_params_resolve_inside_their_declaration() {
        let decls = declarations(
            r#"
            automaton <T : type, size : int> buffer(input : in T) {
                variables { slots : array[T, 8]; }
                transitions { true -> skip; }
            }
            "#,
        );
        let automaton = &decls.automata()[0];
        assert!(automaton.template_params()[0].is_abstract());
        assert_eq!(
            automaton.template_params()[1].kind(),
            &ParamKind::Concrete(TypeRef::named("int"))
        );
        assert_eq!(automaton.ports()[0].ty(), &TypeRef::abstract_name("T"));
        assert_eq!(
            automaton.variables()[0].ty(),
            &TypeRef::array(TypeRef::abstract_name("T"), 8)
        );
    }

    #[test]
    fn abstract_params_do_not_leak_into_later_declarations() {
        let decls = declarations(
            r#"
            automaton <T : type> first(p : in T) { transitions { true -> skip; } }
            automaton second(q : in T) { transitions { true -> skip; } }
            "#,
        );
        assert_eq!(
            decls.automata()[0].ports()[0].ty(),
            &TypeRef::abstract_name("T")
        );
        // Same name, different declaration, no template: resolves concrete.
        assert_eq!(decls.automata()[1].ports()[0].ty(), &TypeRef::named("T"));
    }

    #[test]
    fn later_params_may_use_earlier_abstract_ones() {
        let decls = declarations(
            r#"
            function <T : type, fallback : T> pick(x : T) : T {
                statements { return x; }
            }
            "#,
        );
        let params = decls.functions()[0].template_params();
        assert_eq!(
            params[1].kind(),
            &ParamKind::Concrete(TypeRef::abstract_name("T"))
        );
    }

    #[test]
    fn duplicate_template_param_is_rejected() {
        let tree = parse_source(
            "automaton <T : type, T : int> a(p : in int) { transitions { true -> skip; } }",
        )
        .expect("source parses");
        let err = Transformer::new().transform(&tree).unwrap_err();
        assert!(matches!(err, StructuralError::DuplicateParam { name, .. } if name == "T"));
    }

    #[test]
    fn duplicate_port_is_rejected() {
        let tree = parse_source(
            "automaton a(p : in int, p : out int) { transitions { true -> skip; } }",
        )
        .expect("source parses");
        let err = Transformer::new().transform(&tree).unwrap_err();
        assert!(matches!(err, StructuralError::DuplicatePort { port, .. } if port == "p"));
    }

    #[test]
    fn transitions_keep_declaration_order_and_raw_text() {
        let decls = declarations(
            r#"
            automaton hb(hb : in int, alarm : out bool) {
                transitions {
                    hb != null -> { counter := 0; }
                    counter < 5 -> counter := counter + 1;
                    counter >= 5 -> alarm := true;
                }
            }
            "#,
        );
        let transitions = decls.automata()[0].transitions();
        assert_eq!(transitions.len(), 3);
        assert_eq!(transitions[0].guard(), "hb != null");
        assert_eq!(transitions[0].statements(), ["counter := 0"]);
        assert_eq!(transitions[1].guard(), "counter < 5");
        assert_eq!(transitions[2].statements(), ["alarm := true"]);
    }

    #[test]
    fn system_wiring_is_captured() {
        let decls = declarations(
            r#"
            system net {
                components { a : producer; b : consumer; }
                internals ch;
                connections {
                    a.output -> ch;
                    ch -> b.input;
                }
            }
            "#,
        );
        let system = &decls.systems()[0];
        assert_eq!(system.internals(), ["ch"]);
        assert_eq!(system.connections()[0].from().to_string(), "a.output");
        assert_eq!(system.connections()[1].to().to_string(), "b.input");
    }

    #[test]
    fn invalid_direction_in_dump_is_rejected() {
        // A hand-edited dump can carry a direction the grammar would refuse.
        let dump = "program\n  automaton_decl\n    ident\n      \"a\"\n    port_list\n      port_decl\n        ident\n          \"p\"\n        direction\n          \"sideways\"\n        type_ref\n          ident\n            \"int\"\n    transitions_block\n      transition\n        guard\n          \"true\"\n        statement\n          stmt_text\n            \"skip\"\n";
        let tree = ParseNode::from_pretty(dump).expect("dump parses");
        let err = Transformer::new().transform(&tree).unwrap_err();
        assert!(
            matches!(err, StructuralError::InvalidDirection { direction, .. } if direction == "sideways")
        );
    }

    #[test]
    fn declarations_round_trip_through_json() {
        let decls = declarations(
            r#"
            typedef array[int, 4] as quad;
            automaton <T : type> relay(input : in T, output : out T) {
                variables { buffered : T; }
                transitions { input != null -> output := input; }
            }
            "#,
        );
        let json = serde_json::to_string(&decls).expect("serializes");
        let back: Declarations = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, decls);
    }

    #[test]
    fn declarations_accept_missing_sections() {
        let decls: Declarations =
            serde_json::from_str(r#"{"automata": []}"#).expect("deserializes");
        assert!(decls.is_empty());
    }
}
