//! Automata: templated reactive components.

use super::port::Port;
use crate::types::{TemplateParam, TypeRef};
use serde::{Deserialize, Serialize};

/// A local state variable with an optional initializer kept as source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    init: Option<String>,
}

impl Variable {
    pub fn new(name: &str, ty: TypeRef, init: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            ty,
            init,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn init(&self) -> Option<&str> {
        self.init.as_deref()
    }
}

/// One guarded transition. The guard and each statement are source text; the
/// generator rewrites them into target-language expressions. Declaration
/// order is the dispatch priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    guard: String,
    #[serde(default)]
    statements: Vec<String>,
}

impl Transition {
    pub fn new(guard: &str, statements: Vec<String>) -> Self {
        Self {
            guard: guard.to_string(),
            statements,
        }
    }

    pub fn guard(&self) -> &str {
        &self.guard
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

/// A reactive component: template parameters, directional ports, local
/// variables and an ordered transition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automaton {
    name: String,
    #[serde(default)]
    template_params: Vec<TemplateParam>,
    #[serde(default)]
    ports: Vec<Port>,
    #[serde(default)]
    variables: Vec<Variable>,
    #[serde(default)]
    transitions: Vec<Transition>,
}

impl Automaton {
    pub fn new(
        name: &str,
        template_params: Vec<TemplateParam>,
        ports: Vec<Port>,
        variables: Vec<Variable>,
        transitions: Vec<Transition>,
    ) -> Self {
        Self {
            name: name.to_string(),
            template_params,
            ports,
            variables,
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_params(&self) -> &[TemplateParam] {
        &self.template_params
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name() == name)
    }
}
