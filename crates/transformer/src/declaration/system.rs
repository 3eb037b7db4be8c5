//! Systems: compositions of automaton instances.

use super::port::Port;
use crate::types::TemplateParam;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One component instance: a name bound to an automaton type, with the
/// template arguments passed at instantiation kept as source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    name: String,
    automaton: String,
    #[serde(default)]
    args: Vec<String>,
}

impl Component {
    pub fn new(name: &str, automaton: &str, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            automaton: automaton.to_string(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn automaton(&self) -> &str {
        &self.automaton
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// A reference to a port: either a component's port (`comp.port`) or one of
/// the system's own ports (`port`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    component: Option<String>,
    port: String,
}

impl Endpoint {
    pub fn new(component: Option<&str>, port: &str) -> Self {
        Self {
            component: component.map(str::to_string),
            port: port.to_string(),
        }
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "{}.{}", component, self.port),
            None => write!(f, "{}", self.port),
        }
    }
}

/// A directed link from one endpoint to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    from: Endpoint,
    to: Endpoint,
}

impl Connection {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    pub fn to(&self) -> &Endpoint {
        &self.to
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A composite: named component instances, internal channels and the
/// connections that wire them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    name: String,
    #[serde(default)]
    template_params: Vec<TemplateParam>,
    #[serde(default)]
    ports: Vec<Port>,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    internals: Vec<String>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl System {
    pub fn new(
        name: &str,
        template_params: Vec<TemplateParam>,
        ports: Vec<Port>,
        components: Vec<Component>,
        internals: Vec<String>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            name: name.to_string(),
            template_params,
            ports,
            components,
            internals,
            connections,
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

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn internals(&self) -> &[String] {
        &self.internals
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}
