//! Ports: the communication endpoints of an automaton.

use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a port. Exactly one of the two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(format!("invalid direction '{other}', expected 'in' or 'out'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// A typed, named, directional communication endpoint.
///
/// The direction is optional only at the serialization boundary: the
/// transformer always fills it in, but a declarations object supplied by the
/// external extraction step may omit it, and the generator then rejects the
/// port with a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    name: String,
    #[serde(default)]
    direction: Option<Direction>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    init: Option<String>,
}

impl Port {
    pub fn new(name: &str, direction: Direction, ty: TypeRef, init: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            direction: Some(direction),
            ty,
            init,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn init(&self) -> Option<&str> {
        self.init.as_deref()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self
            .direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(f, "{} : {} {}", self.name, dir, self.ty)?;
        if let Some(init) = &self.init {
            write!(f, " = {init}")?;
        }
        Ok(())
    }
}
