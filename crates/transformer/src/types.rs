//! Type references and template parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a type, tagged by whether it names a template placeholder
/// or a resolved concrete type.
///
/// Type references are value-like: they are cheaply cloned and may be shared
/// by several declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeRef {
    /// A placeholder name bound by an enclosing template list.
    Abstract { name: String },
    /// A resolved type: primitive, user-defined, or a generic container.
    Concrete { ty: ConcreteType },
}

/// The shape of a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConcreteType {
    /// A primitive or user-defined type name.
    Named(String),
    /// A fixed-size array container; nesting is preserved exactly.
    Array { element: Box<TypeRef>, size: u64 },
}

impl TypeRef {
    pub fn abstract_name(name: &str) -> Self {
        Self::Abstract {
            name: name.to_string(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::Concrete {
            ty: ConcreteType::Named(name.to_string()),
        }
    }

    pub fn array(element: TypeRef, size: u64) -> Self {
        Self::Concrete {
            ty: ConcreteType::Array {
                element: Box::new(element),
                size,
            },
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Abstract { .. })
    }
}

impl fmt::Display for TypeRef {
    /// Mediator-syntax rendering, used in diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abstract { name } => write!(f, "{name}"),
            Self::Concrete { ty } => write!(f, "{ty}"),
        }
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Array { element, size } => write!(f, "array[{element}, {size}]"),
        }
    }
}

/// Classification of one template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ty", rename_all = "lowercase")]
pub enum ParamKind {
    /// A generic type slot (`name : type`).
    Abstract,
    /// A value parameter bound to a specific type (`name : int`).
    Concrete(TypeRef),
}

/// A single entry of a template list. Names are unique within one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParam {
    name: String,
    kind: ParamKind,
}

impl TemplateParam {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, ParamKind::Abstract)
    }
}

impl fmt::Display for TemplateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParamKind::Abstract => write!(f, "{} : type", self.name),
            ParamKind::Concrete(ty) => write!(f, "{} : {}", self.name, ty),
        }
    }
}
