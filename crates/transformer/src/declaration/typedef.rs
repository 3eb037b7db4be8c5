//! Type aliases.

use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `typedef <target> as <name>;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typedef {
    name: String,
    target: TypeRef,
}

impl Typedef {
    pub fn new(name: &str, target: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &TypeRef {
        &self.target
    }
}

impl fmt::Display for Typedef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "typedef {} as {}", self.target, self.name)
    }
}
