//! Free function declarations.

use crate::types::{TemplateParam, TypeRef};
use serde::{Deserialize, Serialize};

/// One formal argument of a function, with an optional default value kept as
/// source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    name: String,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    default: Option<String>,
}

impl Arg {
    pub fn new(name: &str, ty: TypeRef, default: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            ty,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// A templated function with typed arguments, local variables and a
/// statement body carried as rewritable source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    name: String,
    #[serde(default)]
    template_params: Vec<TemplateParam>,
    #[serde(default)]
    args: Vec<Arg>,
    return_type: TypeRef,
    #[serde(default)]
    variables: Vec<super::Variable>,
    #[serde(default)]
    statements: Vec<String>,
}

impl Function {
    pub fn new(
        name: &str,
        template_params: Vec<TemplateParam>,
        args: Vec<Arg>,
        return_type: TypeRef,
        variables: Vec<super::Variable>,
        statements: Vec<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            template_params,
            args,
            return_type,
            variables,
            statements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_params(&self) -> &[TemplateParam] {
        &self.template_params
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn variables(&self) -> &[super::Variable] {
        &self.variables
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}
