//! Mediator Compiler
//!
//! The pipeline front to back: parse Mediator source into an owned tree,
//! transform the tree into structured declarations, generate a Rust program
//! embedding the execution runtime. Each stage can also be entered from the
//! middle: a previously dumped parse tree or an externally produced
//! declarations JSON object compiles the same way as source text.

use parser::ParseNode;
use thiserror::Error;
use transformer::{Declarations, Transformer};


/// A pipeline failure, tagged with the stage that produced it.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("parse stage: {0}")]
    Parse(#[from] parser::ParserError),
    #[error("transform stage: {0}")]
    Transform(#[from] transformer::StructuralError),
    #[error("extraction stage: {0}")]
    Extraction(#[from] serde_json::Error),
    #[error("generate stage: {0}")]
    Generate(#[from] generator::GeneratorError),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Everything one compiler run produced.
#[derive(Debug)]
pub struct Compilation {
    tree: Option<ParseNode>,
    declarations: Declarations,
    program: String,
}

impl Compilation {
    /// The parse tree, present when the input was Mediator source or a tree
    /// dump rather than declarations JSON.
    pub fn tree(&self) -> Option<&ParseNode> {
        self.tree.as_ref()
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Full pipeline over Mediator source text.
pub fn compile_source(source: &str) -> Result<Compilation> {
    let tree = parser::parse_source(source)?;
    let declarations = Transformer::new().transform(&tree)?;
    let program = generator::generate_program(&declarations)?;
    Ok(Compilation {
        tree: Some(tree),
        declarations,
        program,
    })
}

/// Pipeline entry from a canonical parse tree dump.
pub fn compile_tree_dump(dump: &str) -> Result<Compilation> {
    let tree = ParseNode::from_pretty(dump)?;
    let declarations = Transformer::new().transform(&tree)?;
    let program = generator::generate_program(&declarations)?;
    Ok(Compilation {
        tree: Some(tree),
        declarations,
        program,
    })
}

/// Pipeline entry from a declarations JSON object, as produced by the
/// external semantic-extraction step.
pub fn compile_declarations_json(json: &str) -> Result<Compilation> {
    let declarations: Declarations = serde_json::from_str(json)?;
    let program = generator::generate_program(&declarations)?;
    Ok(Compilation {
        tree: None,
        declarations,
        program,
    })
}
