//! Mediator Parser Library
//!
//! Grammar-driven parser for the Mediator coordination language: reactive
//! automata with directional ports and guarded transitions, composed into
//! systems. Produces an owned parse tree ([`ParseNode`]) whose shape mirrors
//! the grammar productions in `mediator.pest`, together with a canonical
//! textual dump used at the extraction boundary.

pub mod error;
pub mod tree;

pub use error::ParserError;
pub use tree::ParseNode;

use pest::Parser;
use pest_derive::Parser;
use std::path::Path;

pub type Result<T> = std::result::Result<T, ParserError>;

/// Mediator parser, powered by pest. The grammar artifact `mediator.pest`
/// is consumed once when the parser is built; changing it changes the
/// accepted language.
#[derive(Parser)]
#[grammar = "mediator.pest"]
pub struct MediatorParser;

/// Parse Mediator source text into an owned parse tree.
///
/// Fails fast with [`ParserError::Syntax`] naming the offending line and
/// column; no partial tree is produced.
pub fn parse_source(source: &str) -> Result<ParseNode> {
    let mut pairs =
        MediatorParser::parse(Rule::program, source).map_err(ParserError::from_pest)?;
    let top = pairs.next().ok_or(ParserError::Syntax {
        line: 1,
        column: 1,
        message: "empty parse result".to_string(),
    })?;
    Ok(ParseNode::from_pair(top))
}

/// Read a Mediator program from a file (UTF-8) and parse it.
pub fn parse_file(path: &Path) -> Result<ParseNode> {
    let source = std::fs::read_to_string(path)?;
    parse_source(&source)
}

#[cfg(test)]
mod tests;
