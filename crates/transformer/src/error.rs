use thiserror::Error;

/// Parse-tree shape violations detected while building declarations.
///
/// Every variant names the offending node and the shape that was expected;
/// the transformer never degrades a malformed node to a plain string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Structural error at line {line}: unexpected node '{node}' in {context}")]
    UnexpectedNode {
        node: String,
        context: String,
        line: usize,
    },
    #[error("Structural error at line {line}: expected a '{expected}' node, found '{found}'")]
    NodeShape {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("Structural error at line {line}: missing '{expected}' in '{node}'")]
    MissingChild {
        node: String,
        expected: String,
        line: usize,
    },
    #[error("Structural error at line {line}: duplicate template parameter '{name}'")]
    DuplicateParam { name: String, line: usize },
    #[error("Structural error at line {line}: duplicate port '{port}' in '{owner}'")]
    DuplicatePort {
        owner: String,
        port: String,
        line: usize,
    },
    #[error("Structural error at line {line}: invalid port direction '{direction}', expected 'in' or 'out'")]
    InvalidDirection { direction: String, line: usize },
    #[error("Structural error at line {line}: invalid array size '{size}'")]
    InvalidArraySize { size: String, line: usize },
}
