use crate::Rule;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Parse tree dump error at line {0}: {1}")]
    MalformedDump(usize, String),
    #[error("IO error: {0}")]
    Io(String),
}

impl ParserError {
    /// Extract the offending position and the expected-token message out of
    /// a pest error.
    pub(crate) fn from_pest(e: pest::error::Error<Rule>) -> Self {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Syntax {
            line,
            column,
            message: e.variant.message().to_string(),
        }
    }
}

impl From<std::io::Error> for ParserError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
