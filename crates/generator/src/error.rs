use thiserror::Error;

/// Failures while turning declarations into program text.
///
/// Declarations may come from an external tool rather than our own
/// transformer, so the generator re-validates everything it depends on
/// instead of trusting the producer.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator error: port '{port}' of automaton '{automaton}' has no direction")]
    PortMissingDirection { automaton: String, port: String },
    #[error("Generator error: duplicate port '{port}' in '{owner}'")]
    DuplicatePort { owner: String, port: String },
    #[error("Generator error: component '{component}' of system '{system}' references unknown automaton '{automaton}'")]
    UnknownComponentType {
        system: String,
        component: String,
        automaton: String,
    },
    #[error("Generator error: type parameter '{name}' is not bound in {context}")]
    UnboundTypeParameter { context: String, name: String },
    #[error("Generator error in {context}: cannot translate '{expr}': {message}")]
    MalformedExpression {
        context: String,
        expr: String,
        message: String,
    },
    #[error("Generator error: assembled program does not parse: {0}")]
    Render(String),
    #[error("Generator error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
