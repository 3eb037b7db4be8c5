//! Mediator Declaration Transformer
//!
//! Rewrites the parse tree produced by the `parser` crate into structured
//! declarations: typedefs, functions, automata and systems. The transformer
//! owns the two semantically critical rules of the pipeline:
//!
//! - **template-parameter classification**: a parameter introduced as a bare
//!   `type` placeholder is Abstract, one bound to a named or nested type is
//!   Concrete;
//! - **type-reference resolution**: a bare type name resolves to Abstract
//!   only while an enclosing template declares it, searched through an
//!   explicit lexical scope stack, so parameter names never leak into later,
//!   unrelated declarations.
//!
//! Declarations are serde-serializable; the same schema is what the external
//! semantic-extraction step must produce when it re-derives declarations from
//! a parse tree dump.

pub mod declaration;
pub mod error;
pub mod scope;
pub mod transform;
pub mod types;

pub use declaration::{
    Arg, Automaton, Component, Connection, Declarations, Direction, Endpoint, Function, Port,
    System, Transition, Typedef, Variable,
};
pub use error::StructuralError;
pub use transform::Transformer;
pub use types::{ConcreteType, ParamKind, TemplateParam, TypeRef};

pub type Result<T> = std::result::Result<T, StructuralError>;
