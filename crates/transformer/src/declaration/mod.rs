//! Structured declarations produced by the transformer.
//!
//! A [`Declarations`] value is the schema shared with the external
//! semantic-extraction step: a JSON object with the keys `typedefs`,
//! `functions`, `automata` and `systems`, each defaulting to empty. All
//! entities are built once per compilation run and consumed read-only by the
//! code generator.

pub mod automaton;
pub mod function;
pub mod port;
pub mod system;
pub mod typedef;

pub use automaton::{Automaton, Transition, Variable};
pub use function::{Arg, Function};
pub use port::{Direction, Port};
pub use system::{Component, Connection, Endpoint, System};
pub use typedef::Typedef;

use serde::{Deserialize, Serialize};

/// Everything one compilation run declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default)]
    typedefs: Vec<Typedef>,
    #[serde(default)]
    functions: Vec<Function>,
    #[serde(default)]
    automata: Vec<Automaton>,
    #[serde(default)]
    systems: Vec<System>,
}

impl Declarations {
    pub fn new(
        typedefs: Vec<Typedef>,
        functions: Vec<Function>,
        automata: Vec<Automaton>,
        systems: Vec<System>,
    ) -> Self {
        Self {
            typedefs,
            functions,
            automata,
            systems,
        }
    }

    pub fn typedefs(&self) -> &[Typedef] {
        &self.typedefs
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn automata(&self) -> &[Automaton] {
        &self.automata
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn is_empty(&self) -> bool {
        self.typedefs.is_empty()
            && self.functions.is_empty()
            && self.automata.is_empty()
            && self.systems.is_empty()
    }

    /// Short count summary for progress logging.
    pub fn summary(&self) -> String {
        format!(
            "{} typedefs, {} functions, {} automata, {} systems",
            self.typedefs.len(),
            self.functions.len(),
            self.automata.len(),
            self.systems.len()
        )
    }
}
