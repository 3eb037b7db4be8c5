//! Lexical scope stack for template-parameter names.
//!
//! One frame is pushed when the transformer enters a declaration's template
//! list and popped when the declaration ends. Resolution searches from the
//! innermost frame outward, so an abstract parameter is visible only inside
//! its own declaration and never bleeds into later, unrelated templates.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new template scope.
    pub fn push(&mut self) {
        self.frames.push(HashSet::new());
    }

    /// Leave the innermost template scope, discarding its names.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Record an abstract parameter name in the innermost frame.
    ///
    /// Returns `false` if the name was already declared in that frame.
    pub fn declare(&mut self, name: &str) -> bool {
        match self.frames.last_mut() {
            Some(frame) => frame.insert(name.to_string()),
            None => false,
        }
    }

    /// True if any enclosing frame declares `name`, innermost outward.
    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.contains(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
