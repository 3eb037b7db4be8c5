//! Owned parse tree with a canonical textual dump.
//!
//! The pest pairs borrowed from the source text are converted into an owned
//! [`ParseNode`] tree right after parsing. The tree has a deterministic
//! pretty-print (two-space indentation, rule names bare, token text quoted)
//! which serves two purposes:
//!
//! - it is the diagnostic dump handed to the external semantic-extraction
//!   step, and
//! - it can be re-read with [`ParseNode::from_pretty`], so a dumped tree
//!   round-trips to a structurally identical tree.
//!
//! Structural equality ignores source positions: a tree re-read from a dump
//! compares equal to the tree it was dumped from.

use crate::error::ParserError;
use crate::Rule;
use pest::iterators::Pair;
use std::fmt;

/// One node of the owned parse tree.
#[derive(Debug, Clone)]
pub enum ParseNode {
    /// An inner node produced by a grammar rule.
    Rule {
        name: String,
        children: Vec<ParseNode>,
        line: usize,
        col: usize,
    },
    /// A leaf carrying matched source text.
    Token { text: String, line: usize, col: usize },
}

impl PartialEq for ParseNode {
    /// Structural equality: rule names, token text and child order only.
    /// Source positions are ignored so trees re-read from a dump compare
    /// equal to their originals.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Rule {
                    name: a, children: ca, ..
                },
                Self::Rule {
                    name: b, children: cb, ..
                },
            ) => a == b && ca == cb,
            (Self::Token { text: a, .. }, Self::Token { text: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParseNode {}

impl ParseNode {
    /// Convert a pest pair into an owned node.
    ///
    /// Leaf rules (no inner pairs) become a rule node wrapping a single
    /// token so the rule name stays visible to the transformer. The
    /// end-of-input marker is dropped.
    pub(crate) fn from_pair(pair: Pair<Rule>) -> Self {
        let (line, col) = pair.line_col();
        let name = format!("{:?}", pair.as_rule());
        let text = pair.as_str().to_string();
        let children: Vec<ParseNode> = pair
            .into_inner()
            .filter(|p| p.as_rule() != Rule::EOI)
            .map(Self::from_pair)
            .collect();

        if children.is_empty() {
            Self::Rule {
                name,
                children: vec![Self::Token { text, line, col }],
                line,
                col,
            }
        } else {
            Self::Rule {
                name,
                children,
                line,
                col,
            }
        }
    }

    /// Rule name of this node, if it is a rule node.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Rule { name, .. } => Some(name),
            Self::Token { .. } => None,
        }
    }

    /// Children of this node (empty for tokens).
    pub fn children(&self) -> &[ParseNode] {
        match self {
            Self::Rule { children, .. } => children,
            Self::Token { .. } => &[],
        }
    }

    /// Token text, if this node is a token leaf.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token { text, .. } => Some(text),
            Self::Rule { .. } => None,
        }
    }

    /// Text of a rule node that wraps exactly one token.
    pub fn leaf(&self) -> Option<&str> {
        match self {
            Self::Rule { children, .. } if children.len() == 1 => children[0].token(),
            _ => None,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Rule { line, .. } | Self::Token { line, .. } => *line,
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Self::Rule { col, .. } | Self::Token { col, .. } => *col,
        }
    }

    /// Canonical pretty-print of the tree.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, 0);
        out
    }

    fn pretty_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self {
            Self::Rule { name, children, .. } => {
                out.push_str(name);
                out.push('\n');
                for child in children {
                    child.pretty_into(out, depth + 1);
                }
            }
            Self::Token { text, .. } => {
                out.push('"');
                out.push_str(&escape(text));
                out.push('"');
                out.push('\n');
            }
        }
    }

    /// Re-read a tree from its canonical pretty-print.
    ///
    /// Fails with [`ParserError::MalformedDump`] on inconsistent indentation,
    /// a token line without a matching closing quote, or a dump with more
    /// than one root.
    pub fn from_pretty(dump: &str) -> Result<Self, ParserError> {
        // Stack of rule nodes still being filled, indexed by depth.
        let mut stack: Vec<(String, Vec<ParseNode>, usize)> = Vec::new();
        let mut root: Option<ParseNode> = None;

        for (idx, raw_line) in dump.lines().enumerate() {
            let lineno = idx + 1;
            if raw_line.trim().is_empty() {
                continue;
            }
            let indent = raw_line.len() - raw_line.trim_start_matches(' ').len();
            if indent % 2 != 0 {
                return Err(ParserError::MalformedDump(
                    lineno,
                    "odd indentation".to_string(),
                ));
            }
            let depth = indent / 2;
            if depth > stack.len() {
                return Err(ParserError::MalformedDump(
                    lineno,
                    format!("indentation jumps to depth {}", depth),
                ));
            }

            // Close deeper nodes before attaching at this depth.
            while stack.len() > depth {
                let Some((name, children, line)) = stack.pop() else {
                    break;
                };
                let node = ParseNode::Rule {
                    name,
                    children,
                    line,
                    col: stack.len() * 2 + 1,
                };
                match stack.last_mut() {
                    Some((_, siblings, _)) => siblings.push(node),
                    None => {
                        if root.is_some() {
                            return Err(ParserError::MalformedDump(
                                lineno,
                                "multiple root nodes".to_string(),
                            ));
                        }
                        root = Some(node);
                    }
                }
            }

            let content = raw_line.trim_start_matches(' ');
            if let Some(quoted) = content.strip_prefix('"') {
                let text = quoted.strip_suffix('"').ok_or_else(|| {
                    ParserError::MalformedDump(lineno, "unterminated token text".to_string())
                })?;
                let token = ParseNode::Token {
                    text: unescape(text, lineno)?,
                    line: lineno,
                    col: indent + 1,
                };
                match stack.last_mut() {
                    Some((_, children, _)) => children.push(token),
                    None => {
                        return Err(ParserError::MalformedDump(
                            lineno,
                            "token at root level".to_string(),
                        ))
                    }
                }
            } else {
                stack.push((content.to_string(), Vec::new(), lineno));
            }
        }

        // Close everything still open.
        while let Some((name, children, line)) = stack.pop() {
            let node = ParseNode::Rule {
                name,
                children,
                line,
                col: stack.len() * 2 + 1,
            };
            match stack.last_mut() {
                Some((_, siblings, _)) => siblings.push(node),
                None => {
                    if root.is_some() {
                        return Err(ParserError::MalformedDump(
                            line,
                            "multiple root nodes".to_string(),
                        ));
                    }
                    root = Some(node);
                }
            }
        }

        root.ok_or_else(|| ParserError::MalformedDump(0, "empty dump".to_string()))
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str, lineno: usize) -> Result<String, ParserError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            other => {
                return Err(ParserError::MalformedDump(
                    lineno,
                    format!("invalid escape '\\{}'", other.map(String::from).unwrap_or_default()),
                ))
            }
        }
    }
    Ok(out)
}
