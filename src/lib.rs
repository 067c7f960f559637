/*!
A small backtracking regular expression engine.

A pattern goes through three stages:

1. [`parser::Parser`] turns the pattern string into a [`ast::RegexNode`]
   tree, plus one [`ast::Capture`] descriptor per capturing group.
2. [`compiler::Compiler`] lowers the tree into a [`compiler::Program`], a
   graph of tiny test-and-advance automata.
3. [`matcher::run`] walks that graph against a subject with an explicit
   backtracking stack.

```
use grep_automata::Pattern;

let pattern = Pattern::new(r"(\d+)-(\d+)").unwrap();
let m = pattern.find("call 555-1234 now").unwrap();
assert_eq!(m.as_str(), "555-1234");
assert_eq!(m.get(2), Some("1234"));
```
*/

use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub mod ast;
pub mod compiler;
pub mod error;
pub mod match_data;
pub mod matcher;
pub mod parser;
pub mod state;

pub use ast::{Capture, RegexNode};
pub use error::ParseError;
pub use match_data::Match;

use compiler::{Compiler, Program};
use parser::Parser;

#[cfg(test)]
mod tests;

/// A parsed and compiled pattern.
///
/// Compilation happens once, in [`Pattern::new`]. The result is immutable,
/// so a single `Pattern` can serve any number of matches, from any number
/// of threads.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern as rendered back from its syntax tree.
    source: Arc<str>,
    root: RegexNode,
    captures: Arc<[Capture]>,
    program: Program,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        let (root, captures) = Parser::new(pattern).parse()?;
        let program = Compiler::new().compile(&root, captures.len())?;
        Ok(Self {
            source: root.to_string().into(),
            root,
            captures: captures.into(),
            program,
        })
    }

    /// Finds the leftmost match in `subject`.
    pub fn find(&self, subject: &str) -> Option<Match> {
        self.find_at(subject, 0)
    }

    /// Finds the leftmost match in `subject` that starts at `start` or
    /// later. `start` is a byte offset; if it falls inside a character the
    /// search begins at the next one.
    pub fn find_at(&self, subject: &str, start: usize) -> Option<Match> {
        let state = matcher::run(&self.program, subject, start)?;
        Some(Match::new(self.source.clone(), self.captures.clone(), &state))
    }

    /// Like [`Pattern::find`], but only reports where the match starts.
    pub fn position(&self, subject: &str) -> Option<usize> {
        self.position_at(subject, 0)
    }

    /// Like [`Pattern::find_at`], but only reports where the match starts.
    pub fn position_at(&self, subject: &str, start: usize) -> Option<usize> {
        matcher::run(&self.program, subject, start).map(|state| state.start())
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.position(subject).is_some()
    }

    /// Capturing groups, in declaration order.
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    pub fn ast(&self) -> &RegexNode {
        &self.root
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The pattern rendered back from its syntax tree.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

/// Returns true if `pattern` matches anywhere in `input`.
pub fn is_match(input: &str, pattern: &str) -> Result<bool, ParseError> {
    Ok(Pattern::new(pattern)?.is_match(input))
}
