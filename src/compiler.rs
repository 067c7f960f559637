/*!
Lowers a [`RegexNode`] tree into a [`Program`]: a flat list of automata
nodes plus, for every node, the ordered list of nodes to try next when it
succeeds.

Each node performs one small test against a [`MatchState`]. The order of a
node's successors is the backtracking priority: the engine always tries the
first successor before the second, which is how greedy and lazy repetition
and the left-to-right priority of alternatives are expressed.

Character classes like `[^abc]` are compiled by lowering the class in
*negated* mode. In negated mode every leaf test is inverted into a
zero-width assertion that the leaf does *not* match, and alternatives are
chained instead of branched, so `[^abc]` becomes "not `a`, then not `b`,
then not `c`", followed by a step that consumes one character.
*/

use std::fmt::{self, Display, Formatter};

use log::debug;

use crate::ast::{Metachar, RegexNode};
use crate::error::ParseError;
use crate::state::MatchState;

/// Maximum number of nodes in a compiled [`Program`].
pub const MAX_NODES: usize = 250_000;

/// Index of a node within a [`Program`].
pub type NodeId = usize;

/// The test performed by an automata node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Test {
    /// Consumes the given character.
    Literal(char),
    /// Consumes a character within the inclusive range.
    Range(char, char),
    /// Consumes any character but `\n`.
    Dot,
    /// Consumes any character.
    AnyChar,
    Metachar(Metachar),
    StartOfLine,
    EndOfLine,
    /// Records the start of a capture slot.
    CaptureOpen(usize),
    /// Completes a capture slot at the current offset.
    CaptureClose(usize),
    /// Records where an iteration of an unbounded loop begins.
    LoopEnter(usize),
    /// Passes if the current loop iteration consumed input.
    Progressed(usize),
    /// Passes if the current loop iteration consumed nothing.
    Stalled(usize),
    /// Always passes without consuming input.
    Join,
    /// Never passes. Reached when every path from the current start
    /// offset failed; see [`crate::matcher::run`].
    NoMatchAdvanced,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Consumes one character if it satisfies `f`.
fn consume<'s>(state: &MatchState<'s>, f: impl FnOnce(char) -> bool) -> Option<MatchState<'s>> {
    match state.peek() {
        Some(c) if f(c) => Some(state.advanced(c.len_utf8())),
        _ => None,
    }
}

/// Passes without consuming input if `cond` holds.
fn zero_width<'s>(state: &MatchState<'s>, cond: bool) -> Option<MatchState<'s>> {
    cond.then(|| state.advanced(0))
}

impl Test {
    /// Runs the test, returning the resulting state or `None` on no-match.
    pub fn call<'s>(&self, state: &MatchState<'s>) -> Option<MatchState<'s>> {
        match *self {
            Test::Literal(lit) => consume(state, |c| c == lit),
            Test::Range(start, end) => consume(state, |c| (start..=end).contains(&c)),
            Test::Dot => consume(state, |c| c != '\n'),
            Test::AnyChar => consume(state, |_| true),
            Test::Metachar(m) => match m {
                Metachar::SubjectStart => zero_width(state, state.is_start()),
                Metachar::Digit => consume(state, |c| c.is_ascii_digit()),
                Metachar::Space => consume(state, is_space),
                Metachar::NonSpace => consume(state, |c| !is_space(c)),
                Metachar::SubjectEnd => zero_width(state, state.is_end()),
                Metachar::SubjectEndNewline => {
                    zero_width(state, state.is_end() || state.rest() == "\n")
                }
            },
            Test::StartOfLine => {
                zero_width(state, state.is_start() || state.prev() == Some('\n'))
            }
            Test::EndOfLine => zero_width(state, state.is_end() || state.peek() == Some('\n')),
            Test::CaptureOpen(slot) => Some(state.opened(slot)),
            Test::CaptureClose(slot) => Some(state.closed(slot)),
            Test::LoopEnter(mark) => Some(state.marked(mark)),
            Test::Progressed(mark) => zero_width(state, state.progressed(mark)),
            Test::Stalled(mark) => zero_width(state, !state.progressed(mark)),
            Test::Join => Some(state.advanced(0)),
            Test::NoMatchAdvanced => None,
        }
    }
}

impl Display for Test {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Test::Literal(c) => write!(f, "LIT {c:?}"),
            Test::Range(start, end) => write!(f, "RANGE {start:?}-{end:?}"),
            Test::Dot => write!(f, "DOT"),
            Test::AnyChar => write!(f, "ANY"),
            Test::Metachar(m) => write!(f, "META \\{}", m.escape()),
            Test::StartOfLine => write!(f, "SOL"),
            Test::EndOfLine => write!(f, "EOL"),
            Test::CaptureOpen(slot) => write!(f, "OPEN {}", slot + 1),
            Test::CaptureClose(slot) => write!(f, "CLOSE {}", slot + 1),
            Test::LoopEnter(mark) => write!(f, "LOOP_ENTER {mark}"),
            Test::Progressed(mark) => write!(f, "PROGRESSED {mark}"),
            Test::Stalled(mark) => write!(f, "STALLED {mark}"),
            Test::Join => write!(f, "JOIN"),
            Test::NoMatchAdvanced => write!(f, "NO_MATCH_ADVANCED"),
        }
    }
}

/// One compiled test-and-advance unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Automaton {
    pub test: Test,
    /// A negated automaton passes, without consuming input, exactly when
    /// its test fails.
    pub negated: bool,
}

impl Automaton {
    pub fn call<'s>(&self, state: &MatchState<'s>) -> Option<MatchState<'s>> {
        let result = self.test.call(state);
        if !self.negated {
            return result;
        }
        match result {
            Some(_) => None,
            None => Some(state.advanced(0)),
        }
    }
}

impl Display for Automaton {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "NOT ")?;
        }
        self.test.fmt(f)
    }
}

/// A compiled pattern. Immutable once built, so it can be shared freely
/// between threads running matches concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    nodes: Vec<Automaton>,
    successors: Vec<Vec<NodeId>>,
    start: NodeId,
    terminal: NodeId,
    no_match_advanced: NodeId,
    captures: usize,
    loops: usize,
}

impl Program {
    #[inline]
    pub fn node(&self, id: NodeId) -> &Automaton {
        &self.nodes[id]
    }

    /// Nodes to try after `id` succeeds, in priority order.
    #[inline]
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.successors[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The zero-width node every attempt starts from.
    #[inline]
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The zero-width node that ends a successful walk.
    #[inline]
    pub fn terminal(&self) -> NodeId {
        self.terminal
    }

    #[inline]
    pub fn no_match_advanced(&self) -> NodeId {
        self.no_match_advanced
    }

    /// Number of capture slots.
    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Number of unbounded loops, each of which keeps a progress mark.
    pub fn loops(&self) -> usize {
        self.loops
    }
}

/// Dumps the program one node per line, followed by its successors.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for (id, node) in self.nodes.iter().enumerate() {
            write!(f, "{:05}: {}", id, node)?;
            let successors = &self.successors[id];
            if !successors.is_empty() {
                let list: Vec<String> = successors.iter().map(|s| s.to_string()).collect();
                write!(f, " -> {}", list.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Upper bound of the number of nodes `node` lowers into, in either mode.
/// Saturates instead of overflowing.
fn max_len(node: &RegexNode) -> usize {
    match node {
        RegexNode::Seq(nodes) | RegexNode::Alt(nodes) | RegexNode::CharClass(nodes) => nodes
            .iter()
            .fold(2, |len, node| len.saturating_add(max_len(node))),
        RegexNode::Group { node, .. } => max_len(node).saturating_add(2),
        RegexNode::Negation(node) => max_len(node).saturating_add(1),
        RegexNode::Repeat { node, min, max, .. } => {
            // Unbounded loops keep one copy past the mandatory ones.
            let copies = match max {
                Some(max) => (*max).max(*min),
                None => min.saturating_add(1),
            };
            usize::try_from(copies)
                .unwrap_or(usize::MAX)
                .saturating_mul(max_len(node))
                .saturating_add(6)
        }
        _ => 1,
    }
}

/// Entry and exit node of a lowered piece of the tree.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    entry: NodeId,
    exit: NodeId,
}

/// Builds a [`Program`] out of a [`RegexNode`] tree.
#[derive(Default)]
pub struct Compiler {
    nodes: Vec<Automaton>,
    successors: Vec<Vec<NodeId>>,
    loops: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `root`, which declares `captures` capturing groups.
    ///
    /// Fails with [`ParseError::TooLarge`] if the program could exceed
    /// [`MAX_NODES`], which is checked before anything is lowered.
    pub fn compile(mut self, root: &RegexNode, captures: usize) -> Result<Program, ParseError> {
        // start, terminal and NO_MATCH_ADVANCED
        if max_len(root).saturating_add(3) > MAX_NODES {
            return Err(ParseError::TooLarge { limit: MAX_NODES });
        }

        let start = self.push(Test::Join);
        let body = self.lower(root, false);
        let terminal = self.push(Test::Join);
        self.add_successor(start, body.entry);
        self.add_successor(body.exit, terminal);
        let no_match_advanced = self.push(Test::NoMatchAdvanced);

        debug!(
            "compiled `{}` into {} nodes ({} captures, {} loops)",
            root,
            self.nodes.len(),
            captures,
            self.loops
        );

        Ok(Program {
            nodes: self.nodes,
            successors: self.successors,
            start,
            terminal,
            no_match_advanced,
            captures,
            loops: self.loops,
        })
    }

    fn push(&mut self, test: Test) -> NodeId {
        self.push_automaton(Automaton {
            test,
            negated: false,
        })
    }

    fn push_automaton(&mut self, automaton: Automaton) -> NodeId {
        self.nodes.push(automaton);
        self.successors.push(Vec::new());
        self.nodes.len() - 1
    }

    /// Adds `to` after the existing successors of `from`, unless it is
    /// already there.
    fn add_successor(&mut self, from: NodeId, to: NodeId) {
        let successors = &mut self.successors[from];
        if !successors.contains(&to) {
            successors.push(to);
        }
    }

    /// Makes `from` continue either with another repetition at `more` or
    /// with whatever follows at `done`, in the order given by `lazy`.
    fn add_choice(&mut self, from: NodeId, more: NodeId, done: NodeId, lazy: bool) {
        if lazy {
            self.add_successor(from, done);
            self.add_successor(from, more);
        } else {
            self.add_successor(from, more);
            self.add_successor(from, done);
        }
    }

    fn leaf(&mut self, test: Test, negated: bool) -> Fragment {
        let id = self.push_automaton(Automaton { test, negated });
        Fragment { entry: id, exit: id }
    }

    fn lower(&mut self, node: &RegexNode, negated: bool) -> Fragment {
        match node {
            RegexNode::Literal(c) => self.leaf(Test::Literal(*c), negated),
            RegexNode::Range(start, end) => self.leaf(Test::Range(*start, *end), negated),
            RegexNode::Dot => self.leaf(Test::Dot, negated),
            RegexNode::StartAnchor => self.leaf(Test::StartOfLine, negated),
            RegexNode::EndAnchor => self.leaf(Test::EndOfLine, negated),
            RegexNode::Metachar(m) => self.leaf(Test::Metachar(*m), negated),
            RegexNode::Seq(nodes) => self.conjunction(nodes, negated),
            RegexNode::Alt(nodes) | RegexNode::CharClass(nodes) => {
                self.disjunction(nodes, negated)
            }
            RegexNode::Group { id, node } => self.capture(id - 1, node, negated),
            RegexNode::Negation(node) => self.with_negation(node, negated),
            RegexNode::Repeat {
                node,
                min,
                max,
                lazy,
            } => self.repeated_range(node, *min, *max, *lazy, negated),
        }
    }

    /// All of `nodes`, one after another. In negated mode, any of them.
    fn conjunction(&mut self, nodes: &[RegexNode], negated: bool) -> Fragment {
        if negated {
            self.any_of(nodes, negated)
        } else {
            self.all_of(nodes, negated)
        }
    }

    /// Any of `nodes`, tried in order. In negated mode, all of them.
    fn disjunction(&mut self, nodes: &[RegexNode], negated: bool) -> Fragment {
        if negated {
            self.all_of(nodes, negated)
        } else {
            self.any_of(nodes, negated)
        }
    }

    fn all_of(&mut self, nodes: &[RegexNode], negated: bool) -> Fragment {
        let Some((first, rest)) = nodes.split_first() else {
            return self.leaf(Test::Join, false);
        };
        let head = self.lower(first, negated);
        let mut exit = head.exit;
        for node in rest {
            let next = self.lower(node, negated);
            self.add_successor(exit, next.entry);
            exit = next.exit;
        }
        Fragment {
            entry: head.entry,
            exit,
        }
    }

    fn any_of(&mut self, nodes: &[RegexNode], negated: bool) -> Fragment {
        let split = self.push(Test::Join);
        let exits: Vec<NodeId> = nodes
            .iter()
            .map(|node| {
                let branch = self.lower(node, negated);
                self.add_successor(split, branch.entry);
                branch.exit
            })
            .collect();
        let join = self.push(Test::Join);
        for exit in exits {
            self.add_successor(exit, join);
        }
        Fragment {
            entry: split,
            exit: join,
        }
    }

    /// Brackets `node` between the nodes that open and close capture `slot`.
    fn capture(&mut self, slot: usize, node: &RegexNode, negated: bool) -> Fragment {
        let open = self.push(Test::CaptureOpen(slot));
        let body = self.lower(node, negated);
        let close = self.push(Test::CaptureClose(slot));
        self.add_successor(open, body.entry);
        self.add_successor(body.exit, close);
        Fragment {
            entry: open,
            exit: close,
        }
    }

    /// Lowers `node` with negated mode toggled. When entering negated
    /// mode, the chain of negated assertions is followed by a node that
    /// consumes the character they were checked against.
    fn with_negation(&mut self, node: &RegexNode, negated: bool) -> Fragment {
        let inner = self.lower(node, !negated);
        if negated {
            return inner;
        }
        let step = self.push(Test::AnyChar);
        self.add_successor(inner.exit, step);
        Fragment {
            entry: inner.entry,
            exit: step,
        }
    }

    /// Lowers `node` repeated between `min` and `max` times.
    ///
    /// The mandatory copies are chained one after another. With a finite
    /// `max`, each optional copy can be skipped by jumping straight to the
    /// join node. Without it, a single extra copy loops back on itself, and
    /// the loop is only taken again if the iteration consumed input.
    fn repeated_range(
        &mut self,
        node: &RegexNode,
        min: u32,
        max: Option<u32>,
        lazy: bool,
        negated: bool,
    ) -> Fragment {
        let entry = self.push(Test::Join);
        let join = self.push(Test::Join);

        let mut exit = entry;
        for _ in 0..min {
            let copy = self.lower(node, negated);
            self.add_successor(exit, copy.entry);
            exit = copy.exit;
        }

        match max {
            Some(max) => {
                for _ in min..max {
                    let copy = self.lower(node, negated);
                    self.add_choice(exit, copy.entry, join, lazy);
                    exit = copy.exit;
                }
                self.add_successor(exit, join);
            }
            None => {
                let mark = self.loops;
                self.loops += 1;

                let split = self.push(Test::Join);
                self.add_successor(exit, split);

                let enter = self.push(Test::LoopEnter(mark));
                let copy = self.lower(node, negated);
                let progressed = self.push(Test::Progressed(mark));
                let stalled = self.push(Test::Stalled(mark));

                self.add_successor(enter, copy.entry);
                self.add_successor(copy.exit, progressed);
                self.add_successor(copy.exit, stalled);
                self.add_successor(progressed, split);
                self.add_successor(stalled, join);
                self.add_choice(split, enter, join, lazy);
            }
        }

        Fragment { entry, exit: join }
    }
}
