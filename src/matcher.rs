use log::trace;

use crate::compiler::{NodeId, Program};
use crate::state::MatchState;

/// Walks `program` against `subject`, trying start offsets from `start`
/// onward, and returns the state that reached the terminal node.
///
/// The walk is a depth-first search over the program's graph driven by an
/// explicit stack of `(node, state)` pairs, so deeply nested patterns can't
/// overflow the call stack. Successors are pushed in reverse, which makes
/// the first successor of a node the next one to run.
///
/// When every path from the current start offset fails, the
/// `NO_MATCH_ADVANCED` node restarts the walk one character further,
/// down to a last zero-length attempt at the very end of the subject.
///
/// A `start` inside a character is moved forward to the next one, and a
/// `start` past the end of `subject` never matches.
pub fn run<'s>(program: &Program, subject: &'s str, start: usize) -> Option<MatchState<'s>> {
    let start = char_boundary(subject, start)?;
    let initial = MatchState::new(subject, start, program.captures(), program.loops());
    let mut stack: Vec<(NodeId, MatchState<'s>)> = vec![(program.start(), initial)];

    while let Some((node, state)) = stack.pop() {
        match program.node(node).call(&state) {
            Some(next) if node == program.terminal() => {
                trace!("match at {}..{}", next.start(), next.offset());
                return Some(next);
            }
            Some(next) => {
                if let Some((first, rest)) = program.successors(node).split_first() {
                    for &successor in rest.iter().rev() {
                        stack.push((successor, next.clone()));
                    }
                    stack.push((*first, next));
                }
            }
            None if node == program.no_match_advanced() => {
                if let Some(retry) = state.next_attempt() {
                    trace!("no match at {}, retrying at {}", state.start(), retry.start());
                    stack.push((program.start(), retry));
                }
                continue;
            }
            None => {}
        }

        if stack.is_empty() && !state.is_last_attempt() {
            stack.push((program.no_match_advanced(), state));
        }
    }

    None
}

/// First char boundary at or after `offset`, or `None` past the end.
fn char_boundary(subject: &str, offset: usize) -> Option<usize> {
    (offset..=subject.len()).find(|&i| subject.is_char_boundary(i))
}
