use std::ops::Range;
use std::rc::Rc;

/// Bookkeeping for one capturing group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    /// Offset where the innermost pending attempt at the group started.
    open: Option<usize>,
    /// The last range the group completed.
    range: Option<(usize, usize)>,
}

/// Snapshot of the matching progress at some point of the walk.
///
/// States are never mutated in place: every transition returns a new
/// state, so abandoning a branch while backtracking is just dropping it.
/// Slots and marks are shared between states and only copied by the
/// transitions that change them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState<'s> {
    subject: &'s str,
    /// Offset where the current attempt started.
    start: usize,
    offset: usize,
    slots: Rc<Vec<Slot>>,
    /// Entry offset of the current iteration of each unbounded loop.
    marks: Rc<Vec<usize>>,
}

impl<'s> MatchState<'s> {
    /// Creates the state for an attempt starting at `offset`, with every
    /// capture unset.
    pub fn new(subject: &'s str, offset: usize, captures: usize, loops: usize) -> Self {
        Self {
            subject,
            start: offset,
            offset,
            slots: Rc::new(vec![Slot::default(); captures]),
            marks: Rc::new(vec![offset; loops]),
        }
    }

    #[inline]
    pub fn subject(&self) -> &'s str {
        self.subject
    }

    /// Offset where this attempt started, which is also where the match
    /// starts if this state reaches the end of the program.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Character at the current offset.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character right before the current offset.
    pub fn prev(&self) -> Option<char> {
        self.subject
            .get(..self.offset)
            .and_then(|before| before.chars().next_back())
    }

    /// Text from the current offset to the end of the subject.
    pub fn rest(&self) -> &'s str {
        self.subject.get(self.offset..).unwrap_or_default()
    }

    pub fn is_start(&self) -> bool {
        self.offset == 0
    }

    pub fn is_end(&self) -> bool {
        self.offset >= self.subject.len()
    }

    /// Returns a state `len` bytes further into the subject.
    pub fn advanced(&self, len: usize) -> Self {
        Self {
            offset: self.offset + len,
            ..self.clone()
        }
    }

    /// Returns a state where capture `slot` starts at the current offset.
    pub fn opened(&self, slot: usize) -> Self {
        let mut new = self.clone();
        if let Some(s) = Rc::make_mut(&mut new.slots).get_mut(slot) {
            s.open = Some(self.offset);
        }
        new
    }

    /// Returns a state where capture `slot` ends at the current offset.
    pub fn closed(&self, slot: usize) -> Self {
        let mut new = self.clone();
        if let Some(s) = Rc::make_mut(&mut new.slots).get_mut(slot) {
            if let Some(open) = s.open {
                s.range = Some((open, self.offset));
            }
        }
        new
    }

    /// Returns a state that remembers the current offset as the entry
    /// point of an iteration of loop `mark`.
    pub fn marked(&self, mark: usize) -> Self {
        let mut new = self.clone();
        if let Some(m) = Rc::make_mut(&mut new.marks).get_mut(mark) {
            *m = self.offset;
        }
        new
    }

    /// True if the current iteration of loop `mark` consumed input.
    pub fn progressed(&self, mark: usize) -> bool {
        self.marks.get(mark).is_some_and(|&m| self.offset > m)
    }

    /// Range of capture `slot`, if the group has completed along the path
    /// that led to this state.
    pub fn capture(&self, slot: usize) -> Option<Range<usize>> {
        self.slots
            .get(slot)
            .and_then(|s| s.range)
            .map(|(start, end)| start..end)
    }

    pub fn captures(&self) -> impl Iterator<Item = Option<Range<usize>>> + '_ {
        self.slots
            .iter()
            .map(|s| s.range.map(|(start, end)| start..end))
    }

    /// True if this attempt started at the end of the subject, so there is
    /// no later offset left to try.
    pub fn is_last_attempt(&self) -> bool {
        self.start >= self.subject.len()
    }

    /// Returns a fresh state for an attempt starting one character after
    /// the start of this one, or `None` once the subject is exhausted.
    pub fn next_attempt(&self) -> Option<Self> {
        if self.is_last_attempt() {
            return None;
        }
        let step = self.subject[self.start..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        Some(Self::new(
            self.subject,
            self.start + step,
            self.slots.len(),
            self.marks.len(),
        ))
    }
}
