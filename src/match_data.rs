use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;

use crate::ast::Capture;
use crate::state::MatchState;

/// A successful match.
///
/// Holds its own copy of the subject, so it outlives both the subject it
/// was produced from and the [`crate::Pattern`] that produced it.
#[derive(Clone)]
pub struct Match {
    subject: Bytes,
    pattern: Arc<str>,
    names: Arc<[Capture]>,
    start: usize,
    end: usize,
    captures: Vec<Option<Range<usize>>>,
}

impl Match {
    pub(crate) fn new(pattern: Arc<str>, names: Arc<[Capture]>, state: &MatchState<'_>) -> Self {
        Self {
            subject: Bytes::copy_from_slice(state.subject().as_bytes()),
            pattern,
            names,
            start: state.start(),
            end: state.offset(),
            captures: state.captures().collect(),
        }
    }

    /// Text within `range`. Ranges always fall on char boundaries of the
    /// original UTF-8 subject.
    fn text(&self, range: Range<usize>) -> &str {
        std::str::from_utf8(&self.subject[range]).unwrap_or_default()
    }

    /// The whole subject the match was found in.
    pub fn subject(&self) -> &str {
        self.text(0..self.subject.len())
    }

    /// The pattern that produced the match.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The matched text.
    pub fn as_str(&self) -> &str {
        self.text(self.range())
    }

    /// The matched text, sharing the buffer of this match.
    pub fn as_bytes(&self) -> Bytes {
        self.subject.slice(self.range())
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of groups: the whole match plus one per capture.
    pub fn group_count(&self) -> usize {
        self.captures.len() + 1
    }

    /// Range of group `index`, where 0 is the whole match and `n` the
    /// `n`-th capture. `None` if the capture did not participate.
    pub fn capture_range(&self, index: usize) -> Option<Range<usize>> {
        match index {
            0 => Some(self.range()),
            n => self.captures.get(n - 1).cloned().flatten(),
        }
    }

    /// Text of group `index`. See [`Match::capture_range`].
    pub fn get(&self, index: usize) -> Option<&str> {
        self.capture_range(index).map(|range| self.text(range))
    }

    /// Text of the capture with the given name.
    pub fn name(&self, name: &str) -> Option<&str> {
        let capture = self.names.iter().find(|c| c.name == name)?;
        self.get(capture.index)
    }

    /// Text of every capture, in declaration order.
    pub fn captures(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.captures
            .iter()
            .map(|range| range.clone().map(|range| self.text(range)))
    }

    /// The whole match followed by every capture.
    pub fn to_vec(&self) -> Vec<Option<&str>> {
        std::iter::once(Some(self.as_str()))
            .chain(self.captures())
            .collect()
    }

    /// Text before the match.
    pub fn pre_match(&self) -> &str {
        self.text(0..self.start)
    }

    /// Text after the match.
    pub fn post_match(&self) -> &str {
        self.text(self.end..self.subject.len())
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.pattern == other.pattern
            && self.to_vec() == other.to_vec()
    }
}

impl Eq for Match {}

impl Hash for Match {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.hash(state);
        self.pattern.hash(state);
        self.to_vec().hash(state);
    }
}

impl Display for Match {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders as `#<Match "whole" 1:"first" 2:nil>`.
impl Debug for Match {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#<Match {:?}", self.as_str())?;
        for (capture, text) in self.names.iter().zip(self.captures()) {
            match text {
                Some(text) => write!(f, " {}:{:?}", capture.name, text)?,
                None => write!(f, " {}:nil", capture.name)?,
            }
        }
        write!(f, ">")
    }
}
