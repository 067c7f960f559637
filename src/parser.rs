use log::debug;

use crate::ast::{Capture, Metachar, RegexNode};
use crate::error::ParseError;

/// Parser for regular expressions.
///
/// The `Parser` struct holds the pattern and the current position.
/// It also manages group IDs for capturing groups and records a
/// [`Capture`] descriptor for each of them.
pub struct Parser<'a> {
    pub pattern: &'a str,
    pub pos: usize,
    next_group_id: usize,
    captures: Vec<Capture>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            pos: 0,
            next_group_id: 1,
            captures: Vec::new(),
        }
    }

    /// Allocate a new group ID for capturing groups.
    ///
    /// IDs follow the order in which `(` appears in the pattern, regardless
    /// of nesting.
    fn alloc_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id += 1;
        self.captures.push(Capture::new(id));
        id
    }

    /// Peek at the next character in the pattern without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    /// Advance the parser by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Expect a specific character and advance if it matches.
    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Entry point for parsing a regex pattern.
    ///
    /// Returns the root of the tree together with the capture descriptors,
    /// ordered by declaration.
    ///
    /// Example:
    /// - Pattern: `a|b` → Alt([Seq([Literal('a')]), Seq([Literal('b')])])
    pub fn parse(mut self) -> Result<(RegexNode, Vec<Capture>), ParseError> {
        let root = self.parse_alt()?;
        if self.peek().is_some() {
            // `parse_alt` only stops early at a `)` nobody opened.
            return Err(ParseError::UnmatchedParen { offset: self.pos });
        }
        debug!(
            "parsed pattern {:?} with {} capture(s)",
            self.pattern,
            self.captures.len()
        );
        Ok((root, self.captures))
    }

    /// Parse alternation (`|`) in the pattern.
    ///
    /// Alternation binds looser than anything else and is scoped to the
    /// enclosing group, or to the whole pattern.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alt([Seq([Literal('a')]), Seq([Literal('b')]), Seq([Literal('c')])])
    /// - Pattern: `abc`   → Seq([Literal('a'), Literal('b'), Literal('c')])
    fn parse_alt(&mut self) -> Result<RegexNode, ParseError> {
        let mut branches = vec![self.parse_seq()?];
        while self.expect('|') {
            branches.push(self.parse_seq()?);
        }
        if branches.len() == 1 {
            Ok(branches.swap_remove(0))
        } else {
            Ok(RegexNode::Alt(branches))
        }
    }

    /// Parse a sequence of regex atoms (concatenation).
    ///
    /// Example:
    /// - Pattern: `abc` → Seq([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `a(b|c)d` → Seq([Literal('a'), Group, Literal('d')])
    fn parse_seq(&mut self) -> Result<RegexNode, ParseError> {
        let mut nodes = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            nodes.push(self.parse_repeat()?);
        }
        Ok(RegexNode::Seq(nodes))
    }

    /// Parse repetition operators after an atom.
    ///
    /// A `?` right after a quantifier makes it lazy. Quantifiers may be
    /// stacked, each one wrapping the previous repetition.
    ///
    /// Example:
    /// - Pattern: `a?`     → Repeat { node: Literal('a'), min: 0, max: Some(1), lazy: false }
    /// - Pattern: `b+?`    → Repeat { node: Literal('b'), min: 1, max: None, lazy: true }
    /// - Pattern: `c{2,}`  → Repeat { node: Literal('c'), min: 2, max: None, lazy: false }
    /// - Pattern: `d`      → Literal('d')
    fn parse_repeat(&mut self) -> Result<RegexNode, ParseError> {
        let mut atom = self.parse_atom()?;
        loop {
            let (min, max) = match self.peek() {
                Some('*') => {
                    self.advance();
                    (0, None)
                }
                Some('+') => {
                    self.advance();
                    (1, None)
                }
                Some('?') => {
                    self.advance();
                    (0, Some(1))
                }
                Some('{') => match self.parse_bounds()? {
                    Some(bounds) => bounds,
                    None => break,
                },
                _ => break,
            };
            let lazy = self.expect('?');
            atom = RegexNode::Repeat {
                node: Box::new(atom),
                min,
                max,
                lazy,
            };
        }
        Ok(atom)
    }

    /// Parse `{m}`, `{m,}`, `{,n}` or `{m,n}`.
    ///
    /// Returns `None`, leaving the position untouched, when the brace does
    /// not open a well-formed quantifier. In that case the brace is read as
    /// a literal.
    fn parse_bounds(&mut self) -> Result<Option<(u32, Option<u32>)>, ParseError> {
        let start = self.pos;
        self.advance(); // consume '{'

        let min = self.parse_number();
        let comma = self.expect(',');
        let max = if comma { self.parse_number() } else { min };

        let well_formed = self.expect('}')
            && !matches!(min, Some(None))
            && !matches!(max, Some(None))
            && (min.is_some() || (comma && max.is_some()));

        if !well_formed {
            self.pos = start;
            return Ok(None);
        }

        let min = min.flatten().unwrap_or(0);
        let max = max.flatten();

        if let Some(max) = max {
            if min > max {
                return Err(ParseError::InvalidQuantifierBounds {
                    min,
                    max,
                    offset: start,
                });
            }
        }

        Ok(Some((min, max)))
    }

    /// Parse a run of ASCII digits. Returns `None` if there are no digits
    /// and `Some(None)` if the number does not fit in a `u32`.
    fn parse_number(&mut self) -> Option<Option<u32>> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if start == self.pos {
            None
        } else {
            Some(self.pattern[start..self.pos].parse().ok())
        }
    }

    /// Parse a single regex atom: group, char class, escape, literal, or anchor.
    ///
    /// Examples:
    /// - Pattern: `(abc)` → Group { id, node: Seq([Literal('a'), Literal('b'), Literal('c')]) }
    /// - Pattern: `[abc]` → CharClass([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `\d`   → Metachar(Digit)
    /// - Pattern: `\.`   → Literal('.')
    /// - Pattern: `.`    → Dot
    /// - Pattern: `^`    → StartAnchor
    /// - Pattern: `$`    → EndAnchor
    /// - Pattern: `a`    → Literal('a')
    fn parse_atom(&mut self) -> Result<RegexNode, ParseError> {
        let offset = self.pos;
        match self.peek() {
            Some('(') => {
                self.advance();
                let id = self.alloc_group_id();
                let node = self.parse_alt()?;
                if !self.expect(')') {
                    return Err(ParseError::UnclosedGroup { offset });
                }
                Ok(RegexNode::Group {
                    id,
                    node: Box::new(node),
                })
            }
            Some('[') => self.parse_char_class(),
            Some('\\') => self.parse_escape(),
            Some('*' | '+' | '?') => Err(ParseError::NothingToRepeat { offset }),
            Some('.') => {
                self.advance();
                Ok(RegexNode::Dot) // . matches anything but a newline
            }
            Some('^') => {
                self.advance();
                Ok(RegexNode::StartAnchor) // ^ matches at the start of a line
            }
            Some('$') => {
                self.advance();
                Ok(RegexNode::EndAnchor) // $ matches at the end of a line
            }
            Some(c) => {
                self.advance();
                Ok(RegexNode::Literal(c)) // Any other character is a literal
            }
            None => Ok(RegexNode::Seq(vec![])), // End of pattern
        }
    }

    /// Parse an escape sequence: `\d`, `\A`, ... or an escaped literal.
    fn parse_escape(&mut self) -> Result<RegexNode, ParseError> {
        let offset = self.pos;
        self.advance(); // consume '\'
        match self.advance() {
            Some(c) => Ok(Metachar::from_escape(c)
                .map(RegexNode::Metachar)
                .unwrap_or(RegexNode::Literal(c))),
            None => Err(ParseError::UnterminatedEscape { offset }),
        }
    }

    /// Parse a character class, e.g. `[abc]`, `[a-z0-9]` or `[^abc]`.
    ///
    /// Examples:
    /// - Pattern: `[abc]`   → CharClass([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `[a-z]`   → CharClass([Range('a', 'z')])
    /// - Pattern: `[^xy]`   → Negation(CharClass([Literal('x'), Literal('y')]))
    fn parse_char_class(&mut self) -> Result<RegexNode, ParseError> {
        let open = self.pos;
        self.advance(); // consume '['
        let negated = self.expect('^');

        let mut items: Vec<RegexNode> = Vec::new();
        loop {
            let ch = self
                .peek()
                .ok_or(ParseError::UnclosedClass { offset: open })?;
            match ch {
                // A `]` right after the opening bracket is a literal.
                ']' if !items.is_empty() => {
                    self.advance();
                    break;
                }
                '-' => {
                    let dash = self.pos;
                    self.advance();
                    let start = match items.last() {
                        Some(RegexNode::Literal(c)) => Some(*c),
                        _ => None,
                    };
                    match (start, self.peek()) {
                        // Only `x-y` forms a range; a leading or trailing
                        // dash is a literal.
                        (Some(start), Some(next)) if next != ']' => {
                            match self.parse_class_atom()? {
                                RegexNode::Literal(end) if start > end => {
                                    return Err(ParseError::InvalidRange {
                                        start,
                                        end,
                                        offset: dash,
                                    });
                                }
                                RegexNode::Literal(end) => {
                                    items.pop();
                                    items.push(RegexNode::Range(start, end));
                                }
                                other => {
                                    items.push(RegexNode::Literal('-'));
                                    items.push(other);
                                }
                            }
                        }
                        _ => items.push(RegexNode::Literal('-')),
                    }
                }
                _ => {
                    let item = self.parse_class_atom()?;
                    items.push(item);
                }
            }
        }

        let class = RegexNode::CharClass(items);
        if negated {
            Ok(RegexNode::Negation(Box::new(class)))
        } else {
            Ok(class)
        }
    }

    /// Parse one member of a character class that is not a range.
    fn parse_class_atom(&mut self) -> Result<RegexNode, ParseError> {
        match self.peek() {
            Some('\\') => self.parse_escape(),
            Some(c) => {
                self.advance();
                Ok(RegexNode::Literal(c))
            }
            None => Err(ParseError::UnclosedClass { offset: self.pos }),
        }
    }
}
