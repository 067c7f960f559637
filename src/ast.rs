use std::fmt::{self, Display, Formatter, Write};

/// A node in the abstract syntax tree produced by [`crate::parser::Parser`].
///
/// The tree is immutable once parsed and is only ever walked top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    Seq(Vec<RegexNode>),
    Alt(Vec<RegexNode>),
    Repeat {
        node: Box<RegexNode>,
        min: u32,
        /// `None` means unbounded.
        max: Option<u32>,
        lazy: bool,
    },
    Group {
        id: usize,
        node: Box<RegexNode>,
    },
    /// Inverts the set described by `node`, which is always a `CharClass`
    /// when produced by the parser.
    Negation(Box<RegexNode>),
    StartAnchor,
    EndAnchor,
    Dot,
    Metachar(Metachar),
    CharClass(Vec<RegexNode>),
    Range(char, char),
    Literal(char),
}

/// Escape sequences with a meaning other than the escaped character itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metachar {
    /// `\A`: start of the subject.
    SubjectStart,
    /// `\d`: an ASCII digit.
    Digit,
    /// `\s`: an ASCII whitespace character.
    Space,
    /// `\S`: any character but ASCII whitespace.
    NonSpace,
    /// `\z`: end of the subject.
    SubjectEnd,
    /// `\Z`: end of the subject, or right before a final newline.
    SubjectEndNewline,
}

impl Metachar {
    /// Returns the metacharacter denoted by `\c`, if any.
    pub fn from_escape(c: char) -> Option<Self> {
        match c {
            'A' => Some(Metachar::SubjectStart),
            'd' => Some(Metachar::Digit),
            's' => Some(Metachar::Space),
            'S' => Some(Metachar::NonSpace),
            'z' => Some(Metachar::SubjectEnd),
            'Z' => Some(Metachar::SubjectEndNewline),
            _ => None,
        }
    }

    pub fn escape(self) -> char {
        match self {
            Metachar::SubjectStart => 'A',
            Metachar::Digit => 'd',
            Metachar::Space => 's',
            Metachar::NonSpace => 'S',
            Metachar::SubjectEnd => 'z',
            Metachar::SubjectEndNewline => 'Z',
        }
    }
}

/// Describes one capturing group, in the order its `(` appears in the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capture {
    pub name: String,
    /// 1-based declaration order.
    pub index: usize,
}

impl Capture {
    pub fn new(index: usize) -> Self {
        Self {
            name: index.to_string(),
            index,
        }
    }
}

/// Characters that must be escaped to be read back as literals outside a
/// character class.
const SPECIAL: &[char] = &[
    '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}',
];

/// Same, inside a character class.
const CLASS_SPECIAL: &[char] = &['\\', '^', '-', '[', ']'];

fn write_escaped(f: &mut Formatter<'_>, c: char, special: &[char]) -> fmt::Result {
    if special.contains(&c) {
        f.write_char('\\')?;
    }
    f.write_char(c)
}

impl RegexNode {
    fn fmt_class_item(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegexNode::Literal(c) => write_escaped(f, *c, CLASS_SPECIAL),
            RegexNode::Range(start, end) => {
                write_escaped(f, *start, CLASS_SPECIAL)?;
                f.write_char('-')?;
                write_escaped(f, *end, CLASS_SPECIAL)
            }
            other => other.fmt(f),
        }
    }

    fn fmt_class(&self, f: &mut Formatter<'_>, negated: bool) -> fmt::Result {
        let RegexNode::CharClass(items) = self else {
            return self.fmt(f);
        };
        f.write_char('[')?;
        if negated {
            f.write_char('^')?;
        }
        for item in items {
            item.fmt_class_item(f)?;
        }
        f.write_char(']')
    }
}

/// Renders the node back into pattern syntax. The output is not always
/// byte-identical to the parsed input, but it parses into a tree that
/// accepts the same subjects.
impl Display for RegexNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegexNode::Seq(nodes) => nodes.iter().try_for_each(|n| n.fmt(f)),
            RegexNode::Alt(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_char('|')?;
                    }
                    branch.fmt(f)?;
                }
                Ok(())
            }
            RegexNode::Repeat {
                node,
                min,
                max,
                lazy,
            } => {
                node.fmt(f)?;
                // After another quantifier a bare `?` reads as its lazy marker.
                let stacked = matches!(**node, RegexNode::Repeat { .. });
                match (*min, *max) {
                    (0, None) => f.write_char('*')?,
                    (1, None) => f.write_char('+')?,
                    (0, Some(1)) if !stacked => f.write_char('?')?,
                    (min, Some(max)) if min == max => write!(f, "{{{min}}}")?,
                    (0, Some(max)) => write!(f, "{{,{max}}}")?,
                    (min, Some(max)) => write!(f, "{{{min},{max}}}")?,
                    (min, None) => write!(f, "{{{min},}}")?,
                }
                if *lazy {
                    f.write_char('?')?;
                }
                Ok(())
            }
            RegexNode::Group { node, .. } => write!(f, "({node})"),
            RegexNode::Negation(node) => node.fmt_class(f, true),
            RegexNode::StartAnchor => f.write_char('^'),
            RegexNode::EndAnchor => f.write_char('$'),
            RegexNode::Dot => f.write_char('.'),
            RegexNode::Metachar(m) => write!(f, "\\{}", m.escape()),
            RegexNode::CharClass(_) => self.fmt_class(f, false),
            RegexNode::Range(start, end) => write!(f, "{start}-{end}"),
            RegexNode::Literal(c) => write_escaped(f, *c, SPECIAL),
        }
    }
}
