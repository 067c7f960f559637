use thiserror::Error;

/// Errors returned while parsing or compiling a pattern.
///
/// Offsets are byte offsets into the pattern string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated escape sequence at offset {offset}")]
    UnterminatedEscape { offset: usize },

    #[error("unclosed group opened at offset {offset}")]
    UnclosedGroup { offset: usize },

    #[error("unmatched close parenthesis at offset {offset}")]
    UnmatchedParen { offset: usize },

    #[error("unclosed character class opened at offset {offset}")]
    UnclosedClass { offset: usize },

    #[error("invalid range `{start}-{end}` at offset {offset}")]
    InvalidRange {
        start: char,
        end: char,
        offset: usize,
    },

    #[error("invalid quantifier bounds {{{min},{max}}} at offset {offset}")]
    InvalidQuantifierBounds { min: u32, max: u32, offset: usize },

    #[error("target of repeat operator is not specified at offset {offset}")]
    NothingToRepeat { offset: usize },

    /// The pattern is well-formed, but unrolling its repetitions would
    /// take more than `limit` automata nodes.
    #[error("pattern too large: more than {limit} nodes")]
    TooLarge { limit: usize },
}
