//! The nested block/line tree produced by the block grouper.
//!
//! Lines hold only leaf tokens and nested [`BlockLiteral`]s; the
//! indentation and semicolon markers that shaped the tree are consumed by
//! the grouper and never stored. A block or line that needed error
//! recovery is flagged `tainted` so the semantic parser can skip it
//! without re-reporting.

use crate::foundation::SourceRange;
use crate::token::{NumberLiteral, Token, TokenData};
use serde::{Deserialize, Serialize};

/// One token inside a grouped line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockToken {
    pub range: SourceRange,
    pub data: BlockTokenData,
}

impl BlockToken {
    /// Create a block token.
    pub fn new(range: SourceRange, data: BlockTokenData) -> Self {
        Self { range, data }
    }

    /// Translate a filtered token into a line token.
    ///
    /// Returns `None` for the marker kinds that never appear inside lines.
    pub fn from_filtered(token: Token) -> Option<Self> {
        let data = match token.data {
            TokenData::NewLineIndentation
            | TokenData::BlockStartIndentation
            | TokenData::BlockEndIndentation
            | TokenData::SemicolonSeparator => return None,
            TokenData::CommaSeparator => BlockTokenData::CommaSeparator,
            TokenData::ColonSeparator => BlockTokenData::ColonSeparator,
            TokenData::BracketOpen => BlockTokenData::BracketOpen,
            TokenData::BracketClose => BlockTokenData::BracketClose,
            TokenData::IdentifierLiteral {
                left_separated,
                right_separated,
            } => BlockTokenData::IdentifierLiteral {
                left_separated,
                right_separated,
            },
            TokenData::OperatorLiteral {
                left_separated,
                right_separated,
            } => BlockTokenData::OperatorLiteral {
                left_separated,
                right_separated,
            },
            TokenData::StringLiteral { text } => BlockTokenData::StringLiteral { text },
            TokenData::NumberLiteral(literal) => BlockTokenData::NumberLiteral(literal),
            TokenData::CommentLiteral => BlockTokenData::CommentLiteral,
            TokenData::WhiteSpaceSeparator => BlockTokenData::WhiteSpaceSeparator,
        };
        Some(Self {
            range: token.range,
            data,
        })
    }

    /// Identifier or operator text, if this token has one.
    pub fn name(&self) -> Option<&str> {
        match self.data {
            BlockTokenData::IdentifierLiteral { .. } | BlockTokenData::OperatorLiteral { .. } => {
                Some(self.range.text.as_str())
            }
            _ => None,
        }
    }
}

/// Leaf filtered-token kinds plus nested blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockTokenData {
    CommaSeparator,
    ColonSeparator,
    BracketOpen,
    BracketClose,
    IdentifierLiteral {
        left_separated: bool,
        right_separated: bool,
    },
    OperatorLiteral {
        left_separated: bool,
        right_separated: bool,
    },
    StringLiteral {
        text: String,
    },
    NumberLiteral(NumberLiteral),
    CommentLiteral,
    WhiteSpaceSeparator,
    /// A nested block opened where a block start marker was seen
    BlockLiteral(BlockLiteral),
}

/// One logical line: an ordered sequence of block tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub tokens: Vec<BlockToken>,
    /// Grouping reported at least one diagnostic while building this line
    pub tainted: bool,
}

impl Line {
    /// True if the line holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// An ordered sequence of lines sharing an indentation column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLiteral {
    pub lines: Vec<Line>,
    /// Grouping reported at least one diagnostic inside this block
    pub tainted: bool,
}

impl BlockLiteral {
    /// Count nested block literals, recursively.
    pub fn nested_block_count(&self) -> usize {
        self.lines
            .iter()
            .flat_map(|line| line.tokens.iter())
            .map(|token| match &token.data {
                BlockTokenData::BlockLiteral(block) => 1 + block.nested_block_count(),
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Position, SourceRange};

    #[test]
    fn markers_do_not_translate() {
        let marker = Token::new(
            SourceRange::at(Position::new(1, 1)),
            TokenData::NewLineIndentation,
        );
        assert!(BlockToken::from_filtered(marker).is_none());

        let semicolon = Token::new(
            SourceRange::at(Position::new(1, 3)),
            TokenData::SemicolonSeparator,
        );
        assert!(BlockToken::from_filtered(semicolon).is_none());
    }

    #[test]
    fn leaf_tokens_keep_their_range() {
        let range = SourceRange::new(Position::new(2, 1), Position::new(2, 4), "foo");
        let token = Token::new(
            range.clone(),
            TokenData::IdentifierLiteral {
                left_separated: true,
                right_separated: false,
            },
        );
        let translated = BlockToken::from_filtered(token).unwrap();
        assert_eq!(translated.range, range);
        assert_eq!(translated.name(), Some("foo"));
    }

    #[test]
    fn nested_block_count_recurses() {
        let inner = BlockLiteral::default();
        let mut middle = BlockLiteral::default();
        middle.lines.push(Line {
            tokens: vec![BlockToken::new(
                SourceRange::at(Position::new(2, 3)),
                BlockTokenData::BlockLiteral(inner),
            )],
            tainted: false,
        });
        let mut outer = BlockLiteral::default();
        outer.lines.push(Line {
            tokens: vec![BlockToken::new(
                SourceRange::at(Position::new(1, 1)),
                BlockTokenData::BlockLiteral(middle),
            )],
            tainted: false,
        });
        assert_eq!(outer.nested_block_count(), 2);
    }
}
