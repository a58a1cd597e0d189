//! Filtered tokens: the indentation filter's output and the block grouper's
//! input.
//!
//! The raw scanner layer is an implementation detail of `rebuild-lexer`;
//! everything after it speaks this vocabulary. Indentation markers
//! (`NewLineIndentation`, `BlockStartIndentation`, `BlockEndIndentation`)
//! carry the indent column of the line they open in `range.end.column`.

use crate::foundation::SourceRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One filtered token with its source range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub range: SourceRange,
    pub data: TokenData,
}

impl Token {
    /// Create a token.
    pub fn new(range: SourceRange, data: TokenData) -> Self {
        Self { range, data }
    }

    /// Indent column for indentation markers; begin column otherwise.
    pub fn indent_column(&self) -> u32 {
        match self.data {
            TokenData::NewLineIndentation
            | TokenData::BlockStartIndentation
            | TokenData::BlockEndIndentation => self.range.end.column,
            _ => self.range.begin.column,
        }
    }
}

/// The closed sum of filtered token kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenData {
    /// Start of a new line at some indent column
    NewLineIndentation,
    /// Start of a nested block (a line ended in a colon)
    BlockStartIndentation,
    /// End of a nested block (an `end` line)
    BlockEndIndentation,
    /// `;` - splits a line without leaving the block
    SemicolonSeparator,
    /// `,`
    CommaSeparator,
    /// `:`
    ColonSeparator,
    /// `(`
    BracketOpen,
    /// `)`
    BracketClose,
    /// Identifier, possibly dotted; text in `range.text`
    IdentifierLiteral {
        left_separated: bool,
        right_separated: bool,
    },
    /// Operator run; text in `range.text`
    OperatorLiteral {
        left_separated: bool,
        right_separated: bool,
    },
    /// String literal with escapes resolved
    StringLiteral { text: String },
    /// Number literal split into parts
    NumberLiteral(NumberLiteral),
    /// `#` comment; transparent to the parser
    CommentLiteral,
    /// Run of spaces/tabs inside a line; dropped by the filter
    #[default]
    WhiteSpaceSeparator,
}

impl TokenData {
    /// True for the marker kinds the block grouper consumes structurally.
    pub fn is_separator(&self) -> bool {
        matches!(
            self,
            TokenData::NewLineIndentation
                | TokenData::BlockStartIndentation
                | TokenData::BlockEndIndentation
                | TokenData::SemicolonSeparator
        )
    }
}

/// Number base of a [`NumberLiteral`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Radix {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hex,
}

impl Radix {
    /// Numeric base.
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }
}

/// A number literal split into digit groups.
///
/// The front-end never computes with numbers, so parts stay textual;
/// evaluation concerns (overflow, precision) belong to later stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub radix: Radix,
    pub integer_part: String,
    pub fractional_part: String,
    pub exponent_part: String,
}

impl NumberLiteral {
    /// Decimal literal from its integer digits.
    pub fn decimal(integer_part: impl Into<String>) -> Self {
        Self {
            radix: Radix::Decimal,
            integer_part: integer_part.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.radix {
            Radix::Binary => "0b",
            Radix::Octal => "0o",
            Radix::Decimal => "",
            Radix::Hex => "0x",
        };
        write!(f, "{}{}", prefix, self.integer_part)?;
        if !self.fractional_part.is_empty() {
            write!(f, ".{}", self.fractional_part)?;
        }
        if !self.exponent_part.is_empty() {
            write!(f, "e{}", self.exponent_part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Position, SourceRange};

    #[test]
    fn indent_column_uses_marker_end() {
        let marker = Token::new(
            SourceRange::new(Position::new(1, 1), Position::new(2, 5), "\n    "),
            TokenData::NewLineIndentation,
        );
        assert_eq!(marker.indent_column(), 5);

        let word = Token::new(
            SourceRange::new(Position::new(2, 5), Position::new(2, 8), "foo"),
            TokenData::IdentifierLiteral {
                left_separated: true,
                right_separated: true,
            },
        );
        assert_eq!(word.indent_column(), 5);
    }

    #[test]
    fn separator_classification() {
        assert!(TokenData::SemicolonSeparator.is_separator());
        assert!(TokenData::BlockStartIndentation.is_separator());
        assert!(!TokenData::CommaSeparator.is_separator());
        assert!(!TokenData::ColonSeparator.is_separator());
    }

    #[test]
    fn number_display_round_trips_parts() {
        let n = NumberLiteral {
            radix: Radix::Hex,
            integer_part: "2a".into(),
            fractional_part: String::new(),
            exponent_part: String::new(),
        };
        assert_eq!(n.to_string(), "0x2a");

        let d = NumberLiteral {
            radix: Radix::Decimal,
            integer_part: "3".into(),
            fractional_part: "14".into(),
            exponent_part: "2".into(),
        };
        assert_eq!(d.to_string(), "3.14e2");
    }
}
