//! Builders for filtered tokens, lines and blocks.
//!
//! Shared by the unit and integration test suites of the downstream
//! crates; building token streams by hand keeps grouping and parsing
//! tests independent of the scanner.

use crate::blocks::{BlockLiteral, BlockToken, BlockTokenData, Line};
use crate::foundation::{Position, SourceRange};
use crate::token::{NumberLiteral, Token, TokenData};

fn text_range(text: &str) -> SourceRange {
    SourceRange::new(
        Position::new(1, 1),
        Position::new(1, 1 + text.chars().count() as u32),
        text,
    )
}

fn marker_range(column: u32) -> SourceRange {
    SourceRange::new(Position::new(1, 1), Position::new(1, column), "")
}

/// Identifier literal, separated on both sides.
pub fn id(text: &str) -> Token {
    Token::new(
        text_range(text),
        TokenData::IdentifierLiteral {
            left_separated: true,
            right_separated: true,
        },
    )
}

/// Operator literal, separated on both sides.
pub fn op(text: &str) -> Token {
    Token::new(
        text_range(text),
        TokenData::OperatorLiteral {
            left_separated: true,
            right_separated: true,
        },
    )
}

/// Decimal number literal.
pub fn num(integer_part: &str) -> Token {
    Token::new(
        text_range(integer_part),
        TokenData::NumberLiteral(NumberLiteral::decimal(integer_part)),
    )
}

/// String literal.
pub fn str_lit(text: &str) -> Token {
    Token::new(
        text_range(text),
        TokenData::StringLiteral { text: text.into() },
    )
}

/// `:` separator.
pub fn colon() -> Token {
    Token::new(text_range(":"), TokenData::ColonSeparator)
}

/// `,` separator.
pub fn comma() -> Token {
    Token::new(text_range(","), TokenData::CommaSeparator)
}

/// `;` separator.
pub fn semicolon() -> Token {
    Token::new(text_range(";"), TokenData::SemicolonSeparator)
}

/// `(`.
pub fn bracket_open() -> Token {
    Token::new(text_range("("), TokenData::BracketOpen)
}

/// `)`.
pub fn bracket_close() -> Token {
    Token::new(text_range(")"), TokenData::BracketClose)
}

/// New-line marker at an indent column.
pub fn new_line(column: u32) -> Token {
    Token::new(marker_range(column), TokenData::NewLineIndentation)
}

/// Block-start marker at an indent column.
pub fn block_start(column: u32) -> Token {
    Token::new(marker_range(column), TokenData::BlockStartIndentation)
}

/// Block-end marker at an indent column.
pub fn block_end(column: u32) -> Token {
    Token::new(marker_range(column), TokenData::BlockEndIndentation)
}

/// Translate a filtered token into its line form.
///
/// # Panics
/// Panics when given a marker kind; markers never appear inside lines.
pub fn bt(token: Token) -> BlockToken {
    BlockToken::from_filtered(token).expect("marker tokens cannot appear inside a line")
}

/// Build a line from filtered tokens.
pub fn line(tokens: impl IntoIterator<Item = Token>) -> Line {
    Line {
        tokens: tokens.into_iter().map(bt).collect(),
        tainted: false,
    }
}

/// Build a block from lines.
pub fn block(lines: impl IntoIterator<Item = Line>) -> BlockLiteral {
    BlockLiteral {
        lines: lines.into_iter().collect(),
        tainted: false,
    }
}

/// Nested block literal as a line token, carrying its start column.
pub fn blk(column: u32, block: BlockLiteral) -> BlockToken {
    BlockToken::new(marker_range(column), BlockTokenData::BlockLiteral(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_round_trip_through_translation() {
        let built = line([id("f"), str_lit("hi"), num("42")]);
        assert_eq!(built.tokens.len(), 3);
        assert_eq!(built.tokens[0].name(), Some("f"));
    }

    #[test]
    fn marker_columns() {
        assert_eq!(new_line(5).indent_column(), 5);
        assert_eq!(block_start(3).indent_column(), 3);
        assert_eq!(block_end(1).indent_column(), 1);
    }

    #[test]
    #[should_panic(expected = "marker tokens")]
    fn markers_refuse_line_translation() {
        bt(new_line(1));
    }
}
