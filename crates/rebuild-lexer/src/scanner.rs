//! Raw tokenization using logos.
//!
//! The scanner works on byte spans only; line/column positions, tab
//! expansion and the indentation markers are the filter's job. Newline
//! runs swallow the following indentation so the filter sees one token
//! per physical line start.

use logos::Logos;
use std::ops::Range;

/// Raw token kinds straight out of the scanner.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    /// Newline plus the following indentation run
    #[regex(r"\r?\n[ \t]*")]
    NewLine,

    /// Spaces and tabs inside a line
    #[regex(r"[ \t]+")]
    WhiteSpace,

    /// `#` comment to end of line
    #[regex(r"#[^\n]*")]
    Comment,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("(")]
    BracketOpen,

    #[token(")")]
    BracketClose,

    /// Double-quoted string with backslash escapes
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[regex(r"0[bB][01]+")]
    BinaryNumber,

    #[regex(r"0[oO][0-7]+")]
    OctalNumber,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexNumber,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    DecimalNumber,

    /// Identifier, possibly dotted (`Rebuild.Context.declareVariable`)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*")]
    Identifier,

    /// Run of operator characters
    #[regex(r"[+\-*/%&|<>=!~^?$@.]+")]
    Operator,
}

/// One scanned item: the token kind (or `Err` for unscannable input) and
/// its byte span.
pub type RawItem = (Result<RawToken, ()>, Range<usize>);

/// Scan a source text into raw items.
pub fn scan(source: &str) -> Vec<RawItem> {
    RawToken::lexer(source).spanned().collect()
}
