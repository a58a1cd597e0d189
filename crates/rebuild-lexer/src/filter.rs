//! The indentation filter: raw items to filtered tokens.
//!
//! Responsibilities on top of the scanner:
//!
//! - line/column positions with tab expansion to the configured width
//! - one `NewLineIndentation` marker per line *with content* (blank lines
//!   collapse), carrying the line's indent column
//! - trailing-colon lines open blocks: the colon and the following line
//!   marker fuse into a `BlockStartIndentation`
//! - `end` lines close blocks: the marker and the keyword fuse into a
//!   `BlockEndIndentation`
//! - separation flags on identifier and operator literals
//! - whitespace and comments are dropped; unscannable input is reported
//!   and skipped
//! - the indent character is recorded once and mismatches reported, never
//!   rejected

use crate::scanner::{scan, RawItem, RawToken};
use rebuild_ast::error::{Diagnostic, DiagnosticKind, Diagnostics};
use rebuild_ast::foundation::{Position, SourceRange};
use rebuild_ast::token::{NumberLiteral, Radix, Token, TokenData};
use tracing::debug;

/// Scan and filter a source text into the filtered token stream.
pub fn tokenize(source: &str, tab_width: u32, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let items = scan(source);
    let positioned = position_pass(source, &items, tab_width, diagnostics);
    let tokens = structure_pass(positioned);
    debug!(raw = items.len(), filtered = tokens.len(), "filtered source");
    tokens
}

/// Advance a position over token text, expanding tabs.
fn advance(position: &mut Position, text: &str, tab_width: u32) {
    for ch in text.chars() {
        match ch {
            '\n' => {
                position.line += 1;
                position.column = 1;
            }
            '\t' => position.column = next_tab_stop(position.column, tab_width),
            '\r' => {}
            _ => position.column += 1,
        }
    }
}

fn next_tab_stop(column: u32, tab_width: u32) -> u32 {
    ((column - 1) / tab_width + 1) * tab_width + 1
}

fn is_separating(kind: Option<&Result<RawToken, ()>>) -> bool {
    match kind {
        None => true,
        Some(Ok(RawToken::NewLine | RawToken::WhiteSpace | RawToken::Comment)) => true,
        Some(Ok(_)) => false,
        Some(Err(_)) => true,
    }
}

/// First pass: positions, separation flags, literal decoding, newline
/// collapse. Markers and content come out in source order.
fn position_pass(
    source: &str,
    items: &[RawItem],
    tab_width: u32,
    diagnostics: &mut Diagnostics,
) -> Vec<Token> {
    let mut out = Vec::with_capacity(items.len());
    let mut position = Position::default();
    // marker for the upcoming line, emitted once content shows up
    let mut pending = Some(Token::new(
        SourceRange::at(Position::default()),
        TokenData::NewLineIndentation,
    ));
    let mut saw_content = false;
    let mut indent_char: Option<char> = None;
    let mut indent_reported = false;

    for (index, (kind, span)) in items.iter().enumerate() {
        let text = &source[span.clone()];
        let begin = position;
        advance(&mut position, text, tab_width);
        let end = position;
        let range = SourceRange::new(begin, end, text);

        let kind = match kind {
            Ok(kind) => *kind,
            Err(_) => {
                diagnostics.report(Diagnostic::error(
                    DiagnosticKind::InvalidToken,
                    range,
                    format!("cannot scan input '{}'", text),
                ));
                continue;
            }
        };

        match kind {
            RawToken::NewLine => {
                check_indent_chars(
                    text,
                    &range,
                    &mut indent_char,
                    &mut indent_reported,
                    diagnostics,
                );
                pending = Some(Token::new(range, TokenData::NewLineIndentation));
            }
            RawToken::WhiteSpace => {
                // indentation of the very first line arrives as plain
                // whitespace; fold it into the initial marker
                if !saw_content && begin == Position::default() {
                    check_indent_chars(
                        text,
                        &range,
                        &mut indent_char,
                        &mut indent_reported,
                        diagnostics,
                    );
                    if let Some(marker) = pending.as_mut() {
                        marker.range = range;
                    }
                }
            }
            RawToken::Comment => {}
            _ => {
                saw_content = true;
                if let Some(marker) = pending.take() {
                    out.push(marker);
                }
                let left_separated = is_separating(items.get(index.wrapping_sub(1)).map(|(k, _)| k));
                let right_separated = is_separating(items.get(index + 1).map(|(k, _)| k));
                let data = match kind {
                    RawToken::Colon => TokenData::ColonSeparator,
                    RawToken::Comma => TokenData::CommaSeparator,
                    RawToken::Semicolon => TokenData::SemicolonSeparator,
                    RawToken::BracketOpen => TokenData::BracketOpen,
                    RawToken::BracketClose => TokenData::BracketClose,
                    RawToken::Identifier => TokenData::IdentifierLiteral {
                        left_separated,
                        right_separated,
                    },
                    RawToken::Operator => TokenData::OperatorLiteral {
                        left_separated,
                        right_separated,
                    },
                    RawToken::StringLiteral => TokenData::StringLiteral {
                        text: unescape(text),
                    },
                    RawToken::BinaryNumber => TokenData::NumberLiteral(prefixed_number(text, Radix::Binary)),
                    RawToken::OctalNumber => TokenData::NumberLiteral(prefixed_number(text, Radix::Octal)),
                    RawToken::HexNumber => TokenData::NumberLiteral(prefixed_number(text, Radix::Hex)),
                    RawToken::DecimalNumber => TokenData::NumberLiteral(decimal_number(text)),
                    RawToken::NewLine | RawToken::WhiteSpace | RawToken::Comment => {
                        unreachable!("handled above")
                    }
                };
                out.push(Token::new(range, data));
            }
        }
    }

    out
}

/// Second pass: fuse trailing colons and `end` keywords into block
/// start/end markers.
fn structure_pass(input: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(input.len());
    let mut iter = input.into_iter().peekable();

    while let Some(token) = iter.next() {
        match &token.data {
            TokenData::ColonSeparator
                if matches!(
                    iter.peek().map(|next| &next.data),
                    Some(TokenData::NewLineIndentation)
                ) =>
            {
                if let Some(mut marker) = iter.next() {
                    marker.data = TokenData::BlockStartIndentation;
                    out.push(marker);
                }
            }
            TokenData::IdentifierLiteral { .. } if token.range.text == "end" => {
                let after_newline = matches!(
                    out.last().map(|previous| &previous.data),
                    Some(TokenData::NewLineIndentation)
                );
                let after_block_start = matches!(
                    out.last().map(|previous| &previous.data),
                    Some(TokenData::BlockStartIndentation)
                );
                if after_newline {
                    if let Some(marker) = out.last_mut() {
                        marker.data = TokenData::BlockEndIndentation;
                    }
                } else if after_block_start {
                    // `end` directly after an opening colon closes the
                    // (empty) block it just opened
                    let begin = token.range.begin;
                    out.push(Token::new(
                        SourceRange::new(begin, Position::new(begin.line, begin.column), "end"),
                        TokenData::BlockEndIndentation,
                    ));
                } else {
                    out.push(token);
                }
            }
            _ => out.push(token),
        }
    }

    out
}

fn check_indent_chars(
    text: &str,
    range: &SourceRange,
    indent_char: &mut Option<char>,
    reported: &mut bool,
    diagnostics: &mut Diagnostics,
) {
    for ch in text.chars().filter(|ch| matches!(ch, ' ' | '\t')) {
        match indent_char {
            None => *indent_char = Some(ch),
            Some(expected) if *expected != ch => {
                if !*reported {
                    *reported = true;
                    diagnostics.report(Diagnostic::warning(
                        DiagnosticKind::InconsistentIndentChar,
                        range.clone(),
                        "indentation mixes spaces and tabs; columns use the configured tab width",
                    ));
                }
                return;
            }
            Some(_) => {}
        }
    }
}

fn unescape(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some('0') => text.push('\0'),
            Some(other) => text.push(other),
            None => {}
        }
    }
    text
}

fn prefixed_number(text: &str, radix: Radix) -> NumberLiteral {
    NumberLiteral {
        radix,
        integer_part: text[2..].to_string(),
        fractional_part: String::new(),
        exponent_part: String::new(),
    }
}

fn decimal_number(text: &str) -> NumberLiteral {
    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, exponent),
        None => (text, ""),
    };
    let (integer, fraction) = match mantissa.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (mantissa, ""),
    };
    NumberLiteral {
        radix: Radix::Decimal,
        integer_part: integer.to_string(),
        fractional_part: fraction.to_string(),
        exponent_part: exponent.to_string(),
    }
}
