//! Single-pass cursor over the filtered token stream.

use rebuild_ast::token::Token;

/// Index-based cursor with one token of lookahead.
///
/// The stream is materialized by the filter, so `Clone` is O(1) and no
/// rewind support is needed: consumers only ever peek and move forward.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    /// Create a cursor at the start of a stream.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// True while tokens remain.
    pub fn valid(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// The current token without consuming it.
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Move past the current token; returns the new [`Self::valid`].
    pub fn advance(&mut self) -> bool {
        if self.valid() {
            self.pos += 1;
        }
        self.valid()
    }

    /// Consume and return the current token.
    pub fn take(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Current index into the stream.
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_ast::build::{id, num};
    use rebuild_ast::token::TokenData;

    #[test]
    fn walks_the_stream_once() {
        let tokens = vec![id("a"), num("1")];
        let mut cursor = TokenCursor::new(&tokens);

        assert!(cursor.valid());
        assert!(matches!(
            cursor.peek().map(|t| &t.data),
            Some(TokenData::IdentifierLiteral { .. })
        ));
        assert!(cursor.advance());
        assert!(matches!(
            cursor.take().map(|t| &t.data),
            Some(TokenData::NumberLiteral(_))
        ));
        assert!(!cursor.valid());
        assert!(cursor.peek().is_none());
        assert!(!cursor.advance());
    }

    #[test]
    fn take_returns_the_consumed_token() {
        let tokens = vec![id("x")];
        let mut cursor = TokenCursor::new(&tokens);
        assert_eq!(cursor.take().map(|t| t.range.text.as_str()), Some("x"));
        assert!(cursor.take().is_none());
    }
}
