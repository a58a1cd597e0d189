//! Cursor over one grouped line.

use rebuild_ast::blocks::{BlockToken, Line};

/// Position-indexed view into a line's tokens.
///
/// Cloning is O(1); the overload resolver forks one view per candidate and
/// commits the winner's back to the caller.
#[derive(Debug, Clone)]
pub struct LineView<'a> {
    tokens: &'a [BlockToken],
    pos: usize,
}

impl<'a> LineView<'a> {
    /// View over a line.
    pub fn new(line: &'a Line) -> Self {
        Self {
            tokens: &line.tokens,
            pos: 0,
        }
    }

    /// View over a raw token slice.
    pub fn over(tokens: &'a [BlockToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// True while tokens remain.
    pub fn valid(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// The current token.
    pub fn peek(&self) -> Option<&'a BlockToken> {
        self.tokens.get(self.pos)
    }

    /// The token after the current one.
    pub fn peek_next(&self) -> Option<&'a BlockToken> {
        self.tokens.get(self.pos + 1)
    }

    /// Move past the current token; returns the new [`Self::valid`].
    pub fn advance(&mut self) -> bool {
        if self.valid() {
            self.pos += 1;
        }
        self.valid()
    }

    /// Current index into the line.
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_ast::build::{id, line, num};

    #[test]
    fn clone_forks_the_position() {
        let line = line([id("f"), num("1"), num("2")]);
        let mut a = LineView::new(&line);
        a.advance();
        let mut b = a.clone();
        b.advance();
        assert_eq!(a.position(), 1);
        assert_eq!(b.position(), 2);
    }

    #[test]
    fn two_token_lookahead() {
        let line = line([id("a"), id("b")]);
        let view = LineView::new(&line);
        assert_eq!(view.peek().and_then(|t| t.name()), Some("a"));
        assert_eq!(view.peek_next().and_then(|t| t.name()), Some("b"));
    }
}
