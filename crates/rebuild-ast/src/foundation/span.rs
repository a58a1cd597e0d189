//! Line/column positions and source ranges.
//!
//! The indentation-sensitive pipeline works in terms of *columns*, so unlike
//! byte-offset span models the position is stored explicitly per token. Tab
//! expansion happens in the filter; everything downstream compares plain
//! column numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A caret position in a source file. Both coordinates are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source range of a token or node.
///
/// `begin` is inclusive, `end` is exclusive. `text` carries the source slice
/// the range covers; identifier and operator tokens use it as their name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: Position,
    pub end: Position,
    pub text: String,
}

impl SourceRange {
    /// Create a new range.
    pub fn new(begin: Position, end: Position, text: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            text: text.into(),
        }
    }

    /// Zero-length range at a position.
    pub fn at(position: Position) -> Self {
        Self {
            begin: position,
            end: position,
            text: String::new(),
        }
    }

    /// Check if this range covers no input.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Merge two ranges into one covering both.
    ///
    /// The merged text is dropped; callers that need a snippet re-slice the
    /// source through [`super::SourceFile`].
    pub fn merge(&self, other: &SourceRange) -> SourceRange {
        SourceRange {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
            text: String::new(),
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.begin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering_is_line_major() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(3, 4) < Position::new(3, 5));
    }

    #[test]
    fn range_merge_covers_both() {
        let a = SourceRange::new(Position::new(1, 1), Position::new(1, 4), "foo");
        let b = SourceRange::new(Position::new(1, 6), Position::new(2, 1), "bar");
        let merged = a.merge(&b);
        assert_eq!(merged.begin, Position::new(1, 1));
        assert_eq!(merged.end, Position::new(2, 1));
    }

    #[test]
    fn empty_range() {
        let r = SourceRange::at(Position::new(4, 2));
        assert!(r.is_empty());
        assert_eq!(r.begin, r.end);
    }
}
