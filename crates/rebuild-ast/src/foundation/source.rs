//! In-memory source files with line indexing.

use serde::{Deserialize, Serialize};

/// A single source unit handed to the compiler.
///
/// The front-end never touches the file system; the caller supplies name and
/// content (the CLI reads a file, tests pass literals). Line starts are
/// indexed once so diagnostic rendering can slice out source lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Display name used in diagnostics
    pub name: String,
    /// Full source text
    pub content: String,
    /// Byte offsets of each line start; a trailing EOF sentinel is included
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a source file and compute its line index.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = compute_line_starts(&content);
        Self {
            name: name.into(),
            content,
            line_starts,
        }
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Text of a 1-based line, without the trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[(line - 1) as usize];
        let end = self.line_starts[line as usize];
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// Byte offsets of line starts; `line_starts[0]` is always 0 and the last
/// element is the EOF sentinel.
fn compute_line_starts(content: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    for (idx, ch) in content.char_indices() {
        if ch == '\n' {
            line_starts.push(idx + 1);
        }
    }
    if line_starts.last() != Some(&content.len()) {
        line_starts.push(content.len());
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_text_slices_lines() {
        let file = SourceFile::new("test.rebuild", "hello\nworld\n");
        assert_eq!(file.line_text(1), Some("hello"));
        assert_eq!(file.line_text(2), Some("world"));
        assert_eq!(file.line_text(3), None);
    }

    #[test]
    fn line_count_ignores_trailing_newline() {
        assert_eq!(SourceFile::new("t", "a\nb").line_count(), 2);
        assert_eq!(SourceFile::new("t", "a\nb\n").line_count(), 2);
        assert_eq!(SourceFile::new("t", "").line_count(), 1);
    }

    #[test]
    fn windows_line_endings() {
        let file = SourceFile::new("t", "one\r\ntwo\r\n");
        assert_eq!(file.line_text(1), Some("one"));
        assert_eq!(file.line_text(2), Some("two"));
    }
}
