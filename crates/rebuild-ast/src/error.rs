//! Diagnostic reporting.
//!
//! Every problem the front-end encounters is a diagnostic; nothing aborts
//! compilation. Stages report into an append-only [`Diagnostics`] sink and
//! recover locally, so a single compile surfaces as many findings as the
//! input allows.
//!
//! # Design
//!
//! - `Diagnostic` — one finding with kind, severity, range, message, notes
//! - `DiagnosticKind` — categorizes findings by pipeline stage
//! - `Diagnostics` — the sink, with an optional recording budget
//! - `DiagnosticFormatter` — renders findings with source snippets

use crate::foundation::{SourceFile, SourceRange};
use std::fmt;

/// One compiler finding with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category of this finding
    pub kind: DiagnosticKind,
    /// Severity level
    pub severity: Severity,
    /// Source location
    pub range: SourceRange,
    /// Human-readable message
    pub message: String,
    /// Additional context lines
    pub notes: Vec<String>,
}

/// Category of diagnostic, grouped by the stage that detects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    // Scanner / filter
    /// Input the scanner could not tokenize
    InvalidToken,
    /// Indentation switches between spaces and tabs
    InconsistentIndentChar,

    // Block grouping
    /// Block end marker where no nested block is open
    UnexpectedEnd,
    /// Nested block was never closed
    MissingEnd,
    /// Block end marker indented deeper than the current line
    NestedEnd,
    /// Block end marker at or beyond the block's own column
    MisplacedEnd,
    /// Block start marker left of the enclosing block
    BlockStartBeforeParent,
    /// Continuation line indented left of the wrapped line
    ContinuationColumn,
    /// Input remained after the root block
    ExtraInput,

    // Line parsing
    /// Tokens remained after the line's tuple expression
    LeftoverTokens,
    /// Line skipped because grouping already failed on it
    TaintedLine,
    /// Opening bracket without matching close
    MissingClosingBracket,

    // Name lookup
    /// Name not bound in any reachable scope
    NameNotFound,
    /// Dotted path stepped through a non-module entry
    NotAModule,
    /// Dotted path ended in an unbound name
    NestedNameNotFound,
    /// Single entry required but the name is multi-bound
    AmbiguousName,
    /// Type position did not resolve to a type
    UnknownType,

    // Overload resolution
    /// No overload accepted the arguments
    NoMatchingOverload,
    /// More than one overload completed
    AmbiguousOverload,
    /// Argument value does not convert to the parameter type
    ArgumentTypeMismatch,
    /// Named argument matches no parameter
    UnknownNamedArgument,
    /// Named argument matches a parameter on the wrong side
    WrongParameterSide,

    // Compile-time execution
    /// Intrinsic call failed to produce a result
    IntrinsicCallFailed,
}

impl DiagnosticKind {
    /// Human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::InvalidToken => "invalid token",
            DiagnosticKind::InconsistentIndentChar => "inconsistent indentation character",
            DiagnosticKind::UnexpectedEnd => "unexpected block end",
            DiagnosticKind::MissingEnd => "missing block end",
            DiagnosticKind::NestedEnd => "nested block end",
            DiagnosticKind::MisplacedEnd => "misplaced block end",
            DiagnosticKind::BlockStartBeforeParent => "block start left of parent",
            DiagnosticKind::ContinuationColumn => "continuation column",
            DiagnosticKind::ExtraInput => "extra input",
            DiagnosticKind::LeftoverTokens => "leftover tokens",
            DiagnosticKind::TaintedLine => "tainted line",
            DiagnosticKind::MissingClosingBracket => "missing closing bracket",
            DiagnosticKind::NameNotFound => "name not found",
            DiagnosticKind::NotAModule => "not a module",
            DiagnosticKind::NestedNameNotFound => "nested name not found",
            DiagnosticKind::AmbiguousName => "ambiguous name",
            DiagnosticKind::UnknownType => "unknown type",
            DiagnosticKind::NoMatchingOverload => "no matching overload",
            DiagnosticKind::AmbiguousOverload => "ambiguous overload",
            DiagnosticKind::ArgumentTypeMismatch => "argument type mismatch",
            DiagnosticKind::UnknownNamedArgument => "unknown named argument",
            DiagnosticKind::WrongParameterSide => "wrong parameter side",
            DiagnosticKind::IntrinsicCallFailed => "compile-time call failed",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note
    Note,
    /// Input is accepted but suspicious
    Warning,
    /// Input is invalid; compilation output is degraded
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(kind: DiagnosticKind, range: SourceRange, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Error, range, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(kind: DiagnosticKind, range: SourceRange, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Warning, range, message)
    }

    /// Create a note diagnostic.
    pub fn note(kind: DiagnosticKind, range: SourceRange, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Note, range, message)
    }

    fn with_severity(
        kind: DiagnosticKind,
        severity: Severity,
        range: SourceRange,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            range,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Attach a note (builder style).
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

/// Append-only diagnostic sink.
///
/// An optional budget caps how many findings are recorded; once exceeded,
/// further reports are counted but dropped, so a degenerate input cannot
/// produce an unbounded report.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    budget: Option<usize>,
    dropped: usize,
}

impl Diagnostics {
    /// Create an unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that records at most `budget` findings.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    /// Report a finding.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.budget.is_some_and(|b| self.items.len() >= b) {
            self.dropped += 1;
            return;
        }
        self.items.push(diagnostic);
    }

    /// All recorded findings, in report order.
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Number of recorded findings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.dropped == 0
    }

    /// Number of findings dropped over budget.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// True if any recorded finding has `Error` severity.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Renders diagnostics with source context.
pub struct DiagnosticFormatter<'a> {
    source: &'a SourceFile,
}

impl<'a> DiagnosticFormatter<'a> {
    /// Create a formatter over one source file.
    pub fn new(source: &'a SourceFile) -> Self {
        Self { source }
    }

    /// Format one diagnostic with location, snippet and underline.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}: {}: {}\n",
            diagnostic.severity,
            diagnostic.kind.name(),
            diagnostic.message
        ));

        let begin = diagnostic.range.begin;
        output.push_str(&format!("  --> {}:{}\n", self.source.name, begin));

        if let Some(line) = self.source.line_text(begin.line) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", begin.line, line));

            let start_col = begin.column as usize;
            let end_col = if diagnostic.range.end.line == begin.line {
                (diagnostic.range.end.column as usize).max(start_col + 1)
            } else {
                line.chars().count() + 1
            };
            let underline = " ".repeat(start_col.saturating_sub(1))
                + &"^".repeat(end_col.saturating_sub(start_col).max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("   = note: {}\n", note));
        }

        output
    }

    /// Format all diagnostics separated by blank lines.
    pub fn format_all(&self, diagnostics: &Diagnostics) -> String {
        diagnostics
            .items()
            .iter()
            .map(|d| self.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Position;

    fn dummy_range() -> SourceRange {
        SourceRange::new(Position::new(1, 9), Position::new(1, 12), "foo")
    }

    #[test]
    fn report_and_query() {
        let mut sink = Diagnostics::new();
        assert!(sink.is_empty());
        sink.report(Diagnostic::error(
            DiagnosticKind::NameNotFound,
            dummy_range(),
            "undefined name 'foo'",
        ));
        assert_eq!(sink.len(), 1);
        assert!(sink.has_errors());
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut sink = Diagnostics::new();
        sink.report(Diagnostic::warning(
            DiagnosticKind::ContinuationColumn,
            dummy_range(),
            "continuation line outdented",
        ));
        assert!(!sink.has_errors());
    }

    #[test]
    fn budget_drops_excess() {
        let mut sink = Diagnostics::with_budget(1);
        for _ in 0..3 {
            sink.report(Diagnostic::error(
                DiagnosticKind::InvalidToken,
                dummy_range(),
                "bad input",
            ));
        }
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn formatter_underlines_the_range() {
        let source = SourceFile::new("test.rebuild", "let x = foo\n");
        let diagnostic = Diagnostic::error(
            DiagnosticKind::NameNotFound,
            dummy_range(),
            "undefined name 'foo'",
        )
        .with_note("names are declared with Rebuild.Context.declareVariable");

        let formatted = DiagnosticFormatter::new(&source).format(&diagnostic);
        assert!(formatted.contains("error: name not found"));
        assert!(formatted.contains("test.rebuild:1:9"));
        assert!(formatted.contains("let x = foo"));
        assert!(formatted.contains("^^^"));
        assert!(formatted.contains("note: names are declared"));
    }

    #[test]
    fn display_is_compact() {
        let d = Diagnostic::error(DiagnosticKind::UnexpectedEnd, dummy_range(), "stray end");
        assert_eq!(format!("{}", d), "error: unexpected block end: stray end");
    }
}
