//! The block grouper: filtered tokens to a nested block/line tree.
//!
//! Second parser stage. Consumes the indentation and semicolon markers the
//! filter produced and turns them into structure; the markers themselves
//! never reach a line. Columns are compared numerically - whether the
//! indentation used a consistent character was the filter's concern.
//!
//! Every recovery path reports a diagnostic and continues; blocks and
//! lines that needed recovery are flagged tainted so the semantic parser
//! skips them without re-reporting.

use crate::cursor::TokenCursor;
use rebuild_ast::blocks::{BlockLiteral, BlockToken, BlockTokenData, Line};
use rebuild_ast::error::{Diagnostic, DiagnosticKind, Diagnostics};
use rebuild_ast::token::{Token, TokenData};
use tracing::debug;

/// Group a filtered token stream into the root block.
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> BlockLiteral {
    let mut cursor = TokenCursor::new(tokens);
    if !cursor.valid() {
        return BlockLiteral::default();
    }

    let mut block_column = 1;
    if let Some(token) = cursor.peek() {
        if matches!(token.data, TokenData::NewLineIndentation) {
            block_column = token.indent_column();
            if !cursor.advance() {
                return BlockLiteral::default();
            }
        }
    }

    let block = parse_block(&mut cursor, block_column, diagnostics);
    if let Some(token) = cursor.peek() {
        diagnostics.report(Diagnostic::error(
            DiagnosticKind::ExtraInput,
            token.range.clone(),
            "input continues left of the root block",
        ));
    }
    debug!(
        lines = block.lines.len(),
        tainted = block.tainted,
        "grouped token stream"
    );
    block
}

/// Collect lines at `block_column` until the input falls back to a parent.
fn parse_block(
    cursor: &mut TokenCursor<'_>,
    block_column: u32,
    diagnostics: &mut Diagnostics,
) -> BlockLiteral {
    let mut block = BlockLiteral::default();
    let reported_before = diagnostics.len();

    'lines: loop {
        // skip the separators between lines
        loop {
            let Some(token) = cursor.peek() else {
                break 'lines;
            };
            match token.data {
                TokenData::SemicolonSeparator => {
                    if !cursor.advance() {
                        break 'lines;
                    }
                }
                TokenData::BlockEndIndentation => {
                    if token.indent_column() < block_column {
                        break 'lines; // the parent's end, not ours
                    }
                    diagnostics.report(Diagnostic::error(
                        DiagnosticKind::MisplacedEnd,
                        token.range.clone(),
                        "block end without an open nested block",
                    ));
                    if !cursor.advance() {
                        break 'lines;
                    }
                }
                TokenData::BlockStartIndentation | TokenData::NewLineIndentation => {
                    if token.indent_column() < block_column {
                        break 'lines; // line belongs to a parent block
                    }
                    if !cursor.advance() {
                        break 'lines;
                    }
                }
                _ => break,
            }
        }

        let line = parse_line(cursor, block_column, diagnostics);
        block.lines.push(line);
        if !cursor.valid() {
            break;
        }
    }

    block.tainted = diagnostics.len() > reported_before;
    block
}

/// Collect one logical line, following wrapped continuations and nested
/// blocks, until a separator hands control back to the parent block.
fn parse_line(
    cursor: &mut TokenCursor<'_>,
    parent_column: u32,
    diagnostics: &mut Diagnostics,
) -> Line {
    let mut line = Line::default();
    let reported_before = diagnostics.len();
    let mut expect_end = false;
    let mut continuation: Option<u32> = None;

    loop {
        extract_line_tokens(&mut line, cursor);
        let Some(token) = cursor.peek() else {
            break;
        };
        let column = token.indent_column();
        let range = token.range.clone();

        match token.data {
            TokenData::SemicolonSeparator => {
                if expect_end {
                    diagnostics.report(Diagnostic::error(
                        DiagnosticKind::MissingEnd,
                        range,
                        "nested block is not closed before ';'",
                    ));
                }
                cursor.advance();
                break;
            }
            TokenData::NewLineIndentation => {
                if column < parent_column {
                    if expect_end {
                        diagnostics.report(Diagnostic::error(
                            DiagnosticKind::MissingEnd,
                            range,
                            "nested block is not closed before the line ends",
                        ));
                    }
                    break; // marker belongs to a parent block
                }
                if column == parent_column && !expect_end {
                    break; // regular line break; parent consumes the marker
                }
                // wrapped continuation of the current line
                match continuation {
                    Some(expected) if column < expected => {
                        diagnostics.report(Diagnostic::warning(
                            DiagnosticKind::ContinuationColumn,
                            range,
                            "continuation is outdented from the wrapped line",
                        ));
                    }
                    None if column > parent_column => continuation = Some(column),
                    _ => {}
                }
                cursor.advance();
            }
            TokenData::BlockEndIndentation => {
                if column < parent_column {
                    if expect_end {
                        diagnostics.report(Diagnostic::error(
                            DiagnosticKind::MissingEnd,
                            range,
                            "nested block is not closed before the enclosing block ends",
                        ));
                    }
                    break;
                }
                if column == parent_column {
                    if !expect_end {
                        diagnostics.report(Diagnostic::error(
                            DiagnosticKind::UnexpectedEnd,
                            range,
                            "'end' without an open nested block",
                        ));
                    }
                    cursor.advance(); // consume the end marker
                    break;
                }
                diagnostics.report(Diagnostic::error(
                    DiagnosticKind::NestedEnd,
                    range,
                    "'end' is indented deeper than its line",
                ));
                cursor.advance();
            }
            TokenData::BlockStartIndentation => {
                expect_end = true;
                if column < parent_column {
                    diagnostics.report(Diagnostic::error(
                        DiagnosticKind::BlockStartBeforeParent,
                        range.clone(),
                        "block starts left of its enclosing block",
                    ));
                    line.tokens.push(BlockToken::new(
                        range,
                        BlockTokenData::BlockLiteral(BlockLiteral::default()),
                    ));
                    break; // marker stays for the parent to resolve
                }
                if column == parent_column {
                    // a block at the same level is empty by construction
                    line.tokens.push(BlockToken::new(
                        range,
                        BlockTokenData::BlockLiteral(BlockLiteral::default()),
                    ));
                    if !cursor.advance() {
                        break;
                    }
                } else {
                    // parse_block consumes the start marker itself
                    let nested = parse_block(cursor, column, diagnostics);
                    line.tokens
                        .push(BlockToken::new(range, BlockTokenData::BlockLiteral(nested)));
                }
            }
            _ => break,
        }
    }

    line.tainted = diagnostics.len() > reported_before;
    line
}

/// Copy non-separator tokens into the line until a marker shows up.
fn extract_line_tokens(line: &mut Line, cursor: &mut TokenCursor<'_>) {
    while let Some(token) = cursor.peek() {
        if token.data.is_separator() {
            return;
        }
        if let Some(translated) = BlockToken::from_filtered(token.clone()) {
            line.tokens.push(translated);
        }
        cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_ast::build::{
        blk, block, block_end, block_start, id, line, new_line, num, semicolon, str_lit,
    };

    fn group(tokens: Vec<Token>) -> (BlockLiteral, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let grouped = parse(&tokens, &mut diagnostics);
        (grouped, diagnostics)
    }

    fn group_clean(tokens: Vec<Token>) -> BlockLiteral {
        let (grouped, diagnostics) = group(tokens);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            diagnostics.items()
        );
        grouped
    }

    #[test]
    fn empty_input_yields_empty_block() {
        let grouped = group_clean(vec![]);
        assert!(grouped.lines.is_empty());
        assert!(!grouped.tainted);
    }

    #[test]
    fn single_line() {
        let grouped = group_clean(vec![new_line(1), id("f"), num("1")]);
        assert_eq!(grouped, block([line([id("f"), num("1")])]));
    }

    #[test]
    fn lines_split_at_matching_columns() {
        let grouped = group_clean(vec![new_line(1), id("a"), new_line(1), id("b")]);
        assert_eq!(grouped, block([line([id("a")]), line([id("b")])]));
    }

    #[test]
    fn semicolon_splits_lines_in_the_same_block() {
        let grouped = group_clean(vec![new_line(1), id("x"), semicolon(), id("y")]);
        assert_eq!(grouped, block([line([id("x")]), line([id("y")])]));
    }

    #[test]
    fn deeper_newline_continues_the_line() {
        let grouped = group_clean(vec![new_line(1), id("f"), new_line(5), str_lit("wrapped")]);
        assert_eq!(grouped, block([line([id("f"), str_lit("wrapped")])]));
    }

    #[test]
    fn nested_block_groups_under_its_line() {
        let grouped = group_clean(vec![
            new_line(1),
            id("f"),
            block_start(3),
            num("1"),
            new_line(3),
            num("2"),
        ]);
        let mut expected_line = line([id("f")]);
        expected_line
            .tokens
            .push(blk(3, block([line([num("1")]), line([num("2")])])));
        assert_eq!(grouped, block([expected_line]));
    }

    #[test]
    fn end_marker_closes_the_nested_block() {
        let grouped = group_clean(vec![
            new_line(1),
            id("f"),
            block_start(5),
            id("body"),
            block_end(1),
            new_line(1),
            id("next"),
        ]);
        assert_eq!(grouped.lines.len(), 2);
        assert!(!grouped.tainted);
        assert!(matches!(
            grouped.lines[0].tokens[1].data,
            BlockTokenData::BlockLiteral(_)
        ));
        assert_eq!(grouped.lines[1], line([id("next")]));
    }

    #[test]
    fn block_start_at_parent_column_is_an_empty_block() {
        let grouped = group_clean(vec![new_line(1), id("f"), block_start(1), block_end(1)]);
        assert_eq!(grouped.lines.len(), 1);
        let tokens = &grouped.lines[0].tokens;
        assert!(
            matches!(&tokens[1].data, BlockTokenData::BlockLiteral(b) if b.lines.is_empty())
        );
    }

    #[test]
    fn unexpected_end_is_reported_and_skipped() {
        let (grouped, diagnostics) = group(vec![new_line(1), id("a"), block_end(1)]);
        assert_eq!(
            diagnostics.items()[0].kind,
            DiagnosticKind::UnexpectedEnd
        );
        assert!(grouped.tainted);
        assert!(grouped.lines[0].tainted);
        assert_eq!(grouped.lines[0].tokens, line([id("a")]).tokens);
    }

    #[test]
    fn missing_end_before_semicolon() {
        let (grouped, diagnostics) = group(vec![
            new_line(1),
            id("f"),
            block_start(3),
            num("1"),
            new_line(1),
            semicolon(),
        ]);
        // the nested line ends at the parent column, the semicolon closes
        // the outer line while its block is still open
        assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::MissingEnd);
        assert_eq!(grouped.lines.len(), 1);
    }

    #[test]
    fn misplaced_end_between_lines_is_skipped() {
        let (grouped, diagnostics) = group(vec![
            new_line(1),
            id("a"),
            new_line(1),
            block_end(3),
            new_line(1),
            id("b"),
        ]);
        assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::MisplacedEnd);
        assert_eq!(grouped.lines.len(), 2);
        assert!(grouped.tainted);
    }

    #[test]
    fn block_start_left_of_parent_recovers_with_an_empty_block() {
        let root = vec![
            new_line(3),
            id("a"),
            block_start(1),
            id("b"),
        ];
        let (grouped, diagnostics) = group(root);
        assert_eq!(
            diagnostics.items()[0].kind,
            DiagnosticKind::BlockStartBeforeParent
        );
        // the line terminated with an empty block placeholder
        assert!(matches!(
            &grouped.lines[0].tokens[1].data,
            BlockTokenData::BlockLiteral(b) if b.lines.is_empty()
        ));
        // the stray marker then ends the root block; the rest is extra input
        assert!(diagnostics
            .items()
            .iter()
            .any(|d| d.kind == DiagnosticKind::ExtraInput));
    }

    #[test]
    fn nested_end_inside_continuation_is_discarded() {
        let (grouped, diagnostics) = group(vec![
            new_line(1),
            id("a"),
            block_end(5),
            id("b"),
        ]);
        assert_eq!(diagnostics.items()[0].kind, DiagnosticKind::NestedEnd);
        assert_eq!(grouped.lines.len(), 1);
        assert_eq!(grouped.lines[0].tokens.len(), 2);
    }

    #[test]
    fn outdented_continuation_warns_but_stays_in_the_line() {
        let (grouped, diagnostics) = group(vec![
            new_line(1),
            id("f"),
            new_line(7),
            id("wrapped"),
            new_line(5),
            id("outdented"),
        ]);
        assert_eq!(
            diagnostics.items()[0].kind,
            DiagnosticKind::ContinuationColumn
        );
        assert_eq!(grouped.lines.len(), 1);
        assert_eq!(grouped.lines[0].tokens.len(), 3);
    }

    #[test]
    fn nested_blocks_mirror_start_markers() {
        let tokens = vec![
            new_line(1),
            id("outer"),
            block_start(3),
            id("middle"),
            block_start(5),
            id("inner"),
        ];
        let marker_count = tokens
            .iter()
            .filter(|t| matches!(t.data, TokenData::BlockStartIndentation))
            .count();
        let grouped = group_clean(tokens);
        assert_eq!(grouped.nested_block_count(), marker_count);
    }

    #[test]
    fn taint_is_scoped_to_the_failing_block() {
        let (grouped, _) = group(vec![
            new_line(1),
            id("good"),
            new_line(1),
            id("bad"),
            block_end(3),
        ]);
        assert!(!grouped.lines[0].tainted);
        assert!(grouped.lines[1].tainted);
        assert!(grouped.tainted);
    }
}
