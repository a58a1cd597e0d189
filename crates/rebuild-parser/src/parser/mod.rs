//! The semantic parser: block tree to AST.
//!
//! Unit of work is a tuple expression - each line parses to one
//! [`NameTypeValueTuple`], unwrapped when it holds a single plain value.
//! Identifier resolution goes through the scope; resolved functions enter
//! overload resolution (`call`), and compile-time calls run while parsing,
//! so declarations become visible to the rest of the same file.
//!
//! The single-expression slot is deliberately narrow: producing a second
//! value while one is held always terminates the current expression. That
//! rule is what ends juxtaposed calls.

mod call;
pub(crate) mod types;

use crate::context::Context;
use crate::view::LineView;
use rebuild_ast::ast::{
    Block, NameTypeValue, NameTypeValueTuple, Node, Value, ValueData, ValueKind,
};
use rebuild_ast::blocks::{BlockLiteral, BlockToken, BlockTokenData};
use rebuild_ast::error::{Diagnostic, DiagnosticKind};
use rebuild_ast::instance::{EntryId, FunctionId, LookupError, ParserKind};
use tracing::debug;

/// Whether the current expression keeps collecting tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseAction {
    Continue,
    Finish,
}

/// Parse a grouped block into an AST block.
pub fn parse(block: &BlockLiteral, context: &mut Context<'_>) -> Block {
    let mut result = Block::default();
    for line in &block.lines {
        if line.tainted {
            if let Some(token) = line.tokens.first() {
                context.diagnostics.report(Diagnostic::note(
                    DiagnosticKind::TaintedLine,
                    token.range.clone(),
                    "line is skipped after grouping errors",
                ));
            }
            continue;
        }
        let mut it = LineView::new(line);
        if !it.valid() {
            continue;
        }

        let mut tuple = parse_tuple(&mut it, context);
        if tuple.tuple.len() == 1 && tuple.tuple[0].only_value() {
            // no reason to keep the tuple around, unwrap it
            if let Some(NameTypeValue {
                value: Some(node), ..
            }) = tuple.tuple.pop()
            {
                result.nodes.push(node);
            }
        } else if !tuple.tuple.is_empty() {
            result.nodes.push(Node::NameTypeValueTuple(tuple));
        }

        if let Some(leftover) = it.peek() {
            context.diagnostics.report(Diagnostic::error(
                DiagnosticKind::LeftoverTokens,
                leftover.range.clone(),
                "tokens remain after the line's expression",
            ));
        }
    }
    debug!(nodes = result.nodes.len(), "parsed block");
    result
}

/// Parse a tuple expression, optionally bracket-delimited.
pub(crate) fn parse_tuple(
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> NameTypeValueTuple {
    let mut tuple = NameTypeValueTuple::default();
    let Some(first) = it.peek() else {
        return tuple;
    };
    let with_brackets = matches!(first.data, BlockTokenData::BracketOpen);
    let open_range = first.range.clone();
    if with_brackets {
        it.advance();
    }

    parse_tuple_into(&mut tuple, it, context);

    if with_brackets {
        match it.peek() {
            Some(token) if matches!(token.data, BlockTokenData::BracketClose) => {
                it.advance();
            }
            _ => context.diagnostics.report(Diagnostic::error(
                DiagnosticKind::MissingClosingBracket,
                open_range,
                "'(' is never closed",
            )),
        }
    }
    tuple
}

fn parse_tuple_into(
    tuple: &mut NameTypeValueTuple,
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) {
    while it.valid() {
        if let Some(typed) = parse_single_typed(it, context) {
            tuple.tuple.push(typed);
        }
        if parse_optional_comma(it) == ParseAction::Finish {
            break;
        }
    }
}

/// Skip an optional comma between tuple elements or arguments.
pub(crate) fn parse_optional_comma(it: &mut LineView<'_>) -> ParseAction {
    let Some(mut token) = it.peek() else {
        return ParseAction::Finish;
    };
    if matches!(token.data, BlockTokenData::CommaSeparator) {
        it.advance();
        match it.peek() {
            Some(next) => token = next,
            None => return ParseAction::Finish,
        }
    }
    if matches!(token.data, BlockTokenData::BracketClose) {
        return ParseAction::Finish;
    }
    ParseAction::Continue
}

fn is_colon(token: &BlockToken) -> bool {
    matches!(token.data, BlockTokenData::ColonSeparator)
}

fn is_assignment(token: &BlockToken) -> bool {
    matches!(&token.data, BlockTokenData::OperatorLiteral { .. }) && token.range.text == "="
}

/// Parse one `name :type = value` shaped element with the default value
/// parser.
pub(crate) fn parse_single_typed(
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> Option<NameTypeValue> {
    parse_single_typed_with(it, context, |it, context, typed| {
        typed.value = parse_single(it, context);
    })
}

/// Parse one tuple element, dispatching on the head tokens:
/// `name :type [= value]`, `name = value`, `:type [= value]` or `value`.
///
/// `parse_value` supplies the value parser so the overload resolver can
/// substitute the parser a parameter's type dictates.
pub(crate) fn parse_single_typed_with<'a>(
    it: &mut LineView<'a>,
    context: &mut Context<'_>,
    parse_value: impl FnOnce(&mut LineView<'a>, &mut Context<'_>, &mut NameTypeValue),
) -> Option<NameTypeValue> {
    let mut result = NameTypeValue::default();
    let Some(current) = it.peek() else {
        return None;
    };

    if matches!(current.data, BlockTokenData::IdentifierLiteral { .. }) {
        if let Some(next) = it.peek_next() {
            if is_colon(next) {
                // name :type
                result.name = Some(current.range.text.clone());
                it.advance(); // name
                it.advance(); // colon
                result.ty = types::parse_type_expression(it, context);
                if it.peek().is_some_and(is_assignment) {
                    it.advance();
                    parse_value(it, context, &mut result);
                }
                return non_empty(result);
            }
            if is_assignment(next) {
                // name =value
                result.name = Some(current.range.text.clone());
                it.advance(); // name
                it.advance(); // assignment
                parse_value(it, context, &mut result);
                return non_empty(result);
            }
        }
    }
    if is_colon(current) {
        // :typed
        it.advance();
        result.ty = types::parse_type_expression(it, context);
        if it.peek().is_some_and(is_assignment) {
            it.advance();
            parse_value(it, context, &mut result);
        }
        return non_empty(result);
    }
    // plain value
    parse_value(it, context, &mut result);
    if result.value.is_none() {
        return None;
    }
    Some(result)
}

fn non_empty(result: NameTypeValue) -> Option<NameTypeValue> {
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Parse a single expression: collect tokens until the single-slot rule
/// or a separator terminates it.
pub fn parse_single(it: &mut LineView<'_>, context: &mut Context<'_>) -> Option<Node> {
    let mut result = None;
    while it.valid() {
        if parse_step(&mut result, it, context) == ParseAction::Finish {
            break;
        }
    }
    result
}

/// One dispatch on the head token kind.
fn parse_step(
    result: &mut Option<Node>,
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> ParseAction {
    let Some(token) = it.peek() else {
        return ParseAction::Finish;
    };
    match &token.data {
        BlockTokenData::CommaSeparator
        | BlockTokenData::BracketClose
        | BlockTokenData::ColonSeparator => ParseAction::Finish,
        // comments are transparent inside lines
        BlockTokenData::CommentLiteral | BlockTokenData::WhiteSpaceSeparator => {
            it.advance();
            ParseAction::Continue
        }
        BlockTokenData::BracketOpen => {
            if result.is_some() {
                return ParseAction::Finish;
            }
            let tuple = parse_tuple(it, context);
            *result = Some(Node::NameTypeValueTuple(tuple));
            ParseAction::Continue
        }
        BlockTokenData::StringLiteral { .. }
        | BlockTokenData::NumberLiteral(_)
        | BlockTokenData::BlockLiteral(_) => {
            if result.is_some() {
                return ParseAction::Finish;
            }
            *result = Some(Node::Value(token_value(token, context)));
            it.advance();
            ParseAction::Continue
        }
        BlockTokenData::IdentifierLiteral { .. } | BlockTokenData::OperatorLiteral { .. } => {
            let entries = lookup_identifier(token, result, context);
            if entries.is_empty() {
                if result.is_some() {
                    return ParseAction::Finish;
                }
                // unresolved names stay in the tree as literal values
                *result = Some(Node::Value(token_value(token, context)));
                it.advance();
                ParseAction::Continue
            } else {
                parse_instance(result, &entries, token, it, context)
            }
        }
    }
}

/// Resolve an identifier, honoring module member access: when the current
/// result is a module reference, the lookup happens in that module's
/// locals and the reference is consumed.
fn lookup_identifier(
    token: &BlockToken,
    result: &mut Option<Node>,
    context: &mut Context<'_>,
) -> Vec<EntryId> {
    let Some(name) = token.name() else {
        return Vec::new();
    };
    if let Some(Node::ModuleReference(module)) = result {
        let module = *module;
        *result = None;
        return context.instances.module(module).locals.get(name).to_vec();
    }
    match context.lookup(name) {
        Ok(entries) => entries,
        // a plain unknown name becomes a literal value, silently
        Err(LookupError::NameNotFound { .. }) if !name.contains('.') => Vec::new(),
        Err(error) => {
            context.diagnostics.report(Diagnostic::error(
                lookup_error_kind(&error),
                token.range.clone(),
                error.to_string(),
            ));
            Vec::new()
        }
    }
}

pub(crate) fn lookup_error_kind(error: &LookupError) -> DiagnosticKind {
    match error {
        LookupError::NameNotFound { .. } => DiagnosticKind::NameNotFound,
        LookupError::NotAModule { .. } => DiagnosticKind::NotAModule,
        LookupError::NestedNameNotFound { .. } => DiagnosticKind::NestedNameNotFound,
        LookupError::Ambiguous { .. } => DiagnosticKind::AmbiguousName,
    }
}

/// Continue the expression with a resolved scope entry.
fn parse_instance(
    result: &mut Option<Node>,
    entries: &[EntryId],
    token: &BlockToken,
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> ParseAction {
    let Some(first) = entries.first() else {
        return ParseAction::Finish;
    };
    match *first {
        EntryId::Variable(id) => {
            if result.is_some() {
                return ParseAction::Finish;
            }
            *result = Some(Node::VariableReference(id));
            it.advance();
            ParseAction::Continue
        }
        EntryId::Parameter(reference) => {
            if result.is_some() {
                return ParseAction::Finish;
            }
            *result = Some(Node::ParameterReference(reference));
            it.advance();
            ParseAction::Continue
        }
        EntryId::Module(id) => {
            if result.is_some() {
                return ParseAction::Finish;
            }
            *result = Some(Node::ModuleReference(id));
            it.advance();
            ParseAction::Continue
        }
        EntryId::Type(_) => {
            // a type name is not an expression; consumed without a node
            if result.is_some() {
                return ParseAction::Finish;
            }
            it.advance();
            ParseAction::Continue
        }
        EntryId::Function(_) => {
            it.advance();
            // a multi-bound name fronted by a function resolves over all
            // its function entries
            let overloads: Vec<FunctionId> = entries
                .iter()
                .filter_map(|entry| match entry {
                    EntryId::Function(function) => Some(*function),
                    _ => None,
                })
                .collect();
            call::parse_call(result, &overloads, &token.range, it, context)
        }
    }
}

/// Wrap a literal token as a typed value.
pub(crate) fn token_value(token: &BlockToken, context: &Context<'_>) -> Value {
    let (data, kind) = match &token.data {
        BlockTokenData::IdentifierLiteral { .. } => (
            ValueData::Identifier(token.range.clone()),
            ValueKind::Identifier,
        ),
        BlockTokenData::OperatorLiteral { .. } => {
            (ValueData::Operator(token.range.clone()), ValueKind::Operator)
        }
        BlockTokenData::StringLiteral { text } => (
            ValueData::String {
                range: token.range.clone(),
                text: text.clone(),
            },
            ValueKind::String,
        ),
        BlockTokenData::NumberLiteral(literal) => (
            ValueData::Number {
                range: token.range.clone(),
                literal: literal.clone(),
            },
            ValueKind::Number,
        ),
        BlockTokenData::BlockLiteral(block) => (
            ValueData::Block {
                range: token.range.clone(),
                block: block.clone(),
            },
            ValueKind::Block,
        ),
        _ => unreachable!("separators have no value form"),
    };
    Value {
        data,
        ty: context.intrinsic_type(kind),
    }
}

/// Wrap a whole name/type/value triple as a value of the intrinsic
/// NameTypeValue type.
pub(crate) fn wrap_name_type_value(typed: NameTypeValue, context: &Context<'_>) -> Node {
    Node::Value(Value {
        data: ValueData::NameTypeValue(Box::new(typed)),
        ty: context.intrinsic_type(ValueKind::NameTypeValue),
    })
}

/// Parse an argument with the parser its parameter's type dictates.
pub(crate) fn parse_with_kind(
    kind: ParserKind,
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> Option<Node> {
    match kind {
        ParserKind::Expression => parse_single(it, context),
        ParserKind::SingleToken => parse_single_token(it, context),
        ParserKind::IdTypeValue => {
            parse_typed(it, context).map(|typed| wrap_name_type_value(typed, context))
        }
    }
}

/// Consume exactly one literal or identifier token as a value.
fn parse_single_token(it: &mut LineView<'_>, context: &mut Context<'_>) -> Option<Node> {
    let token = it.peek()?;
    match token.data {
        BlockTokenData::IdentifierLiteral { .. }
        | BlockTokenData::OperatorLiteral { .. }
        | BlockTokenData::StringLiteral { .. }
        | BlockTokenData::NumberLiteral(_)
        | BlockTokenData::BlockLiteral(_) => {
            let value = token_value(token, context);
            it.advance();
            Some(Node::Value(value))
        }
        _ => None,
    }
}

/// Parse one name/type/value triple with unconditional leading-name
/// extraction - a lone identifier is a name here, not a value.
fn parse_typed(it: &mut LineView<'_>, context: &mut Context<'_>) -> Option<NameTypeValue> {
    let mut result = NameTypeValue::default();
    if let Some(token) = it.peek() {
        if matches!(token.data, BlockTokenData::IdentifierLiteral { .. }) {
            result.name = Some(token.range.text.clone());
            it.advance();
        }
    }
    if it.peek().is_some_and(is_colon) {
        it.advance();
        result.ty = types::parse_type_expression(it, context);
    }
    if it.peek().is_some_and(is_assignment) {
        it.advance();
        result.value = parse_single(it, context);
    }
    non_empty(result)
}
