//! Overload resolution and call construction.
//!
//! Every overload candidate speculates over its own clone of the line
//! cursor; the winner commits its cursor back to the caller. Candidates
//! never abort the parse - failure and ambiguity both fall back to "no
//! call", leaving the left expression as it was.

use crate::context::Context;
use crate::eval;
use crate::parser::{
    parse_optional_comma, parse_single_typed_with, parse_with_kind, wrap_name_type_value,
    ParseAction,
};
use crate::parser::types::parser_kind_for;
use crate::view::LineView;
use rebuild_ast::ast::{ArgumentAssignment, Call, NameTypeValue, Node, ValueKind};
use rebuild_ast::blocks::BlockTokenData;
use rebuild_ast::error::{Diagnostic, DiagnosticKind};
use rebuild_ast::foundation::SourceRange;
use rebuild_ast::instance::{FunctionId, ParameterRef, ParameterSide};
use tracing::trace;

/// One overload candidate.
struct Overload<'a> {
    active: bool,
    complete: bool,
    has_blocks: bool,
    function: FunctionId,
    it: LineView<'a>,
    right_args: Vec<ArgumentAssignment>,
    next_arg: usize,
    /// Declaration indices of parameters already bound, by name or
    /// position; the positional cursor skips them
    assigned: Vec<u32>,
    /// Why this candidate retired, for the no-match diagnostic
    fail: Option<(DiagnosticKind, String)>,
}

impl<'a> Overload<'a> {
    fn new(function: FunctionId, it: &LineView<'a>, context: &Context<'_>) -> Self {
        let has_parameters = !context.instances.function(function).parameters().is_empty();
        Self {
            active: has_parameters,
            complete: !has_parameters,
            has_blocks: false,
            function,
            it: it.clone(),
            right_args: Vec::new(),
            next_arg: 0,
            assigned: Vec::new(),
            fail: None,
        }
    }

    /// Record a binding and move the positional cursor past every
    /// parameter that is already bound.
    fn assign(&mut self, index: u32, value: Node, context: &Context<'_>) {
        self.right_args.push(ArgumentAssignment {
            parameter: ParameterRef {
                function: self.function,
                index,
            },
            values: vec![value],
        });
        self.assigned.push(index);
        let function = context.instances.function(self.function);
        while let Some((declared, _)) = function.right_parameter_at(self.next_arg) {
            if !self.assigned.contains(&declared) {
                break;
            }
            self.next_arg += 1;
        }
    }

    fn retire(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.active = false;
        if self.fail.is_none() {
            self.fail = Some((kind, message.into()));
        }
    }

    /// Phase 1: match the left expression against the left parameters.
    fn retire_left(&mut self, left: &[(Option<&str>, Option<&Node>)], context: &Context<'_>) {
        let function = context.instances.function(self.function);
        let mut positional = 0usize;
        let mut named = 0usize;

        for (name, value) in left {
            let Some(value) = value else {
                self.retire(
                    DiagnosticKind::NoMatchingOverload,
                    "left tuple element carries no value",
                );
                return;
            };
            if let Some(name) = name {
                match function.lookup_parameter(name) {
                    Some((_, parameter)) if parameter.side == ParameterSide::Left => {
                        if context.can_implicit_convert(value, &parameter.ty) {
                            named += 1;
                            continue;
                        }
                        self.retire(
                            DiagnosticKind::ArgumentTypeMismatch,
                            format!("left value does not convert to '{}'", name),
                        );
                    }
                    Some(_) => self.retire(
                        DiagnosticKind::WrongParameterSide,
                        format!("'{}' is not a left parameter", name),
                    ),
                    None => self.retire(
                        DiagnosticKind::UnknownNamedArgument,
                        format!("no parameter named '{}'", name),
                    ),
                }
                return;
            }
            match function.left_parameter_at(positional) {
                Some((_, parameter)) => {
                    if context.can_implicit_convert(value, &parameter.ty) {
                        positional += 1;
                        continue;
                    }
                    self.retire(
                        DiagnosticKind::ArgumentTypeMismatch,
                        "left value does not convert to the parameter type",
                    );
                }
                None => self.retire(
                    DiagnosticKind::NoMatchingOverload,
                    "more left values than left parameters",
                ),
            }
            return;
        }

        if positional + named != function.left_count() {
            self.retire(
                DiagnosticKind::NoMatchingOverload,
                "left value count does not match the left parameters",
            );
        }
    }
}

/// The candidates for one function name.
struct OverloadSet<'a> {
    overloads: Vec<Overload<'a>>,
}

impl<'a> OverloadSet<'a> {
    fn new(functions: &[FunctionId], it: &LineView<'a>, context: &Context<'_>) -> Self {
        Self {
            overloads: functions
                .iter()
                .map(|function| Overload::new(*function, it, context))
                .collect(),
        }
    }

    fn retire_left(&mut self, left: &Option<Node>, context: &Context<'_>) {
        let elements = left_elements(left);
        for overload in self.overloads.iter_mut().filter(|o| o.active) {
            overload.retire_left(&elements, context);
        }
    }

    fn any_active(&self) -> bool {
        self.overloads.iter().any(|o| o.active)
    }

    fn set_cursors(&mut self, it: &LineView<'a>) {
        for overload in &mut self.overloads {
            overload.it = it.clone();
        }
    }

    fn completed(&self) -> Vec<usize> {
        self.overloads
            .iter()
            .enumerate()
            .filter(|(_, o)| o.complete)
            .map(|(index, _)| index)
            .collect()
    }
}

/// View the left expression as name/value pairs.
///
/// A tuple contributes its elements; any other node is a single unnamed
/// value; no node means no left arguments.
fn left_elements(left: &Option<Node>) -> Vec<(Option<&str>, Option<&Node>)> {
    match left {
        None => Vec::new(),
        Some(Node::NameTypeValueTuple(tuple)) => tuple
            .tuple
            .iter()
            .map(|typed| (typed.name.as_deref(), typed.value.as_ref()))
            .collect(),
        Some(node) => vec![(None, Some(node))],
    }
}

/// Resolve one call: select an overload, bind arguments, build the node.
///
/// `left` is the single-expression slot; on success it receives the call
/// node (possibly already evaluated). Returns whether the enclosing
/// single-expression continues.
pub(crate) fn parse_call(
    left: &mut Option<Node>,
    functions: &[FunctionId],
    name_range: &SourceRange,
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> ParseAction {
    let mut set = OverloadSet::new(functions, it, context);
    set.retire_left(left, context);

    let snapshot = it.clone();
    let mut with_brackets = false;
    if set.any_active() && it.valid() {
        if matches!(
            it.peek().map(|token| &token.data),
            Some(BlockTokenData::BracketOpen)
        ) {
            with_brackets = true;
            it.advance();
        }
        set.set_cursors(it);
        parse_arguments(&mut set, context);
    }

    let completed = set.completed();
    if let [index] = completed.as_slice() {
        let winner = set.overloads.swap_remove(*index);
        *it = winner.it;
        if with_brackets {
            match it.peek() {
                Some(token) if matches!(token.data, BlockTokenData::BracketClose) => {
                    it.advance();
                }
                _ => context.diagnostics.report(Diagnostic::error(
                    DiagnosticKind::MissingClosingBracket,
                    name_range.clone(),
                    "argument list is never closed",
                )),
            }
        }
        trace!(function = %winner.function, args = winner.right_args.len(), "resolved call");
        let call = Call {
            function: winner.function,
            arguments: winner.right_args,
        };
        let has_blocks = winner.has_blocks;
        *left = Some(eval::build_call_node(call, context));
        return if has_blocks {
            // a block argument binds tightly; the expression ends here
            ParseAction::Finish
        } else {
            ParseAction::Continue
        };
    }

    if completed.len() > 1 {
        context.diagnostics.report(Diagnostic::error(
            DiagnosticKind::AmbiguousOverload,
            name_range.clone(),
            format!("{} overloads match this call", completed.len()),
        ));
    } else {
        report_no_match(&set, name_range, context);
    }

    if with_brackets {
        *it = snapshot;
    }
    if left.is_some() {
        ParseAction::Finish
    } else {
        ParseAction::Continue
    }
}

/// No candidate completed: report, with the candidates' retirement
/// reasons attached. A single candidate keeps its specific kind.
fn report_no_match(set: &OverloadSet<'_>, name_range: &SourceRange, context: &mut Context<'_>) {
    let mut diagnostic = match set.overloads.as_slice() {
        [only] => {
            let (kind, message) = only.fail.clone().unwrap_or((
                DiagnosticKind::NoMatchingOverload,
                "the call never completed its arguments".into(),
            ));
            Diagnostic::error(kind, name_range.clone(), message)
        }
        _ => Diagnostic::error(
            DiagnosticKind::NoMatchingOverload,
            name_range.clone(),
            format!("none of {} overloads matches this call", set.overloads.len()),
        ),
    };
    if set.overloads.len() > 1 {
        for overload in &set.overloads {
            if let Some((_, message)) = &overload.fail {
                diagnostic = diagnostic.with_note(format!(
                    "{}: {}",
                    context.instances.function(overload.function).name,
                    message
                ));
            }
        }
    }
    context.diagnostics.report(diagnostic);
}

/// Phase 2: every active candidate consumes right arguments in parallel
/// over its own cursor until it completes or retires.
fn parse_arguments(set: &mut OverloadSet<'_>, context: &mut Context<'_>) {
    while set.any_active() {
        for overload in set.overloads.iter_mut().filter(|o| o.active) {
            step_overload(overload, context);
        }
    }
}

/// Consume one argument for one candidate.
fn step_overload(overload: &mut Overload<'_>, context: &mut Context<'_>) {
    let position_before = overload.it.position();
    let function_id = overload.function;
    let right_count = context.instances.function(function_id).right_count();
    if right_count == 0 {
        // left-only signature: phase 1 already decided
        overload.complete = true;
        overload.active = false;
        return;
    }
    let Some((position_index, position_parameter)) = context
        .instances
        .function(function_id)
        .right_parameter_at(overload.next_arg)
    else {
        overload.active = false;
        return;
    };
    let position_ty = position_parameter.ty.clone();

    let typed = parse_single_typed_with(&mut overload.it, context, |it, context, typed| {
        // a named argument is parsed by the named parameter's parser
        if let (Some(name), None) = (typed.name.as_deref(), &typed.ty) {
            let named = context
                .instances
                .function(function_id)
                .lookup_parameter(name)
                .map(|(_, parameter)| parameter.ty.clone());
            if let Some(named_ty) = named {
                let kind = parser_kind_for(&named_ty, context.instances);
                typed.value = parse_with_kind(kind, it, context);
                return;
            }
        }
        let kind = parser_kind_for(&position_ty, context.instances);
        typed.value = parse_with_kind(kind, it, context);
    });

    if let Some(mut typed) = typed {
        if typed.ty.is_some() || typed.value.is_none() {
            // a type-annotated (or valueless) element only fits a
            // parameter of the intrinsic NameTypeValue type, which takes
            // the whole triple as its value
            if context.is_intrinsic_type(&position_ty, ValueKind::NameTypeValue) {
                let value = wrap_name_type_value(typed, context);
                overload.assign(position_index, value, context);
            } else {
                overload.retire(
                    DiagnosticKind::ArgumentTypeMismatch,
                    "type annotation where a plain value is expected",
                );
            }
        } else {
            if is_block_value(typed.value.as_ref(), context) {
                overload.has_blocks = true;
            }
            if let Some(name) = typed.name.clone() {
                assign_named(overload, &name, typed, context);
            } else if let Some(value) = typed.value.take() {
                if context.can_implicit_convert(&value, &position_ty) {
                    overload.assign(position_index, value, context);
                } else {
                    overload.retire(
                        DiagnosticKind::ArgumentTypeMismatch,
                        "argument does not convert to the parameter type",
                    );
                }
            }
        }
    }
    // no value parsed: fall through to the separator logic, which ends
    // the candidate at a line boundary

    if overload.next_arg == right_count {
        overload.complete = true;
        overload.active = false;
    } else if overload.active && parse_optional_comma(&mut overload.it) == ParseAction::Finish {
        overload.retire(
            DiagnosticKind::NoMatchingOverload,
            "the argument list ends before all parameters are bound",
        );
    }

    // a candidate that neither consumed input nor finished cannot make
    // progress on the next round either
    if overload.active && overload.it.position() == position_before {
        overload.retire(
            DiagnosticKind::NoMatchingOverload,
            "no argument can be parsed here",
        );
    }
}

/// Bind a named argument. Any parameter side is addressable by name -
/// that is how left parameters are supplied when no left expression
/// precedes the call. Named bindings advance the positional cursor only
/// through the assigned-slot skip in [`Overload::assign`].
fn assign_named(
    overload: &mut Overload<'_>,
    name: &str,
    mut typed: NameTypeValue,
    context: &mut Context<'_>,
) {
    let found = context
        .instances
        .function(overload.function)
        .lookup_parameter(name)
        .map(|(index, parameter)| (index, parameter.ty.clone()));
    match found {
        Some((index, ty)) => {
            let Some(value) = typed.value.take() else {
                overload.retire(
                    DiagnosticKind::NoMatchingOverload,
                    format!("named argument '{}' has no value", name),
                );
                return;
            };
            if context.can_implicit_convert(&value, &ty) {
                overload.assign(index, value, context);
            } else {
                overload.retire(
                    DiagnosticKind::ArgumentTypeMismatch,
                    format!("value for '{}' does not convert", name),
                );
            }
        }
        None => overload.retire(
            DiagnosticKind::UnknownNamedArgument,
            format!("no parameter named '{}'", name),
        ),
    }
}

fn is_block_value(node: Option<&Node>, context: &Context<'_>) -> bool {
    node.and_then(Node::as_value)
        .is_some_and(|value| context.is_intrinsic_type(&value.ty, ValueKind::Block))
}
