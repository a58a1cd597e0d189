//! Compile-time dispatch: deciding which calls run while parsing.
//!
//! A call is directly executable when its function is flagged compile-time
//! and every argument value is fully static - literal values, constant
//! tuples, and calls that recursively satisfy the same rule. References,
//! blocks and initializations never are: they need a runtime.

use crate::context::Context;
use rebuild_ast::ast::{Call, NameTypeValue, Node, TypeExpression};
use rebuild_ast::instance::Instances;
use tracing::trace;

/// Build the AST node for a resolved call, running it now when possible.
///
/// A compile-time call that produces a value replaces the call node; one
/// that produces nothing (declarations, output) keeps its call node with
/// the side effects already applied.
pub fn build_call_node(call: Call, context: &mut Context<'_>) -> Node {
    if is_directly_executable_call(&call, context.instances) {
        trace!(function = %call.function, "running compile-time call");
        if let Some(node) = context.run_call(&call) {
            return node;
        }
    }
    Node::Call(call)
}

/// Staticness of a node.
pub fn is_directly_executable(node: &Node, instances: &Instances) -> bool {
    match node {
        Node::Block(_)
        | Node::IntrinsicCall(_)
        | Node::VariableReference(_)
        | Node::ParameterReference(_)
        | Node::ModuleReference(_)
        | Node::NameTypeValueReference(_)
        | Node::VariableInit(_) => false,
        Node::Call(call) => is_directly_executable_call(call, instances),
        Node::NameTypeValueTuple(tuple) => tuple
            .tuple
            .iter()
            .all(|typed| is_directly_executable_typed(typed, instances)),
        Node::Value(_) => true,
    }
}

/// Staticness of a call: compile-time flag plus static arguments.
pub fn is_directly_executable_call(call: &Call, instances: &Instances) -> bool {
    if !instances.function(call.function).compile_time {
        return false;
    }
    call.arguments.iter().all(|assignment| {
        assignment
            .values
            .iter()
            .all(|value| is_directly_executable(value, instances))
    })
}

fn is_directly_executable_typed(typed: &NameTypeValue, instances: &Instances) -> bool {
    if let Some(value) = &typed.value {
        if !is_directly_executable(value, instances) {
            return false;
        }
    }
    if let Some(ty) = &typed.ty {
        if !is_directly_executable_type(ty) {
            return false;
        }
    }
    true
}

fn is_directly_executable_type(ty: &TypeExpression) -> bool {
    !matches!(ty, TypeExpression::Auto)
}
