//! Host routines behind the intrinsic functions.
//!
//! Handlers validate their arguments hard: the resolver guarantees shape
//! only loosely (convertibility is still permissive), so every extraction
//! failure is a recoverable [`IntrinsicError`] that the registry turns
//! into a diagnostic.

use crate::registry::Registry;
use rebuild_ast::ast::{Call, NameTypeValue, Node, Value, ValueData};
use rebuild_ast::blocks::BlockLiteral;
use rebuild_ast::foundation::SourceRange;
use rebuild_ast::instance::{
    EntryId, Function, Module, Parameter, ParameterRef, ParameterSide, Variable,
};
use rebuild_parser::{parser, Context};
use thiserror::Error;
use tracing::debug;

/// Why a host routine rejected its call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrinsicError {
    #[error("argument '{0}' is missing")]
    MissingArgument(&'static str),
    #[error("argument '{0}' is not a name/type/value triple")]
    NotATriple(&'static str),
    #[error("argument '{0}' is not a tuple")]
    NotATuple(&'static str),
    #[error("argument '{0}' is not an identifier")]
    NotAnIdentifier(&'static str),
    #[error("argument '{0}' is not a block")]
    NotABlock(&'static str),
    #[error("argument '{0}' is not a string")]
    NotAString(&'static str),
    #[error("argument '{0}' carries no name")]
    MissingName(&'static str),
    #[error("a declared parameter carries no name")]
    UnnamedParameter,
    #[error("value has no printable form")]
    Unprintable,
}

/// The single value bound to the parameter called `name`.
fn argument<'c>(
    context: &Context<'_>,
    call: &'c Call,
    name: &'static str,
) -> Result<&'c Node, IntrinsicError> {
    let function = context.instances.function(call.function);
    let (index, _) = function
        .lookup_parameter(name)
        .ok_or(IntrinsicError::MissingArgument(name))?;
    call.argument_values(index)
        .and_then(<[Node]>::first)
        .ok_or(IntrinsicError::MissingArgument(name))
}

fn triple<'c>(node: &'c Node, name: &'static str) -> Result<&'c NameTypeValue, IntrinsicError> {
    match node {
        Node::Value(Value {
            data: ValueData::NameTypeValue(triple),
            ..
        }) => Ok(triple),
        _ => Err(IntrinsicError::NotATriple(name)),
    }
}

fn identifier_text(node: &Node, name: &'static str) -> Result<String, IntrinsicError> {
    match node {
        Node::Value(Value {
            data: ValueData::Identifier(range),
            ..
        }) => Ok(range.text.clone()),
        _ => Err(IntrinsicError::NotAnIdentifier(name)),
    }
}

fn block_literal<'c>(node: &'c Node, name: &'static str) -> Result<&'c BlockLiteral, IntrinsicError> {
    match node {
        Node::Value(Value {
            data: ValueData::Block { block, .. },
            ..
        }) => Ok(block),
        _ => Err(IntrinsicError::NotABlock(name)),
    }
}

fn string_text(node: &Node, name: &'static str) -> Result<String, IntrinsicError> {
    match node {
        Node::Value(Value {
            data: ValueData::String { text, .. },
            ..
        }) => Ok(text.clone()),
        _ => Err(IntrinsicError::NotAString(name)),
    }
}

/// View a tuple-shaped argument as its elements. A lone triple value
/// counts as a one-element tuple.
fn tuple_elements(node: &Node, name: &'static str) -> Result<Vec<NameTypeValue>, IntrinsicError> {
    match node {
        Node::NameTypeValueTuple(tuple) => Ok(tuple.tuple.clone()),
        Node::Value(Value {
            data: ValueData::NameTypeValue(triple),
            ..
        }) => Ok(vec![(**triple).clone()]),
        _ => Err(IntrinsicError::NotATuple(name)),
    }
}

/// Turn declared tuple elements into parameters of one side.
fn parameters_from(
    elements: Vec<NameTypeValue>,
    side: ParameterSide,
) -> Result<Vec<Parameter>, IntrinsicError> {
    elements
        .into_iter()
        .map(|element| {
            let name = element.name.ok_or(IntrinsicError::UnnamedParameter)?;
            Ok(Parameter {
                name,
                ty: element.ty.unwrap_or_default(),
                side,
                optional: false,
            })
        })
        .collect()
}

/// `Context.declareVariable name :Type = value`
pub(crate) fn declare_variable(
    context: &mut Context<'_>,
    call: &Call,
) -> Result<Option<Node>, IntrinsicError> {
    let declared = triple(argument(context, call, "variable")?, "variable")?.clone();
    let name = declared.name.ok_or(IntrinsicError::MissingName("variable"))?;

    let variable = context.instances.add_variable(Variable {
        name: name.clone(),
        ty: declared.ty.unwrap_or_default(),
        value: declared.value,
    });
    context
        .scope
        .declare(context.instances, name.clone(), EntryId::Variable(variable));
    debug!(%name, "declared variable");
    Ok(None)
}

/// `Context.declareFunction left=(...) name (right...) (results...):`
///
/// The body block parses immediately, in a fresh scope frame seeded with
/// the parameters - compile-time calls inside it run now.
pub(crate) fn declare_function(
    context: &mut Context<'_>,
    call: &Call,
) -> Result<Option<Node>, IntrinsicError> {
    let name = identifier_text(argument(context, call, "name")?, "name")?;
    let left = tuple_elements(argument(context, call, "left")?, "left")?;
    let right = tuple_elements(argument(context, call, "right")?, "right")?;
    let results = tuple_elements(argument(context, call, "results")?, "results")?;
    let body = block_literal(argument(context, call, "block")?, "block")?.clone();

    let mut function = Function::new(name.clone());
    for parameter in parameters_from(left, ParameterSide::Left)? {
        function.push_parameter(parameter);
    }
    for parameter in parameters_from(right, ParameterSide::Right)? {
        function.push_parameter(parameter);
    }
    for parameter in parameters_from(results, ParameterSide::Result)? {
        function.push_parameter(parameter);
    }
    let parameter_names: Vec<(u32, String)> = function
        .parameters()
        .iter()
        .enumerate()
        .map(|(index, parameter)| (index as u32, parameter.name.clone()))
        .collect();

    // declared before the body parses, so the body can call it
    let function = context.instances.add_function(function);
    context
        .scope
        .declare(context.instances, name.clone(), EntryId::Function(function));

    context.scope.push();
    for (index, parameter_name) in parameter_names {
        context.scope.declare(
            context.instances,
            parameter_name,
            EntryId::Parameter(ParameterRef { function, index }),
        );
    }
    let body = parser::parse(&body, context);
    context.scope.pop();
    context.instances.function_mut(function).body = Some(body);

    debug!(%name, "declared function");
    Ok(None)
}

/// `Context.declareModule name:` - the block parses with the module's
/// locals as the innermost frame, so inner declarations land in the
/// module.
pub(crate) fn declare_module(
    context: &mut Context<'_>,
    call: &Call,
) -> Result<Option<Node>, IntrinsicError> {
    let name = identifier_text(argument(context, call, "name")?, "name")?;
    let body = block_literal(argument(context, call, "block")?, "block")?.clone();

    let module = context.instances.add_module(Module::new(name.clone()));
    context
        .scope
        .declare(context.instances, name.clone(), EntryId::Module(module));

    context.scope.push_module(module);
    // parsed for its declaration side effects
    parser::parse(&body, context);
    context.scope.pop();

    debug!(%name, "declared module");
    Ok(None)
}

/// `say value` - renders the value into the registry's output sink.
pub(crate) fn say(
    registry: &Registry,
    context: &mut Context<'_>,
    call: &Call,
) -> Result<Option<Node>, IntrinsicError> {
    let message = render(argument(context, call, "message")?)?;
    debug!(%message, "say");
    registry.push_output(message);
    Ok(None)
}

fn render(node: &Node) -> Result<String, IntrinsicError> {
    let value = node.as_value().ok_or(IntrinsicError::Unprintable)?;
    match &value.data {
        ValueData::String { text, .. } => Ok(text.clone()),
        ValueData::Number { literal, .. } => Ok(literal.to_string()),
        ValueData::Identifier(range) | ValueData::Operator(range) => Ok(range.text.clone()),
        ValueData::Block { .. } | ValueData::NameTypeValue(_) => Err(IntrinsicError::Unprintable),
    }
}

/// `concat a b` - the value-producing compile-time path: the result
/// replaces the call node and carries the declared result type.
pub(crate) fn concat(
    context: &mut Context<'_>,
    call: &Call,
) -> Result<Option<Node>, IntrinsicError> {
    let a = string_text(argument(context, call, "a")?, "a")?;
    let b = string_text(argument(context, call, "b")?, "b")?;
    let ty = context
        .instances
        .function(call.function)
        .result_parameter()
        .map(|(_, parameter)| parameter.ty.clone())
        .unwrap_or_default();
    Ok(Some(Node::Value(Value {
        data: ValueData::String {
            range: SourceRange::default(),
            text: format!("{}{}", a, b),
        },
        ty,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_ast::ast::TypeExpression;
    use rebuild_ast::foundation::Position;
    use rebuild_ast::token::NumberLiteral;

    fn number_value(text: &str) -> Node {
        Node::Value(Value {
            data: ValueData::Number {
                range: SourceRange::at(Position::default()),
                literal: NumberLiteral::decimal(text),
            },
            ty: TypeExpression::Auto,
        })
    }

    #[test]
    fn render_covers_the_printable_kinds() {
        assert_eq!(render(&number_value("42")).unwrap(), "42");

        let text = Node::Value(Value {
            data: ValueData::String {
                range: SourceRange::at(Position::default()),
                text: "hi".into(),
            },
            ty: TypeExpression::Auto,
        });
        assert_eq!(render(&text).unwrap(), "hi");

        let triple = Node::Value(Value {
            data: ValueData::NameTypeValue(Box::new(NameTypeValue::default())),
            ty: TypeExpression::Auto,
        });
        assert_eq!(render(&triple), Err(IntrinsicError::Unprintable));
    }

    #[test]
    fn parameters_require_names() {
        let named = vec![NameTypeValue {
            name: Some("a".into()),
            ty: None,
            value: None,
        }];
        let parameters = parameters_from(named, ParameterSide::Right).unwrap();
        assert_eq!(parameters[0].name, "a");
        assert_eq!(parameters[0].ty, TypeExpression::Auto);

        let unnamed = vec![NameTypeValue {
            name: None,
            ty: None,
            value: Some(number_value("1")),
        }];
        assert_eq!(
            parameters_from(unnamed, ParameterSide::Right),
            Err(IntrinsicError::UnnamedParameter)
        );
    }
}
