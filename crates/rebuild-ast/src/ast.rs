//! Parser nodes.
//!
//! The semantic parser produces a [`Block`] of [`Node`]s per source file.
//! Node kinds are a closed sum with exhaustive matching everywhere; no
//! dynamic dispatch. References into the scope are arena ids - the
//! [`crate::instance::Instances`] arena owns the entries, nodes borrow.
//!
//! Nodes are read-only once built, with one exception: compile-time call
//! substitution replaces a `Call` by the node the intrinsic returned, in
//! place in its parent container.

use crate::blocks::BlockLiteral;
use crate::foundation::SourceRange;
use crate::instance::{FunctionId, ModuleId, ParameterRef, TypeId, VariableId};
use crate::token::NumberLiteral;
use serde::{Deserialize, Serialize};

/// The closed sum of parser nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Block(Block),
    Call(Call),
    /// Executed form of an intrinsic call; produced by later stages
    IntrinsicCall(IntrinsicCall),
    VariableReference(VariableId),
    ParameterReference(ParameterRef),
    ModuleReference(ModuleId),
    /// Reference to an element of the enclosing tuple
    NameTypeValueReference(NameTypeValueReference),
    VariableInit(VariableInit),
    NameTypeValueTuple(NameTypeValueTuple),
    Value(Value),
}

impl Node {
    /// View this node as a literal value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// An ordered sequence of nodes, one per parsed line expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub nodes: Vec<Node>,
}

/// A resolved call with fully assigned arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub function: FunctionId,
    pub arguments: Vec<ArgumentAssignment>,
}

impl Call {
    /// Values assigned to the parameter at `index`, if any.
    pub fn argument_values(&self, index: u32) -> Option<&[Node]> {
        self.arguments
            .iter()
            .find(|assignment| assignment.parameter.index == index)
            .map(|assignment| assignment.values.as_slice())
    }
}

/// A call bound to its host routine; opaque to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicCall {
    pub function: FunctionId,
    pub arguments: Vec<ArgumentAssignment>,
}

/// Values bound to one parameter of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentAssignment {
    pub parameter: ParameterRef,
    pub values: Vec<Node>,
}

/// Initialization of a declared variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInit {
    pub variable: VariableId,
    pub value: Box<Node>,
}

/// Back-reference to a named element of the nearest enclosing tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTypeValueReference {
    pub element: u32,
}

/// The `(name?, type?, value?)` triple used for tuple elements, parameter
/// declarations and argument binding. At least one field is set; the
/// parser drops candidates where all three stayed empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameTypeValue {
    pub name: Option<String>,
    pub ty: Option<TypeExpression>,
    pub value: Option<Node>,
}

impl NameTypeValue {
    /// True when only the value field is set.
    pub fn only_value(&self) -> bool {
        self.name.is_none() && self.ty.is_none() && self.value.is_some()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ty.is_none() && self.value.is_none()
    }
}

/// An ordered tuple of [`NameTypeValue`] elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameTypeValueTuple {
    pub tuple: Vec<NameTypeValue>,
}

/// A type position in the AST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpression {
    /// Not yet resolved
    #[default]
    Auto,
    /// Pointer to a target type
    Pointer { target: Box<TypeExpression> },
    /// A concrete registered type
    Instance(TypeId),
}

impl TypeExpression {
    /// The concrete type id, if this is a direct instance.
    pub fn instance(&self) -> Option<TypeId> {
        match self {
            TypeExpression::Instance(id) => Some(*id),
            _ => None,
        }
    }
}

/// A literal value carrying its intrinsic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub data: ValueData,
    pub ty: TypeExpression,
}

impl Value {
    /// The concrete type id, if the value's type resolved.
    pub fn type_id(&self) -> Option<TypeId> {
        self.ty.instance()
    }

    /// Source range of the underlying token, where one exists.
    pub fn range(&self) -> Option<&SourceRange> {
        match &self.data {
            ValueData::Identifier(range) | ValueData::Operator(range) => Some(range),
            ValueData::String { range, .. } | ValueData::Number { range, .. } => Some(range),
            ValueData::Block { range, .. } => Some(range),
            ValueData::NameTypeValue(_) => None,
        }
    }
}

/// Payload of a [`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    /// Unresolved identifier kept as data; name in `range.text`
    Identifier(SourceRange),
    /// Unresolved operator kept as data
    Operator(SourceRange),
    String {
        range: SourceRange,
        text: String,
    },
    Number {
        range: SourceRange,
        literal: NumberLiteral,
    },
    /// An unparsed nested block passed as a value
    Block {
        range: SourceRange,
        block: BlockLiteral,
    },
    /// A whole name/type/value triple passed as a value
    NameTypeValue(Box<NameTypeValue>),
}

impl ValueData {
    /// The intrinsic-type tag for this payload.
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueData::Identifier(_) => ValueKind::Identifier,
            ValueData::Operator(_) => ValueKind::Operator,
            ValueData::String { .. } => ValueKind::String,
            ValueData::Number { .. } => ValueKind::Number,
            ValueData::Block { .. } => ValueKind::Block,
            ValueData::NameTypeValue(_) => ValueKind::NameTypeValue,
        }
    }
}

/// Static tags for the value kinds backed by intrinsic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Identifier,
    Operator,
    String,
    Number,
    Block,
    NameTypeValue,
}
