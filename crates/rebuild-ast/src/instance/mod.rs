//! Scope instances: the entries a name can resolve to.
//!
//! The [`Instances`] arena owns every function, variable, module and type
//! of a compilation; scopes and AST nodes refer to them through copyable
//! ids. Entries are append-only within one compile - compile-time
//! intrinsics add entries while parsing, nothing removes them, so ids
//! stay stable for the lifetime of the arena.

mod scope;

pub use scope::{lookup, LocalScope, LookupError, ScopeStack};

use crate::ast::{Block, Node, TypeExpression, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Function`] in the arena.
    FunctionId, "fn"
);
arena_id!(
    /// Index of a [`Variable`] in the arena.
    VariableId, "var"
);
arena_id!(
    /// Index of a [`Module`] in the arena.
    ModuleId, "mod"
);
arena_id!(
    /// Index of a [`Type`] in the arena.
    TypeId, "type"
);

/// A parameter, addressed through its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterRef {
    pub function: FunctionId,
    pub index: u32,
}

impl fmt::Display for ParameterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.param#{}", self.function, self.index)
    }
}

/// One scope binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryId {
    Function(FunctionId),
    Variable(VariableId),
    Module(ModuleId),
    Type(TypeId),
    Parameter(ParameterRef),
}

/// Which side of the function name a parameter sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterSide {
    /// Before the name (prefix)
    Left,
    /// After the name
    #[default]
    Right,
    /// Produced, not consumed
    Result,
}

/// A declared function parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeExpression,
    pub side: ParameterSide,
    pub optional: bool,
}

impl Parameter {
    /// Create a right-side parameter with the given type.
    pub fn right(name: impl Into<String>, ty: TypeExpression) -> Self {
        Self {
            name: name.into(),
            ty,
            side: ParameterSide::Right,
            optional: false,
        }
    }

    /// Create a left-side parameter with the given type.
    pub fn left(name: impl Into<String>, ty: TypeExpression) -> Self {
        Self {
            side: ParameterSide::Left,
            ..Self::right(name, ty)
        }
    }

    /// Create a result parameter with the given type.
    pub fn result(name: impl Into<String>, ty: TypeExpression) -> Self {
        Self {
            side: ParameterSide::Result,
            ..Self::right(name, ty)
        }
    }
}

/// A declared function.
///
/// Projections of the left and right parameter lists are cached because the
/// overload resolver indexes into them per argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Calls may run during parsing when all arguments are static
    pub compile_time: bool,
    parameters: Vec<Parameter>,
    left: Vec<u32>,
    right: Vec<u32>,
    /// Parsed body for functions declared in source
    pub body: Option<Block>,
}

impl Function {
    /// Create a function with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a parameter, keeping the side projections current.
    pub fn push_parameter(&mut self, parameter: Parameter) -> u32 {
        let index = self.parameters.len() as u32;
        match parameter.side {
            ParameterSide::Left => self.left.push(index),
            ParameterSide::Right => self.right.push(index),
            ParameterSide::Result => {}
        }
        self.parameters.push(parameter);
        index
    }

    /// All parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameter by declaration index.
    pub fn parameter(&self, index: u32) -> &Parameter {
        &self.parameters[index as usize]
    }

    /// Number of left-side parameters.
    pub fn left_count(&self) -> usize {
        self.left.len()
    }

    /// Number of right-side parameters.
    pub fn right_count(&self) -> usize {
        self.right.len()
    }

    /// Positional left parameter, with its declaration index.
    pub fn left_parameter_at(&self, position: usize) -> Option<(u32, &Parameter)> {
        let index = *self.left.get(position)?;
        Some((index, &self.parameters[index as usize]))
    }

    /// Positional right parameter, with its declaration index.
    pub fn right_parameter_at(&self, position: usize) -> Option<(u32, &Parameter)> {
        let index = *self.right.get(position)?;
        Some((index, &self.parameters[index as usize]))
    }

    /// Find a parameter by name.
    pub fn lookup_parameter(&self, name: &str) -> Option<(u32, &Parameter)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, parameter)| parameter.name == name)
            .map(|(index, parameter)| (index as u32, parameter))
    }

    /// Find a result-side parameter.
    pub fn result_parameter(&self) -> Option<(u32, &Parameter)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, parameter)| parameter.side == ParameterSide::Result)
            .map(|(index, parameter)| (index as u32, parameter))
    }
}

/// A declared variable.
///
/// `value` holds the compile-time initializer when the declaration carried
/// one; later stages read it for constant propagation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: TypeExpression,
    pub value: Option<Node>,
}

/// A declared module owning its own scope.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub locals: LocalScope,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locals: LocalScope::new(),
        }
    }
}

/// How the argument of a parameter with this type is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParserKind {
    /// Full single-expression parse
    #[default]
    Expression,
    /// Consume exactly one literal or identifier token
    SingleToken,
    /// Parse one name/type/value triple
    IdTypeValue,
}

/// A registered type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub name: String,
    /// Sub-parser for arguments declared with this type
    pub parser: ParserKind,
}

impl Type {
    /// Create a type with the default expression parser.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parser: ParserKind::Expression,
        }
    }

    /// Create a type with an explicit argument parser.
    pub fn with_parser(name: impl Into<String>, parser: ParserKind) -> Self {
        Self {
            name: name.into(),
            parser,
        }
    }
}

/// Arena owning every scope entry of one compilation.
#[derive(Debug, Default)]
pub struct Instances {
    functions: Vec<Function>,
    variables: Vec<Variable>,
    modules: Vec<Module>,
    types: Vec<Type>,
    intrinsic_types: IndexMap<ValueKind, TypeId>,
}

impl Instances {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, returning its id.
    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    /// Function by id.
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// Mutable function by id.
    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    /// Add a variable, returning its id.
    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    /// Variable by id.
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    /// Add a module, returning its id.
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    /// Module by id.
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    /// Mutable module by id.
    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    /// Add a type, returning its id.
    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Type by id.
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Parameter through its function.
    pub fn parameter(&self, reference: ParameterRef) -> &Parameter {
        self.function(reference.function).parameter(reference.index)
    }

    /// Bind a value kind to its backing intrinsic type.
    pub fn register_intrinsic_type(&mut self, kind: ValueKind, id: TypeId) {
        self.intrinsic_types.insert(kind, id);
    }

    /// The intrinsic type backing a value kind, once registered.
    pub fn intrinsic_type(&self, kind: ValueKind) -> Option<TypeId> {
        self.intrinsic_types.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_projections_follow_sides() {
        let mut function = Function::new("apply");
        function.push_parameter(Parameter::left("subject", TypeExpression::Auto));
        function.push_parameter(Parameter::right("first", TypeExpression::Auto));
        function.push_parameter(Parameter::result("out", TypeExpression::Auto));
        function.push_parameter(Parameter::right("second", TypeExpression::Auto));

        assert_eq!(function.left_count(), 1);
        assert_eq!(function.right_count(), 2);
        assert_eq!(function.right_parameter_at(0).unwrap().1.name, "first");
        assert_eq!(function.right_parameter_at(1).unwrap().1.name, "second");
        assert_eq!(function.right_parameter_at(1).unwrap().0, 3);
        assert!(function.right_parameter_at(2).is_none());
        assert_eq!(function.result_parameter().unwrap().1.name, "out");
    }

    #[test]
    fn lookup_parameter_by_name() {
        let mut function = Function::new("f");
        function.push_parameter(Parameter::right("value", TypeExpression::Auto));
        assert_eq!(function.lookup_parameter("value").unwrap().0, 0);
        assert!(function.lookup_parameter("missing").is_none());
    }

    #[test]
    fn arena_ids_are_stable() {
        let mut instances = Instances::new();
        let f = instances.add_function(Function::new("first"));
        let g = instances.add_function(Function::new("second"));
        assert_eq!(instances.function(f).name, "first");
        assert_eq!(instances.function(g).name, "second");

        let t = instances.add_type(Type::with_parser("Block", ParserKind::SingleToken));
        instances.register_intrinsic_type(ValueKind::Block, t);
        assert_eq!(instances.intrinsic_type(ValueKind::Block), Some(t));
        assert_eq!(instances.intrinsic_type(ValueKind::String), None);
    }
}
