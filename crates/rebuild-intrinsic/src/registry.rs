//! Registry construction and compile-time dispatch.

use crate::ops::{self, IntrinsicError};
use indexmap::IndexMap;
use rebuild_ast::ast::{Call, Node, TypeExpression, ValueKind};
use rebuild_ast::error::{Diagnostic, DiagnosticKind};
use rebuild_ast::foundation::SourceRange;
use rebuild_ast::instance::{
    EntryId, Function, FunctionId, Instances, Module, Parameter, ParserKind, ScopeStack, Type,
};
use rebuild_parser::{Context, IntrinsicRunner};
use std::cell::RefCell;
use tracing::debug;

/// Host routine identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    DeclareVariable,
    DeclareFunction,
    DeclareModule,
    Say,
    Concat,
}

/// The intrinsic registry: function identity to host routine, plus the
/// output sink `say` writes to.
pub struct Registry {
    ops: IndexMap<FunctionId, Op>,
    output: RefCell<Vec<String>>,
}

impl Registry {
    /// Declare the `Rebuild` module tree into scope and build the
    /// registry binding its functions to host routines.
    pub fn install(instances: &mut Instances, scope: &mut ScopeStack) -> Self {
        let mut ops = IndexMap::new();

        // literal types, each wrapped in a module with a `type` entry
        let mut literal = Module::new("literal");
        let literal_type = |instances: &mut Instances,
                                literal: &mut Module,
                                kind: ValueKind,
                                name: &str,
                                parser: ParserKind| {
            let ty = instances.add_type(Type::with_parser(name, parser));
            instances.register_intrinsic_type(kind, ty);
            let mut module = Module::new(name);
            module.locals.declare("type", EntryId::Type(ty));
            let module = instances.add_module(module);
            literal.locals.declare(name, EntryId::Module(module));
            ty
        };
        let string_ty = literal_type(
            instances,
            &mut literal,
            ValueKind::String,
            "String",
            ParserKind::Expression,
        );
        literal_type(
            instances,
            &mut literal,
            ValueKind::Number,
            "Number",
            ParserKind::Expression,
        );
        let identifier_ty = literal_type(
            instances,
            &mut literal,
            ValueKind::Identifier,
            "Identifier",
            ParserKind::SingleToken,
        );
        literal_type(
            instances,
            &mut literal,
            ValueKind::Operator,
            "Operator",
            ParserKind::Expression,
        );
        let block_ty = literal_type(
            instances,
            &mut literal,
            ValueKind::Block,
            "BlockLiteral",
            ParserKind::SingleToken,
        );
        let triple_ty = literal_type(
            instances,
            &mut literal,
            ValueKind::NameTypeValue,
            "IdTypeValue",
            ParserKind::IdTypeValue,
        );
        let literal = instances.add_module(literal);

        let instance = TypeExpression::Instance;
        let single_token_of =
            |ty| TypeExpression::Pointer {
                target: Box::new(TypeExpression::Instance(ty)),
            };

        // Context module: the declare intrinsics
        let mut context_module = Module::new("Context");

        let mut declare_variable = Function::new("declareVariable");
        declare_variable.compile_time = true;
        declare_variable.push_parameter(Parameter::right("variable", instance(triple_ty)));
        let declare_variable = instances.add_function(declare_variable);
        ops.insert(declare_variable, Op::DeclareVariable);
        context_module
            .locals
            .declare("declareVariable", EntryId::Function(declare_variable));

        let mut declare_function = Function::new("declareFunction");
        declare_function.compile_time = true;
        declare_function.push_parameter(Parameter::right("left", instance(triple_ty)));
        declare_function.push_parameter(Parameter::right("name", single_token_of(identifier_ty)));
        declare_function.push_parameter(Parameter::right("right", instance(triple_ty)));
        declare_function.push_parameter(Parameter::right("results", instance(triple_ty)));
        declare_function.push_parameter(Parameter::right("block", single_token_of(block_ty)));
        let declare_function = instances.add_function(declare_function);
        ops.insert(declare_function, Op::DeclareFunction);
        context_module
            .locals
            .declare("declareFunction", EntryId::Function(declare_function));

        let mut declare_module = Function::new("declareModule");
        declare_module.compile_time = true;
        declare_module.push_parameter(Parameter::right("name", single_token_of(identifier_ty)));
        declare_module.push_parameter(Parameter::right("block", single_token_of(block_ty)));
        let declare_module = instances.add_function(declare_module);
        ops.insert(declare_module, Op::DeclareModule);
        context_module
            .locals
            .declare("declareModule", EntryId::Function(declare_module));

        let context_module = instances.add_module(context_module);

        // the Rebuild root
        let mut root = Module::new("Rebuild");
        root.locals.declare("literal", EntryId::Module(literal));
        root.locals
            .declare("Context", EntryId::Module(context_module));

        let mut say = Function::new("say");
        say.compile_time = true;
        say.push_parameter(Parameter::right("message", instance(string_ty)));
        let say = instances.add_function(say);
        ops.insert(say, Op::Say);
        root.locals.declare("say", EntryId::Function(say));

        let mut concat = Function::new("concat");
        concat.compile_time = true;
        concat.push_parameter(Parameter::right("a", instance(string_ty)));
        concat.push_parameter(Parameter::right("b", instance(string_ty)));
        concat.push_parameter(Parameter::result("result", instance(string_ty)));
        let concat = instances.add_function(concat);
        ops.insert(concat, Op::Concat);
        root.locals.declare("concat", EntryId::Function(concat));

        let root = instances.add_module(root);
        scope.declare(instances, "Rebuild", EntryId::Module(root));

        debug!(intrinsics = ops.len(), "installed intrinsic registry");
        Self {
            ops,
            output: RefCell::new(Vec::new()),
        }
    }

    /// Lines `say` produced so far, draining the sink.
    pub fn take_output(&self) -> Vec<String> {
        self.output.borrow_mut().drain(..).collect()
    }

    pub(crate) fn push_output(&self, line: String) {
        self.output.borrow_mut().push(line);
    }

    fn dispatch(
        &self,
        op: Op,
        context: &mut Context<'_>,
        call: &Call,
    ) -> Result<Option<Node>, IntrinsicError> {
        match op {
            Op::DeclareVariable => ops::declare_variable(context, call),
            Op::DeclareFunction => ops::declare_function(context, call),
            Op::DeclareModule => ops::declare_module(context, call),
            Op::Say => ops::say(self, context, call),
            Op::Concat => ops::concat(context, call),
        }
    }
}

impl IntrinsicRunner for Registry {
    fn run_call(&self, context: &mut Context<'_>, call: &Call) -> Option<Node> {
        let op = *self.ops.get(&call.function)?;
        match self.dispatch(op, context, call) {
            Ok(node) => node,
            Err(error) => {
                context.diagnostics.report(Diagnostic::error(
                    DiagnosticKind::IntrinsicCallFailed,
                    call_range(call),
                    format!(
                        "{} failed: {}",
                        context.instances.function(call.function).name,
                        error
                    ),
                ));
                None
            }
        }
    }
}

/// Best-effort source range for a call: the span of its argument values.
fn call_range(call: &Call) -> SourceRange {
    let mut range: Option<SourceRange> = None;
    for assignment in &call.arguments {
        for value in &assignment.values {
            if let Some(value_range) = value.as_value().and_then(|value| value.range()) {
                range = Some(match range {
                    Some(range) => range.merge(value_range),
                    None => value_range.clone(),
                });
            }
        }
    }
    range.unwrap_or_default()
}
