//! Parsing context: scope chain, intrinsic types, compile-time dispatch.

use rebuild_ast::ast::{Call, Node, TypeExpression, ValueKind};
use rebuild_ast::error::Diagnostics;
use rebuild_ast::instance::{self, EntryId, Instances, LookupError, ScopeStack};

/// Executes compile-time calls against the intrinsic registry.
///
/// The parser owns the mutable compilation state and hands it back in
/// through the context, so intrinsics can declare entries and re-enter the
/// parser for block arguments (function bodies, module bodies).
pub trait IntrinsicRunner {
    /// Run a fully static call.
    ///
    /// `Some(node)` replaces the call in the AST; `None` keeps the call
    /// node (side-effect-only intrinsics, failed evaluation - failures
    /// report their own diagnostics).
    fn run_call(&self, context: &mut Context<'_>, call: &Call) -> Option<Node>;
}

/// Runner without any intrinsics; every compile-time call keeps its node.
pub struct NoIntrinsics;

impl IntrinsicRunner for NoIntrinsics {
    fn run_call(&self, _context: &mut Context<'_>, _call: &Call) -> Option<Node> {
        None
    }
}

/// Mutable state threaded through one semantic parse.
pub struct Context<'a> {
    pub instances: &'a mut Instances,
    pub scope: &'a mut ScopeStack,
    pub diagnostics: &'a mut Diagnostics,
    pub intrinsics: &'a dyn IntrinsicRunner,
}

impl<'a> Context<'a> {
    /// Bundle the compilation state.
    pub fn new(
        instances: &'a mut Instances,
        scope: &'a mut ScopeStack,
        diagnostics: &'a mut Diagnostics,
        intrinsics: &'a dyn IntrinsicRunner,
    ) -> Self {
        Self {
            instances,
            scope,
            diagnostics,
            intrinsics,
        }
    }

    /// Resolve a possibly dotted name against the active scope chain.
    ///
    /// Entries are returned by value; the scope may be mutated by a
    /// compile-time call before the caller is done with them.
    pub fn lookup(&self, name: &str) -> Result<Vec<EntryId>, LookupError> {
        instance::lookup(self.scope, self.instances, name).map(<[EntryId]>::to_vec)
    }

    /// The type expression of an intrinsic value kind.
    ///
    /// `Auto` when the kind was never registered, so literal values stay
    /// untyped instead of failing the parse.
    pub fn intrinsic_type(&self, kind: ValueKind) -> TypeExpression {
        self.instances
            .intrinsic_type(kind)
            .map(TypeExpression::Instance)
            .unwrap_or(TypeExpression::Auto)
    }

    /// True if `ty` is exactly the registered intrinsic type of `kind`.
    pub fn is_intrinsic_type(&self, ty: &TypeExpression, kind: ValueKind) -> bool {
        match ty {
            TypeExpression::Instance(id) => self.instances.intrinsic_type(kind) == Some(*id),
            _ => false,
        }
    }

    /// Dispatch a compile-time call through the intrinsic registry.
    pub fn run_call(&mut self, call: &Call) -> Option<Node> {
        let runner = self.intrinsics;
        runner.run_call(self, call)
    }

    /// The single implicit-convertibility hook.
    ///
    /// Permissive for now: overload scoring hardens here later, and every
    /// type-compatibility check already routes through this one place.
    pub fn can_implicit_convert(&self, _node: &Node, _ty: &TypeExpression) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuild_ast::instance::{ParserKind, Type};

    #[test]
    fn intrinsic_type_defaults_to_auto() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let mut diagnostics = Diagnostics::new();
        let context = Context::new(&mut instances, &mut scope, &mut diagnostics, &NoIntrinsics);
        assert_eq!(context.intrinsic_type(ValueKind::String), TypeExpression::Auto);
    }

    #[test]
    fn intrinsic_type_identity() {
        let mut instances = Instances::new();
        let string_type = instances.add_type(Type::new("String"));
        let block_type = instances.add_type(Type::with_parser("Block", ParserKind::SingleToken));
        instances.register_intrinsic_type(ValueKind::String, string_type);
        instances.register_intrinsic_type(ValueKind::Block, block_type);

        let mut scope = ScopeStack::new();
        let mut diagnostics = Diagnostics::new();
        let context = Context::new(&mut instances, &mut scope, &mut diagnostics, &NoIntrinsics);

        let ty = context.intrinsic_type(ValueKind::String);
        assert!(context.is_intrinsic_type(&ty, ValueKind::String));
        assert!(!context.is_intrinsic_type(&ty, ValueKind::Block));
        assert!(!context.is_intrinsic_type(&TypeExpression::Auto, ValueKind::String));
    }
}
