//! Type expressions and per-parameter parser selection.

use crate::context::Context;
use crate::parser::lookup_error_kind;
use crate::view::LineView;
use rebuild_ast::ast::TypeExpression;
use rebuild_ast::blocks::BlockTokenData;
use rebuild_ast::error::{Diagnostic, DiagnosticKind};
use rebuild_ast::instance::{EntryId, Instances, ParserKind};

/// The parser a parameter's declared type dictates for its argument.
///
/// `Pointer { Instance(t) }` inherits `t`'s parser; every other type shape
/// parses a full expression. This is the extension point that lets
/// declarative intrinsics accept syntax that is not a plain expression.
pub(crate) fn parser_kind_for(ty: &TypeExpression, instances: &Instances) -> ParserKind {
    match ty {
        TypeExpression::Pointer { target } => match target.as_ref() {
            TypeExpression::Instance(id) => instances.ty(*id).parser,
            _ => ParserKind::Expression,
        },
        _ => ParserKind::Expression,
    }
}

/// Parse a type position: an identifier resolving to a type, or to a
/// module wrapping one under its `type` entry.
pub(crate) fn parse_type_expression(
    it: &mut LineView<'_>,
    context: &mut Context<'_>,
) -> Option<TypeExpression> {
    let Some(token) = it.peek() else {
        return None;
    };
    if !matches!(token.data, BlockTokenData::IdentifierLiteral { .. }) {
        context.diagnostics.report(Diagnostic::error(
            DiagnosticKind::UnknownType,
            token.range.clone(),
            "expected a type name",
        ));
        return None;
    }

    let name = token.range.text.as_str();
    let resolved = match context.lookup(name) {
        Ok(entries) => entries,
        Err(error) => {
            context.diagnostics.report(Diagnostic::error(
                lookup_error_kind(&error),
                token.range.clone(),
                error.to_string(),
            ));
            it.advance();
            return None;
        }
    };

    let result = match resolved.as_slice() {
        [EntryId::Type(id)] => Some(TypeExpression::Instance(*id)),
        [EntryId::Module(id)] => {
            // intrinsic types sit inside their module as a `type` entry
            match context.instances.module(*id).locals.get("type") {
                [EntryId::Type(id)] => Some(TypeExpression::Instance(*id)),
                _ => None,
            }
        }
        _ => None,
    };
    if result.is_none() {
        context.diagnostics.report(Diagnostic::error(
            DiagnosticKind::UnknownType,
            token.range.clone(),
            format!("'{}' does not name a type", name),
        ));
    }
    it.advance();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoIntrinsics;
    use rebuild_ast::build::{id, line, num};
    use rebuild_ast::error::Diagnostics;
    use rebuild_ast::instance::{Module, ScopeStack, Type};

    #[test]
    fn pointer_to_instance_inherits_the_parser() {
        let mut instances = Instances::new();
        let ty = instances.add_type(Type::with_parser("Block", ParserKind::SingleToken));

        let direct = TypeExpression::Instance(ty);
        assert_eq!(parser_kind_for(&direct, &instances), ParserKind::Expression);

        let pointer = TypeExpression::Pointer {
            target: Box::new(TypeExpression::Instance(ty)),
        };
        assert_eq!(parser_kind_for(&pointer, &instances), ParserKind::SingleToken);

        let pointer_to_auto = TypeExpression::Pointer {
            target: Box::new(TypeExpression::Auto),
        };
        assert_eq!(
            parser_kind_for(&pointer_to_auto, &instances),
            ParserKind::Expression
        );
    }

    #[test]
    fn type_names_resolve_through_modules() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let ty = instances.add_type(Type::new("String"));
        let mut module = Module::new("String");
        module.locals.declare("type", EntryId::Type(ty));
        let module = instances.add_module(module);
        scope.declare(&mut instances, "String", EntryId::Module(module));

        let mut diagnostics = Diagnostics::new();
        let mut context = Context::new(&mut instances, &mut scope, &mut diagnostics, &NoIntrinsics);
        let tokens = line([id("String")]);
        let mut view = LineView::new(&tokens);

        assert_eq!(
            parse_type_expression(&mut view, &mut context),
            Some(TypeExpression::Instance(ty))
        );
        assert!(!view.valid());
    }

    #[test]
    fn unknown_type_reports_and_consumes() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let mut diagnostics = Diagnostics::new();
        let mut context = Context::new(&mut instances, &mut scope, &mut diagnostics, &NoIntrinsics);

        let tokens = line([id("Missing")]);
        let mut view = LineView::new(&tokens);
        assert_eq!(parse_type_expression(&mut view, &mut context), None);
        assert!(!view.valid());
        assert_eq!(
            context.diagnostics.items()[0].kind,
            DiagnosticKind::NameNotFound
        );
    }

    #[test]
    fn non_identifier_reports_without_consuming() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let mut diagnostics = Diagnostics::new();
        let mut context = Context::new(&mut instances, &mut scope, &mut diagnostics, &NoIntrinsics);

        let tokens = line([num("1")]);
        let mut view = LineView::new(&tokens);
        assert_eq!(parse_type_expression(&mut view, &mut context), None);
        assert!(view.valid());
        assert_eq!(
            context.diagnostics.items()[0].kind,
            DiagnosticKind::UnknownType
        );
    }
}
