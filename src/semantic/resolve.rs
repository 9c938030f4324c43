//! Pass 2: symbol resolution (spec §4.7 pass 2) — fills in `ExprKind::IdentRef::resolved` for
//! every plain identifier reference the lowerer left unresolved.
//!
//! Procedures never land in a scope's identifier map: `finish_decl` always routes a procedure
//! constant through `ScopeManager::register_overload`, never `declare_identifier` (grounded on
//! the scope module's split between `identifiers` and the separate `overloads` table). So a
//! reference whose name only matches an overload set is deliberately left unresolved here — pass
//! 6 resolves it through the enclosing call site instead, after candidate matching.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{ElementGraph, ElementKind, ExprKind};
use crate::scope::ScopeManager;

pub(super) fn run(graph: &mut ElementGraph, scopes: &ScopeManager, diagnostics: &mut Diagnostics) {
    for id in graph.ids().collect::<Vec<_>>() {
        let (symbol, scope, span) = {
            let el = graph.get(id);
            let ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }) = &el.kind else {
                continue;
            };
            let Some(scope) = el.parent_scope else { continue };
            (symbol.clone(), scope, el.span)
        };
        if let Some(target) = scopes.find_identifier(scope, &symbol) {
            if let ElementKind::Expr(ExprKind::IdentRef { resolved, .. }) = &mut graph.get_mut(id).kind {
                *resolved = Some(target);
            }
            continue;
        }
        if !scopes.find_overloads(scope, &symbol.name).is_empty() {
            continue;
        }
        diagnostics.report(DiagnosticCode::R030UndefinedIdentifier, span).emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{BindingKind, ElementBuilder};
    use crate::scope::Symbol;
    use crate::source::{SourceId, Span};

    fn span() -> Span {
        Span::new(SourceId::new(0), 0, 1)
    }

    #[test]
    fn resolves_a_plain_identifier_to_its_declaration() {
        let mut builder = ElementBuilder::new();
        let mut scopes = ScopeManager::new();
        let root = scopes.push_scope();
        builder.set_scope(Some(root));
        let symbol = Symbol::plain("x");
        let decl = builder.make(
            ElementKind::Binding(BindingKind::Identifier {
                name: "x".into(),
                symbol: symbol.clone(),
                declared_type: None,
                init: None,
                constant: false,
            }),
            span(),
        );
        scopes.declare_identifier(root, "x", decl).unwrap();
        let reference = builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), span());

        let mut diagnostics = Diagnostics::new();
        run(builder.graph_mut(), &scopes, &mut diagnostics);

        let ElementKind::Expr(ExprKind::IdentRef { resolved, .. }) = &builder.graph().get(reference).kind else {
            panic!("expected IdentRef");
        };
        assert_eq!(*resolved, Some(decl));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reports_undefined_identifier_with_no_matching_declaration_or_overload() {
        let mut builder = ElementBuilder::new();
        let mut scopes = ScopeManager::new();
        let root = scopes.push_scope();
        builder.set_scope(Some(root));
        let symbol = Symbol::plain("ghost");
        builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), span());

        let mut diagnostics = Diagnostics::new();
        run(builder.graph_mut(), &scopes, &mut diagnostics);

        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.iter().next().unwrap().code, DiagnosticCode::R030UndefinedIdentifier);
    }

    #[test]
    fn leaves_an_overloaded_callee_name_unresolved() {
        let mut builder = ElementBuilder::new();
        let mut scopes = ScopeManager::new();
        let root = scopes.push_scope();
        builder.set_scope(Some(root));
        let symbol = Symbol::plain("len");
        let proc_identifier = builder.make(
            ElementKind::Binding(BindingKind::Identifier {
                name: "len".into(),
                symbol: symbol.clone(),
                declared_type: None,
                init: None,
                constant: true,
            }),
            span(),
        );
        scopes.register_overload(root, "len", proc_identifier);
        let callee = builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), span());

        let mut diagnostics = Diagnostics::new();
        run(builder.graph_mut(), &scopes, &mut diagnostics);

        let ElementKind::Expr(ExprKind::IdentRef { resolved, .. }) = &builder.graph().get(callee).kind else {
            panic!("expected IdentRef");
        };
        assert_eq!(*resolved, None);
        assert!(diagnostics.is_empty());
    }
}
