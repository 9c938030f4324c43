//! Pass 7: type-check (spec §4.7 pass 7) — the authoritative check over every assignment binding
//! (`x := 42;` declared-type and `x := 42;` mutable-narrowing forms alike) and plain `=`
//! assignment, reusing [`type_check`] and [`literal_fits`] rather than re-deriving compatibility
//! rules a second time. Argument/return compatibility for call sites is already enforced inside
//! `overload::prepare_call_site` (pass 6) as part of candidate selection; this pass does not
//! re-check those, only the assignment forms pass 6 never touches.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{literal_fits, type_check, BindingKind, DeclMode, ElementGraph, ElementKind, Literal, TypeCheckOptions};

pub(super) fn run(graph: &ElementGraph, diagnostics: &mut Diagnostics) {
    for id in graph.ids().collect::<Vec<_>>() {
        let el = graph.get(id);
        match &el.kind {
            // Checked once via the `Decl` wrapper rather than also via the `Identifier` it wraps
            // (which carries the same `declared_type`/`init` pair) to avoid reporting the same
            // mismatch twice.
            ElementKind::Binding(BindingKind::Decl { mode: DeclMode::Typed, declared_type: Some(dt), init: Some(init), .. }) => {
                check_assignment(graph, diagnostics, *dt, *init, el.span);
            }
            ElementKind::Binding(BindingKind::Assignment { target, value }) => {
                let Some(target_ty) = target_declared_type(graph, *target) else { continue };
                check_assignment(graph, diagnostics, target_ty, *value, el.span);
            }
            _ => {}
        }
    }
}

fn target_declared_type(graph: &ElementGraph, target: crate::element::ElementId) -> Option<crate::element::ElementId> {
    let ElementKind::Binding(BindingKind::AssignmentTarget { inner }) = &graph.get(target).kind else { return None };
    match &graph.get(*inner).kind {
        ElementKind::Expr(crate::element::ExprKind::IdentRef { resolved: Some(id), .. }) => match &graph.get(*id).kind {
            ElementKind::Binding(BindingKind::Identifier { declared_type, .. }) => *declared_type,
            _ => None,
        },
        _ => None,
    }
}

fn check_assignment(
    graph: &ElementGraph,
    diagnostics: &mut Diagnostics,
    declared_type: crate::element::ElementId,
    value: crate::element::ElementId,
    span: crate::source::Span,
) {
    let value_el = graph.get(value);
    // An integer literal assigned straight into a numeric target is a narrowing check against
    // the literal's actual value (spec §8 scenario 1), not the general width/signedness
    // comparison `type_check` makes between two already-typed expressions — the literal's own
    // narrowed type (e.g. `u8` for `42`) would otherwise collide with a wider signed target like
    // `s32` even though the value fits it perfectly.
    if let ElementKind::Literal(lit @ Literal::Int(_)) = &value_el.kind {
        if let ElementKind::Type(crate::element::TypeKind::Numeric(target)) = &graph.get(declared_type).kind {
            if !literal_fits(lit, *target) {
                diagnostics.report(DiagnosticCode::C052NarrowingOverflow, span).emit();
            }
            return;
        }
    }
    let Some(value_ty) = value_el.inferred_type else { return };
    if !type_check(graph, declared_type, value_ty, TypeCheckOptions::Lenient) {
        diagnostics.report(DiagnosticCode::C050AssignmentMismatch, span).emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::SourceBuffer;
    use crate::token::TokenPool;

    fn check_source(src: &str) -> Diagnostics {
        let source = SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), src.to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        let mut scopes = lowered.scopes;
        let root_scope = lowered.root_scope;
        super::super::resolve::run(&mut graph, &scopes, &mut Diagnostics::new());
        super::super::infer::run(&mut graph, &mut scopes, root_scope);
        let mut diagnostics = Diagnostics::new();
        run(&graph, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn narrowing_overflow_is_reported_for_an_out_of_range_literal() {
        let diagnostics = check_source("z : u8 = 300;\n");
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.iter().next().unwrap().code, DiagnosticCode::C052NarrowingOverflow);
    }

    #[test]
    fn a_literal_within_range_type_checks_cleanly() {
        let diagnostics = check_source("z : u8 = 10;\n");
        assert!(!diagnostics.has_errors());
    }
}
