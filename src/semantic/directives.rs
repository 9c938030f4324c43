//! Pass 3: directive evaluation (spec §4.7 pass 3) — selects `#if` branches, attaches `#foreign`
//! metadata to the procedure it precedes (or, failing that, to every later procedure in the same
//! block that doesn't carry its own), injects `#core_type` declarations into the root scope, and
//! rewrites calls to a registered `#intrinsic` name into the matching [`IntrinsicKind`] element.
//!
//! `#intrinsic`-adjacent procedures are already folded into `ProcedureType::intrinsic_name` by the
//! lowerer (`lower_stmt_sequence`'s directive/procedure peek-ahead) — this pass is what actually
//! *uses* that name, rewriting call sites once every scope (and so every candidate) is known.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{
    BindingKind, ElementGraph, ElementId, ElementKind, ExprKind, ForeignInfo, IntrinsicKind, ModuleKind, TypeKind,
};
use crate::scope::{BlockId, ScopeManager};

pub(super) fn run(graph: &mut ElementGraph, scopes: &mut ScopeManager, root_scope: BlockId, diagnostics: &mut Diagnostics) {
    select_if_branches(graph, diagnostics);
    attach_foreign(graph, scopes);
    inject_core_types(graph, scopes, root_scope);
    rewrite_intrinsic_calls(graph);
}

/// Picks the first branch whose condition is a compile-time-true constant; `None` if none match
/// and there is no `#else` (spec §4.6: "a condition that isn't constant in this context" — then
/// `D042NonConstantContext`, matching the outer `Some(None)` so it isn't re-evaluated next pass).
fn select_if_branches(graph: &mut ElementGraph, diagnostics: &mut Diagnostics) {
    for id in graph.ids().collect::<Vec<_>>() {
        let (branches, span) = {
            let ElementKind::Directive(crate::element::DirectiveKind::If { branches, selected: None, .. }) =
                &graph.get(id).kind
            else {
                continue;
            };
            (branches.clone(), graph.get(id).span)
        };
        let mut choice: Option<Option<usize>> = None;
        for (idx, (cond, _)) in branches.iter().enumerate() {
            match graph.get(*cond).as_bool(graph) {
                Some(true) => {
                    choice = Some(Some(idx));
                    break;
                }
                Some(false) => continue,
                None => {
                    diagnostics.report(DiagnosticCode::D042NonConstantContext, span).emit();
                    choice = Some(None);
                    break;
                }
            }
        }
        let choice = choice.unwrap_or(None);
        if let ElementKind::Directive(crate::element::DirectiveKind::If { selected, .. }) = &mut graph.get_mut(id).kind {
            *selected = Some(choice);
        }
    }
}

/// `#foreign` immediately before a procedure declaration attaches to that procedure alone; one
/// that stands on its own applies to every later procedure in the same block lacking its own.
fn attach_foreign(graph: &mut ElementGraph, scopes: &mut ScopeManager) {
    for block in 0..scopes.len() {
        let block_id = BlockId::new(block as u32);
        let statements = scopes.get(block_id).statements.clone();
        let mut block_default: Option<ForeignInfo> = None;
        let mut prev_foreign: Option<ForeignInfo> = None;
        for stmt in statements {
            if let ElementKind::Directive(crate::element::DirectiveKind::Foreign(info)) = &graph.get(stmt).kind {
                let info = info.clone();
                block_default = Some(info.clone());
                prev_foreign = Some(info);
                continue;
            }
            let target = prev_foreign.take().or_else(|| block_default.clone());
            if let (Some(info), Some(proc_ty)) = (target, procedure_type_of(graph, stmt)) {
                if let ElementKind::Type(TypeKind::Procedure(p)) = &mut graph.get_mut(proc_ty).kind {
                    if p.foreign.is_none() {
                        p.foreign = Some(info);
                    }
                }
            }
        }
    }
}

fn procedure_type_of(graph: &ElementGraph, id: ElementId) -> Option<ElementId> {
    match &graph.get(id).kind {
        ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { ty }) => Some(*ty),
        ElementKind::Type(TypeKind::Procedure(_)) => Some(id),
        ElementKind::Binding(BindingKind::Decl { identifier, .. }) => {
            let BindingKind::Identifier { init: Some(init), .. } = &graph.get(*identifier).kind else {
                return None;
            };
            procedure_type_of(graph, *init)
        }
        _ => None,
    }
}

/// `#core_type T` injects `T`'s type declaration into the root program scope (spec §4.6).
fn inject_core_types(graph: &ElementGraph, scopes: &mut ScopeManager, root_scope: BlockId) {
    for id in graph.ids().collect::<Vec<_>>() {
        let ElementKind::Directive(crate::element::DirectiveKind::CoreType { ty }) = &graph.get(id).kind else { continue };
        let ty = *ty;
        let name = match &graph.get(ty).kind {
            ElementKind::Type(TypeKind::Composite(c)) => c.symbol.name.clone(),
            ElementKind::Type(TypeKind::Namespace { symbol }) => symbol.name.clone(),
            _ => continue,
        };
        if name.is_empty() {
            continue;
        }
        let _ = scopes.add_type_to_scope(root_scope, &name, ty);
    }
}

/// A call resolved (or uniquely resolvable) to a procedure registered under `#intrinsic "name"`
/// is rewritten in place into the matching [`IntrinsicKind`] (spec §4.6 "rebuilt as the
/// corresponding intrinsic element"). `size_of`/`align_of` are excluded: those already reach
/// `IntrinsicKind` through the lexer's dedicated keyword path (`lower::expr::lower_call`), not
/// through a registered name.
fn rewrite_intrinsic_calls(graph: &mut ElementGraph) {
    let registry = intrinsic_registry(graph);
    if registry.is_empty() {
        return;
    }
    for id in graph.ids().collect::<Vec<_>>() {
        let (callee, args_id) = {
            let ElementKind::Expr(ExprKind::Call { callee, args, .. }) = &graph.get(id).kind else { continue };
            (*callee, *args)
        };
        let Some(name) = callee_name(graph, callee) else { continue };
        if !registry.contains(&name) {
            continue;
        }
        let args = match &graph.get(args_id).kind {
            ElementKind::Expr(ExprKind::ArgList { args }) => args.clone(),
            _ => continue,
        };
        let Some(kind) = build_intrinsic(&name, &args) else { continue };
        graph.get_mut(id).kind = ElementKind::Intrinsic(kind);
    }
}

fn callee_name(graph: &ElementGraph, callee: ElementId) -> Option<String> {
    match &graph.get(callee).kind {
        ElementKind::Expr(ExprKind::IdentRef { symbol, .. }) => Some(symbol.name.clone()),
        _ => None,
    }
}

fn intrinsic_registry(graph: &ElementGraph) -> std::collections::HashSet<String> {
    let mut names = std::collections::HashSet::new();
    for el in graph.iter() {
        if let ElementKind::Type(TypeKind::Procedure(p)) = &el.kind {
            if let Some(name) = &p.intrinsic_name {
                names.insert(name.clone());
            }
        }
    }
    names
}

fn build_intrinsic(name: &str, args: &[ElementId]) -> Option<IntrinsicKind> {
    match (name, args) {
        ("address_of", [value]) => Some(IntrinsicKind::AddressOf { value: *value }),
        ("type_of", [value]) => Some(IntrinsicKind::TypeOf { value: *value }),
        ("length_of", [value]) => Some(IntrinsicKind::LengthOf { value: *value }),
        ("free", [value]) => Some(IntrinsicKind::Free { value: *value }),
        ("alloc", [ty]) => Some(IntrinsicKind::Alloc { ty: *ty, count: None }),
        ("alloc", [ty, count]) => Some(IntrinsicKind::Alloc { ty: *ty, count: Some(*count) }),
        ("copy", [dest, src, count]) => Some(IntrinsicKind::Copy { dest: *dest, src: *src, count: *count }),
        ("fill", [dest, value, count]) => Some(IntrinsicKind::Fill { dest: *dest, value: *value, count: *count }),
        ("range", [start, end]) => Some(IntrinsicKind::Range { start: *start, end: *end }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::SourceBuffer;
    use crate::token::TokenPool;

    fn directives_source(src: &str) -> (ElementGraph, ScopeManager, BlockId) {
        let source = SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), src.to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        let mut scopes = lowered.scopes;
        let root_scope = lowered.root_scope;
        super::super::resolve::run(&mut graph, &scopes, &mut Diagnostics::new());
        let mut diagnostics = Diagnostics::new();
        run(&mut graph, &mut scopes, root_scope, &mut diagnostics);
        (graph, scopes, root_scope)
    }

    #[test]
    fn selects_the_true_branch_of_an_if_directive() {
        let (graph, scopes, root_scope) =
            directives_source("DEBUG :: true;\n#if DEBUG {\nx := 1;\n} #else {\nx := 2;\n}\n");
        let if_el = scopes
            .get(root_scope)
            .statements
            .iter()
            .find(|&&id| matches!(graph.get(id).kind, ElementKind::Directive(crate::element::DirectiveKind::If { .. })))
            .copied()
            .expect("if directive present");
        let ElementKind::Directive(crate::element::DirectiveKind::If { selected, .. }) = &graph.get(if_el).kind else {
            unreachable!()
        };
        assert_eq!(*selected, Some(Some(0)));
    }
}
