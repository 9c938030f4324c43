//! Pass 8: finalization (spec §4.7 pass 8) — `#run` directives would hand their expression to a
//! VM collaborator for execution; that collaborator is out of scope for this crate (spec's own
//! "Non-goals": no bytecode emitter, no execution), so this pass only counts them. What it does
//! do is the unused-symbol sweep: any identifier declared in a live scope that no `IdentRef` in
//! the graph ever resolves to is reported as `S001UnusedSymbol` (a warning, not an error — spec
//! §6 "Testable Properties").
//!
//! "Live" here respects `#if` branch selection (pass 3): identifiers declared inside a branch
//! that lost selection are not reported, since that code is conditionally compiled out rather
//! than genuinely dead in the surviving program.

use std::collections::HashSet;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{ElementGraph, ElementId, ElementKind, ExprKind};
use crate::scope::{BlockId, ScopeManager};

pub(super) fn run(graph: &ElementGraph, scopes: &ScopeManager, root_scope: BlockId, diagnostics: &mut Diagnostics) {
    let referenced = referenced_identifiers(graph);
    let live = live_blocks(graph, scopes, root_scope);
    for block in live {
        for (name, &id) in &scopes.get(block).identifiers {
            if name == "_" || referenced.contains(&id) {
                continue;
            }
            diagnostics
                .report(DiagnosticCode::S001UnusedSymbol, graph.get(id).span)
                .message(format!("`{name}` is never used"))
                .emit();
        }
    }
}

fn referenced_identifiers(graph: &ElementGraph) -> HashSet<ElementId> {
    graph
        .iter()
        .filter_map(|el| match &el.kind {
            ElementKind::Expr(ExprKind::IdentRef { resolved: Some(target), .. }) => Some(*target),
            _ => None,
        })
        .collect()
}

/// Every block reachable from `root_scope` that isn't inside an `#if` branch that lost
/// selection.
fn live_blocks(graph: &ElementGraph, scopes: &ScopeManager, root_scope: BlockId) -> Vec<BlockId> {
    let mut out = vec![root_scope];
    let discarded = discarded_blocks(graph, scopes);
    let mut frontier = vec![root_scope];
    while let Some(block) = frontier.pop() {
        for &child in &scopes.get(block).children {
            if discarded.contains(&child) {
                continue;
            }
            out.push(child);
            frontier.push(child);
        }
    }
    out
}

fn discarded_blocks(graph: &ElementGraph, scopes: &ScopeManager) -> HashSet<BlockId> {
    let mut discarded = HashSet::new();
    for el in graph.iter() {
        let ElementKind::Directive(crate::element::DirectiveKind::If { branches, else_branch, selected }) = &el.kind else {
            continue;
        };
        let Some(choice) = selected else { continue };
        for (idx, (_, body)) in branches.iter().enumerate() {
            if *choice != Some(idx) {
                collect_block_of(graph, *body, &mut discarded);
            }
        }
        if *choice != None {
            if let Some(e) = else_branch {
                collect_block_of(graph, *e, &mut discarded);
            }
        }
    }
    let _ = scopes;
    discarded
}

fn collect_block_of(graph: &ElementGraph, body: ElementId, out: &mut HashSet<BlockId>) {
    if let ElementKind::Control(crate::element::ControlKind::Block(b)) = &graph.get(body).kind {
        out.insert(*b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::SourceBuffer;
    use crate::token::TokenPool;

    #[test]
    fn reports_an_identifier_that_is_never_read() {
        let source = SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), "x := 1;\n".to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut diagnostics = Diagnostics::new();
        run(&lowered.graph, &lowered.scopes, lowered.root_scope, &mut diagnostics);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn a_referenced_identifier_is_not_reported() {
        let source =
            SourceBuffer::new(crate::source::SourceId::new(0), "test.bc".into(), "x := 1;\ny := x;\n".to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        let mut scopes = lowered.scopes;
        let root_scope = lowered.root_scope;
        super::super::resolve::run(&mut graph, &scopes, &mut Diagnostics::new());
        let mut diagnostics = Diagnostics::new();
        run(&graph, &scopes, root_scope, &mut diagnostics);
        // `x` is read by `y`'s initializer; only `y` itself remains unused.
        assert_eq!(diagnostics.warning_count(), 1);
        let _ = &mut scopes;
    }
}
