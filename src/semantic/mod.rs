//! Fixed pass pipeline over the element graph (spec §4.7): resolve → infer → fold → check →
//! finalize, run in program order (spec §5 "Ordering guarantees").
//!
//! Each pass reports diagnostics but keeps running over independent subtrees — a pass never
//! aborts the whole graph walk on one bad element. Overall session success is the conjunction of
//! "no error recorded" and "pipeline completed all passes" (spec §7), which
//! [`crate::session::Session`] checks after calling [`analyze`].
//!
//! Grounded on `plotnik-lib/src/query/stages.rs`'s `QueryParsed::analyze`, which drives its own
//! named passes in sequence over shared interner/symbol-table state the same way.

mod check;
mod decl;
mod directives;
mod finalize;
mod fold;
mod infer;
mod overload;
mod resolve;

use crate::diagnostics::Diagnostics;
use crate::element::ElementGraph;
use crate::scope::{BlockId, ScopeManager};

/// Counters describing one run of the pipeline, surfaced for tests and for `#run`-style
/// introspection; they describe the pipeline's own behavior, not the compiled program.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// How many iterations pass 1 (type declaration) took to reach a fixpoint.
    pub fixpoint_iterations: u32,
    /// How many elements pass 5 (constant folding) replaced with a literal.
    pub folded_elements: u32,
}

/// Runs the fixed semantic pass pipeline (spec §4.7, passes 1–8) over `graph`, rooted at
/// `root_scope`. Diagnostics from every pass accumulate in `diagnostics`; the caller decides
/// overall success from `diagnostics.has_errors()`.
pub fn analyze(
    graph: &mut ElementGraph,
    scopes: &mut ScopeManager,
    root_scope: BlockId,
    diagnostics: &mut Diagnostics,
) -> SessionStats {
    let mut stats = SessionStats::default();

    // Pass 1: type declaration, repeated to a fixpoint (spec §4.7 pass 1).
    stats.fixpoint_iterations = decl::run(graph, root_scope, diagnostics);

    // Pass 2: symbol resolution.
    resolve::run(graph, scopes, diagnostics);

    // Pass 3: directive evaluation (#if selection, #foreign/#intrinsic attachment, #core_type).
    directives::run(graph, scopes, root_scope, diagnostics);

    // Pass 4: type inference.
    infer::run(graph, scopes, root_scope);

    // Pass 5: constant folding.
    stats.folded_elements = fold::run(graph);

    // Pass 6: overload resolution.
    overload::run(graph, scopes, diagnostics);

    // Pass 7: type-check.
    check::run(graph, diagnostics);

    // Pass 8: finalization (#run directives, unused-symbol warnings).
    finalize::run(graph, scopes, root_scope, diagnostics);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::source::{SourceBuffer, SourceId};
    use crate::token::TokenPool;

    fn analyze_source(src: &str) -> (ElementGraph, ScopeManager, BlockId, Diagnostics, SessionStats) {
        let source = SourceBuffer::new(SourceId::new(0), "test.bc", src.to_string());
        let mut pool = TokenPool::new();
        let lexed = crate::lexer::lex(source.id(), source.text(), &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().unwrap();
        let lowered = lower_program(&parsed.ast, &pool, &source, parsed.program);
        let mut graph = lowered.graph;
        let mut scopes = lowered.scopes;
        let root_scope = lowered.root_scope;
        let mut diagnostics = lowered.diagnostics;
        let stats = analyze(&mut graph, &mut scopes, root_scope, &mut diagnostics);
        (graph, scopes, root_scope, diagnostics, stats)
    }

    #[test]
    fn constant_folding_across_identifiers_reaches_a_literal() {
        use crate::element::{BindingKind, ElementKind, Literal};
        let (graph, scopes, root_scope, diagnostics, _stats) =
            analyze_source("a :: 2; b :: 3; c :: a * b + 1;");
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.iter().collect::<Vec<_>>());
        let c = scopes.find_identifier(root_scope, &crate::scope::Symbol::plain("c")).unwrap();
        let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) = &graph.get(c).kind else {
            panic!("expected identifier");
        };
        match &graph.get(*init).kind {
            ElementKind::Literal(Literal::Int(v)) => assert_eq!(*v, 7),
            other => panic!("expected folded literal, got {other:?}"),
        }
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let (_graph, _scopes, _root, diagnostics, _stats) = analyze_source("x := y;");
        assert!(diagnostics.has_errors());
    }
}
