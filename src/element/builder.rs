//! Element builder: the sole factory for element creation (spec §4.5).
//!
//! Every element originates here — no other code constructs an [`Element`] directly. Singleton
//! literals (`true`, `false`, `nil`, the value-sink `_`) are allocated once per session and
//! shared by reference (spec §3 invariant 5); everything else is a fresh arena slot tracking
//! whatever `parent`/`parent_scope`/`module` the builder's cursor currently points at, mirroring
//! the teacher's builder-holds-cursor-state shape (`plotnik-lib/src/parser/core.rs`'s `Parser`
//! holding scope-stack state alongside its node allocator).

use super::{Element, ElementGraph, ElementId, ElementKind};
use crate::scope::{BlockId, Symbol};
use crate::source::Span;

/// Session-scoped cache of singleton literal elements (spec §3 invariant 5).
#[derive(Debug, Clone, Copy, Default)]
pub struct Singletons {
    pub true_lit: Option<ElementId>,
    pub false_lit: Option<ElementId>,
    pub nil_lit: Option<ElementId>,
    /// The value-sink `_` identifier.
    pub sink: Option<ElementId>,
}

/// Factory for [`Element`] creation. Owns the [`ElementGraph`] arena and a cursor (current
/// parent element / parent scope / owning module) that every `make_*` call consults so callers
/// (the lowering pass) don't have to thread those three values through every call site.
pub struct ElementBuilder {
    graph: ElementGraph,
    singletons: Singletons,
    current_parent: Option<ElementId>,
    current_scope: Option<BlockId>,
    current_module: Option<ElementId>,
}

impl Default for ElementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementBuilder {
    pub fn new() -> Self {
        Self {
            graph: ElementGraph::new(),
            singletons: Singletons::default(),
            current_parent: None,
            current_scope: None,
            current_module: None,
        }
    }

    pub fn graph(&self) -> &ElementGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ElementGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> ElementGraph {
        self.graph
    }

    pub fn singletons(&self) -> Singletons {
        self.singletons
    }

    // --- cursor management: parent/scope/module tracked for every subsequently created element ---

    pub fn set_parent(&mut self, parent: Option<ElementId>) -> Option<ElementId> {
        std::mem::replace(&mut self.current_parent, parent)
    }

    pub fn set_scope(&mut self, scope: Option<BlockId>) -> Option<BlockId> {
        std::mem::replace(&mut self.current_scope, scope)
    }

    pub fn set_module(&mut self, module: Option<ElementId>) -> Option<ElementId> {
        std::mem::replace(&mut self.current_module, module)
    }

    pub fn current_parent(&self) -> Option<ElementId> {
        self.current_parent
    }

    pub fn current_scope(&self) -> Option<BlockId> {
        self.current_scope
    }

    /// The general-purpose factory call: every `make_*` helper below funnels through this.
    pub fn make(&mut self, kind: ElementKind, span: Span) -> ElementId {
        let id = self.graph.next_id();
        let element = Element {
            id,
            kind,
            parent_scope: self.current_scope,
            parent: self.current_parent,
            module: self.current_module,
            span,
            inferred_type: None,
            no_fold: false,
        };
        self.graph.alloc(element)
    }

    /// As [`Self::make`], but marks the element `no_fold` (spec §4.6 fold policy: "when present,
    /// the element is left un-folded").
    pub fn make_no_fold(&mut self, kind: ElementKind, span: Span) -> ElementId {
        let id = self.make(kind, span);
        self.graph.get_mut(id).no_fold = true;
        id
    }

    // --- singleton literals ---

    pub fn make_bool_lit(&mut self, value: bool, span: Span) -> ElementId {
        let cached = if value { self.singletons.true_lit } else { self.singletons.false_lit };
        if let Some(id) = cached {
            return id;
        }
        let id = self.make(ElementKind::Literal(super::Literal::Bool(value)), span);
        if value {
            self.singletons.true_lit = Some(id);
        } else {
            self.singletons.false_lit = Some(id);
        }
        id
    }

    pub fn make_nil_lit(&mut self, span: Span) -> ElementId {
        if let Some(id) = self.singletons.nil_lit {
            return id;
        }
        let id = self.make(ElementKind::Literal(super::Literal::Nil), span);
        self.singletons.nil_lit = Some(id);
        id
    }

    /// The value-sink `_`, shared by reference per session (spec §3 invariant 5).
    pub fn make_sink(&mut self, span: Span) -> ElementId {
        if let Some(id) = self.singletons.sink {
            return id;
        }
        let symbol = Symbol::plain("_");
        let id = self.make(
            ElementKind::Binding(super::BindingKind::Identifier {
                name: "_".to_string(),
                symbol,
                declared_type: None,
                init: None,
                constant: false,
            }),
            span,
        );
        self.singletons.sink = Some(id);
        id
    }

    pub fn make_int_lit(&mut self, value: i128, span: Span) -> ElementId {
        self.make(ElementKind::Literal(super::Literal::Int(value)), span)
    }

    pub fn make_float_lit(&mut self, value: f64, span: Span) -> ElementId {
        self.make(ElementKind::Literal(super::Literal::Float(value)), span)
    }

    pub fn make_char_lit(&mut self, value: char, span: Span) -> ElementId {
        self.make(ElementKind::Literal(super::Literal::Char(value)), span)
    }

    pub fn make_string_lit(&mut self, value: impl Into<String>, span: Span) -> ElementId {
        self.make(ElementKind::Literal(super::Literal::Str(value.into())), span)
    }

    pub fn make_uninitialized(&mut self, span: Span) -> ElementId {
        self.make(ElementKind::Literal(super::Literal::Uninitialized), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    fn span() -> Span {
        Span::new(SourceId::new(0), 0, 1)
    }

    #[test]
    fn bool_singleton_shared_across_calls() {
        let mut b = ElementBuilder::new();
        let t1 = b.make_bool_lit(true, span());
        let t2 = b.make_bool_lit(true, span());
        let f1 = b.make_bool_lit(false, span());
        assert_eq!(t1, t2);
        assert_ne!(t1, f1);
    }

    #[test]
    fn nil_and_sink_are_singletons() {
        let mut b = ElementBuilder::new();
        assert_eq!(b.make_nil_lit(span()), b.make_nil_lit(span()));
        assert_eq!(b.make_sink(span()), b.make_sink(span()));
    }

    #[test]
    fn cursor_applies_to_subsequent_elements() {
        let mut b = ElementBuilder::new();
        let parent = b.make_int_lit(1, span());
        b.set_parent(Some(parent));
        let child = b.make_int_lit(2, span());
        assert_eq!(b.graph().get(child).parent, Some(parent));
    }

    #[test]
    fn no_fold_flag_is_set() {
        let mut b = ElementBuilder::new();
        let id = b.make_no_fold(ElementKind::Literal(super::super::Literal::Int(1)), span());
        assert!(b.graph().get(id).no_fold);
    }
}
