//! The element graph: the compiler's IR (spec §3 "Element").
//!
//! An [`Element`] is a tagged record — stable id, kind tag, parent scope, parent element, owning
//! module, source location — whose kind-specific payload lives in [`ElementKind`]. Grounded on
//! spec §9's own translation note ("tagged variant plus capability dispatch") and patterned
//! structurally after the teacher's `TypeValue` tagged enum (`plotnik-lib/src/query/types.rs` /
//! `infer/types.rs`), generalized from a handful of inferred-output-shape variants to the full
//! ~80-variant IR family this spec's element graph calls for.
//!
//! Elements never own other elements directly: cross-links are plain [`ElementId`]s, non-owning
//! indices into the session's [`ElementGraph`] arena (spec §9 "pervasive raw pointers → arenas +
//! stable ids"). No element is ever removed from the arena during compilation.

mod builder;
mod kind;
mod ops;
mod typecheck;

pub use builder::{ElementBuilder, Singletons};
pub use kind::{
    BinaryOp, BindingKind, CompositeKind, CompositeType, ControlKind, DeclMode, DirectiveKind,
    ElementKind, ExprKind, ForeignInfo, IntrinsicKind, Literal, ModuleKind, NumericType,
    ProcedureType, TypeKind, UnaryOp,
};
pub use typecheck::{literal_fits, narrow_float_to_value, narrow_to_value, type_check, TypeCheckOptions};

use crate::scope::{BlockId, Symbol};
use crate::source::Span;

/// Stable id of an element, valid for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// One node in the element graph.
///
/// `inferred_type` and `no_fold` are common mutable slots every expression-shaped element needs
/// (spec §4.6 `on_infer_type`/fold policy), hoisted out of [`ElementKind`]'s per-variant payload
/// rather than duplicated across every expression variant.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub parent_scope: Option<BlockId>,
    pub parent: Option<ElementId>,
    pub module: Option<ElementId>,
    pub span: Span,
    pub inferred_type: Option<ElementId>,
    pub no_fold: bool,
}

impl Element {
    pub fn is_type(&self) -> bool {
        matches!(self.kind, ElementKind::Type(_))
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            ElementKind::Binding(BindingKind::Symbol(s)) => Some(s),
            ElementKind::Binding(BindingKind::Identifier { symbol, .. }) => Some(symbol),
            ElementKind::Expr(ExprKind::IdentRef { symbol, .. }) => Some(symbol),
            ElementKind::Type(TypeKind::Namespace { symbol }) => Some(symbol),
            ElementKind::Type(TypeKind::Composite(c)) => Some(&c.symbol),
            _ => None,
        }
    }
}

/// Session-owned flat arena holding every [`Element`] ever created. Ownership for cleanup is the
/// arena, not the element (spec §5 "Ownership"); intra-graph links are non-owning `ElementId`s.
#[derive(Debug, Default)]
pub struct ElementGraph {
    elements: Vec<Element>,
}

impl ElementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, element: Element) -> ElementId {
        debug_assert_eq!(element.id.as_u32() as usize, self.elements.len());
        let id = element.id;
        self.elements.push(element);
        id
    }

    pub(crate) fn next_id(&self) -> ElementId {
        ElementId::new(self.elements.len() as u32)
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.as_u32() as usize]
    }

    pub fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.as_u32() as usize]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> {
        (0..self.elements.len() as u32).map(ElementId::new)
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
    fn arena_alloc_assigns_monotonic_ids() {
        let mut graph = ElementGraph::new();
        let id0 = graph.next_id();
        graph.alloc(Element {
            id: id0,
            kind: ElementKind::Literal(Literal::Nil),
            parent_scope: None,
            parent: None,
            module: None,
            span: span(),
            inferred_type: None,
            no_fold: false,
        });
        let id1 = graph.next_id();
        graph.alloc(Element {
            id: id1,
            kind: ElementKind::Literal(Literal::Bool(true)),
            parent_scope: None,
            parent: None,
            module: None,
            span: span(),
            inferred_type: None,
            no_fold: false,
        });
        assert!(id1.as_u32() > id0.as_u32());
        assert_eq!(graph.len(), 2);
    }
}
