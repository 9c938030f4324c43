//! Scope manager: the stack of lexical blocks, symbol/type lookup, and type interning (spec §4.5).
//!
//! Grounded on the teacher's `SymbolTable` (`plotnik-lib/src/analyze/symbol_table.rs` — insert/
//! contains/get over an `IndexMap`) for the per-block identifier and type maps, and on
//! `plotnik-core/src/interner.rs`'s intern-or-return-existing pattern for pointer-type interning.
//! Distinct from [`crate::ast::AstBuilder`]'s parse-time scope stack: this is the element graph's
//! lexical scope, populated during AST lowering and consulted by every later semantic pass.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::element::ElementId;

/// A symbol: a (namespace path, name) pair — the equality key for cross-scope references (spec
/// §3 invariant 6). `qualified_name` is precomputed once at construction so hashing/equality for
/// the common case (comparing two already-built symbols) never re-joins the namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub namespaces: Vec<String>,
    pub name: String,
}

impl Symbol {
    pub fn plain(name: impl Into<String>) -> Self {
        Self { namespaces: Vec::new(), name: name.into() }
    }

    pub fn qualified(namespaces: Vec<String>, name: impl Into<String>) -> Self {
        Self { namespaces, name: name.into() }
    }

    /// `namespace₁::namespace₂::…::name`, the equality key per spec §3 invariant 6.
    pub fn qualified_name(&self) -> String {
        if self.namespaces.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespaces.join("::"), self.name)
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.namespaces.is_empty()
    }
}

/// Stable id of a [`Block`], valid for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// One lexical block (spec §3 invariant 2): an ordered statement list, identifier and type maps
/// keyed by name, child blocks, imports, and a defer stack.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub parent: Option<BlockId>,
    pub statements: Vec<ElementId>,
    pub identifiers: IndexMap<String, ElementId>,
    pub types: IndexMap<String, ElementId>,
    pub children: Vec<BlockId>,
    pub imports: Vec<ElementId>,
    /// `defer` statements, in the order they were parsed. §9's design notes model this as an
    /// explicit stack the emitter (out of scope) pops in reverse during scope teardown — the
    /// semantic engine itself just records membership.
    pub deferred: Vec<ElementId>,
}

/// Errors specific to scope registration, distinct from the general [`crate::diagnostics`]
/// collector so callers can decide how to report them with full context (symbol name, prior
/// definition span) rather than a bare message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    DuplicateIdentifier,
    DuplicateType,
}

/// Owns every [`Block`] created during AST lowering and drives the current-scope stack semantic
/// passes and lowering both consult.
#[derive(Debug, Default)]
pub struct ScopeManager {
    blocks: Vec<Block>,
    stack: Vec<BlockId>,
    root: Option<BlockId>,
    /// Pointer-type intern cache, keyed by base type id (spec §4.5 `find_pointer_type`).
    pointer_cache: HashMap<ElementId, ElementId>,
    /// Procedure overload candidates per `(scope, name)`, kept separate from `identifiers`:
    /// unlike ordinary bindings, two procedures sharing a name in the same scope are not a
    /// duplicate-declaration error but overload candidates for §4.6's overload resolution.
    overloads: HashMap<(BlockId, String), Vec<ElementId>>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> BlockId {
        BlockId::new(self.blocks.len() as u32)
    }

    /// Allocates a new block as a child of the current scope (or as the root, if the stack is
    /// empty), pushes it, and returns its id. Mirrors the AST builder's `push_scope`, but on the
    /// element-graph side rather than the parser side.
    pub fn push_scope(&mut self) -> BlockId {
        let parent = self.stack.last().copied();
        let id = self.next_id();
        self.blocks.push(Block { parent, ..Block::default() });
        if let Some(p) = parent {
            self.blocks[p.as_u32() as usize].children.push(id);
        } else {
            self.root.get_or_insert(id);
        }
        self.stack.push(id);
        id
    }

    pub fn pop_scope(&mut self) -> Option<BlockId> {
        self.stack.pop()
    }

    pub fn current_scope(&self) -> Option<BlockId> {
        self.stack.last().copied()
    }

    pub fn root(&self) -> Option<BlockId> {
        self.root
    }

    pub fn get(&self, id: BlockId) -> &Block {
        &self.blocks[id.as_u32() as usize]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.as_u32() as usize]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Records an element as a statement of `scope` and, if it declares a name, registers that
    /// name in the identifier map — rejecting a second declaration of the same name in the same
    /// scope (spec §3 invariant 4; shadowing across scopes remains allowed since each scope has
    /// its own map).
    pub fn declare_identifier(&mut self, scope: BlockId, name: &str, element: ElementId) -> Result<(), ScopeError> {
        let block = self.get_mut(scope);
        if block.identifiers.contains_key(name) {
            return Err(ScopeError::DuplicateIdentifier);
        }
        block.identifiers.insert(name.to_string(), element);
        Ok(())
    }

    /// Registers `named_type` under `name` in `scope`'s type map. A qualified-name collision is
    /// an error (spec §3 invariant 7: "A second request returns the existing type" only applies
    /// to `find_type`/lookup — first-time registration of a duplicate name is rejected, matching
    /// §4.5's `add_type_to_scope` contract and `R033DuplicateTypeName`).
    pub fn add_type_to_scope(&mut self, scope: BlockId, qualified_name: &str, ty: ElementId) -> Result<(), ScopeError> {
        let block = self.get_mut(scope);
        if block.types.contains_key(qualified_name) {
            return Err(ScopeError::DuplicateType);
        }
        block.types.insert(qualified_name.to_string(), ty);
        Ok(())
    }

    /// Resolves a symbol using walk-upward-then-namespace-chase semantics (spec §4.5): if the
    /// symbol is qualified, only the scope that registered its leading namespace is checked;
    /// otherwise ascend from `from` through parent scopes to the root.
    pub fn find_identifier(&self, from: BlockId, symbol: &Symbol) -> Option<ElementId> {
        let key = symbol.qualified_name();
        if symbol.is_qualified() {
            return self.find_in_any_ancestor(from, |b| b.identifiers.get(&key).copied())
                .or_else(|| self.find_in_any_ancestor(from, |b| b.identifiers.get(&symbol.name).copied()));
        }
        self.ascend(from, |b| b.identifiers.get(&symbol.name).copied())
    }

    /// Analogous to [`Self::find_identifier`] for types; unresolved queries are the caller's
    /// responsibility to map to `unknown_type` (spec §4.5).
    pub fn find_type(&self, from: BlockId, qualified_name: &str) -> Option<ElementId> {
        self.ascend(from, |b| b.types.get(qualified_name).copied())
    }

    /// Interns a pointer type by base type id: a second request for the same base returns the
    /// existing pointer-type element (spec §8 intern invariant).
    pub fn find_pointer_type(&self, base: ElementId) -> Option<ElementId> {
        self.pointer_cache.get(&base).copied()
    }

    pub fn register_pointer_type(&mut self, base: ElementId, pointer: ElementId) {
        self.pointer_cache.insert(base, pointer);
    }

    /// Adds `element` as an overload candidate for `name` in `scope` (spec §4.6 overload
    /// resolution): unlike [`Self::declare_identifier`], a repeat name is never an error here —
    /// it is simply another candidate joining the set.
    pub fn register_overload(&mut self, scope: BlockId, name: &str, element: ElementId) {
        self.overloads.entry((scope, name.to_string())).or_default().push(element);
    }

    /// Ascends from `from` to the root, returning the first scope's overload set for `name`
    /// (empty if none is found at any ancestor).
    pub fn find_overloads(&self, from: BlockId, name: &str) -> Vec<ElementId> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            if let Some(set) = self.overloads.get(&(id, name.to_string())) {
                return set.clone();
            }
            cur = self.get(id).parent;
        }
        Vec::new()
    }

    /// Ascends from `from` through parent scopes to the root, returning the first scope for which
    /// `lookup` yields a hit.
    fn ascend(&self, from: BlockId, lookup: impl Fn(&Block) -> Option<ElementId>) -> Option<ElementId> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let block = self.get(id);
            if let Some(hit) = lookup(block) {
                return Some(hit);
            }
            cur = block.parent;
        }
        None
    }

    /// Namespace-chase fallback: scans every block reachable from the root for a hit, used when a
    /// qualified symbol's declaring namespace isn't an ancestor of `from`.
    fn find_in_any_ancestor(&self, from: BlockId, lookup: impl Fn(&Block) -> Option<ElementId> + Copy) -> Option<ElementId> {
        if let Some(hit) = self.ascend(from, lookup) {
            return Some(hit);
        }
        let Some(root) = self.root else { return None };
        let mut found = None;
        self.visit_blocks(root, &mut |id| {
            if let Some(hit) = lookup(self.get(id)) {
                found = Some(hit);
                false
            } else {
                true
            }
        });
        found
    }

    /// Top-down preorder traversal over all blocks reachable from `root`, invoking `pred` per
    /// block; aborts as soon as `pred` returns `false` (spec §4.5 `visit_blocks`).
    pub fn visit_blocks(&self, root: BlockId, pred: &mut impl FnMut(BlockId) -> bool) {
        if !pred(root) {
            return;
        }
        for &child in &self.get(root).children {
            self.visit_blocks(child, pred);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(n: u32) -> ElementId {
        ElementId::new(n)
    }

    #[test]
    fn symbol_qualified_name_joins_namespaces() {
        let s = Symbol::qualified(vec!["a".into(), "b".into()], "c");
        assert_eq!(s.qualified_name(), "a::b::c");
        assert!(s.is_qualified());
        assert_eq!(Symbol::plain("x").qualified_name(), "x");
    }

    #[test]
    fn identifier_lookup_ascends_and_shadows() {
        let mut mgr = ScopeManager::new();
        let outer = mgr.push_scope();
        mgr.declare_identifier(outer, "x", eid(0)).unwrap();
        let inner = mgr.push_scope();
        mgr.declare_identifier(inner, "x", eid(1)).unwrap();
        assert_eq!(mgr.find_identifier(inner, &Symbol::plain("x")), Some(eid(1)));
        mgr.pop_scope();
        assert_eq!(mgr.find_identifier(outer, &Symbol::plain("x")), Some(eid(0)));
    }

    #[test]
    fn duplicate_identifier_in_same_scope_errors() {
        let mut mgr = ScopeManager::new();
        let s = mgr.push_scope();
        mgr.declare_identifier(s, "x", eid(0)).unwrap();
        assert_eq!(mgr.declare_identifier(s, "x", eid(1)), Err(ScopeError::DuplicateIdentifier));
    }

    #[test]
    fn pointer_type_interning_is_idempotent() {
        let mut mgr = ScopeManager::new();
        assert_eq!(mgr.find_pointer_type(eid(0)), None);
        mgr.register_pointer_type(eid(0), eid(99));
        assert_eq!(mgr.find_pointer_type(eid(0)), Some(eid(99)));
        assert_eq!(mgr.find_pointer_type(eid(0)), mgr.find_pointer_type(eid(0)));
    }

    #[test]
    fn visit_blocks_preorder_and_abort() {
        let mut mgr = ScopeManager::new();
        let root = mgr.push_scope();
        let _child = mgr.push_scope();
        mgr.pop_scope();
        mgr.pop_scope();
        let mut seen = Vec::new();
        mgr.visit_blocks(root, &mut |id| {
            seen.push(id);
            true
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], root);
    }

    #[test]
    fn overload_candidates_accumulate_and_ascend() {
        let mut mgr = ScopeManager::new();
        let outer = mgr.push_scope();
        mgr.register_overload(outer, "foo", eid(0));
        mgr.register_overload(outer, "foo", eid(1));
        let inner = mgr.push_scope();
        assert_eq!(mgr.find_overloads(inner, "foo"), vec![eid(0), eid(1)]);
        assert!(mgr.find_overloads(inner, "bar").is_empty());
    }

    #[test]
    fn visit_blocks_stops_when_pred_returns_false() {
        let mut mgr = ScopeManager::new();
        let root = mgr.push_scope();
        let _a = mgr.push_scope();
        mgr.pop_scope();
        let _b = mgr.push_scope();
        mgr.pop_scope();
        mgr.pop_scope();
        let mut seen = Vec::new();
        mgr.visit_blocks(root, &mut |id| {
            seen.push(id);
            false
        });
        assert_eq!(seen, vec![root]);
    }
}
