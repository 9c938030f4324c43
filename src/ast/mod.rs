//! AST: the parser's output, before lowering into the element graph.
//!
//! Mirrors the teacher's split between a lossless tree (`plotnik-lib/src/parser/ast.rs`) and its
//! builder-owned arena, generalized to a plain tagged-record tree since this AST does not need to
//! be lossless (comments/labels/attributes live in a side table instead of inline tree nodes).

use indexmap::IndexMap;

use crate::source::Span;
use crate::token::TokenId;

/// Stable id of an AST node, valid for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Tag identifying the syntactic shape of an [`AstNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Literals
    BoolLit,
    IntLit,
    FloatLit,
    CharLit,
    StringLit,
    NilLit,
    Ident,

    // Expressions
    Unary,
    Binary,
    Assign,
    Comma,
    MemberAccess,
    Subscript,
    Call,
    ArgList,
    ArgPair,
    Cast,
    Transmute,
    Spread,
    KeyValue,
    TypeTag, // `name<T, U, ...>`

    // Types (as written, before element lowering)
    TypeRef,
    PointerType,
    ArrayType,
    ProcType,

    // Declarations
    Decl,     // `name := expr` / `name : T = expr` / `name :: expr`
    Field,
    ParamList,
    Param,

    // Control flow
    Block,
    Stmt,
    If,
    While,
    ForIn,
    Switch,
    Case,
    Fallthrough,
    Break,
    Continue,
    Return,
    Defer,
    With,
    Yield,

    // Module level
    Module,
    Namespace,
    Import,
    Program,

    // Directives
    Directive,
    RawBlock,
}

/// Side-table data attached to a node, kept out of the core record since most nodes need none
/// of it. Indexed by [`NodeId`] in [`AstBuilder::side_table`].
#[derive(Debug, Clone, Default)]
pub struct NodeExtras {
    pub labels: Vec<TokenId>,
    pub attributes: Vec<TokenId>,
    pub leading_comments: Vec<TokenId>,
    pub uniform_call: bool,
}

/// One AST node: a tagged record with up to two primary children plus an ordered extra list.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub binding: Option<TokenId>,
    pub span: Span,
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A named lexical scope frame on the [`AstBuilder`]'s scope stack. Distinct from
/// [`crate::scope::Block`]: this is parse-time bookkeeping, not the element-graph scope.
#[derive(Debug, Default)]
struct ScopeFrame {
    names: IndexMap<String, NodeId>,
}

/// Frame pushed while parsing a `switch`, tracking its cases for fallthrough validation.
#[derive(Debug, Default)]
struct SwitchFrame {
    cases: Vec<NodeId>,
}

/// Owns AST node allocation and the five explicit stacks parselets consult: scope, switch, case,
/// with, member-access.
///
/// Each stack models lexical context a nested parselet needs without resorting to global state;
/// parselets push on rule entry and pop on exit.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<AstNode>,
    side_table: IndexMap<NodeId, NodeExtras>,

    scope_stack: Vec<ScopeFrame>,
    switch_stack: Vec<SwitchFrame>,
    case_stack: Vec<NodeId>,
    with_stack: Vec<NodeId>,
    member_access_stack: Vec<NodeId>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(AstNode { id, kind, binding: None, span, lhs: None, rhs: None, children: Vec::new() });
        id
    }

    pub fn make_leaf(&mut self, kind: NodeKind, binding: Option<TokenId>, span: Span) -> NodeId {
        let id = self.alloc(kind, span);
        self.nodes[id.as_u32() as usize].binding = binding;
        id
    }

    pub fn make_unary(&mut self, kind: NodeKind, binding: Option<TokenId>, operand: NodeId, span: Span) -> NodeId {
        let id = self.alloc(kind, span);
        let node = &mut self.nodes[id.as_u32() as usize];
        node.binding = binding;
        node.lhs = Some(operand);
        id
    }

    pub fn make_binary(&mut self, kind: NodeKind, binding: Option<TokenId>, lhs: NodeId, rhs: NodeId, span: Span) -> NodeId {
        let id = self.alloc(kind, span);
        let node = &mut self.nodes[id.as_u32() as usize];
        node.binding = binding;
        node.lhs = Some(lhs);
        node.rhs = Some(rhs);
        id
    }

    pub fn make_with_children(&mut self, kind: NodeKind, binding: Option<TokenId>, children: Vec<NodeId>, span: Span) -> NodeId {
        let id = self.alloc(kind, span);
        let node = &mut self.nodes[id.as_u32() as usize];
        node.binding = binding;
        node.children = children;
        id
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.as_u32() as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.as_u32() as usize]
    }

    pub fn extras(&self, id: NodeId) -> NodeExtras {
        self.side_table.get(&id).cloned().unwrap_or_default()
    }

    pub fn extras_mut(&mut self, id: NodeId) -> &mut NodeExtras {
        self.side_table.entry(id).or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // --- scope stack ---

    pub fn push_scope(&mut self) {
        self.scope_stack.push(ScopeFrame::default());
    }

    pub fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    pub fn declare_in_scope(&mut self, name: &str, node: NodeId) {
        if let Some(frame) = self.scope_stack.last_mut() {
            frame.names.insert(name.to_string(), node);
        }
    }

    pub fn lookup_in_scope(&self, name: &str) -> Option<NodeId> {
        self.scope_stack.iter().rev().find_map(|f| f.names.get(name).copied())
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_stack.len()
    }

    // --- switch / case stacks ---

    pub fn push_switch(&mut self) {
        self.switch_stack.push(SwitchFrame::default());
    }

    pub fn pop_switch(&mut self) -> Vec<NodeId> {
        self.switch_stack.pop().map(|f| f.cases).unwrap_or_default()
    }

    pub fn in_switch(&self) -> bool {
        !self.switch_stack.is_empty()
    }

    pub fn push_case(&mut self, case: NodeId) {
        if let Some(frame) = self.switch_stack.last_mut() {
            frame.cases.push(case);
        }
        self.case_stack.push(case);
    }

    pub fn pop_case(&mut self) {
        self.case_stack.pop();
    }

    pub fn in_case(&self) -> bool {
        !self.case_stack.is_empty()
    }

    // --- with stack ---

    pub fn push_with(&mut self, node: NodeId) {
        self.with_stack.push(node);
    }

    pub fn pop_with(&mut self) {
        self.with_stack.pop();
    }

    pub fn current_with(&self) -> Option<NodeId> {
        self.with_stack.last().copied()
    }

    // --- member-access stack (drives UFCS) ---

    pub fn push_member_access(&mut self, receiver: NodeId) {
        self.member_access_stack.push(receiver);
    }

    pub fn pop_member_access(&mut self) -> Option<NodeId> {
        self.member_access_stack.pop()
    }

    pub fn member_access_receiver(&self) -> Option<NodeId> {
        self.member_access_stack.last().copied()
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
    fn scope_stack_shadows_inner_over_outer() {
        let mut b = AstBuilder::new();
        b.push_scope();
        let outer = b.make_leaf(NodeKind::Ident, None, span());
        b.declare_in_scope("x", outer);
        b.push_scope();
        let inner = b.make_leaf(NodeKind::Ident, None, span());
        b.declare_in_scope("x", inner);
        assert_eq!(b.lookup_in_scope("x"), Some(inner));
        b.pop_scope();
        assert_eq!(b.lookup_in_scope("x"), Some(outer));
    }

    #[test]
    fn member_access_stack_tracks_ufcs_receiver() {
        let mut b = AstBuilder::new();
        assert!(b.member_access_receiver().is_none());
        let recv = b.make_leaf(NodeKind::StringLit, None, span());
        b.push_member_access(recv);
        assert_eq!(b.member_access_receiver(), Some(recv));
        b.pop_member_access();
        assert!(b.member_access_receiver().is_none());
    }

    #[test]
    fn switch_stack_collects_cases() {
        let mut b = AstBuilder::new();
        b.push_switch();
        let c1 = b.make_leaf(NodeKind::Case, None, span());
        let c2 = b.make_leaf(NodeKind::Case, None, span());
        b.push_case(c1);
        b.pop_case();
        b.push_case(c2);
        b.pop_case();
        assert_eq!(b.pop_switch(), vec![c1, c2]);
    }

    #[test]
    fn node_ids_are_monotonic() {
        let mut b = AstBuilder::new();
        let a = b.make_leaf(NodeKind::NilLit, None, span());
        let c = b.make_leaf(NodeKind::NilLit, None, span());
        assert!(c.as_u32() > a.as_u32());
    }
}
