//! AST → element graph lowering (spec §4.5's `ElementBuilder`/`ScopeManager` wired together,
//! driven walking the [`crate::ast::AstBuilder`] tree the parser produced).
//!
//! One [`Lowerer`] lowers exactly one parsed program; it owns the element/scope factories for the
//! duration and is discarded once [`lower_program`] returns — the [`ElementGraph`] and
//! [`ScopeManager`] it produces outlive it and are what the semantic engine (spec §4.7) walks.
//! Grounded structurally on the teacher's `QueryParsed::analyze` step (`plotnik-lib/src/query/
//! stages.rs`), which drives its AST → `SymbolTable`/`TypeContext` build the same way: one pass
//! over the tree, building scopes top-down while it goes.

mod directive;
mod expr;
mod ty;

use crate::ast::{AstBuilder, NodeId, NodeKind};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::element::{
    BindingKind, DeclMode, Element, ElementBuilder, ElementGraph, ElementId, ElementKind, ModuleKind,
    NumericType, TypeKind,
};
use crate::scope::{BlockId, ScopeManager, Symbol};
use crate::source::{SourceBuffer, SourceId, Span};
use crate::token::{BinaryOp as _Unused, Token as _UnusedToken, TokenId, TokenKind, TokenPool, UnaryOp as _Unused2};

// The element module's own `BinaryOp`/`UnaryOp` shadow the token-level enums of the same name
// used nowhere else in this module; re-import them explicitly under their real home.
use crate::element::{BinaryOp, UnaryOp};

/// Output of lowering one program: the element graph, its scope tree, the root element/scope,
/// and any diagnostics recorded along the way (spec §4.5 invariants never abort lowering itself —
/// a malformed reference is recorded and lowering continues, matching the parser's own recovery
/// philosophy).
pub struct LowerResult {
    pub root: ElementId,
    pub root_scope: BlockId,
    pub graph: ElementGraph,
    pub scopes: ScopeManager,
    pub diagnostics: Diagnostics,
}

/// Lowers a parsed program into an element graph.
pub fn lower_program(ast: &AstBuilder, pool: &TokenPool, source: &SourceBuffer, program: NodeId) -> LowerResult {
    let mut lowerer = Lowerer {
        ast,
        pool,
        source,
        builder: ElementBuilder::new(),
        scopes: ScopeManager::new(),
        diagnostics: Diagnostics::new(),
    };
    let root_scope = lowerer.scopes.push_scope();
    register_builtins(&mut lowerer.builder, &mut lowerer.scopes, root_scope);

    let span = lowerer.span(program);
    let root = lowerer.builder.make(ElementKind::ModuleLevel(ModuleKind::Program { body: root_scope }), span);
    let prev_parent = lowerer.builder.set_parent(Some(root));
    let prev_scope = lowerer.builder.set_scope(Some(root_scope));
    let prev_module = lowerer.builder.set_module(Some(root));
    let stmts = lowerer.ast.get(program).children.clone();
    lowerer.lower_stmt_sequence(&stmts, root_scope);
    lowerer.builder.set_parent(prev_parent);
    lowerer.builder.set_scope(prev_scope);
    lowerer.builder.set_module(prev_module);

    LowerResult {
        root,
        root_scope,
        graph: lowerer.builder.into_graph(),
        scopes: lowerer.scopes,
        diagnostics: lowerer.diagnostics,
    }
}

/// Preloads every numeric/primitive type name into the root scope's type table so an ordinary
/// [`ScopeManager::find_type`] lookup resolves `s32`, `bool`, etc. exactly like a user-declared
/// type — no separate "is this a builtin" branch needed anywhere else in lowering.
fn register_builtins(builder: &mut ElementBuilder, scopes: &mut ScopeManager, root: BlockId) {
    let span = Span::empty(SourceId::new(0), 0);
    let mut reg = |name: &str, kind: TypeKind| {
        let id = builder.make(ElementKind::Type(kind), span);
        let _ = scopes.add_type_to_scope(root, name, id);
    };
    reg("u8", TypeKind::Numeric(NumericType::U8));
    reg("u16", TypeKind::Numeric(NumericType::U16));
    reg("u32", TypeKind::Numeric(NumericType::U32));
    reg("u64", TypeKind::Numeric(NumericType::U64));
    reg("s8", TypeKind::Numeric(NumericType::S8));
    reg("s16", TypeKind::Numeric(NumericType::S16));
    reg("s32", TypeKind::Numeric(NumericType::S32));
    reg("s64", TypeKind::Numeric(NumericType::S64));
    reg("f32", TypeKind::Numeric(NumericType::F32));
    reg("f64", TypeKind::Numeric(NumericType::F64));
    reg("bool", TypeKind::Bool);
    reg("rune", TypeKind::Rune);
    reg("str", TypeKind::Str);
    reg("any", TypeKind::Any);
    reg("typeinfo", TypeKind::TypeInfo);
}

/// Owns the (borrowed) parse output plus the (owned, under construction) element graph / scope
/// tree for the duration of one lowering pass.
struct Lowerer<'a> {
    ast: &'a AstBuilder,
    pool: &'a TokenPool,
    source: &'a SourceBuffer,
    builder: ElementBuilder,
    scopes: ScopeManager,
    diagnostics: Diagnostics,
}

impl<'a> Lowerer<'a> {
    fn span(&self, id: NodeId) -> Span {
        self.ast.get(id).span
    }

    fn lexeme_of(&self, tok: TokenId) -> String {
        self.pool.get(tok).lexeme.clone()
    }

    fn ident_name(&self, id: NodeId) -> String {
        let tok = self.ast.get(id).binding.expect("identifier node missing its binding token");
        self.lexeme_of(tok)
    }

    fn report(&mut self, code: DiagnosticCode, span: Span) {
        self.diagnostics.report(code, span).emit();
    }

    /// Lowers a run of statement nodes into `scope`, in source order, handling the one
    /// cross-statement fold this pass does on its own: a `#intrinsic name` directive immediately
    /// followed by a procedure declaration is merged into that procedure's `intrinsic_name`
    /// rather than kept as a separate dangling directive element (spec §4.6 intrinsic dispatch
    /// reads the name off the procedure type, not off a free-floating directive).
    fn lower_stmt_sequence(&mut self, stmt_nodes: &[NodeId], scope: BlockId) {
        let mut i = 0;
        while i < stmt_nodes.len() {
            let stmt = stmt_nodes[i];
            if let Some(name) = self.intrinsic_directive_name(stmt) {
                if let Some(&next) = stmt_nodes.get(i + 1) {
                    if self.ast.get(next).kind == NodeKind::Decl {
                        let decl_el = self.lower_decl_stmt(next, scope);
                        if let Some(proc_ty) = self.procedure_type_of(decl_el) {
                            if let ElementKind::Type(TypeKind::Procedure(p)) =
                                &mut self.builder.graph_mut().get_mut(proc_ty).kind
                            {
                                p.intrinsic_name = Some(name);
                            }
                        }
                        self.scopes.get_mut(scope).statements.push(decl_el);
                        i += 2;
                        continue;
                    }
                }
            }
            if let Some(id) = self.lower_stmt(stmt, scope) {
                self.scopes.get_mut(scope).statements.push(id);
            }
            i += 1;
        }
    }

    fn lower_stmt(&mut self, node: NodeId, scope: BlockId) -> Option<ElementId> {
        let base = self.lower_stmt_inner(node, scope)?;
        Some(self.apply_labels(node, base))
    }

    /// Wraps `inner` in a [`crate::element::ControlKind::Label`] per label attached to `node`
    /// (spec §4.4's label side-table, consulted by `break`/`continue` label resolution).
    fn apply_labels(&mut self, node: NodeId, inner: ElementId) -> ElementId {
        use crate::element::ControlKind;
        let labels = self.ast.extras(node).labels.clone();
        let span = self.span(node);
        labels.into_iter().fold(inner, |acc, tok| {
            let raw = self.lexeme_of(tok);
            let name = raw.trim_start_matches('\'').trim_end_matches(':').to_string();
            self.builder.make(ElementKind::Control(ControlKind::Label { name, inner: acc }), span)
        })
    }

    fn lower_stmt_inner(&mut self, node: NodeId, scope: BlockId) -> Option<ElementId> {
        use crate::element::ControlKind;
        let kind = self.ast.get(node).kind;
        match kind {
            NodeKind::Decl => Some(self.lower_decl_stmt(node, scope)),
            NodeKind::Field => Some(self.lower_field_decl_stmt(node, scope)),
            NodeKind::Module => Some(self.lower_module_stmt(node, scope)),
            NodeKind::Namespace => Some(self.lower_namespace_stmt(node, scope)),
            NodeKind::Import => Some(self.lower_import_stmt(node)),
            // A bare `@attr;` run (parser's `scope_attribute_only_run`) carries no binding token
            // and has no modeled semantic effect of its own; it is metadata on the enclosing
            // scope, not a statement.
            NodeKind::Directive if self.ast.get(node).binding.is_none() => None,
            NodeKind::Directive => Some(self.lower_directive(node, scope)),
            NodeKind::If
            | NodeKind::While
            | NodeKind::ForIn
            | NodeKind::Switch
            | NodeKind::Return
            | NodeKind::Defer
            | NodeKind::With
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Fallthrough
            | NodeKind::Block
            | NodeKind::Yield => Some(self.lower_control(node, scope)),
            _ => {
                let inner = self.lower_expr(node, scope);
                let span = self.span(node);
                Some(self.builder.make(ElementKind::Control(ControlKind::Stmt { inner }), span))
            }
        }
    }

    fn lower_block(&mut self, node: NodeId) -> ElementId {
        use crate::element::ControlKind;
        let span = self.span(node);
        let child_scope = self.scopes.push_scope();
        let el = self.builder.make(ElementKind::Control(ControlKind::Block(child_scope)), span);
        let prev_parent = self.builder.set_parent(Some(el));
        let prev_scope = self.builder.set_scope(Some(child_scope));
        let stmts = self.ast.get(node).children.clone();
        self.lower_stmt_sequence(&stmts, child_scope);
        self.builder.set_parent(prev_parent);
        self.builder.set_scope(prev_scope);
        self.scopes.pop_scope();
        el
    }

    fn lower_control(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        use crate::element::ControlKind;
        let n_kind = self.ast.get(node).kind;
        let span = self.span(node);
        match n_kind {
            NodeKind::Block => self.lower_block(node),
            NodeKind::If => {
                let children = self.ast.get(node).children.clone();
                let cond = self.lower_expr(children[0], scope);
                let then_branch = self.lower_block(children[1]);
                let else_branch = children.get(2).map(|&e| {
                    if self.ast.get(e).kind == NodeKind::If { self.lower_control(e, scope) } else { self.lower_block(e) }
                });
                self.builder.make(ElementKind::Control(ControlKind::If { cond, then_branch, else_branch }), span)
            }
            NodeKind::While => {
                let n = self.ast.get(node).clone();
                let cond = self.lower_expr(n.lhs.unwrap(), scope);
                let body = self.lower_block(n.rhs.unwrap());
                self.builder.make(ElementKind::Control(ControlKind::While { cond, body }), span)
            }
            NodeKind::ForIn => {
                let children = self.ast.get(node).children.clone();
                let binding = self.ident_name(children[0]);
                let iterable = self.lower_expr(children[1], scope);
                let body = self.lower_block(children[2]);
                self.builder.make(ElementKind::Control(ControlKind::ForIn { binding, iterable, body }), span)
            }
            NodeKind::Switch => {
                let children = self.ast.get(node).children.clone();
                let subject = self.lower_expr(children[0], scope);
                let cases = children[1..].iter().map(|&c| self.lower_case(c, scope)).collect();
                self.builder.make(ElementKind::Control(ControlKind::Switch { subject, cases }), span)
            }
            NodeKind::Fallthrough => self.builder.make(ElementKind::Control(ControlKind::Fallthrough), span),
            NodeKind::Break => {
                let label = self.ast.extras(node).labels.first().map(|&t| self.lexeme_of(t));
                self.builder.make(ElementKind::Control(ControlKind::Break { label }), span)
            }
            NodeKind::Continue => {
                let label = self.ast.extras(node).labels.first().map(|&t| self.lexeme_of(t));
                self.builder.make(ElementKind::Control(ControlKind::Continue { label }), span)
            }
            NodeKind::Return => {
                let value = self.ast.get(node).lhs.map(|v| self.lower_expr(v, scope));
                self.builder.make(ElementKind::Control(ControlKind::Return { value }), span)
            }
            // `yield` has no dedicated IR shape (spec's control-flow family stops at `return`);
            // modeled as a `Return`, leaving the generator-vs-procedure distinction to emission
            // (out of scope here), which can tell the two apart by the enclosing procedure kind.
            NodeKind::Yield => {
                let value = self.ast.get(node).lhs.map(|v| self.lower_expr(v, scope));
                self.builder.make(ElementKind::Control(ControlKind::Return { value }), span)
            }
            NodeKind::Defer => {
                let inner = self.lower_expr(self.ast.get(node).lhs.unwrap(), scope);
                let el = self.builder.make(ElementKind::Control(ControlKind::Defer { inner }), span);
                self.scopes.get_mut(scope).deferred.push(el);
                el
            }
            NodeKind::With => {
                let n = self.ast.get(node).clone();
                let binding = self.lower_expr(n.lhs.unwrap(), scope);
                let body = self.lower_block(n.rhs.unwrap());
                self.builder.make(ElementKind::Control(ControlKind::With { binding, body }), span)
            }
            _ => unreachable!("lower_control called with a non-control node kind"),
        }
    }

    fn lower_case(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        use crate::element::ControlKind;
        let span = self.span(node);
        let children = self.ast.get(node).children.clone();
        let (value_nodes, body_node) = children.split_at(children.len() - 1);
        let values = value_nodes.iter().map(|&v| self.lower_expr(v, scope)).collect();
        let body = self.lower_block(body_node[0]);
        self.builder.make(ElementKind::Control(ControlKind::Case { values, body }), span)
    }

    fn lower_decl_stmt(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let lhs = n.lhs.unwrap();
        let init_node = n.rhs.unwrap();
        let span = n.span;
        let lhs_node = self.ast.get(lhs).clone();
        if lhs_node.kind == NodeKind::Field {
            // `name : T = expr`: a typed declaration with an explicit initializer.
            let name = self.ident_name(lhs_node.lhs.unwrap());
            let declared_ty = self.lower_type(lhs_node.rhs.unwrap(), scope, None);
            return self.finish_decl(DeclMode::Typed, name, Some(declared_ty), Some(init_node), scope, span);
        }
        let name = self.ident_name(lhs);
        let binding_tok = n.binding.unwrap();
        let mode =
            if self.pool.get(binding_tok).kind == TokenKind::ColonColon { DeclMode::Constant } else { DeclMode::Mutable };
        self.finish_decl(mode, name, None, Some(init_node), scope, span)
    }

    fn lower_field_decl_stmt(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let name = self.ident_name(n.lhs.unwrap());
        let ty = self.lower_type(n.rhs.unwrap(), scope, None);
        let span = n.span;
        let symbol = Symbol::plain(name.clone());
        let identifier = self.builder.make(
            ElementKind::Binding(BindingKind::Identifier {
                name: name.clone(),
                symbol,
                declared_type: Some(ty),
                init: None,
                constant: false,
            }),
            span,
        );
        if self.scopes.declare_identifier(scope, &name, identifier).is_err() {
            self.report(DiagnosticCode::R034DuplicateIdentifier, span);
        }
        self.builder.make(
            ElementKind::Binding(BindingKind::Decl { mode: DeclMode::Typed, identifier, declared_type: Some(ty), init: None }),
            span,
        )
    }

    /// Shared tail of every `:=`/`::`/`: T =` declaration form. Constant declarations whose
    /// initializer is itself a self-registering type construct (a composite, a namespace, or a
    /// module) return that element directly rather than wrapping it in an `Identifier`/`Decl`
    /// pair — registration into the scope's *type* table already happened while lowering the
    /// initializer (spec §4.5 `add_type_to_scope`), matching how a forward self-reference inside
    /// a struct's own fields resolves.
    fn finish_decl(
        &mut self,
        mode: DeclMode,
        name: String,
        declared_type: Option<ElementId>,
        init_node: Option<NodeId>,
        scope: BlockId,
        span: Span,
    ) -> ElementId {
        let raw_init = init_node.map(|n| self.lower_value_or_type(n, scope, Some(&name)));
        let init = raw_init.map(|id| {
            if mode == DeclMode::Constant && self.is_bare_procedure_type(id) {
                self.builder.make(ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { ty: id }), span)
            } else {
                id
            }
        });

        if mode == DeclMode::Constant {
            if let Some(init_id) = init {
                if self.is_self_registering_type(init_id) {
                    return init_id;
                }
            }
        }

        let symbol = Symbol::plain(name.clone());
        let identifier = self.builder.make(
            ElementKind::Binding(BindingKind::Identifier {
                name: name.clone(),
                symbol,
                declared_type,
                init,
                constant: mode == DeclMode::Constant,
            }),
            span,
        );
        let is_proc_instance =
            init.map(|id| matches!(self.builder.graph().get(id).kind, ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { .. })))
                .unwrap_or(false);
        if is_proc_instance {
            self.scopes.register_overload(scope, &name, identifier);
        } else if self.scopes.declare_identifier(scope, &name, identifier).is_err() {
            self.report(DiagnosticCode::R034DuplicateIdentifier, span);
        }
        self.builder.make(ElementKind::Binding(BindingKind::Decl { mode, identifier, declared_type, init }), span)
    }

    fn is_bare_procedure_type(&self, id: ElementId) -> bool {
        matches!(self.builder.graph().get(id).kind, ElementKind::Type(TypeKind::Procedure(_)))
    }

    fn is_self_registering_type(&self, id: ElementId) -> bool {
        matches!(
            self.builder.graph().get(id).kind,
            ElementKind::Type(TypeKind::Composite(_))
                | ElementKind::ModuleLevel(ModuleKind::Namespace { .. })
                | ElementKind::ModuleLevel(ModuleKind::Module { .. })
        )
    }

    /// Walks a `Decl`/instance chain to the [`TypeKind::Procedure`] element it ultimately names,
    /// if any — used to fold a preceding `#intrinsic` directive into that procedure's type.
    fn procedure_type_of(&self, id: ElementId) -> Option<ElementId> {
        match &self.builder.graph().get(id).kind {
            ElementKind::ModuleLevel(ModuleKind::ProcedureInstance { ty }) => Some(*ty),
            ElementKind::Type(TypeKind::Procedure(_)) => Some(id),
            ElementKind::Binding(BindingKind::Decl { identifier, .. }) => {
                if let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) =
                    &self.builder.graph().get(*identifier).kind
                {
                    let init = *init;
                    return self.procedure_type_of(init);
                }
                None
            }
            _ => None,
        }
    }

    fn lower_module_stmt(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        let name = self.ident_name(n.lhs.unwrap());
        let body_node = n.rhs.unwrap();
        let child_scope = self.scopes.push_scope();
        let placeholder = self.builder.make(ElementKind::ModuleLevel(ModuleKind::Module { name: name.clone(), body: child_scope }), span);
        if self.scopes.add_type_to_scope(scope, &name, placeholder).is_err() {
            self.report(DiagnosticCode::R033DuplicateTypeName, span);
        }
        let prev_parent = self.builder.set_parent(Some(placeholder));
        let prev_scope = self.builder.set_scope(Some(child_scope));
        let prev_module = self.builder.set_module(Some(placeholder));
        let stmts = self.ast.get(body_node).children.clone();
        self.lower_stmt_sequence(&stmts, child_scope);
        self.builder.set_parent(prev_parent);
        self.builder.set_scope(prev_scope);
        self.builder.set_module(prev_module);
        self.scopes.pop_scope();
        placeholder
    }

    fn lower_namespace_stmt(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        let name = self.ident_name(n.lhs.unwrap());
        let body_node = n.rhs.unwrap();
        let child_scope = self.scopes.push_scope();
        let placeholder =
            self.builder.make(ElementKind::ModuleLevel(ModuleKind::Namespace { name: name.clone(), body: child_scope }), span);
        if self.scopes.add_type_to_scope(scope, &name, placeholder).is_err() {
            self.report(DiagnosticCode::R033DuplicateTypeName, span);
        }
        let prev_parent = self.builder.set_parent(Some(placeholder));
        let prev_scope = self.builder.set_scope(Some(child_scope));
        let stmts = self.ast.get(body_node).children.clone();
        self.lower_stmt_sequence(&stmts, child_scope);
        self.builder.set_parent(prev_parent);
        self.builder.set_scope(prev_scope);
        self.scopes.pop_scope();
        placeholder
    }

    fn lower_import_stmt(&mut self, node: NodeId) -> ElementId {
        let n = self.ast.get(node).clone();
        let path = n.binding.map(|t| unescape(&self.lexeme_of(t))).unwrap_or_default();
        self.builder.make(ElementKind::ModuleLevel(ModuleKind::Import { path }), n.span)
    }
}

fn unary_op(kind: TokenKind) -> UnaryOp {
    match kind {
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Amp => UnaryOp::AddressOf,
        TokenKind::Caret => UnaryOp::Deref,
        _ => UnaryOp::Neg,
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    use TokenKind::*;
    match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Rem,
        StarStar => BinaryOp::Pow,
        EqEq => BinaryOp::Eq,
        NotEq => BinaryOp::NotEq,
        Less => BinaryOp::Lt,
        Greater => BinaryOp::Gt,
        LessEq => BinaryOp::LtEq,
        GreaterEq => BinaryOp::GtEq,
        AmpAmp => BinaryOp::And,
        PipePipe => BinaryOp::Or,
        Amp => BinaryOp::BitAnd,
        Pipe => BinaryOp::BitOr,
        Tilde => BinaryOp::BitXor,
        Shl => BinaryOp::Shl,
        Shr => BinaryOp::Shr,
        // Compound assignments (`x -:= 1`) desugar to a `Binary` node whose `binding` token is
        // the compound-assign token itself (`parse_assignment`, spec §4.2) — map each back to the
        // plain arithmetic/bitwise op it stands for.
        PlusAssign => BinaryOp::Add,
        MinusAssign => BinaryOp::Sub,
        StarAssign => BinaryOp::Mul,
        SlashAssign => BinaryOp::Div,
        PercentAssign => BinaryOp::Rem,
        PipeAssign => BinaryOp::BitOr,
        AmpAssign => BinaryOp::BitAnd,
        TildeAssign => BinaryOp::BitXor,
        _ => BinaryOp::Add,
    }
}

/// Parses an integer literal lexeme (radix prefix and `_` separators already implied by `radix`),
/// saturating to `0` on overflow rather than panicking — malformed numeric literals are a parser
/// diagnostic concern (`P022`), not a lowering-time one.
fn parse_int_literal(lexeme: &str, radix: crate::token::Radix) -> i128 {
    use crate::token::Radix;
    let (digits, base): (String, u32) = match radix {
        Radix::Hex => (lexeme[1..].chars().filter(|c| *c != '_').collect(), 16),
        Radix::Octal => (lexeme[1..].chars().filter(|c| *c != '_').collect(), 8),
        Radix::Binary => (lexeme[1..].chars().filter(|c| *c != '_').collect(), 2),
        Radix::Decimal => (lexeme.chars().filter(|c| *c != '_').collect(), 10),
    };
    i128::from_str_radix(&digits, base).unwrap_or(0)
}

fn parse_float_literal(lexeme: &str) -> f64 {
    lexeme.chars().filter(|c| *c != '_').collect::<String>().parse().unwrap_or(0.0)
}

/// Un-escapes a string/char literal's raw content (the lexer only isolates the quoted content;
/// escape processing is lowering's job, matching the other "logos handles the flat case, the
/// wrapper handles the rest" split already used by [`crate::lexer`]).
fn unescape(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(b) = u8::from_str_radix(&hex, 16) {
                    out.push(b as char);
                }
            }
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if let Ok(v) = u32::from_str_radix(&hex, 16) {
                    if let Some(ch) = char::from_u32(v) {
                        out.push(ch);
                    }
                }
            }
            Some('U') => {
                let hex: String = chars.by_ref().take(8).collect();
                if let Ok(v) = u32::from_str_radix(&hex, 16) {
                    if let Some(ch) = char::from_u32(v) {
                        out.push(ch);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, ExprKind};
    use crate::lexer::lex;
    use crate::parser::Parser;
    use crate::token::TokenPool;

    fn lower_source(src: &str) -> LowerResult {
        let source_id = SourceId::new(0);
        let buffer = SourceBuffer::new(source_id, "test.bc", src);
        let mut pool = TokenPool::new();
        let lexed = lex(source_id, src, &mut pool);
        let parsed = Parser::new(&lexed.tokens, &pool).parse().expect("parse should not hit a fatal error");
        lower_program(&parsed.ast, &pool, &buffer, parsed.program)
    }

    #[test]
    fn mutable_decl_infers_nothing_but_registers_identifier() {
        let result = lower_source("x := 42;");
        assert!(result.diagnostics.is_empty());
        let root_block = result.scopes.get(result.root_scope);
        assert_eq!(root_block.statements.len(), 1);
        assert!(root_block.identifiers.contains_key("x"));
    }

    #[test]
    fn constant_struct_decl_registers_as_type_not_identifier() {
        let result = lower_source("Point :: struct { x: s32, y: s32 };");
        let root_block = result.scopes.get(result.root_scope);
        assert!(root_block.types.contains_key("Point"));
        assert!(!root_block.identifiers.contains_key("Point"));
        let ty = *root_block.types.get("Point").unwrap();
        match &result.graph.get(ty).kind {
            ElementKind::Type(TypeKind::Composite(c)) => assert_eq!(c.members.len(), 2),
            other => panic!("expected composite type, got {other:?}"),
        }
    }

    #[test]
    fn self_referential_struct_resolves_via_forward_registration() {
        let result = lower_source("Node :: struct { next: ^Node };");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics.iter().collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_identifier_in_same_scope_is_diagnosed() {
        let result = lower_source("x := 1; x := 2;");
        assert_eq!(result.diagnostics.error_count(), 1);
    }

    #[test]
    fn two_procedures_sharing_a_name_are_overload_candidates_not_an_error() {
        let result = lower_source("foo :: proc(x: s32): s32 { return x; }; foo :: proc(x: f32): f32 { return x; };");
        assert!(result.diagnostics.is_empty());
        let candidates = result.scopes.find_overloads(result.root_scope, "foo");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn uniform_call_syntax_rewrites_the_callee_to_a_plain_identifier_reference() {
        let result = lower_source(r#"n := "hello".len();"#);
        let root_block = result.scopes.get(result.root_scope);
        let n = *root_block.identifiers.get("n").unwrap();
        let ElementKind::Binding(BindingKind::Identifier { init: Some(call), .. }) = &result.graph.get(n).kind else {
            panic!("expected identifier");
        };
        let ElementKind::Expr(ExprKind::Call { callee, args, uniform, .. }) = &result.graph.get(*call).kind else {
            panic!("expected a call");
        };
        assert!(*uniform);
        match &result.graph.get(*callee).kind {
            ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }) => assert_eq!(symbol.name, "len"),
            other => panic!("expected an unresolved IdentRef callee, got {other:?}"),
        }
        let ElementKind::Expr(ExprKind::ArgList { args }) = &result.graph.get(*args).kind else {
            panic!("expected an argument list");
        };
        assert_eq!(args.len(), 1, "the receiver is prepended as the sole positional argument");
        match &result.graph.get(args[0]).kind {
            ElementKind::Literal(crate::element::Literal::Str(s)) => assert_eq!(s, "hello"),
            other => panic!("expected the receiver string literal, got {other:?}"),
        }
    }

    #[test]
    fn import_path_is_unescaped() {
        let result = lower_source(r#"import "a/b.bc";"#);
        let root_block = result.scopes.get(result.root_scope);
        let id = root_block.statements[0];
        match &result.graph.get(id).kind {
            ElementKind::ModuleLevel(ModuleKind::Import { path }) => assert_eq!(path, "a/b.bc"),
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn intrinsic_directive_folds_into_procedure_type() {
        let result = lower_source("#intrinsic size_of foo :: proc(x: s32): s32;");
        let root_block = result.scopes.get(result.root_scope);
        assert_eq!(root_block.statements.len(), 1, "the directive should fold into the procedure, not stand alone");
        let candidates = result.scopes.find_overloads(result.root_scope, "foo");
        let ty = result.graph.get(candidates[0]);
        let ElementKind::Binding(BindingKind::Identifier { init: Some(init), .. }) = &ty.kind else { panic!() };
        let ElementKind::Type(TypeKind::Procedure(p)) = &result.graph.get(*init).kind else { panic!() };
        assert_eq!(p.intrinsic_name.as_deref(), Some("size_of"));
    }
}
