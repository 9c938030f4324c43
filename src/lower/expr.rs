//! Lowers expression-shaped AST nodes (`parser::expr`'s literal/operator/call/member grammar)
//! into [`ElementKind::Expr`]/[`ElementKind::Literal`]/[`ElementKind::Intrinsic`] elements.
//!
//! Identifier references are lowered to `ExprKind::IdentRef { resolved: None, .. }` here and left
//! unresolved on purpose (spec §4.7 pass 2 fills `resolved` in once every scope in the program has
//! been registered) — unlike type names, which [`super::ty`] resolves eagerly since a composite's
//! own name must be visible to its fields while they're still being lowered.

use super::{binary_op, parse_float_literal, parse_int_literal, unary_op, unescape, Lowerer};
use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticCode;
use crate::element::{BindingKind, ElementId, ElementKind, ExprKind, IntrinsicKind};
use crate::scope::{BlockId, Symbol};
use crate::token::{Radix, TokenKind};

impl<'a> Lowerer<'a> {
    pub(super) fn lower_expr(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        match n.kind {
            NodeKind::BoolLit => {
                let tok = n.binding.expect("BoolLit node missing its binding token");
                let value = self.pool.get(tok).kind == TokenKind::KwTrue;
                self.builder.make_bool_lit(value, span)
            }
            NodeKind::NilLit => self.builder.make_nil_lit(span),
            NodeKind::IntLit => {
                let tok = n.binding.expect("IntLit node missing its binding token");
                let data = self.pool.get(tok);
                let value = parse_int_literal(&data.lexeme, data.radix.unwrap_or(Radix::Decimal));
                self.builder.make_int_lit(value, span)
            }
            NodeKind::FloatLit => {
                let tok = n.binding.expect("FloatLit node missing its binding token");
                let value = parse_float_literal(&self.lexeme_of(tok));
                self.builder.make_float_lit(value, span)
            }
            NodeKind::CharLit => {
                let tok = n.binding.expect("CharLit node missing its binding token");
                let value = unescape(&self.lexeme_of(tok)).chars().next().unwrap_or('\0');
                self.builder.make_char_lit(value, span)
            }
            NodeKind::StringLit => {
                let tok = n.binding.expect("StringLit node missing its binding token");
                let value = unescape(&self.lexeme_of(tok));
                self.builder.make_string_lit(value, span)
            }
            NodeKind::Ident => {
                let name = self.ident_name(node);
                if name == "_" {
                    return self.builder.make_sink(span);
                }
                let symbol = Symbol::plain(name);
                self.builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), span)
            }
            NodeKind::Unary => {
                let tok = n.binding.expect("Unary node missing its operator token");
                let op = unary_op(self.pool.get(tok).kind);
                let operand = self.lower_expr(n.lhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::Unary { op, operand }), span)
            }
            NodeKind::Binary => {
                let tok = n.binding.expect("Binary node missing its operator token");
                let op = binary_op(self.pool.get(tok).kind);
                let lhs = self.lower_expr(n.lhs.unwrap(), scope);
                let rhs = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::Binary { op, lhs, rhs }), span)
            }
            NodeKind::Assign => {
                let target_inner = self.lower_expr(n.lhs.unwrap(), scope);
                let target_span = self.span(n.lhs.unwrap());
                let target = self
                    .builder
                    .make(ElementKind::Binding(BindingKind::AssignmentTarget { inner: target_inner }), target_span);
                let value = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Binding(BindingKind::Assignment { target, value }), span)
            }
            NodeKind::Comma => {
                let mut elems = Vec::new();
                self.flatten_comma(node, scope, &mut elems);
                self.builder.make(ElementKind::Expr(ExprKind::TupleCtor { elems }), span)
            }
            // `k := v` mid-expression has no dedicated element shape (spec's array/composite
            // literal syntax, the only place it would normally appear, has no concrete grammar in
            // this parser); modeled as a 2-element tuple, matching `Comma`'s fallback shape.
            NodeKind::KeyValue => {
                let key = self.lower_expr(n.lhs.unwrap(), scope);
                let value = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::TupleCtor { elems: vec![key, value] }), span)
            }
            NodeKind::MemberAccess => {
                let base = self.lower_expr(n.lhs.unwrap(), scope);
                let name = self.ident_name(n.rhs.unwrap());
                self.builder.make(ElementKind::Expr(ExprKind::Member { base, name }), span)
            }
            NodeKind::Subscript => {
                let base = self.lower_expr(n.lhs.unwrap(), scope);
                let index = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::Subscript { base, index }), span)
            }
            NodeKind::Call => self.lower_call(node, scope),
            NodeKind::Cast => {
                let ty = self.lower_type(n.lhs.unwrap(), scope, None);
                let value = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::Cast { ty, value }), span)
            }
            NodeKind::Transmute => {
                let ty = self.lower_type(n.lhs.unwrap(), scope, None);
                let value = self.lower_expr(n.rhs.unwrap(), scope);
                self.builder.make(ElementKind::Expr(ExprKind::Transmute { ty, value }), span)
            }
            // `(expr)`: the parens exist only to override precedence — unwrap straight to the
            // inner element rather than allocating a pass-through wrapper.
            NodeKind::ParamList => self.lower_expr(n.lhs.unwrap(), scope),
            NodeKind::TypeRef | NodeKind::PointerType | NodeKind::ArrayType | NodeKind::ProcType | NodeKind::TypeTag => {
                self.lower_type(node, scope, None)
            }
            NodeKind::Module => self.lower_module_stmt(node, scope),
            NodeKind::Namespace => self.lower_namespace_stmt(node, scope),
            NodeKind::Import => self.lower_import_stmt(node),
            NodeKind::Directive => self.lower_directive(node, scope),
            NodeKind::RawBlock => {
                let text = self.source.slice(span).to_string();
                self.builder.make_string_lit(text, span)
            }
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
            | NodeKind::Yield => self.lower_control(node, scope),
            _ => {
                self.report(DiagnosticCode::P019UnexpectedToken, span);
                self.builder.make_nil_lit(span)
            }
        }
    }

    fn lower_call(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        if let Some(tok) = n.binding {
            let tok_kind = self.pool.get(tok).kind;
            if matches!(tok_kind, TokenKind::KwSizeOf | TokenKind::KwAlignOf) {
                let ty = self.lower_type(n.lhs.unwrap(), scope, None);
                let kind =
                    if tok_kind == TokenKind::KwSizeOf { IntrinsicKind::SizeOf { ty } } else { IntrinsicKind::AlignOf { ty } };
                return self.builder.make(ElementKind::Intrinsic(kind), span);
            }
        }
        let lhs = n.lhs.unwrap();
        let uniform = self.ast.extras(node).uniform_call;
        // `recv.name(...)`: the parser leaves `lhs` as the whole `recv.name` MemberAccess node
        // and has already prepended `recv` to the argument list (spec §4.4 UFCS) — lowering
        // `lhs` as-is would re-lower the receiver a second time into a `Member` callee that
        // resolution/overload matching never looks at. The callee proper is just `name`, an
        // ordinary (as yet unresolved) procedure reference.
        let callee = if uniform {
            let lhs_node = self.ast.get(lhs).clone();
            let name = self.ident_name(lhs_node.rhs.unwrap());
            let symbol = Symbol::plain(name);
            self.builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), self.span(lhs))
        } else {
            self.lower_expr(lhs, scope)
        };
        let arglist_node = n.rhs.unwrap();
        let arg_nodes = self.ast.get(arglist_node).children.clone();
        let args: Vec<ElementId> = arg_nodes.iter().map(|&a| self.lower_call_arg(a, scope)).collect();
        let args_el = self.builder.make(ElementKind::Expr(ExprKind::ArgList { args }), self.span(arglist_node));
        self.builder.make(ElementKind::Expr(ExprKind::Call { callee, args: args_el, uniform, resolved: None }), span)
    }

    fn lower_call_arg(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        if n.kind == NodeKind::ArgPair {
            let name = self.ident_name(n.lhs.unwrap());
            let value = self.lower_expr(n.rhs.unwrap(), scope);
            return self.builder.make(ElementKind::Expr(ExprKind::ArgPair { name, value }), n.span);
        }
        self.lower_expr(node, scope)
    }

    /// `Comma` nests right-associatively (`a, b, c` is `Comma(a, Comma(b, c))`); flattens that
    /// chain into a flat element list for `ExprKind::TupleCtor`.
    fn flatten_comma(&mut self, node: NodeId, scope: BlockId, out: &mut Vec<ElementId>) {
        let n = self.ast.get(node).clone();
        if n.kind == NodeKind::Comma {
            self.flatten_comma(n.lhs.unwrap(), scope, out);
            self.flatten_comma(n.rhs.unwrap(), scope, out);
        } else {
            out.push(self.lower_expr(node, scope));
        }
    }
}
