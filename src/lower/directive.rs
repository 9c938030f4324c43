//! Lowers `#directive` nodes (`parser::directive`'s `#type`/`#foreign`/`#intrinsic`/`#assembly`/
//! `#language`/`#run`/`#core_type`/`#if` grammar) into [`DirectiveKind`] elements.
//!
//! Raw-block bodies (`#assembly { .. }`/`#language "c" { .. }`) are re-sliced from the source
//! buffer at the `RawBlock` node's span, which the lexer already trims to exactly the inner text
//! (spec §3 "raw block" — no `{{`/`}}` delimiters to strip here).

use super::{unescape, Lowerer};
use crate::ast::{NodeId, NodeKind};
use crate::element::{DirectiveKind, ElementId, ElementKind, ExprKind, ForeignInfo};
use crate::scope::{BlockId, Symbol};

impl<'a> Lowerer<'a> {
    /// If `node` is a `#intrinsic name` directive, returns `name` — used by
    /// [`super::Lowerer::lower_stmt_sequence`] to fold the directive into the procedure
    /// declaration immediately following it, rather than lowering it as a standalone element.
    pub(super) fn intrinsic_directive_name(&self, node: NodeId) -> Option<String> {
        let n = self.ast.get(node).clone();
        if n.kind != NodeKind::Directive {
            return None;
        }
        let tok = n.binding?;
        if self.lexeme_of(tok) != "#intrinsic" {
            return None;
        }
        Some(self.ident_name(n.lhs?))
    }

    pub(super) fn lower_directive(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        let Some(tok) = n.binding else {
            let expr = self.builder.make_nil_lit(span);
            return self.builder.make(ElementKind::Directive(DirectiveKind::Run { expr }), span);
        };
        match self.lexeme_of(tok).as_str() {
            "#type" => {
                let ty = self.lower_type(n.lhs.unwrap(), scope, None);
                self.builder.make(ElementKind::Directive(DirectiveKind::Type { ty }), span)
            }
            // The grammar's bare `#foreign` carries no library/symbol payload of its own; those
            // attach via other means out of this parser's scope, so it lowers to an empty
            // `ForeignInfo` the semantic engine can still flag as present.
            "#foreign" => self.builder.make(ElementKind::Directive(DirectiveKind::Foreign(ForeignInfo::default())), span),
            "#intrinsic" => {
                let name = self.ident_name(n.lhs.unwrap());
                let symbol = Symbol::plain(name.clone());
                let target = self.builder.make(ElementKind::Expr(ExprKind::IdentRef { symbol, resolved: None }), span);
                self.builder.make(ElementKind::Directive(DirectiveKind::Intrinsic { name, target }), span)
            }
            "#assembly" => {
                let raw_body = self.source.slice(self.span(n.lhs.unwrap())).to_string();
                self.builder.make(ElementKind::Directive(DirectiveKind::Assembly { raw_body, should_emit: true }), span)
            }
            "#language" => {
                let lang = self.directive_lang_name(n.lhs.unwrap());
                let raw_body = self.source.slice(self.span(n.rhs.unwrap())).to_string();
                self.builder.make(ElementKind::Directive(DirectiveKind::Language { lang, raw_body }), span)
            }
            "#run" => {
                let expr = self.lower_expr(n.lhs.unwrap(), scope);
                self.builder.make(ElementKind::Directive(DirectiveKind::Run { expr }), span)
            }
            "#core_type" => {
                let ty = self.lower_type(n.lhs.unwrap(), scope, None);
                self.builder.make(ElementKind::Directive(DirectiveKind::CoreType { ty }), span)
            }
            "#if" => self.lower_if_directive(node, scope),
            // Unknown directive name: the parser already emitted `D040UnknownDirective`; lower to
            // an inert no-op rather than invent a catch-all `DirectiveKind` variant.
            _ => {
                let expr = self.builder.make_nil_lit(span);
                self.builder.make(ElementKind::Directive(DirectiveKind::Run { expr }), span)
            }
        }
    }

    fn directive_lang_name(&mut self, node: NodeId) -> String {
        let n = self.ast.get(node).clone();
        match n.kind {
            NodeKind::StringLit => unescape(&self.lexeme_of(n.binding.unwrap())),
            NodeKind::Ident => self.ident_name(node),
            _ => self.source.slice(n.span).to_string(),
        }
    }

    /// `#if cond { .. } [#elif cond { .. }]* [#else { .. }]`, flattened by the parser into
    /// `[cond, body, cond, body, ..., elseBody?]`; an odd-length list means the trailing element
    /// is the `#else` body rather than another condition.
    fn lower_if_directive(&mut self, node: NodeId, scope: BlockId) -> ElementId {
        let n = self.ast.get(node).clone();
        let span = n.span;
        let children = n.children.clone();
        let has_else = children.len() % 2 == 1;
        let pair_count = children.len() / 2;
        let mut branches = Vec::with_capacity(pair_count);
        for i in 0..pair_count {
            let cond = self.lower_expr(children[2 * i], scope);
            let body = self.lower_block(children[2 * i + 1]);
            branches.push((cond, body));
        }
        let else_branch = if has_else { Some(self.lower_block(*children.last().unwrap())) } else { None };
        self.builder.make(ElementKind::Directive(DirectiveKind::If { branches, else_branch, selected: None }), span)
    }
}
