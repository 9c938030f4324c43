//! Statements, blocks, and the control-flow keyword parselets.

use super::precedence::Precedence;
use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// A statement: leading labels/attributes/comments, exactly one expression, then a mandatory
    /// `;`. On failure, records an error and resynchronizes at the next `;` or `}` so later
    /// statements still get parsed (spec §4.4 error recovery).
    pub(super) fn parse_statement(&mut self) -> NodeId {
        let start = self.current_span();

        // A bare attribute/label run terminated by `;` with no expression attaches to the
        // enclosing scope rather than producing a statement body.
        if self.at(TokenKind::Attribute) && self.scope_attribute_only_run() {
            let mut attrs = Vec::new();
            while self.at(TokenKind::Attribute) {
                attrs.push(self.bump().id);
            }
            self.expect(TokenKind::Semi, "`;`");
            let span = start.cover(self.current_span());
            let node = self.ast().make_leaf(NodeKind::Directive, None, span);
            self.ast().extras_mut(node).attributes = attrs;
            return node;
        }

        let expr = if self.at_decl_start() { self.parse_decl() } else { self.parse_expr(Precedence::Lowest) };
        if !self.expect(TokenKind::Semi, "`;`") {
            self.synchronize(|k| matches!(k, TokenKind::Semi | TokenKind::RBrace));
            self.eat(TokenKind::Semi);
        }
        let span = start.cover(self.current_span());
        self.ast().get_mut(expr).span = span;
        expr
    }

    /// Looks ahead past a run of `Attribute` tokens to see if a `;` immediately follows (as
    /// opposed to an expression that happens to start with further attributes).
    fn scope_attribute_only_run(&self) -> bool {
        let mut i = self.pos;
        while self.tokens.get(i).map(|t| t.kind) == Some(TokenKind::Attribute) {
            i += 1;
        }
        self.tokens.get(i).map(|t| t.kind) == Some(TokenKind::Semi)
    }

    pub(super) fn parse_block(&mut self) -> NodeId {
        let start = self.current_span();
        self.bump();
        self.push_delimiter(TokenKind::LBrace);
        self.ast().push_scope();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.should_stop() {
            stmts.push(self.parse_statement());
        }
        self.ast().pop_scope();
        self.expect(TokenKind::RBrace, "`}`");
        self.pop_delimiter();
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::Block, None, stmts, span)
    }

    pub(super) fn parse_if(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let cond = self.parse_expr(Precedence::Lowest);
        let then_branch = self.parse_block();
        let else_branch = if self.eat(TokenKind::KwElse) {
            Some(if self.at(TokenKind::KwIf) { self.parse_if() } else { self.parse_block() })
        } else {
            None
        };
        let mut children = vec![cond, then_branch];
        if let Some(e) = else_branch {
            children.push(e);
        }
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::If, Some(kw.id), children, span)
    }

    pub(super) fn parse_while(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let cond = self.parse_expr(Precedence::Lowest);
        let body = self.parse_block();
        let span = start.cover(self.current_span());
        self.ast().make_binary(NodeKind::While, Some(kw.id), cond, body, span)
    }

    pub(super) fn parse_for_in(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let binding = self.expect_ident_leaf_pub();
        self.expect(TokenKind::KwIn, "`in`");
        let iterable = self.parse_expr(Precedence::Lowest);
        let body = self.parse_block();
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::ForIn, Some(kw.id), vec![binding, iterable, body], span)
    }

    pub(super) fn parse_switch(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let subject = self.parse_expr(Precedence::Lowest);
        self.expect(TokenKind::LBrace, "`{`");
        self.push_delimiter(TokenKind::LBrace);
        self.ast().push_switch();
        let mut cases = Vec::new();
        while self.at(TokenKind::KwCase) && !self.should_stop() {
            cases.push(self.parse_case());
        }
        self.ast().pop_switch();
        self.expect(TokenKind::RBrace, "`}`");
        self.pop_delimiter();
        let mut children = vec![subject];
        children.extend(cases);
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::Switch, Some(kw.id), children, span)
    }

    fn parse_case(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let mut values = vec![self.parse_expr(Precedence::Comma)];
        while self.eat(TokenKind::Comma) {
            values.push(self.parse_expr(Precedence::Comma));
        }
        let body = self.parse_block();
        let span = start.cover(self.current_span());
        let node = self.ast().make_with_children(NodeKind::Case, Some(kw.id), {
            let mut c = values;
            c.push(body);
            c
        }, span);
        self.ast().push_case(node);
        self.ast().pop_case();
        node
    }

    pub(super) fn parse_jump_with_value(&mut self, kind: NodeKind, _tag: TokenKind) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let value = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr(Precedence::Assignment))
        };
        let span = start.cover(self.current_span());
        match value {
            Some(v) => self.ast().make_unary(kind, Some(kw.id), v, span),
            None => self.ast().make_leaf(kind, Some(kw.id), span),
        }
    }

    pub(super) fn parse_jump_no_value(&mut self, kind: NodeKind, _tag: TokenKind) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let label = if self.at(TokenKind::Label) { Some(self.bump().id) } else { None };
        let span = start.cover(self.current_span());
        let node = self.ast().make_leaf(kind, Some(kw.id), span);
        if let Some(l) = label {
            self.ast().extras_mut(node).labels.push(l);
        }
        node
    }

    pub(super) fn parse_defer(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let body = self.parse_expr(Precedence::Lowest);
        let span = start.cover(self.ast().get(body).span);
        self.ast().make_unary(NodeKind::Defer, Some(kw.id), body, span)
    }

    pub(super) fn parse_with(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let binding = self.parse_expr(Precedence::Assignment);
        self.ast().push_with(binding);
        let body = self.parse_block();
        self.ast().pop_with();
        let span = start.cover(self.current_span());
        self.ast().make_binary(NodeKind::With, Some(kw.id), binding, body, span)
    }
}
