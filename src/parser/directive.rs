//! `#directive` parsing: `#type`, `#foreign`, `#intrinsic`, `#assembly`, `#run`, `#if/#elif/#else`,
//! `#language`, `#core_type`, and any other `#name` treated as a generic directive the semantic
//! engine can still inspect by name.

use super::precedence::Precedence;
use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticCode;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_directive(&mut self) -> NodeId {
        let start = self.current_span();
        let tok = self.bump();
        let name = self.lexeme(tok.id).trim_start_matches('#').to_string();
        match name.as_str() {
            "if" => self.parse_if_directive(start, tok.id),
            "type" => {
                let ty = self.parse_type();
                let span = start.cover(self.ast().get(ty).span);
                self.ast().make_unary(NodeKind::Directive, Some(tok.id), ty, span)
            }
            "foreign" => {
                let span = start.cover(self.current_span());
                self.ast().make_leaf(NodeKind::Directive, Some(tok.id), span)
            }
            "intrinsic" => {
                let name_span = self.current_span();
                let target = self.expect_ident_leaf_pub();
                let span = start.cover(name_span);
                self.ast().make_unary(NodeKind::Directive, Some(tok.id), target, span)
            }
            "assembly" | "language" => {
                let lang = if name == "language" { Some(self.parse_expr(Precedence::Assignment)) } else { None };
                let body = self.parse_raw_block();
                let span = start.cover(self.ast().get(body).span);
                match lang {
                    Some(l) => self.ast().make_binary(NodeKind::Directive, Some(tok.id), l, body, span),
                    None => self.ast().make_unary(NodeKind::Directive, Some(tok.id), body, span),
                }
            }
            "run" => {
                let expr = self.parse_expr(Precedence::Assignment);
                let span = start.cover(self.ast().get(expr).span);
                self.ast().make_unary(NodeKind::Directive, Some(tok.id), expr, span)
            }
            "core_type" => {
                let ty = self.parse_type();
                let span = start.cover(self.ast().get(ty).span);
                self.ast().make_unary(NodeKind::Directive, Some(tok.id), ty, span)
            }
            _ => {
                self.error_msg(DiagnosticCode::D040UnknownDirective, format!("unknown directive `#{name}`"));
                let span = start.cover(self.current_span());
                self.ast().make_leaf(NodeKind::Directive, Some(tok.id), span)
            }
        }
    }

    /// `#if cond { .. } [#elif cond { .. }]* [#else { .. }]`. Parsed (not yet selected — selection
    /// happens during directive evaluation, spec §4.7 pass 3) as a chain of condition/body pairs
    /// plus an optional trailing else body, all preserved in `children` so the unselected
    /// branches can be located and discarded from the graph during that pass.
    fn parse_if_directive(&mut self, start: crate::source::Span, kw: crate::token::TokenId) -> NodeId {
        let mut children = Vec::new();
        let cond = self.parse_expr(Precedence::Lowest);
        let body = self.parse_block();
        children.push(cond);
        children.push(body);
        loop {
            if self.at(TokenKind::Directive) && self.lexeme(self.current_id()) == "#elif" {
                self.bump();
                let cond = self.parse_expr(Precedence::Lowest);
                let body = self.parse_block();
                children.push(cond);
                children.push(body);
                continue;
            }
            if self.at(TokenKind::Directive) && self.lexeme(self.current_id()) == "#else" {
                self.bump();
                let body = self.parse_block();
                children.push(body);
            }
            break;
        }
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::Directive, Some(kw), children, span)
    }

    /// `{{ .. }}`: a raw, unparsed body (spec §3 `#assembly`/`#language` "raw block"). The
    /// lexer already isolates the inner text as the token's span, so the node's span *is* the
    /// raw body — no re-slicing needed at lowering time.
    fn parse_raw_block(&mut self) -> NodeId {
        let span = self.current_span();
        if self.at(TokenKind::RawBlockStart) {
            let tok = self.bump();
            self.ast().make_leaf(NodeKind::RawBlock, Some(tok.id), tok.span)
        } else {
            self.error_msg(DiagnosticCode::P019UnexpectedToken, "expected `{{` to start a raw block");
            self.ast().make_leaf(NodeKind::RawBlock, None, span)
        }
    }
}
