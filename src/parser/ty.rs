//! Type syntax: named types, pointer/array constructors, and the `struct`/`union`/`enum`/`proc`
//! composite/procedure type constructors (which double as expressions in type-constructor
//! position, per spec §3's "type constructors" expression kind).

use super::precedence::Precedence;
use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticCode;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// Parses a type reference: a (possibly generic) named type, a pointer (`^T`), or an array
    /// (`[]T` / `[N]T`).
    pub(super) fn parse_type(&mut self) -> NodeId {
        let span = self.current_span();
        match self.current() {
            TokenKind::Caret => {
                self.bump();
                let base = self.parse_type();
                let full = span.cover(self.ast().get(base).span);
                self.ast().make_unary(NodeKind::PointerType, None, base, full)
            }
            TokenKind::LBracket => {
                self.bump();
                let len = if !self.at(TokenKind::RBracket) { Some(self.parse_expr(Precedence::Lowest)) } else { None };
                self.expect(TokenKind::RBracket, "`]`");
                let elem = self.parse_type();
                let full = span.cover(self.ast().get(elem).span);
                match len {
                    Some(n) => self.ast().make_binary(NodeKind::ArrayType, None, n, elem, full),
                    None => self.ast().make_unary(NodeKind::ArrayType, None, elem, full),
                }
            }
            TokenKind::KwStruct | TokenKind::KwUnion | TokenKind::KwEnum | TokenKind::KwProc => self.parse_type_expr(),
            TokenKind::Ident => {
                let tok = self.bump();
                let name = self.ast().make_leaf(NodeKind::TypeRef, Some(tok.id), span);
                if self.at(TokenKind::Less) && self.looks_like_type_args_pub() {
                    self.bump();
                    let mut args = vec![name];
                    loop {
                        args.push(self.parse_type());
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::Greater, "`>`");
                    let full = span.cover(self.current_span());
                    return self.ast().make_with_children(NodeKind::TypeTag, None, args, full);
                }
                if self.eat(TokenKind::ColonColon) {
                    // qualified type path: fold into the same TypeRef node, keyed by the last
                    // segment's token for display, with earlier segments in `children`.
                    let mut segments = vec![name];
                    loop {
                        let seg_span = self.current_span();
                        if !self.at(TokenKind::Ident) {
                            self.error(DiagnosticCode::P019UnexpectedToken);
                            break;
                        }
                        let seg_tok = self.bump();
                        segments.push(self.ast().make_leaf(NodeKind::TypeRef, Some(seg_tok.id), seg_span));
                        if !self.eat(TokenKind::ColonColon) {
                            break;
                        }
                    }
                    let full = span.cover(self.current_span());
                    return self.ast().make_with_children(NodeKind::TypeRef, None, segments, full);
                }
                name
            }
            _ => {
                self.error_and_bump(DiagnosticCode::P019UnexpectedToken);
                self.ast().make_leaf(NodeKind::TypeRef, None, span)
            }
        }
    }

    /// `struct { fields }`, `union { fields }`, `enum { members }`, `proc(params): ReturnType`.
    pub(super) fn parse_type_expr(&mut self) -> NodeId {
        let start = self.current_span();
        match self.current() {
            TokenKind::KwStruct => self.parse_struct_or_union(NodeKind::Module),
            TokenKind::KwUnion => self.parse_struct_or_union(NodeKind::Module),
            TokenKind::KwEnum => self.parse_enum(),
            TokenKind::KwProc => self.parse_proc_type(),
            _ => {
                self.error_and_bump(DiagnosticCode::P019UnexpectedToken);
                self.ast().make_leaf(NodeKind::TypeRef, None, start)
            }
        }
    }

    fn parse_struct_or_union(&mut self, _marker: NodeKind) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        self.expect(TokenKind::LBrace, "`{`");
        self.push_delimiter(TokenKind::LBrace);
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.should_stop() {
            let field_start = self.current_span();
            let name = self.expect_ident_leaf_pub();
            self.expect(TokenKind::Colon, "`:`");
            let ty = self.parse_type();
            let span = field_start.cover(self.current_span());
            fields.push(self.ast().make_binary(NodeKind::Field, None, name, ty, span));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "`}`");
        self.pop_delimiter();
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::TypeRef, Some(kw.id), fields, span)
    }

    fn parse_enum(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        self.expect(TokenKind::LBrace, "`{`");
        self.push_delimiter(TokenKind::LBrace);
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.should_stop() {
            let member_span = self.current_span();
            let name = self.expect_ident_leaf_pub();
            let value = if self.eat(TokenKind::ColonEquals) { Some(self.parse_expr(Precedence::Comma)) } else { None };
            let span = member_span.cover(self.current_span());
            members.push(match value {
                Some(v) => self.ast().make_binary(NodeKind::Decl, None, name, v, span),
                None => name,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "`}`");
        self.pop_delimiter();
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::TypeRef, Some(kw.id), members, span)
    }

    fn parse_proc_type(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        self.expect(TokenKind::LParen, "`(`");
        self.push_delimiter(TokenKind::LParen);
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) && !self.should_stop() {
            let param_start = self.current_span();
            let name = self.expect_ident_leaf_pub();
            self.expect(TokenKind::Colon, "`:`");
            let ty = self.parse_type();
            let default = if self.eat(TokenKind::Equals) { Some(self.parse_expr(Precedence::Comma)) } else { None };
            let span = param_start.cover(self.current_span());
            let param = self.ast().make_binary(NodeKind::Param, None, name, ty, span);
            if let Some(d) = default {
                let with_default = self.ast().make_binary(NodeKind::Decl, None, param, d, span);
                params.push(with_default);
            } else {
                params.push(param);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`");
        self.pop_delimiter();
        let ret = if self.eat(TokenKind::Colon) { Some(self.parse_type()) } else { None };
        let param_list = self.ast().make_with_children(NodeKind::ParamList, None, params, start);
        // A trailing `{ .. }` turns the signature into a procedure declaration with a body
        // (spec §3 "procedure instance"); a bare signature (no body) is a procedure *type*,
        // e.g. a `#foreign` or forward declaration. Layout: `[param_list, ret?, body?]`, with
        // `ret` vs. `body` told apart at lowering time by node kind (a type shape vs. `Block`).
        let body = if self.at(TokenKind::LBrace) { Some(self.parse_block()) } else { None };
        let mut children = vec![param_list];
        children.extend(ret);
        children.extend(body);
        let span = start.cover(self.current_span());
        self.ast().make_with_children(NodeKind::ProcType, Some(kw.id), children, span)
    }
}
