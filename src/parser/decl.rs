//! Declarations: `name := expr`, `name :: expr`, `name : Type = expr`, and bare `name : Type`
//! (field/parameter) forms. Handled as a dedicated production rather than generic Pratt infix
//! parselets, since `:` and `::` introduce a type sub-grammar rather than a uniform binary
//! expression.

use super::precedence::Precedence;
use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// True when the parser is positioned at `Ident (':=' | '::' | ':')`, i.e. a declaration.
    pub(super) fn at_decl_start(&self) -> bool {
        self.at(TokenKind::Ident)
            && matches!(self.nth(1), TokenKind::ColonEquals | TokenKind::ColonColon | TokenKind::Colon)
    }

    /// Parses a declaration starting at the current identifier.
    pub(super) fn parse_decl(&mut self) -> NodeId {
        let start = self.current_span();
        let name = self.expect_ident_leaf_pub();
        match self.current() {
            TokenKind::ColonEquals => {
                let op = self.bump();
                let init = self.parse_expr(Precedence::Assignment);
                let span = start.cover(self.ast().get(init).span);
                self.ast().make_binary(NodeKind::Decl, Some(op.id), name, init, span)
            }
            TokenKind::ColonColon => {
                let op = self.bump();
                let init = self.parse_expr(Precedence::Assignment);
                let span = start.cover(self.ast().get(init).span);
                let decl = self.ast().make_binary(NodeKind::Decl, Some(op.id), name, init, span);
                self.ast().extras_mut(decl).attributes.push(op.id); // `::` constancy marker
                decl
            }
            TokenKind::Colon => {
                self.bump();
                let ty = self.parse_type();
                let init = if self.eat(TokenKind::Equals) { Some(self.parse_expr(Precedence::Assignment)) } else { None };
                let span = start.cover(self.current_span());
                match init {
                    Some(v) => {
                        let field = self.ast().make_binary(NodeKind::Field, None, name, ty, span);
                        self.ast().make_binary(NodeKind::Decl, None, field, v, span)
                    }
                    None => self.ast().make_binary(NodeKind::Field, None, name, ty, span),
                }
            }
            _ => unreachable!("at_decl_start must be checked before parse_decl"),
        }
    }
}
