//! Prefix and infix parselets: the Pratt expression parser proper.

use super::precedence::Precedence;
use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticCode;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// Parses an expression, consuming infix operators while their precedence exceeds `min`.
    pub(super) fn parse_expr(&mut self, min: Precedence) -> NodeId {
        if !self.enter_recursion() {
            return self.ast().make_leaf(NodeKind::NilLit, None, self.current_span());
        }
        let mut left = self.parse_prefix();
        loop {
            let Some((prec, right_assoc)) = infix_binding(self.current()) else { break };
            if prec <= min {
                break;
            }
            left = self.parse_infix(left, prec, right_assoc);
        }
        self.exit_recursion();
        left
    }

    fn parse_prefix(&mut self) -> NodeId {
        let span = self.current_span();
        match self.current() {
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::BoolLit, Some(tok.id), span)
            }
            TokenKind::KwNil => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::NilLit, Some(tok.id), span)
            }
            TokenKind::DecimalInt | TokenKind::HexInt | TokenKind::OctalInt | TokenKind::BinaryInt => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::IntLit, Some(tok.id), span)
            }
            TokenKind::DecimalFloat => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::FloatLit, Some(tok.id), span)
            }
            TokenKind::StrVal => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::StringLit, Some(tok.id), span)
            }
            TokenKind::CharVal => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::CharLit, Some(tok.id), span)
            }
            TokenKind::Ident => self.parse_ident_or_type_tag(),
            TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde | TokenKind::Amp => {
                let tok = self.bump();
                let operand = self.parse_expr(Precedence::Prefix);
                let full = span.cover(self.ast().get(operand).span);
                self.ast().make_unary(NodeKind::Unary, Some(tok.id), operand, full)
            }
            TokenKind::LParen => self.parse_paren_expr(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwFor => self.parse_for_in(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwReturn => self.parse_jump_with_value(NodeKind::Return, TokenKind::KwReturn),
            TokenKind::KwDefer => self.parse_defer(),
            TokenKind::KwWith => self.parse_with(),
            TokenKind::KwYield => self.parse_jump_with_value(NodeKind::Yield, TokenKind::KwYield),
            TokenKind::KwBreak => self.parse_jump_no_value(NodeKind::Break, TokenKind::KwBreak),
            TokenKind::KwContinue => self.parse_jump_no_value(NodeKind::Continue, TokenKind::KwContinue),
            TokenKind::KwFallthrough => {
                let tok = self.bump();
                self.ast().make_leaf(NodeKind::Fallthrough, Some(tok.id), span)
            }
            TokenKind::KwCast => self.parse_cast(NodeKind::Cast),
            TokenKind::KwTransmute => self.parse_cast(NodeKind::Transmute),
            TokenKind::KwSizeOf | TokenKind::KwAlignOf => self.parse_intrinsic_of(),
            TokenKind::Directive => self.parse_directive(),
            TokenKind::Attribute => self.parse_attribute_prefixed_expr(),
            TokenKind::Label => self.parse_label_prefixed_expr(),
            TokenKind::KwStruct | TokenKind::KwUnion | TokenKind::KwEnum | TokenKind::KwProc => {
                self.parse_type_expr()
            }
            TokenKind::KwModule => self.parse_module(),
            TokenKind::KwNamespace => self.parse_namespace(),
            TokenKind::KwImport => self.parse_import(),
            TokenKind::Caret => {
                let tok = self.bump();
                let base = self.parse_type();
                let full = span.cover(self.ast().get(base).span);
                self.ast().make_unary(NodeKind::PointerType, Some(tok.id), base, full)
            }
            _ => {
                self.error_and_bump(DiagnosticCode::P019UnexpectedToken);
                self.ast().make_leaf(NodeKind::NilLit, None, span)
            }
        }
    }

    fn parse_ident_or_type_tag(&mut self) -> NodeId {
        let span = self.current_span();
        let tok = self.bump();
        let ident = self.ast().make_leaf(NodeKind::Ident, Some(tok.id), span);
        if self.at(TokenKind::Less) && self.looks_like_type_args_pub() {
            self.bump();
            let mut args = vec![ident];
            loop {
                args.push(self.parse_type());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Greater, "`>` to close type argument list");
            let full = span.cover(self.current_span());
            return self.ast().make_with_children(NodeKind::TypeTag, None, args, full);
        }
        ident
    }

    fn parse_paren_expr(&mut self) -> NodeId {
        let span = self.current_span();
        self.bump();
        self.push_delimiter(TokenKind::LParen);
        let inner = self.parse_expr(Precedence::Lowest);
        self.expect(TokenKind::RParen, "`)`");
        self.pop_delimiter();
        let full = span.cover(self.current_span());
        self.ast().make_unary(NodeKind::ParamList, None, inner, full)
    }

    fn parse_infix(&mut self, left: NodeId, prec: Precedence, right_assoc: bool) -> NodeId {
        let bound = if right_assoc { prec.one_below() } else { prec };
        let kind = self.current();
        match kind {
            TokenKind::Dot => self.parse_member_access(left),
            TokenKind::LBracket => self.parse_subscript(left),
            TokenKind::LParen => self.parse_call(left),
            TokenKind::Comma => self.parse_comma(left, bound),
            TokenKind::ColonEquals => self.parse_key_value(left, bound),
            TokenKind::Caret => {
                let tok = self.bump();
                let full = self.ast().get(left).span.cover(tok.span);
                self.ast().make_unary(NodeKind::Unary, Some(tok.id), left, full)
            }
            TokenKind::Equals
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign
            | TokenKind::PipeAssign
            | TokenKind::AmpAssign
            | TokenKind::TildeAssign => self.parse_assignment(left, kind, bound),
            _ => self.parse_binary(left, kind, bound),
        }
    }

    fn parse_member_access(&mut self, left: NodeId) -> NodeId {
        let tok = self.bump();
        self.ast().push_member_access(left);
        let field_span = self.current_span();
        let name = self.expect_ident_leaf_pub();
        let full = self.ast().get(left).span.cover(field_span);
        let node = self.ast().make_binary(NodeKind::MemberAccess, Some(tok.id), left, name, full);
        // popped by `parse_call` if a call follows; otherwise pop immediately (UFCS only applies
        // to `recv.name(...)`, not to a bare `recv.name`).
        if !self.at(TokenKind::LParen) {
            self.ast().pop_member_access();
        }
        node
    }

    fn parse_subscript(&mut self, left: NodeId) -> NodeId {
        self.bump();
        self.push_delimiter(TokenKind::LBracket);
        let index = self.parse_expr(Precedence::Lowest);
        self.expect(TokenKind::RBracket, "`]`");
        self.pop_delimiter();
        let full = self.ast().get(left).span.cover(self.current_span());
        self.ast().make_binary(NodeKind::Subscript, None, left, index, full)
    }

    fn parse_call(&mut self, left: NodeId) -> NodeId {
        self.bump();
        self.push_delimiter(TokenKind::LParen);
        let uniform = self.ast().member_access_receiver().is_some();
        let mut args = Vec::new();
        if uniform {
            // `a.f(b)`: prepend the receiver, per UFCS (spec §4.4).
            args.push(self.ast().pop_member_access().expect("checked above"));
        }
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_call_arg());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`");
        self.pop_delimiter();
        let full = self.ast().get(left).span.cover(self.current_span());
        let arglist = self.ast().make_with_children(NodeKind::ArgList, None, args, full);
        let call = self.ast().make_binary(NodeKind::Call, None, left, arglist, full);
        self.ast().extras_mut(call).uniform_call = uniform;
        call
    }

    fn parse_call_arg(&mut self) -> NodeId {
        // named argument: `name: expr`
        if self.at(TokenKind::Ident) && self.nth(1) == TokenKind::Colon {
            let span = self.current_span();
            let name = self.expect_ident_leaf_pub();
            let colon = self.bump();
            let value = self.parse_expr(Precedence::Comma);
            let full = span.cover(self.ast().get(value).span);
            return self.ast().make_binary(NodeKind::ArgPair, Some(colon.id), name, value, full);
        }
        self.parse_expr(Precedence::Comma)
    }

    fn parse_comma(&mut self, left: NodeId, bound: Precedence) -> NodeId {
        let tok = self.bump();
        let right = self.parse_expr(bound);
        let full = self.ast().get(left).span.cover(self.ast().get(right).span);
        self.ast().make_binary(NodeKind::Comma, Some(tok.id), left, right, full)
    }

    fn parse_key_value(&mut self, left: NodeId, bound: Precedence) -> NodeId {
        let tok = self.bump();
        let right = self.parse_expr(bound);
        let full = self.ast().get(left).span.cover(self.ast().get(right).span);
        self.ast().make_binary(NodeKind::KeyValue, Some(tok.id), left, right, full)
    }

    /// Compound assignment desugars here: `x +:= y` becomes `Assign(x, Binary(+, x, y))`.
    fn parse_assignment(&mut self, left: NodeId, op: TokenKind, bound: Precedence) -> NodeId {
        let tok = self.bump();
        let rhs = self.parse_expr(bound);
        let value = if op == TokenKind::Equals {
            rhs
        } else {
            let span = self.ast().get(left).span.cover(self.ast().get(rhs).span);
            self.ast().make_binary(NodeKind::Binary, Some(tok.id), left, rhs, span)
        };
        let full = self.ast().get(left).span.cover(self.ast().get(value).span);
        self.ast().make_binary(NodeKind::Assign, Some(tok.id), left, value, full)
    }

    fn parse_binary(&mut self, left: NodeId, _op: TokenKind, bound: Precedence) -> NodeId {
        let tok = self.bump();
        let right = self.parse_expr(bound);
        let full = self.ast().get(left).span.cover(self.ast().get(right).span);
        self.ast().make_binary(NodeKind::Binary, Some(tok.id), left, right, full)
    }

    fn parse_cast(&mut self, kind: NodeKind) -> NodeId {
        let span = self.current_span();
        let tok = self.bump();
        self.expect(TokenKind::LParen, "`(`");
        let ty = self.parse_type();
        self.expect(TokenKind::Comma, "`,`");
        let value = self.parse_expr(Precedence::Lowest);
        self.expect(TokenKind::RParen, "`)`");
        let full = span.cover(self.current_span());
        self.ast().make_binary(kind, Some(tok.id), ty, value, full)
    }

    fn parse_intrinsic_of(&mut self) -> NodeId {
        let span = self.current_span();
        let tok = self.bump();
        self.expect(TokenKind::LParen, "`(`");
        let arg = self.parse_type();
        self.expect(TokenKind::RParen, "`)`");
        let full = span.cover(self.current_span());
        self.ast().make_unary(NodeKind::Call, Some(tok.id), arg, full)
    }

    fn parse_attribute_prefixed_expr(&mut self) -> NodeId {
        let span = self.current_span();
        let mut attrs = Vec::new();
        while self.at(TokenKind::Attribute) {
            attrs.push(self.bump().id);
        }
        // An attribute run with nothing but `;` following attaches to the enclosing scope
        // rather than a statement body (spec §4.4); the caller (`parse_statement`) handles that
        // case by checking `extras.attributes` on a placeholder. Here we just parse the body.
        let body = self.parse_expr(Precedence::Lowest);
        self.ast().extras_mut(body).attributes.extend(attrs);
        let full = span.cover(self.ast().get(body).span);
        self.ast().get_mut(body).span = full;
        body
    }

    fn parse_label_prefixed_expr(&mut self) -> NodeId {
        let label = self.bump();
        let body = self.parse_expr(Precedence::Lowest);
        self.ast().extras_mut(body).labels.push(label.id);
        body
    }
}

/// `(precedence, right_associative)` for an infix-position token, or `None` if `kind` cannot
/// start an infix/postfix operation.
fn infix_binding(kind: TokenKind) -> Option<(Precedence, bool)> {
    use Precedence::*;
    use TokenKind::*;
    Some(match kind {
        Equals | PlusAssign | MinusAssign | StarAssign | SlashAssign | PercentAssign | PipeAssign | AmpAssign
        | TildeAssign => (Assignment, true),
        Comma => (Comma, true),
        ColonEquals => (KeyValue, true),
        PipePipe => (LogicalOr, false),
        AmpAmp => (LogicalAnd, false),
        Pipe => (BitwiseOr, false),
        EqEq | NotEq => (Equality, false),
        Less | Greater | LessEq | GreaterEq => (Relational, false),
        Shl | Shr => (ShiftOrRotate, false),
        Plus | Minus => (Sum, false),
        Star | Slash | Percent => (Product, false),
        StarStar => (Exponent, true),
        Dot => (MemberAccess, false),
        Caret => (PointerDeref, false),
        LBracket => (Subscript, false),
        LParen => (Call, false),
        Amp => (BitwiseAnd, false),
        Tilde => (BitwiseXor, false),
        _ => return None,
    })
}
