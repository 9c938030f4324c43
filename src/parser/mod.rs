//! Pratt parser over a lookahead-buffered token stream, producing an [`AstNode`] tree.
//!
//! Grounded on `plotnik-lib/src/parser/core.rs`'s `Parser`: same fuel-bounded `bump`/`nth`
//! primitives, the same `enter_recursion`/`exit_recursion` depth guard, the same
//! error-then-continue recovery philosophy — generalized from a lossless-CST green-tree builder
//! to building plain [`crate::ast::AstNode`]s in [`crate::ast::AstBuilder`].

mod decl;
mod directive;
mod expr;
mod module_level;
mod precedence;
mod stmt;
mod ty;

pub use precedence::Precedence;

use crate::ast::{AstBuilder, NodeId};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::Error;
use crate::source::Span;
use crate::token::{Token, TokenId, TokenKind, TokenPool};

/// Tracks one open bracket/brace/paren so mismatched-delimiter diagnostics can point at both
/// ends.
#[derive(Debug, Clone, Copy)]
struct OpenDelimiter {
    #[allow(dead_code)]
    kind: TokenKind,
    span: Span,
}

/// Result of running the parser to completion.
#[derive(Debug)]
pub struct ParseResult {
    pub program: NodeId,
    pub ast: AstBuilder,
    pub diagnostics: Diagnostics,
}

/// Pratt parser state. Owns the token stream view, the in-progress [`AstBuilder`], fuel counters,
/// and the delimiter stack; does not own the [`TokenPool`] (lexemes are looked up through it as
/// needed, e.g. to extract an identifier's text for scope declaration).
pub struct Parser<'a> {
    tokens: &'a [Token],
    pool: &'a TokenPool,
    pos: usize,
    ast: AstBuilder,
    diagnostics: Diagnostics,
    depth: u32,
    delimiter_stack: Vec<OpenDelimiter>,
    exec_fuel_remaining: Option<u32>,
    recursion_fuel_limit: Option<u32>,
    fatal_error: Option<Error>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], pool: &'a TokenPool) -> Self {
        Self {
            tokens,
            pool,
            pos: 0,
            ast: AstBuilder::new(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            delimiter_stack: Vec::new(),
            exec_fuel_remaining: None,
            recursion_fuel_limit: None,
            fatal_error: None,
        }
    }

    pub fn with_exec_fuel(mut self, limit: Option<u32>) -> Self {
        self.exec_fuel_remaining = limit;
        self
    }

    pub fn with_recursion_fuel(mut self, limit: Option<u32>) -> Self {
        self.recursion_fuel_limit = limit;
        self
    }

    pub fn parse(mut self) -> Result<ParseResult, Error> {
        let program = self.parse_program();
        if let Some(err) = self.fatal_error {
            return Err(err);
        }
        Ok(ParseResult { program, ast: self.ast, diagnostics: self.diagnostics })
    }

    // --- token stream primitives ---

    pub(super) fn nth(&self, lookahead: usize) -> TokenKind {
        self.tokens.get(self.pos + lookahead).map_or(TokenKind::Error, |t| t.kind)
    }

    pub(super) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(super) fn current_id(&self) -> TokenId {
        self.tokens.get(self.pos).map_or_else(|| self.tokens.last().unwrap().id, |t| t.id)
    }

    pub(super) fn current_span(&self) -> Span {
        self.tokens.get(self.pos).map_or_else(|| self.tokens.last().unwrap().span, |t| t.span)
    }

    pub(super) fn lexeme(&self, id: TokenId) -> &str {
        &self.pool.get(id).lexeme
    }

    pub(super) fn eof(&self) -> bool {
        self.current() == TokenKind::Eof
    }

    pub(super) fn should_stop(&self) -> bool {
        self.eof() || self.fatal_error.is_some()
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn consume_exec_fuel(&mut self) {
        if let Some(remaining) = &mut self.exec_fuel_remaining {
            if *remaining == 0 {
                self.fatal_error.get_or_insert(Error::ExecFuelExhausted);
                return;
            }
            *remaining -= 1;
        }
    }

    /// Advances past the current token, returning its id. Panics at EOF (callers must check
    /// [`Parser::eof`] first), matching the teacher's `bump` contract.
    pub(super) fn bump(&mut self) -> Token {
        assert!(!self.eof(), "bump called at EOF");
        self.consume_exec_fuel();
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// On mismatch: emits a diagnostic but does not consume, so the caller can attempt recovery.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_msg(DiagnosticCode::P019UnexpectedToken, format!("expected {what}"));
        false
    }

    pub(super) fn error(&mut self, code: DiagnosticCode) {
        self.error_msg(code, code.default_message());
    }

    pub(super) fn error_msg(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        if let Some(builder) = self.diagnostics.report_once(code, self.current_span()) {
            builder.message(message).emit();
        }
    }

    /// Emits an error then advances past the offending token (used when a token simply cannot
    /// start anything valid).
    pub(super) fn error_and_bump(&mut self, code: DiagnosticCode) {
        self.error(code);
        if !self.eof() {
            self.bump();
        }
    }

    /// Skips tokens until `pred` matches the current token or the stream ends, used by statement
    /// recovery to resynchronize at the next `;` or `}`.
    pub(super) fn synchronize(&mut self, pred: impl Fn(TokenKind) -> bool) {
        while !self.should_stop() && !pred(self.current()) {
            self.bump();
        }
    }

    pub(super) fn enter_recursion(&mut self) -> bool {
        if let Some(limit) = self.recursion_fuel_limit {
            if self.depth >= limit {
                self.fatal_error.get_or_insert(Error::RecursionLimitExceeded);
                return false;
            }
        }
        self.depth += 1;
        true
    }

    pub(super) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(super) fn push_delimiter(&mut self, kind: TokenKind) {
        self.delimiter_stack.push(OpenDelimiter { kind, span: self.current_span() });
    }

    pub(super) fn pop_delimiter(&mut self) -> Option<()> {
        self.delimiter_stack.pop().map(|_| ())
    }

    pub(super) fn ast(&mut self) -> &mut AstBuilder {
        &mut self.ast
    }

    /// `name<T, U>` vs. `name < other`: a shallow heuristic, scanning for a closing `>` before a
    /// statement terminator without crossing a `;`. Shared by expression-position type tags
    /// (`ident<T>` used as a value) and type-position generics (`ident<T>` used as a type).
    pub(super) fn looks_like_type_args_pub(&self) -> bool {
        let mut depth = 0i32;
        let mut i = self.pos;
        while let Some(t) = self.tokens.get(i) {
            match t.kind {
                TokenKind::Less => depth += 1,
                TokenKind::Greater => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                TokenKind::Semi | TokenKind::LBrace | TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// An identifier leaf, erroring (but not aborting) if the current token isn't one. Shared by
    /// member access, `for .. in` bindings, and anywhere else a bare name is required.
    pub(super) fn expect_ident_leaf_pub(&mut self) -> NodeId {
        use crate::ast::NodeKind;
        let span = self.current_span();
        if self.at(TokenKind::Ident) {
            let tok = self.bump();
            self.ast.make_leaf(NodeKind::Ident, Some(tok.id), span)
        } else {
            self.error(DiagnosticCode::P019UnexpectedToken);
            self.ast.make_leaf(NodeKind::Ident, None, span)
        }
    }

    // --- top level ---

    fn parse_program(&mut self) -> NodeId {
        use crate::ast::NodeKind;
        let start = self.current_span();
        self.ast.push_scope();
        let mut stmts = Vec::new();
        while !self.should_stop() {
            stmts.push(self.parse_statement());
        }
        self.ast.pop_scope();
        let end = if self.pos > 0 { self.tokens[self.pos - 1].span } else { start };
        self.ast.make_with_children(NodeKind::Program, None, stmts, start.cover(end))
    }
}
