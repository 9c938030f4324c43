//! Module-level constructs: `module name { .. }`, `namespace name { .. }`, `import "path";`.
//!
//! These sit at statement/expression position alongside any other declaration (spec §3
//! "Module-level" element family), so they're reached the same way any other prefix parselet is.

use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_module(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let name = self.expect_ident_leaf_pub();
        let body = self.parse_block();
        let span = start.cover(self.ast().get(body).span);
        self.ast().make_binary(NodeKind::Module, Some(kw.id), name, body, span)
    }

    pub(super) fn parse_namespace(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let name = self.expect_ident_leaf_pub();
        let body = self.parse_block();
        let span = start.cover(self.ast().get(body).span);
        self.ast().make_binary(NodeKind::Namespace, Some(kw.id), name, body, span)
    }

    pub(super) fn parse_import(&mut self) -> NodeId {
        let start = self.current_span();
        let kw = self.bump();
        let span;
        let binding;
        if self.at(TokenKind::StrVal) {
            let tok = self.bump();
            binding = Some(tok.id);
            span = start.cover(tok.span);
        } else {
            self.error(crate::diagnostics::DiagnosticCode::P019UnexpectedToken);
            binding = None;
            span = start.cover(self.current_span());
        }
        self.ast().make_leaf(NodeKind::Import, binding, span)
    }
}
