//! Interned tokens: stable pool plus per-occurrence span.
//!
//! Spec §3 calls for tokens "interned by (kind, lexeme) in a token pool and referenced by stable
//! id; equality is identity." Two occurrences of the same keyword or operator share one
//! [`TokenId`]; only the occurrence's [`crate::source::Span`] differs, so identifier/keyword
//! comparisons during parsing are O(1) id comparisons rather than string comparisons.

mod kind;

pub use kind::{NumericKind, Radix, TokenKind};

use std::collections::HashMap;

use crate::source::Span;

/// Stable id of an interned (kind, lexeme) pair. Addresses are stable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(u32);

/// The interned data for one distinct (kind, lexeme) pair.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub kind: TokenKind,
    pub lexeme: String,
    pub radix: Option<Radix>,
    pub numeric: NumericKind,
}

/// One token occurrence: a reference into the pool plus where it was found in the source.
///
/// `kind` is duplicated inline (cheap `Copy`) so the parser's hot lookahead path never needs a
/// pool lookup just to dispatch on token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(id: TokenId, kind: TokenKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

/// Session-owned interner for token (kind, lexeme) pairs.
///
/// Canonical tokens for every keyword and punctuator are preallocated in [`TokenPool::new`];
/// identifiers, numeric literals, and string/char content are interned lazily as the lexer
/// encounters them.
#[derive(Debug, Default)]
pub struct TokenPool {
    entries: Vec<TokenData>,
    index: HashMap<(TokenKind, String), TokenId>,
}

impl TokenPool {
    pub fn new() -> Self {
        let mut pool = Self::default();
        pool.preload_canonicals();
        pool
    }

    fn preload_canonicals(&mut self) {
        for (kind, lexeme) in CANONICAL_TOKENS {
            self.intern_raw(*kind, (*lexeme).to_string(), None, NumericKind::None);
        }
    }

    fn intern_raw(
        &mut self,
        kind: TokenKind,
        lexeme: String,
        radix: Option<Radix>,
        numeric: NumericKind,
    ) -> TokenId {
        let key = (kind, lexeme.clone());
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = TokenId(self.entries.len() as u32);
        self.entries.push(TokenData { kind, lexeme, radix, numeric });
        self.index.insert(key, id);
        id
    }

    /// Intern a token by kind and lexeme, returning its stable id. A second call with the same
    /// (kind, lexeme) returns the existing id.
    pub fn intern(&mut self, kind: TokenKind, lexeme: &str) -> TokenId {
        self.intern_raw(kind, lexeme.to_string(), kind.radix(), kind.numeric_kind())
    }

    pub fn get(&self, id: TokenId) -> &TokenData {
        &self.entries[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keyword and fixed-punctuator lexemes preallocated at pool construction.
const CANONICAL_TOKENS: &[(TokenKind, &str)] = &[
    (TokenKind::KwIf, "if"),
    (TokenKind::KwElse, "else"),
    (TokenKind::KwWhile, "while"),
    (TokenKind::KwFor, "for"),
    (TokenKind::KwIn, "in"),
    (TokenKind::KwSwitch, "switch"),
    (TokenKind::KwCase, "case"),
    (TokenKind::KwFallthrough, "fallthrough"),
    (TokenKind::KwBreak, "break"),
    (TokenKind::KwContinue, "continue"),
    (TokenKind::KwReturn, "return"),
    (TokenKind::KwDefer, "defer"),
    (TokenKind::KwWith, "with"),
    (TokenKind::KwYield, "yield"),
    (TokenKind::KwProc, "proc"),
    (TokenKind::KwStruct, "struct"),
    (TokenKind::KwUnion, "union"),
    (TokenKind::KwEnum, "enum"),
    (TokenKind::KwNamespace, "namespace"),
    (TokenKind::KwModule, "module"),
    (TokenKind::KwImport, "import"),
    (TokenKind::KwTrue, "true"),
    (TokenKind::KwFalse, "false"),
    (TokenKind::KwNil, "nil"),
    (TokenKind::KwCast, "cast"),
    (TokenKind::KwTransmute, "transmute"),
    (TokenKind::KwSizeOf, "sizeof"),
    (TokenKind::KwAlignOf, "alignof"),
    (TokenKind::PlusAssign, "+:="),
    (TokenKind::MinusAssign, "-:="),
    (TokenKind::StarAssign, "*:="),
    (TokenKind::StarStar, "**"),
    (TokenKind::SlashAssign, "/:="),
    (TokenKind::PercentAssign, "%:="),
    (TokenKind::PipeAssign, "|:="),
    (TokenKind::AmpAssign, "&:="),
    (TokenKind::TildeAssign, "~:="),
    (TokenKind::ColonColon, "::"),
    (TokenKind::ColonEquals, ":="),
    (TokenKind::EqEq, "=="),
    (TokenKind::NotEq, "!="),
    (TokenKind::LessEq, "<="),
    (TokenKind::GreaterEq, ">="),
    (TokenKind::AmpAmp, "&&"),
    (TokenKind::PipePipe, "||"),
    (TokenKind::Shl, "<<"),
    (TokenKind::Shr, ">>"),
    (TokenKind::DotDot, ".."),
    (TokenKind::Arrow, "->"),
    (TokenKind::Plus, "+"),
    (TokenKind::Minus, "-"),
    (TokenKind::Star, "*"),
    (TokenKind::Slash, "/"),
    (TokenKind::Percent, "%"),
    (TokenKind::Equals, "="),
    (TokenKind::Less, "<"),
    (TokenKind::Greater, ">"),
    (TokenKind::Bang, "!"),
    (TokenKind::Amp, "&"),
    (TokenKind::Pipe, "|"),
    (TokenKind::Tilde, "~"),
    (TokenKind::Caret, "^"),
    (TokenKind::Dot, "."),
    (TokenKind::Comma, ","),
    (TokenKind::Colon, ":"),
    (TokenKind::Semi, ";"),
    (TokenKind::LParen, "("),
    (TokenKind::RParen, ")"),
    (TokenKind::LBrace, "{"),
    (TokenKind::RBrace, "}"),
    (TokenKind::LBracket, "["),
    (TokenKind::RBracket, "]"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tokens_preloaded() {
        let pool = TokenPool::new();
        assert_eq!(pool.len(), CANONICAL_TOKENS.len());
    }

    #[test]
    fn interning_is_idempotent() {
        let mut pool = TokenPool::new();
        let a = pool.intern(TokenKind::Ident, "foo");
        let b = pool.intern(TokenKind::Ident, "foo");
        assert_eq!(a, b);
        let c = pool.intern(TokenKind::Ident, "bar");
        assert_ne!(a, c);
    }

    #[test]
    fn keyword_lookup_matches_canonical() {
        let mut pool = TokenPool::new();
        let before = pool.len();
        let id = pool.intern(TokenKind::KwIf, "if");
        assert_eq!(pool.len(), before, "keyword should already be interned");
        assert_eq!(pool.get(id).lexeme, "if");
    }

    #[test]
    fn distinct_kinds_with_same_lexeme_are_distinct() {
        // Not expected in practice, but the pool keys on (kind, lexeme), not lexeme alone.
        let mut pool = TokenPool::new();
        let a = pool.intern(TokenKind::Ident, "if");
        let b = pool.intern(TokenKind::KwIf, "if");
        assert_ne!(a, b);
    }
}
