//! Token kind enumeration. Drives both the logos lexer and the parser's parselet tables.

use logos::Logos;

/// Numeric radix, present on integer/float literal tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Decimal,
    Hex,
    Octal,
    Binary,
}

/// Classification of a numeric literal token; `None` for non-numeric tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumericKind {
    #[default]
    None,
    Integer,
    Float,
}

/// Every distinct lexical token kind recognized by the lexer.
///
/// `#[token]` entries are literal matches (keywords, punctuators); `#[regex]` entries cover
/// variable-length lexemes (identifiers, numbers, comments). Nested constructs (`/* */`,
/// `{{ }}`) are not expressible as flat regexes, so their start markers are tokenized here and
/// [`crate::lexer::lex`] manually extends the match via `lexer.bump()` in the callback.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // Keywords
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("for")]
    KwFor,
    #[token("in")]
    KwIn,
    #[token("switch")]
    KwSwitch,
    #[token("case")]
    KwCase,
    #[token("fallthrough")]
    KwFallthrough,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("return")]
    KwReturn,
    #[token("defer")]
    KwDefer,
    #[token("with")]
    KwWith,
    #[token("yield")]
    KwYield,
    #[token("proc")]
    KwProc,
    #[token("struct")]
    KwStruct,
    #[token("union")]
    KwUnion,
    #[token("enum")]
    KwEnum,
    #[token("namespace")]
    KwNamespace,
    #[token("module")]
    KwModule,
    #[token("import")]
    KwImport,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("nil")]
    KwNil,
    #[token("cast")]
    KwCast,
    #[token("transmute")]
    KwTransmute,
    #[token("sizeof")]
    KwSizeOf,
    #[token("alignof")]
    KwAlignOf,

    // Identifiers and literals
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", priority = 1)]
    Ident,
    #[regex(r"\$[0-9A-Fa-f_]+")]
    HexInt,
    #[regex(r"@[0-7_]+")]
    OctalInt,
    #[regex(r"%[01_]+")]
    BinaryInt,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*")]
    DecimalFloat,
    #[regex(r"[0-9][0-9_]*")]
    DecimalInt,
    #[token("\"")]
    StringLiteralStart,
    #[token("'")]
    CharLiteralStart,
    /// Manufactured by the lexer wrapper when splitting a string literal's content out of its
    /// surrounding quotes; never produced directly by a logos pattern.
    StrVal,
    /// Manufactured by the lexer wrapper for a character literal's content.
    CharVal,

    // Directives, attributes, labels
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    Directive,
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Attribute,
    #[regex(r"'[A-Za-z_][A-Za-z0-9_]*:")]
    Label,

    // Punctuation and operators, longest-prefix-first so logos' maximal-munch picks correctly.
    #[token("+:=")]
    PlusAssign,
    #[token("-:=")]
    MinusAssign,
    #[token("*:=")]
    StarAssign,
    #[token("**")]
    StarStar,
    #[token("/:=")]
    SlashAssign,
    #[token("%:=")]
    PercentAssign,
    #[token("|:=")]
    PipeAssign,
    #[token("&:=")]
    AmpAssign,
    #[token("~:=")]
    TildeAssign,
    #[token("::")]
    ColonColon,
    #[token(":=")]
    ColonEquals,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("..")]
    DotDot,
    #[token("->")]
    Arrow,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Equals,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("^")]
    Caret,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("//")]
    LineCommentStart,
    #[token("/*")]
    BlockCommentStart,
    #[token("{{")]
    RawBlockStart,

    /// A maximal run of bytes no recognizer could consume; coalesced by the lexer wrapper.
    Garbage,
    /// Synthesized at the end of every token stream.
    Eof,
    /// Used as a sentinel by lookahead past the end of the buffer.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::LineCommentStart | TokenKind::BlockCommentStart)
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            KwIf | KwElse
                | KwWhile
                | KwFor
                | KwIn
                | KwSwitch
                | KwCase
                | KwFallthrough
                | KwBreak
                | KwContinue
                | KwReturn
                | KwDefer
                | KwWith
                | KwYield
                | KwProc
                | KwStruct
                | KwUnion
                | KwEnum
                | KwNamespace
                | KwModule
                | KwImport
                | KwTrue
                | KwFalse
                | KwNil
                | KwCast
                | KwTransmute
                | KwSizeOf
                | KwAlignOf
        )
    }

    pub fn is_numeric_literal(self) -> bool {
        use TokenKind::*;
        matches!(self, HexInt | OctalInt | BinaryInt | DecimalInt | DecimalFloat)
    }

    pub fn radix(self) -> Option<Radix> {
        use TokenKind::*;
        match self {
            HexInt => Some(Radix::Hex),
            OctalInt => Some(Radix::Octal),
            BinaryInt => Some(Radix::Binary),
            DecimalInt | DecimalFloat => Some(Radix::Decimal),
            _ => None,
        }
    }

    pub fn numeric_kind(self) -> NumericKind {
        use TokenKind::*;
        match self {
            DecimalFloat => NumericKind::Float,
            HexInt | OctalInt | BinaryInt | DecimalInt => NumericKind::Integer,
            _ => NumericKind::None,
        }
    }
}
