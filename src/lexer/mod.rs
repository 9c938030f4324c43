//! Hand-written post-processing pass over a generated [`logos`] token stream.
//!
//! `logos` handles every flat, fixed-length-dispatch token. It cannot express nested block
//! comments, nested raw blocks, or string/char escape processing, so [`lex`] re-scans the source
//! around the `BlockCommentStart`/`RawBlockStart`/`StringLiteralStart`/`CharLiteralStart`/
//! `LineCommentStart` markers those simple patterns produce, exactly the way the teacher's own
//! `lex()` wrapper splits `StringLiteral` content out from around its quotes.

use logos::Logos;

use crate::source::{SourceId, Span};
use crate::token::{Token, TokenId, TokenKind, TokenPool};

/// A lexical error, carrying the offending byte offset for diagnostic rendering.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: u32 },

    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: u32 },

    #[error("unterminated character literal starting at byte {offset}")]
    UnterminatedChar { offset: u32 },

    #[error("unterminated block comment starting at byte {offset}")]
    UnterminatedBlockComment { offset: u32 },

    #[error("unterminated raw block starting at byte {offset}")]
    UnterminatedRawBlock { offset: u32 },

    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape { offset: u32 },

    #[error("no recognizer matched at byte {offset}")]
    NoRecognizer { offset: u32 },
}

/// Result of lexing one source buffer: the token stream plus any lexical errors encountered.
///
/// Lexing never aborts on error: a `Garbage` token is emitted in place of the unrecognized run
/// and scanning resumes after it, per the "recoverable passes keep going" rule applied down to
/// the lexer level.
#[derive(Debug, Default)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

/// Lexes `source` into a token stream, interning every non-trivial lexeme into `pool`.
///
/// The returned stream always ends with a single [`TokenKind::Eof`] token whose span is empty
/// and positioned at `source.len()`.
pub fn lex(source_id: SourceId, source: &str, pool: &mut TokenPool) -> LexResult {
    let mut result = LexResult::default();
    let mut inner = TokenKind::lexer(source);

    while let Some(spanned) = inner.next() {
        let raw_span = inner.span();
        let start = raw_span.start as u32;

        match spanned {
            Ok(TokenKind::StringLiteralStart) => {
                let mut escape_errors = Vec::new();
                match scan_quoted(source, raw_span.end as u32, b'"', &mut escape_errors) {
                    Ok(content_end) => {
                        let quote_end = content_end + 1;
                        let content_span = Span::new(source_id, raw_span.end as u32, content_end);
                        let id = pool.intern(TokenKind::StrVal, &source[raw_span.end..content_end as usize]);
                        result.tokens.push(Token::new(id, TokenKind::StrVal, content_span));
                        result.errors.extend(escape_errors);
                        inner.bump((quote_end - raw_span.end as u32) as usize);
                    }
                    Err(e) => {
                        result.errors.extend(escape_errors);
                        result.errors.push(e);
                        inner.bump(source.len() - raw_span.end);
                    }
                }
            }
            Ok(TokenKind::CharLiteralStart) => {
                let mut escape_errors = Vec::new();
                match scan_quoted(source, raw_span.end as u32, b'\'', &mut escape_errors) {
                    Ok(content_end) => {
                        let quote_end = content_end + 1;
                        let content_span = Span::new(source_id, raw_span.end as u32, content_end);
                        let id = pool.intern(TokenKind::CharVal, &source[raw_span.end..content_end as usize]);
                        result.tokens.push(Token::new(id, TokenKind::CharVal, content_span));
                        result.errors.extend(escape_errors);
                        inner.bump((quote_end - raw_span.end as u32) as usize);
                    }
                    Err(e) => {
                        result.errors.extend(escape_errors);
                        result.errors.push(e);
                        inner.bump(source.len() - raw_span.end);
                    }
                }
            }
            Ok(TokenKind::LineCommentStart) => {
                let rest = &source[raw_span.end..];
                let nl = rest.find('\n').unwrap_or(rest.len());
                let end = raw_span.end + nl;
                let span = Span::new(source_id, start, end as u32);
                let id = pool.intern(TokenKind::LineCommentStart, &source[raw_span.start..end]);
                result.tokens.push(Token::new(id, TokenKind::LineCommentStart, span));
                inner.bump(nl);
            }
            Ok(TokenKind::BlockCommentStart) => {
                match scan_nested(source, raw_span.end, "/*", "*/") {
                    Ok(consumed) => {
                        let end = raw_span.end + consumed;
                        let span = Span::new(source_id, start, end as u32);
                        let id = pool.intern(TokenKind::BlockCommentStart, &source[raw_span.start..end]);
                        result.tokens.push(Token::new(id, TokenKind::BlockCommentStart, span));
                        inner.bump(consumed);
                    }
                    Err(()) => {
                        result.errors.push(LexError::UnterminatedBlockComment { offset: start });
                        inner.bump(source.len() - raw_span.end);
                    }
                }
            }
            Ok(TokenKind::RawBlockStart) => {
                match scan_nested(source, raw_span.end, "{{", "}}") {
                    Ok(consumed) => {
                        let body_span = Span::new(
                            source_id,
                            raw_span.end as u32,
                            (raw_span.end + consumed - 2) as u32,
                        );
                        let id = pool.intern(TokenKind::RawBlockStart, &source[raw_span.start..raw_span.end + consumed]);
                        result.tokens.push(Token::new(id, TokenKind::RawBlockStart, body_span));
                        inner.bump(consumed);
                    }
                    Err(()) => {
                        result.errors.push(LexError::UnterminatedRawBlock { offset: start });
                        inner.bump(source.len() - raw_span.end);
                    }
                }
            }
            Ok(kind) => {
                let lexeme = &source[raw_span.clone()];
                let span = Span::new(source_id, raw_span.start as u32, raw_span.end as u32);
                let id = pool.intern(kind, lexeme);
                result.tokens.push(Token::new(id, kind, span));
            }
            Err(()) => {
                // Coalesce consecutive unrecognized bytes into one `Garbage` token rather than
                // emitting one error per byte.
                let mut end = raw_span.end;
                loop {
                    let mut peek = inner.clone();
                    match peek.next() {
                        Some(Err(())) => {
                            end = peek.span().end;
                            inner = peek;
                        }
                        _ => break,
                    }
                }
                let span = Span::new(source_id, start, end as u32);
                let lexeme = &source[raw_span.start..end];
                let id = pool.intern(TokenKind::Garbage, lexeme);
                result.tokens.push(Token::new(id, TokenKind::Garbage, span));
                result.errors.push(LexError::NoRecognizer { offset: start });
            }
        }
    }

    let eof_offset = source.len() as u32;
    let eof_id = pool.intern(TokenKind::Eof, "");
    result
        .tokens
        .push(Token::new(eof_id, TokenKind::Eof, Span::empty(source_id, eof_offset)));

    result
}

/// Scans from just past an opening quote to the matching unescaped closing `quote` byte.
/// Returns the byte offset of the closing quote (exclusive of content) on success. Malformed
/// escape sequences are recorded into `errors` but do not abort the scan.
fn scan_quoted(source: &str, start: u32, quote: u8, errors: &mut Vec<LexError>) -> Result<u32, LexError> {
    let bytes = source.as_bytes();
    let mut i = start as usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let escape_at = i;
                i += 1;
                if i >= bytes.len() {
                    break;
                }
                match escape_width(bytes, i) {
                    Some(width) => i += width,
                    None => {
                        errors.push(LexError::InvalidEscape { offset: escape_at as u32 });
                        i += 1;
                    }
                }
            }
            b if b == quote => return Ok(i as u32),
            b'\n' if quote == b'\'' => break,
            _ => i += 1,
        }
    }
    Err(if quote == b'"' {
        LexError::UnterminatedString { offset: start }
    } else {
        LexError::UnterminatedChar { offset: start }
    })
}

/// Width, in bytes, of the escape body following a `\`, for the standard set plus
/// `\xNN`, `\uNNNN`, `\UNNNNNNNN`. Returns `None` for an unrecognized escape (treated as width 1
/// so scanning still advances).
fn escape_width(bytes: &[u8], at: usize) -> Option<usize> {
    match bytes.get(at)? {
        b'n' | b't' | b'r' | b'\\' | b'"' | b'\'' | b'0' => Some(1),
        b'x' => Some(1 + 2),
        b'u' => Some(1 + 4),
        b'U' => Some(1 + 8),
        _ => None,
    }
}

/// Scans a nested `open`/`close` delimited run starting right after the first `open`, given one
/// nesting level is already open. Returns the number of bytes consumed from `start` (inclusive of
/// the final matching `close`) on success.
fn scan_nested(source: &str, start: usize, open: &str, close: &str) -> Result<usize, ()> {
    let rest = &source[start..];
    let mut depth = 1usize;
    let mut i = 0usize;
    while i < rest.len() {
        if rest[i..].starts_with(open) {
            depth += 1;
            i += open.len();
        } else if rest[i..].starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return Ok(i);
            }
        } else {
            i += 1;
        }
    }
    Err(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_str(src: &str) -> (Vec<TokenKind>, Vec<LexError>) {
        let mut pool = TokenPool::new();
        let result = lex(SourceId::new(0), src, &mut pool);
        (result.tokens.iter().map(|t| t.kind).collect(), result.errors)
    }

    #[test]
    fn lexes_keywords_and_idents() {
        let (kinds, errs) = lex_str("if foo");
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::KwIf, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn splits_string_literal_content() {
        let (kinds, errs) = lex_str("\"hello\"");
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::StrVal, TokenKind::Eof]);
    }

    #[test]
    fn string_with_escape() {
        let (kinds, errs) = lex_str(r#""a\nb""#);
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::StrVal, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, errs) = lex_str("\"abc");
        assert!(matches!(errs[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn nested_block_comments() {
        let (kinds, errs) = lex_str("/* outer /* inner */ still outer */ if");
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::BlockCommentStart, TokenKind::KwIf, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_block_comment_reports_error() {
        let (_, errs) = lex_str("/* not closed");
        assert!(matches!(errs[0], LexError::UnterminatedBlockComment { .. }));
    }

    #[test]
    fn nested_raw_blocks() {
        let (kinds, errs) = lex_str("{{ a {{ b }} c }}");
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::RawBlockStart, TokenKind::Eof]);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let (kinds, errs) = lex_str("// comment\nif");
        assert!(errs.is_empty());
        assert_eq!(kinds, vec![TokenKind::LineCommentStart, TokenKind::KwIf, TokenKind::Eof]);
    }

    #[test]
    fn hex_octal_binary_prefixes() {
        let (kinds, errs) = lex_str("$FF @17 %101");
        assert!(errs.is_empty());
        assert_eq!(
            kinds,
            vec![TokenKind::HexInt, TokenKind::OctalInt, TokenKind::BinaryInt, TokenKind::Eof]
        );
    }

    #[test]
    fn garbage_coalesces_consecutive_unknown_bytes() {
        let (kinds, errs) = lex_str("§§§ if");
        assert_eq!(kinds, vec![TokenKind::Garbage, TokenKind::KwIf, TokenKind::Eof]);
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn always_terminates_with_eof() {
        let (kinds, _) = lex_str("");
        assert_eq!(kinds, vec![TokenKind::Eof]);
    }

    #[test]
    fn compound_assignment_longest_match() {
        let (kinds, errs) = lex_str("x +:= 1");
        assert!(errs.is_empty());
        assert_eq!(
            kinds,
            vec![TokenKind::Ident, TokenKind::PlusAssign, TokenKind::DecimalInt, TokenKind::Eof]
        );
    }
}
