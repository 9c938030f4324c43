//! Source buffer: owns a loaded file's UTF-8 bytes and a precomputed line index.
//!
//! Mirrors the teacher's `SourceMap`/`SourceId` split: a session may load several files, each
//! gets a stable small id, and diagnostics carry `(SourceId, byte offset)` locations resolved
//! against the buffer on render.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Stable id for a loaded source file, valid for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u32);

impl SourceId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Constructs an id directly; used by [`SourceSet`] and by tests in other modules that need
    /// a `SourceId` without loading a real buffer.
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// A byte range within one source file, paired with its [`SourceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub source: SourceId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(source: SourceId, start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { source, start, end }
    }

    pub fn empty(source: SourceId, at: u32) -> Self {
        Self::new(source, at, at)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span containing both `self` and `other`. Both must share a source.
    pub fn cover(&self, other: Span) -> Span {
        debug_assert_eq!(self.source, other.source, "cannot cover spans from different sources");
        Span::new(self.source, self.start.min(other.start), self.end.max(other.end))
    }
}

/// A 1-based (line, column) position, as rendered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An immutable, loaded source file.
///
/// Precomputes a line-start index at construction time so position queries are O(log n) on
/// line count rather than a linear rescan.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    id: SourceId,
    path: PathBuf,
    text: String,
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl SourceBuffer {
    pub fn new(id: SourceId, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self { id, path: path.into(), text, line_starts }
    }

    pub fn load(id: SourceId, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::SourceLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|e| Error::InvalidUtf8 {
            path: path.to_path_buf(),
            offset: e.utf8_error().valid_up_to(),
        })?;
        Ok(Self::new(id, path, text))
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte access to a single byte position (must be a char boundary to get a codepoint).
    pub fn byte_at(&self, offset: u32) -> Option<u8> {
        self.text.as_bytes().get(offset as usize).copied()
    }

    /// Extracts the substring covered by `span`. Panics if the span crosses a different source
    /// or falls outside the buffer — both indicate a caller bug.
    pub fn slice(&self, span: Span) -> &str {
        debug_assert_eq!(span.source, self.id, "span belongs to a different source buffer");
        &self.text[span.start as usize..span.end as usize]
    }

    /// Resolves a byte offset to a 1-based (line, column) pair. Binary search on line count.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start as usize..offset as usize].chars().count() as u32 + 1;
        LineCol { line: line_idx as u32 + 1, column }
    }

    /// Byte range of the given 1-based line number, excluding its trailing newline.
    pub fn line_span(&self, line: u32) -> Option<Span> {
        let idx = (line.checked_sub(1))? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| {
                let mut e = s;
                while e > start && matches!(self.text.as_bytes().get(e as usize - 1), Some(b'\n' | b'\r')) {
                    e -= 1;
                }
                e
            })
            .unwrap_or_else(|| self.len());
        Some(Span::new(self.id, start, end))
    }

    pub fn line_text(&self, line: u32) -> Option<&str> {
        self.line_span(line).map(|s| self.slice(s))
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// A source-context excerpt for error rendering: the full line(s) covering `span`, along
    /// with the (line, column) of the span start, suitable for pointer-underlining by a printer.
    pub fn excerpt(&self, span: Span) -> Excerpt<'_> {
        let start = self.line_col(span.start);
        let end = self.line_col(span.end);
        Excerpt {
            start,
            end,
            first_line: self.line_text(start.line).unwrap_or(""),
        }
    }
}

fn compute_line_starts(text: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i as u32 + 1);
        }
    }
    starts
}

/// A rendered excerpt of source text around a span, for diagnostic printing.
#[derive(Debug, Clone)]
pub struct Excerpt<'a> {
    pub start: LineCol,
    pub end: LineCol,
    pub first_line: &'a str,
}

/// Owns all [`SourceBuffer`]s loaded for one session and hands out fresh [`SourceId`]s.
#[derive(Debug, Default)]
pub struct SourceSet {
    buffers: Vec<SourceBuffer>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> SourceId {
        SourceId(self.buffers.len() as u32)
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> SourceId {
        let id = self.next_id();
        self.buffers.push(SourceBuffer::new(id, path, text));
        id
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<SourceId> {
        let id = self.next_id();
        self.buffers.push(SourceBuffer::load(id, path)?);
        Ok(id)
    }

    pub fn get(&self, id: SourceId) -> &SourceBuffer {
        &self.buffers[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceBuffer> {
        self.buffers.iter()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> SourceBuffer {
        SourceBuffer::new(SourceId(0), "test.bc", text)
    }

    #[test]
    fn line_col_first_line() {
        let b = buf("abc\ndef\nghi");
        assert_eq!(b.line_col(0), LineCol { line: 1, column: 1 });
        assert_eq!(b.line_col(2), LineCol { line: 1, column: 3 });
    }

    #[test]
    fn line_col_later_lines() {
        let b = buf("abc\ndef\nghi");
        assert_eq!(b.line_col(4), LineCol { line: 2, column: 1 });
        assert_eq!(b.line_col(9), LineCol { line: 3, column: 2 });
    }

    #[test]
    fn line_text_strips_newline() {
        let b = buf("abc\ndef\n");
        assert_eq!(b.line_text(1), Some("abc"));
        assert_eq!(b.line_text(2), Some("def"));
    }

    #[test]
    fn slice_respects_span() {
        let b = buf("let x = 1;");
        let span = Span::new(b.id(), 4, 5);
        assert_eq!(b.slice(span), "x");
    }

    #[test]
    fn span_cover_widens() {
        let s1 = Span::new(SourceId(0), 3, 5);
        let s2 = Span::new(SourceId(0), 1, 4);
        let c = s1.cover(s2);
        assert_eq!(c, Span::new(SourceId(0), 1, 5));
    }

    #[test]
    fn source_set_assigns_stable_ids() {
        let mut set = SourceSet::new();
        let a = set.add("a.bc", "x");
        let b = set.add("b.bc", "y");
        assert_ne!(a, b);
        assert_eq!(set.get(a).text(), "x");
        assert_eq!(set.get(b).text(), "y");
    }

    #[test]
    fn empty_source_has_one_line() {
        let b = buf("");
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line_col(0), LineCol { line: 1, column: 1 });
    }
}
