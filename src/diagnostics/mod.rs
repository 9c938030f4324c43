//! Recoverable diagnostics: the session's error/warning collector.
//!
//! Distinct from [`crate::error::Error`]: a diagnostic is recorded while a pass keeps running.
//! Severity follows the teacher's `Severity` split (error vs. warning); codes follow spec §6's
//! two-letter-prefix + three-digit convention (`P019`, `C051`, `B021`, …) rather than the
//! teacher's kind-name-only scheme, since this crate needs a stable, greppable code per
//! diagnostic kind.

mod code;
mod printer;

pub use code::DiagnosticCode;
pub use printer::DiagnosticsPrinter;

use crate::source::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A suggested fix for a diagnostic (replacement text plus a human description).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub replacement: String,
    pub description: String,
}

/// A secondary location referenced by a diagnostic (e.g. "previous declaration here").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub fix: Option<Fix>,
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Builder for one diagnostic. Not emitted until [`DiagnosticBuilder::emit`] is called.
#[must_use = "diagnostic not recorded until .emit() is called"]
pub struct DiagnosticBuilder<'a> {
    collector: &'a mut Diagnostics,
    diagnostic: Diagnostic,
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.diagnostic.message = message.into();
        self
    }

    pub fn related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.diagnostic.related.push(RelatedInfo { span, message: message.into() });
        self
    }

    pub fn fix(mut self, description: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.diagnostic.fix = Some(Fix { replacement: replacement.into(), description: description.into() });
        self
    }

    pub fn emit(self) {
        self.collector.messages.push(self.diagnostic);
    }
}

/// Accumulating collector of diagnostics for one session. Passes keep running after recording a
/// diagnostic; overall session success is `!diagnostics.has_errors()`.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
    /// Suppresses duplicate reports at the same span, mirroring the teacher's
    /// `last_diagnostic_pos` de-duplication during error recovery.
    last_reported_at: Option<(u32, u32)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a diagnostic using `code`'s default severity and message. Returns a builder so
    /// callers can customize the message, attach related info, or suggest a fix before emitting.
    pub fn report(&mut self, code: DiagnosticCode, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostic: Diagnostic {
                code,
                severity: code.severity(),
                span,
                message: code.default_message().to_string(),
                fix: None,
                related: Vec::new(),
            },
            collector: self,
        }
    }

    /// Reports at `span` unless the last report already landed at the same span, preventing
    /// error-recovery loops from flooding the same location with repeats.
    pub fn report_once(&mut self, code: DiagnosticCode, span: Span) -> Option<DiagnosticBuilder<'_>> {
        let key = (span.start, span.end);
        if self.last_reported_at == Some(key) {
            return None;
        }
        self.last_reported_at = Some(key);
        Some(self.report(code, span))
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(Diagnostic::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(Diagnostic::is_warning)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn printer<'a>(&'a self, source: &'a str) -> DiagnosticsPrinter<'a> {
        DiagnosticsPrinter::new(&self.messages, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    fn span() -> Span {
        Span::new(SourceId::new(0), 0, 1)
    }

    #[test]
    fn report_uses_code_default_severity_and_message() {
        let mut d = Diagnostics::new();
        d.report(DiagnosticCode::P019UnexpectedToken, span()).emit();
        assert_eq!(d.len(), 1);
        assert!(d.has_errors());
        assert!(!d.has_warnings());
    }

    #[test]
    fn report_once_suppresses_duplicate_span() {
        let mut d = Diagnostics::new();
        assert!(d.report_once(DiagnosticCode::P019UnexpectedToken, span()).is_some());
        d.report(DiagnosticCode::P019UnexpectedToken, span()).emit();
        assert!(d.report_once(DiagnosticCode::P019UnexpectedToken, span()).is_none());
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn warning_does_not_count_as_error() {
        let mut d = Diagnostics::new();
        d.report(DiagnosticCode::S001UnusedSymbol, span()).emit();
        assert!(!d.has_errors());
        assert!(d.has_warnings());
    }

    #[test]
    fn extend_merges_messages() {
        let mut a = Diagnostics::new();
        a.report(DiagnosticCode::P019UnexpectedToken, span()).emit();
        let mut b = Diagnostics::new();
        b.report(DiagnosticCode::C051TypeMismatch, span()).emit();
        a.extend(b);
        assert_eq!(a.len(), 2);
    }
}
