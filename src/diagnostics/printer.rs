//! Renders a [`super::Diagnostics`] collection with source-line context and pointer underlining.
//!
//! Grounded on the teacher's `DiagnosticsPrinter`: same builder shape, same `annotate-snippets`
//! groups-and-levels API, generalized to key each diagnostic by [`super::DiagnosticCode`] rather
//! than an internal diagnostic-kind enum only meaningful to the parser.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Patch, Renderer, Snippet};

use super::{Diagnostic, Severity};

/// Builder for rendering one source buffer's diagnostics.
///
/// All diagnostics passed to [`DiagnosticsPrinter::new`] must belong to the `source` text given
/// to [`DiagnosticsPrinter::source`] — a session with multiple files renders one printer per
/// file's diagnostic subset.
pub struct DiagnosticsPrinter<'d> {
    diagnostics: &'d [Diagnostic],
    source: Option<&'d str>,
    path: Option<&'d str>,
    colored: bool,
}

impl<'d> DiagnosticsPrinter<'d> {
    pub(super) fn new(diagnostics: &'d [Diagnostic], source: &'d str) -> Self {
        Self { diagnostics, source: Some(source), path: None, colored: false }
    }

    pub fn path(mut self, path: &'d str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return self.format_plain(w);
        };
        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored { Renderer::styled() } else { Renderer::plain() };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            let range = adjust_range(diag.span.start as usize, diag.span.end as usize, source.len());
            let label = format!("[{}] {}", diag.code, diag.message);

            let mut snippet =
                Snippet::source(source).line_start(1).annotation(AnnotationKind::Primary.span(range.clone()).label(&label));
            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }
            for related in &diag.related {
                let related_range =
                    adjust_range(related.span.start as usize, related.span.end as usize, source.len());
                snippet = snippet.annotation(AnnotationKind::Context.span(related_range).label(&related.message));
            }

            let level = severity_to_level(diag.severity);
            let mut report: Vec<Group> = vec![level.primary_title(&label).element(snippet)];

            if let Some(fix) = &diag.fix {
                report.push(
                    Level::HELP
                        .secondary_title(&fix.description)
                        .element(Snippet::source(source).line_start(1).patch(Patch::new(range, &fix.replacement))),
                );
            }

            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }
        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{} [{}] {}..{}: {}", diag.severity, diag.code, diag.span.start, diag.span.end, diag.message)?;
        }
        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn adjust_range(start: usize, end: usize, limit: usize) -> std::ops::Range<usize> {
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}
