//! Rendering diagnostics for terminals and logs.
//!
//! Two layouts: annotated source snippets (the default once a source is
//! attached) and compact one-line records (`query.xml:1:9: error: ...`) for
//! tools that parse output line by line.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Patch, Renderer, Snippet};
use rowan::{TextRange, TextSize};

use super::Diagnostics;
use super::message::{DiagnosticMessage, Severity};

pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
    compact: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
            compact: false,
        }
    }

    /// Markup the ranges point into. Without it only offsets can be shown.
    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    /// Document name shown next to each location.
    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    /// One line per diagnostic instead of source snippets.
    pub fn compact(mut self, value: bool) -> Self {
        self.compact = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        match self.source {
            Some(source) if !self.compact => self.format_snippets(w, source),
            _ => self.format_lines(w),
        }
    }

    fn format_snippets(&self, w: &mut impl Write, source: &str) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            let report = snippet_report(diag, source, self.path);
            write!(w, "{}", renderer.render(&report))?;
        }
        Ok(())
    }

    fn format_lines(&self, w: &mut impl Write) -> std::fmt::Result {
        for diag in self.diagnostics.iter() {
            if let Some(path) = self.path {
                write!(w, "{path}:")?;
            }
            match self.source {
                Some(source) => {
                    let (line, column) = line_column(source, diag.range().start());
                    writeln!(w, "{line}:{column}: {}: {}", diag.severity(), diag.message())?;
                }
                None if self.path.is_some() => {
                    let start = u32::from(diag.range().start());
                    writeln!(w, "{start}: {}: {}", diag.severity(), diag.message())?;
                }
                None => writeln!(w, "{diag}")?,
            }
        }
        Ok(())
    }
}

fn snippet_report<'a>(
    diag: &'a DiagnosticMessage,
    source: &'a str,
    path: Option<&'a str>,
) -> Vec<Group<'a>> {
    let range = visible_range(diag.range(), source.len());

    let mut snippet = Snippet::source(source)
        .line_start(1)
        .annotation(AnnotationKind::Primary.span(range.clone()).label(diag.message()));
    if let Some(path) = path {
        snippet = snippet.path(path);
    }

    let mut title = level(diag.severity())
        .primary_title(diag.message())
        .element(snippet);
    for hint in diag.hints() {
        title = title.element(Level::HELP.message(hint));
    }

    let mut report = vec![title];
    if let Some(fix) = &diag.fix {
        report.push(
            Level::HELP.secondary_title(&fix.description).element(
                Snippet::source(source)
                    .line_start(1)
                    .patch(Patch::new(range, &fix.replacement)),
            ),
        );
    }
    report
}

fn level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

/// Clamps `range` to the source and widens empty ranges to one character so
/// the marker stays visible.
fn visible_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start = usize::from(range.start()).min(limit);
    let end = usize::from(range.end()).min(limit);
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}

/// 1-based line and character column of `offset`.
fn line_column(source: &str, offset: TextSize) -> (usize, usize) {
    let mut offset = usize::from(offset).min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
