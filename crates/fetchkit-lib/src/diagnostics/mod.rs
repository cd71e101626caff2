mod message;
mod printer;


use rowan::{TextRange, TextSize};

pub use message::{DiagnosticKind, DiagnosticMessage, EditorDiagnostic, Fix, Severity};
pub use printer::DiagnosticsPrinter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Create a diagnostic with the given kind and span.
    ///
    /// Uses the kind's default message. Call `.message()` on the builder to override.
    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::with_default_message(kind, range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.messages.iter().map(|d| d.kind).collect()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub(crate) fn push(&mut self, message: DiagnosticMessage) {
        self.messages.push(message);
    }

    /// Returns diagnostics with near-duplicates suppressed, in source order.
    ///
    /// Two diagnostics whose start offsets are at most `proximity` apart would
    /// render as overlapping markers; only the higher-priority one is kept
    /// (lower `DiagnosticKind` discriminant, then earlier position, then
    /// emission order).
    pub fn deduplicated(&self, proximity: u32) -> Diagnostics {
        let mut order: Vec<usize> = (0..self.messages.len()).collect();
        order.sort_by_key(|&i| (self.messages[i].kind, self.messages[i].range.start(), i));

        let mut kept: Vec<usize> = Vec::with_capacity(order.len());
        for i in order {
            let start = self.messages[i].range.start();
            let clashes = kept
                .iter()
                .any(|&k| distance(self.messages[k].range.start(), start) <= proximity);
            if !clashes {
                kept.push(i);
            }
        }

        kept.sort_by_key(|&i| (self.messages[i].range.start(), i));
        Diagnostics {
            messages: kept.into_iter().map(|i| self.messages[i].clone()).collect(),
        }
    }

    /// Editor-facing list: deduplicated and flattened to offsets.
    pub fn to_editor(&self, proximity: u32) -> Vec<EditorDiagnostic> {
        self.deduplicated(proximity)
            .iter()
            .map(DiagnosticMessage::to_editor)
            .collect()
    }

    pub fn render(&self, source: &str) -> String {
        self.printer().source(source).render()
    }

    pub fn render_colored(&self, source: &str, colored: bool) -> String {
        self.printer().source(source).colored(colored).render()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl FromIterator<DiagnosticMessage> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = DiagnosticMessage>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Provide custom detail for this diagnostic, rendered using the kind's template.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        let detail = msg.into();
        self.message.message = self.message.kind.message(Some(&detail));
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn fix(mut self, description: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.message.fix = Some(Fix::new(replacement, description));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}

fn distance(a: TextSize, b: TextSize) -> u32 {
    let (a, b) = (u32::from(a), u32::from(b));
    a.abs_diff(b)
}
