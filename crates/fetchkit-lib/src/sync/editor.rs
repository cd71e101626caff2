use rowan::TextRange;

use crate::diagnostics::EditorDiagnostic;
use crate::syntax::{self, SourceText, Token};

/// The text editor a [`Session`](super::Session) is attached to.
///
/// The editor owns the document text and its syntax engine. The engine pulls
/// tokens from it when the text changed and pushes whole documents and
/// diagnostic lists back.
pub trait EditorHost {
    /// Current document text.
    fn text(&self) -> &str;

    /// Token stream for the current text, from offset zero.
    fn tokens(&self) -> Vec<Token>;

    fn slice(&self, range: TextRange) -> &str {
        self.text().slice(range)
    }

    /// Replaces the full document with generated markup.
    fn replace_document(&mut self, text: &str);

    fn publish_diagnostics(&mut self, diagnostics: Vec<EditorDiagnostic>);
}

/// Lets the parser slice token text straight out of an editor.
pub(crate) struct EditorText<'e, E: ?Sized>(pub(crate) &'e E);

impl<E: EditorHost + ?Sized> SourceText for EditorText<'_, E> {
    fn slice(&self, range: TextRange) -> &str {
        self.0.slice(range)
    }
}

/// In-memory editor tokenized with the reference lexer.
#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    text: String,
    published: Vec<EditorDiagnostic>,
    replacements: usize,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Simulates the user typing over the whole document.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Simulates the user replacing `range` with `insert`.
    pub fn splice(&mut self, range: TextRange, insert: &str) {
        self.text
            .replace_range(std::ops::Range::<usize>::from(range), insert);
    }

    /// Diagnostics from the latest publish.
    pub fn published(&self) -> &[EditorDiagnostic] {
        &self.published
    }

    /// How many times the engine rewrote the document.
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl EditorHost for MemoryEditor {
    fn text(&self) -> &str {
        &self.text
    }

    fn tokens(&self) -> Vec<Token> {
        syntax::lex(&self.text)
    }

    fn replace_document(&mut self, text: &str) {
        self.replacements += 1;
        self.text.clear();
        self.text.push_str(text);
    }

    fn publish_diagnostics(&mut self, diagnostics: Vec<EditorDiagnostic>) {
        self.published = diagnostics;
    }
}
