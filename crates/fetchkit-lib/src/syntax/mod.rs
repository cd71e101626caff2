//! Token vocabulary consumed by the parser, plus a reference tokenizer.
//!
//! In an editor the tokens come from the editor's own syntax engine; [`lex`]
//! produces the same stream from plain text for tools and tests.

mod lexer;


use rowan::TextRange;

pub use lexer::{Token, TokenKind, lex, token_text};

/// Anything that can hand out the source text behind a token span.
pub trait SourceText {
    /// Text at `range`, or `""` when the range is out of bounds.
    fn slice(&self, range: TextRange) -> &str;
}

impl SourceText for str {
    fn slice(&self, range: TextRange) -> &str {
        self.get(std::ops::Range::<usize>::from(range)).unwrap_or("")
    }
}

impl SourceText for String {
    fn slice(&self, range: TextRange) -> &str {
        self.as_str().slice(range)
    }
}
