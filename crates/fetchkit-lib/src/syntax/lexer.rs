//! Reference tokenizer for query markup.
//!
//! Produces span-based tokens without storing text; text is sliced from source
//! only when needed. Markup has two lexical contexts, so there are two logos
//! token sets and the lexer morphs between them: element content (text and
//! tag openers) and the inside of a tag (names, `=`, quoted values, `>`).
//!
//! ## Error handling
//!
//! Consecutive unrecognized characters are coalesced into one `Error` token
//! rather than one error per character.

use logos::Logos;
use rowan::TextRange;
use std::ops::Range;

/// Token vocabulary shared with the editor's syntax engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// `<`
    StartTag,
    /// `</`
    StartCloseTag,
    /// First name after `<` or `</`.
    TagName,
    AttributeName,
    Equals,
    /// Quoted value, quotes included.
    AttributeValue,
    /// `>`
    EndTag,
    /// `/>`
    SelfCloseEndTag,
    Text,
    Whitespace,
    Comment,
    /// Coalesced unrecognized characters.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    #[token("</")]
    StartCloseTag,

    #[token("<")]
    StartTag,

    #[regex(r"<!--(?:[^-]|-[^-])*-->")]
    Comment,

    #[regex(r"[^<]+", allow_greedy = true)]
    Text,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Markup {
    #[token(">")]
    EndTag,

    #[token("/>")]
    SelfCloseEndTag,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    AttributeValue,

    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*")]
    Name,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// A new tag opener before the current tag was terminated.
    #[token("</")]
    StartCloseTag,

    #[token("<")]
    StartTag,
}

enum Mode<'s> {
    Content(logos::Lexer<'s, Content>),
    /// `bool`: the next name is the tag name.
    Markup(logos::Lexer<'s, Markup>, bool),
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

struct Sink<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    error_start: Option<usize>,
}

impl Sink<'_> {
    fn push(&mut self, kind: TokenKind, span: Range<usize>) {
        self.flush_error(span.start);
        self.tokens.push(Token::new(kind, range_to_text_range(span)));
    }

    fn error(&mut self, span: Range<usize>) {
        if self.error_start.is_none() {
            self.error_start = Some(span.start);
        }
    }

    fn flush_error(&mut self, end: usize) {
        if let Some(start) = self.error_start.take() {
            self.tokens
                .push(Token::new(TokenKind::Error, range_to_text_range(start..end)));
        }
    }
}

/// Tokenizes markup into span-based tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut sink = Sink {
        source,
        tokens: Vec::new(),
        error_start: None,
    };
    let mut mode = Mode::Content(Content::lexer(source));

    loop {
        mode = match mode {
            Mode::Content(mut lexer) => match lexer.next() {
                None => break,
                Some(Ok(token)) => {
                    let span = lexer.span();
                    match token {
                        Content::StartTag | Content::StartCloseTag => {
                            let kind = if token == Content::StartTag {
                                TokenKind::StartTag
                            } else {
                                TokenKind::StartCloseTag
                            };
                            sink.push(kind, span);
                            Mode::Markup(lexer.morph(), true)
                        }
                        Content::Comment => {
                            sink.push(TokenKind::Comment, span);
                            Mode::Content(lexer)
                        }
                        Content::Text => {
                            let kind = if sink.source[span.clone()].trim().is_empty() {
                                TokenKind::Whitespace
                            } else {
                                TokenKind::Text
                            };
                            sink.push(kind, span);
                            Mode::Content(lexer)
                        }
                    }
                }
                Some(Err(())) => {
                    sink.error(lexer.span());
                    Mode::Content(lexer)
                }
            },
            Mode::Markup(mut lexer, expect_tag_name) => match lexer.next() {
                None => break,
                Some(Ok(token)) => {
                    let span = lexer.span();
                    match token {
                        Markup::EndTag | Markup::SelfCloseEndTag => {
                            let kind = if token == Markup::EndTag {
                                TokenKind::EndTag
                            } else {
                                TokenKind::SelfCloseEndTag
                            };
                            sink.push(kind, span);
                            Mode::Content(lexer.morph())
                        }
                        Markup::StartTag => {
                            sink.push(TokenKind::StartTag, span);
                            Mode::Markup(lexer, true)
                        }
                        Markup::StartCloseTag => {
                            sink.push(TokenKind::StartCloseTag, span);
                            Mode::Markup(lexer, true)
                        }
                        Markup::Name => {
                            let kind = if expect_tag_name {
                                TokenKind::TagName
                            } else {
                                TokenKind::AttributeName
                            };
                            sink.push(kind, span);
                            Mode::Markup(lexer, false)
                        }
                        Markup::Equals => {
                            sink.push(TokenKind::Equals, span);
                            Mode::Markup(lexer, false)
                        }
                        Markup::AttributeValue => {
                            sink.push(TokenKind::AttributeValue, span);
                            Mode::Markup(lexer, false)
                        }
                        Markup::Whitespace => {
                            sink.push(TokenKind::Whitespace, span);
                            Mode::Markup(lexer, expect_tag_name)
                        }
                    }
                }
                Some(Err(())) => {
                    sink.error(lexer.span());
                    Mode::Markup(lexer, false)
                }
            },
        };
    }

    sink.flush_error(source.len());
    sink.tokens
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'q>(source: &'q str, token: &Token) -> &'q str {
    &source[std::ops::Range::<usize>::from(token.span)]
}
