//! Markup parser: replays a token stream into the query tree.
//!
//! The parser is a small state machine over editor tokens. It never builds a
//! syntax tree of its own; each finished start tag goes straight into
//! [`QueryNodeTree::add_node_from_parsing`], and a stack of open elements
//! mirrors the nesting. Malformed input is reported in [`Diagnostics`] and
//! parsing continues on a best-effort basis.
//!
//! Every entry point checks the [`SyncCoordinator`]: while the renderer is
//! writing text, tokens are dropped without touching the tree.


use fetchkit_core::{CONTENT_ATTRIBUTE, NodeKind};
use rowan::{TextRange, TextSize};

use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::escape;
use crate::model::NodeId;
use crate::sync::{SyncCoordinator, SyncDirection};
use crate::syntax::{SourceText, Token, TokenKind};
use crate::tree::QueryNodeTree;

/// Where the parser is relative to tag nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Between elements, or inside a start tag (`<`).
    #[default]
    IncrementingLevel,
    /// Just finished a self-closing element.
    Flat,
    /// Inside a close tag (`</`).
    DecrementingLevel,
}

#[derive(Debug)]
struct StagedAttribute {
    name: String,
    span: TextRange,
    value: Option<String>,
}

#[derive(Debug)]
struct StagedNode {
    tag: String,
    tag_span: TextRange,
    attributes: Vec<StagedAttribute>,
}

/// An element whose start tag was seen but not its close tag.
#[derive(Debug)]
struct OpenElement {
    /// `None` for elements that were skipped (and everything inside them).
    node: Option<NodeId>,
    tag: String,
    tag_span: TextRange,
}

#[derive(Debug)]
pub struct MarkupParser {
    coordinator: SyncCoordinator,
    fuel: u32,
    state: ParseState,
    tag_open: Option<TextRange>,
    staged: Option<StagedNode>,
    open: Vec<OpenElement>,
    saw_root: bool,
    ignored: usize,
    diagnostics: Diagnostics,
}

impl MarkupParser {
    pub fn new(coordinator: SyncCoordinator, config: &EngineConfig) -> Self {
        Self {
            coordinator,
            fuel: config.recursion_fuel,
            state: ParseState::default(),
            tag_open: None,
            staged: None,
            open: Vec::new(),
            saw_root: false,
            ignored: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Nesting depth of the element currently being built.
    pub fn level(&self) -> usize {
        self.open.len()
    }

    /// Tokens dropped because the renderer was writing.
    pub fn ignored_tokens(&self) -> usize {
        self.ignored
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Applies one token to `tree`.
    pub fn feed<S: SourceText + ?Sized>(
        &mut self,
        tree: &mut QueryNodeTree,
        token: Token,
        source: &S,
    ) {
        if !self.coordinator.accepts_tokens() {
            self.ignored += 1;
            return;
        }

        match token.kind {
            TokenKind::StartTag | TokenKind::StartCloseTag => {
                self.abandon_unterminated(tree);
                self.tag_open = Some(token.span);
                self.state = if token.kind == TokenKind::StartTag {
                    ParseState::IncrementingLevel
                } else {
                    ParseState::DecrementingLevel
                };
            }
            TokenKind::TagName => {
                // Closing-tag names are not matched against the open element.
                if self.state != ParseState::DecrementingLevel && self.tag_open.is_some() {
                    self.staged = Some(StagedNode {
                        tag: source.slice(token.span).to_string(),
                        tag_span: token.span,
                        attributes: Vec::new(),
                    });
                }
            }
            TokenKind::AttributeName => {
                if let Some(staged) = &mut self.staged {
                    staged.attributes.push(StagedAttribute {
                        name: source.slice(token.span).to_string(),
                        span: token.span,
                        value: None,
                    });
                }
            }
            TokenKind::AttributeValue => {
                let Some(staged) = self.staged.as_mut() else {
                    return;
                };
                let value = escape::decode(unquote(source.slice(token.span))).into_owned();
                match staged.attributes.last_mut() {
                    Some(attribute) if attribute.value.is_none() => {
                        attribute.value = Some(value);
                    }
                    _ => {
                        self.diagnostics
                            .report(DiagnosticKind::SyntaxError, token.span)
                            .message("value without an attribute name")
                            .emit();
                    }
                }
            }
            TokenKind::EndTag | TokenKind::SelfCloseEndTag => {
                let self_closing = token.kind == TokenKind::SelfCloseEndTag;
                if self.state == ParseState::DecrementingLevel {
                    self.close(token.span);
                } else if let Some(staged) = self.staged.take() {
                    self.finalize(tree, staged, self_closing);
                } else if let Some(open) = self.tag_open {
                    self.diagnostics
                        .report(DiagnosticKind::SyntaxError, open.cover(token.span))
                        .message("tag has no name")
                        .emit();
                }
                self.tag_open = None;
                if self_closing {
                    self.state = ParseState::Flat;
                } else if self.state == ParseState::DecrementingLevel {
                    self.state = ParseState::IncrementingLevel;
                }
            }
            TokenKind::Text => self.text(tree, token.span, source.slice(token.span)),
            TokenKind::Error => {
                self.diagnostics
                    .report(DiagnosticKind::SyntaxError, token.span)
                    .message(format!("unexpected `{}`", source.slice(token.span)))
                    .emit();
            }
            TokenKind::Equals | TokenKind::Whitespace | TokenKind::Comment => {}
        }
    }

    /// Ends the stream: reports unclosed elements and returns all diagnostics.
    pub fn finish(&mut self, tree: &mut QueryNodeTree) -> Diagnostics {
        if self.coordinator.accepts_tokens() {
            self.abandon_unterminated(tree);
            for element in std::mem::take(&mut self.open) {
                self.diagnostics
                    .report(DiagnosticKind::UnclosedTag, element.tag_span)
                    .message(element.tag)
                    .emit();
            }
        }
        std::mem::take(&mut self.diagnostics)
    }

    /// A start tag that never reached `>` is kept as a self-closing element.
    /// A bare `<` or `</` that never reached `>` is only reported.
    fn abandon_unterminated(&mut self, tree: &mut QueryNodeTree) {
        let open = self.tag_open.take();
        if let Some(staged) = self.staged.take() {
            self.diagnostics
                .report(DiagnosticKind::SyntaxError, staged.tag_span)
                .message(format!("`<{}` is missing its closing `>`", staged.tag))
                .emit();
            self.finalize(tree, staged, true);
            return;
        }
        let Some(open) = open else {
            return;
        };
        let message = if self.state == ParseState::DecrementingLevel {
            "close tag is missing its `>`"
        } else {
            "`<` is not followed by a tag name"
        };
        self.diagnostics
            .report(DiagnosticKind::SyntaxError, open)
            .message(message)
            .emit();
    }

    fn close(&mut self, end: TextRange) {
        let span = self.tag_open.map_or(end, |open| open.cover(end));
        if self.open.pop().is_none() {
            self.diagnostics
                .report(DiagnosticKind::UnexpectedCloseTag, span)
                .emit();
        }
    }

    fn finalize(&mut self, tree: &mut QueryNodeTree, staged: StagedNode, self_closing: bool) {
        let StagedNode {
            tag,
            tag_span,
            attributes,
        } = staged;

        let skip = match self.open.last() {
            Some(OpenElement { node: None, .. }) => true,
            _ if self.open.len() >= self.fuel as usize => {
                self.diagnostics
                    .report(DiagnosticKind::NestingTooDeep, tag_span)
                    .message(format!("limit is {}", self.fuel))
                    .emit();
                true
            }
            None if self.saw_root => {
                self.diagnostics
                    .report(DiagnosticKind::MultipleRoots, tag_span)
                    .message(format!("`<{tag}>` is a second top-level element"))
                    .emit();
                true
            }
            _ => false,
        };
        if skip {
            self.push_open(None, tag, tag_span, self_closing);
            return;
        }

        let kind = NodeKind::from_tag(&tag);
        let parent = self.open.last().and_then(|e| e.node);
        let parent_kind = parent.and_then(|p| tree.get(p)).map(|p| p.kind());

        for issue in tree.factory().check_parsed(kind, &tag, parent_kind) {
            self.diagnostics
                .report(issue.kind, tag_span)
                .message(issue.detail)
                .emit();
        }

        let id = match tree.add_node_from_parsing(kind, &tag, parent) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(%err, tag = %tag, "element dropped");
                self.push_open(None, tag, tag_span, self_closing);
                return;
            }
        };
        self.saw_root = true;
        tree.set_source_span(id, Some(tag_span));

        let mut seen: Vec<&str> = Vec::with_capacity(attributes.len());
        for attribute in &attributes {
            if seen.contains(&attribute.name.as_str()) {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateAttribute, attribute.span)
                    .message(attribute.name.clone())
                    .emit();
            }
            seen.push(&attribute.name);

            let Some(value) = &attribute.value else {
                self.diagnostics
                    .report(DiagnosticKind::MissingAttributeValue, attribute.span)
                    .message(attribute.name.clone())
                    .emit();
                continue;
            };
            match tree.insert_parsed_attribute(id, &attribute.name, value) {
                Ok(issues) => {
                    tree.set_attribute_span(id, &attribute.name, Some(attribute.span));
                    for issue in issues {
                        self.diagnostics
                            .report(issue.kind, attribute.span)
                            .message(issue.detail)
                            .emit();
                    }
                }
                Err(err) => tracing::warn!(%err, name = %attribute.name, "attribute dropped"),
            }
        }

        tracing::trace!(%id, tag = %tag, level = self.open.len(), "element parsed");
        self.push_open(Some(id), tag, tag_span, self_closing);
    }

    fn push_open(&mut self, node: Option<NodeId>, tag: String, tag_span: TextRange, self_closing: bool) {
        if !self_closing {
            self.open.push(OpenElement {
                node,
                tag,
                tag_span,
            });
        }
    }

    fn text(&mut self, tree: &mut QueryNodeTree, span: TextRange, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        match self.open.last() {
            Some(OpenElement { node: None, .. }) => {}
            Some(OpenElement {
                node: Some(id), ..
            }) if tree.get(*id).is_some_and(|n| n.kind().accepts_content()) => {
                let id = *id;
                let decoded = escape::decode(trimmed);
                let current = tree.get(id).map(|n| n.attribute_value(CONTENT_ATTRIBUTE));
                let value = match current.as_deref() {
                    None | Some("") => decoded.into_owned(),
                    Some(existing) => format!("{existing} {decoded}"),
                };
                if let Err(err) = tree.insert_parsed_attribute(id, CONTENT_ATTRIBUTE, &value) {
                    tracing::warn!(%err, "element text dropped");
                }
            }
            _ => {
                let lead = text.len() - text.trim_start().len();
                let start = span.start() + TextSize::from(lead as u32);
                let range = TextRange::at(start, TextSize::from(trimmed.len() as u32));
                self.diagnostics
                    .report(DiagnosticKind::UnexpectedText, range)
                    .emit();
            }
        }
    }
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'"' | b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Rebuilds `tree` from a complete token stream.
///
/// Clears the tree, parses inside a text-to-tree pass and, if the text held no
/// element at all, falls back to the default document. Only a fallback for
/// blank text counts as a tree change; otherwise the text is left for the
/// user to finish.
pub fn parse_document<S: SourceText + ?Sized>(
    tree: &mut QueryNodeTree,
    tokens: &[Token],
    source: &S,
    coordinator: &SyncCoordinator,
    config: &EngineConfig,
) -> Diagnostics {
    let guard = match coordinator.enter(SyncDirection::TextToTree) {
        Ok(guard) => guard,
        Err(err) => {
            tracing::debug!(%err, "parse skipped");
            return Diagnostics::new();
        }
    };

    tree.clear();
    let mut parser = MarkupParser::new(coordinator.clone(), config);
    for token in tokens {
        parser.feed(tree, *token, source);
    }
    let diagnostics = parser.finish(tree);

    // Half-typed markup stays as typed; only blank text gets the default
    // document written back.
    let blank = tokens
        .iter()
        .all(|t| t.kind.is_trivia() || source.slice(t.span).trim().is_empty());
    if !tree.is_empty() {
        drop(guard);
    } else if blank {
        drop(guard);
        tree.initialize();
    } else {
        tree.initialize();
        drop(guard);
    }
    tracing::debug!(
        tokens = tokens.len(),
        nodes = tree.len(),
        diagnostics = diagnostics.len(),
        "document parsed"
    );
    diagnostics
}

/// Convenience for plain text: tokenizes with the reference lexer and parses.
pub fn parse_str(tree: &mut QueryNodeTree, source: &str, config: &EngineConfig) -> Diagnostics {
    let tokens = crate::syntax::lex(source);
    parse_document(tree, &tokens, source, &SyncCoordinator::new(), config)
}
