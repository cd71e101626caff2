//! Tree-to-markup renderer.
//!
//! One linear pass over the flattened `next` chain. Closing tags owed by
//! expandable nodes wait on a stack keyed by level and are replayed whenever
//! the walk climbs back out, which is the dual of the level bookkeeping the
//! insertion engine does.


use rowan::{TextRange, TextSize};

use crate::model::{NodeId, QueryNode};
use crate::tree::QueryNodeTree;

/// Output of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Tag-name range of every node in `text`, in chain order.
    pub spans: Vec<(NodeId, TextRange)>,
    /// Name range of every written attribute.
    pub attribute_spans: Vec<(NodeId, String, TextRange)>,
}

impl Rendered {
    pub fn span_of(&self, id: NodeId) -> Option<TextRange> {
        self.spans
            .iter()
            .find_map(|&(node, span)| (node == id).then_some(span))
    }
}

struct Writer {
    indent_width: usize,
    out: String,
    spans: Vec<(NodeId, TextRange)>,
    attribute_spans: Vec<(NodeId, String, TextRange)>,
    /// `(level, "</tag>")` for every open element, innermost last.
    pending: Vec<(u32, String)>,
}

impl Writer {
    fn line(&mut self, level: u32) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..level as usize * self.indent_width {
            self.out.push(' ');
        }
    }

    fn offset(&self) -> TextSize {
        TextSize::of(self.out.as_str())
    }

    /// Emits the closing tags for every open element at `level` or deeper.
    fn close_to(&mut self, level: u32) {
        while self.pending.last().is_some_and(|(open, _)| *open >= level) {
            let Some((open, closing)) = self.pending.pop() else {
                break;
            };
            self.line(open);
            self.out.push_str(&closing);
        }
    }

    fn node(&mut self, node: &QueryNode) {
        self.close_to(node.level());
        self.line(node.level());

        let tag = node.tag_name();
        self.out.push('<');
        let start = self.offset();
        self.out.push_str(tag);
        self.spans
            .push((node.id(), TextRange::new(start, self.offset())));
        for attribute in node.attributes().filter(|a| !a.is_content()) {
            let fragment = attribute.display_value();
            if fragment.is_empty() {
                continue;
            }
            self.out.push(' ');
            let start = self.offset();
            let name = attribute.editor_name();
            self.attribute_spans.push((
                node.id(),
                name.to_string(),
                TextRange::at(start, TextSize::of(name)),
            ));
            self.out.push_str(&fragment);
        }

        match (node.content(), node.expandable()) {
            (Some(text), false) => {
                self.out.push('>');
                self.out.push_str(&text);
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push('>');
            }
            (content, true) => {
                self.out.push('>');
                if let Some(text) = content {
                    self.out.push_str(&text);
                }
                self.pending.push((node.level(), format!("</{tag}>")));
            }
            (None, false) => self.out.push_str(" />"),
        }
    }
}

/// Serializes `tree` as indented markup with no trailing newline.
pub fn render(tree: &QueryNodeTree, indent_width: usize) -> Rendered {
    let mut writer = Writer {
        indent_width,
        out: String::new(),
        spans: Vec::with_capacity(tree.len()),
        attribute_spans: Vec::new(),
        pending: Vec::new(),
    };
    for node in tree.iter() {
        writer.node(node);
    }
    writer.close_to(0);

    tracing::trace!(
        nodes = writer.spans.len(),
        bytes = writer.out.len(),
        "tree rendered"
    );
    Rendered {
        text: writer.out,
        spans: writer.spans,
        attribute_spans: writer.attribute_spans,
    }
}
