use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use fetchkit_core::NodeKind;

use super::clock::{Clock, SystemClock};
use super::coordinator::{SyncCoordinator, SyncDirection};
use super::editor::{EditorHost, EditorText};
use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticMessage, Diagnostics};
use crate::model::NodeId;
use crate::parser::parse_document;
use crate::reactive::{Observable, Subscription};
use crate::render::{Rendered, render};
use crate::tree::QueryNodeTree;
use crate::validation::ValidationResult;
use crate::Result;

/// Host-facing facade tying one editor to one query tree.
///
/// Text edits are pulled in with [`document_changed`](Self::document_changed).
/// Tree edits go through the mutation methods (or straight to attribute
/// values); they schedule a render that [`poll`](Self::poll) writes once the
/// debounce window has passed without further changes.
pub struct Session<E: EditorHost, C: Clock + Clone + 'static = SystemClock> {
    editor: E,
    clock: C,
    config: EngineConfig,
    coordinator: SyncCoordinator,
    tree: QueryNodeTree,
    parse_diagnostics: Diagnostics,
    rendered: Observable<String>,
    /// Time of the latest tree change not yet rendered.
    changed_at: Rc<Cell<Option<Instant>>>,
    _revisions: Subscription,
}

impl<E: EditorHost, C: Clock + Clone + 'static> std::fmt::Debug for Session<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tree", &self.tree)
            .field("direction", &self.coordinator.direction())
            .field("render_pending", &self.is_render_pending())
            .finish()
    }
}

impl<E: EditorHost, C: Clock + Clone + 'static> Session<E, C> {
    pub fn new(editor: E, config: EngineConfig, clock: C) -> Self {
        Self::with_tree(editor, config, clock, QueryNodeTree::default())
    }

    /// Like [`new`](Self::new), with a tree built by a custom factory
    /// (e.g. one carrying a schema validator).
    pub fn with_tree(editor: E, config: EngineConfig, clock: C, tree: QueryNodeTree) -> Self {
        let coordinator = SyncCoordinator::new();
        let changed_at = Rc::new(Cell::new(None));
        let revisions = {
            let coordinator = coordinator.clone();
            let changed_at = Rc::clone(&changed_at);
            let clock = clock.clone();
            tree.revision_observable().subscribe(move |_| {
                // While parsing, the text is the source of truth.
                if coordinator.accepts_tree_changes() {
                    changed_at.set(Some(clock.now()));
                }
            })
        };
        Self {
            editor,
            clock,
            config,
            coordinator,
            tree,
            parse_diagnostics: Diagnostics::new(),
            rendered: Observable::new(String::new()),
            changed_at,
            _revisions: revisions,
        }
    }

    pub fn tree(&self) -> &QueryNodeTree {
        &self.tree
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.tree.selection()
    }

    pub fn selection_observable(&self) -> &Observable<Option<NodeId>> {
        self.tree.selection_observable()
    }

    /// Markup produced by the latest render.
    pub fn rendered(&self) -> &Observable<String> {
        &self.rendered
    }

    pub fn validation(&self, id: NodeId) -> Result<ValidationResult> {
        Ok(self.tree.node(id)?.validation())
    }

    pub fn validation_observable(&self, id: NodeId) -> Result<&Observable<ValidationResult>> {
        Ok(self.tree.node(id)?.validation_observable())
    }

    /// Whether a tree change is waiting to be rendered.
    pub fn is_render_pending(&self) -> bool {
        self.changed_at.get().is_some()
    }

    pub fn initialize(&mut self) {
        self.tree.initialize();
    }

    pub fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> Result<NodeId> {
        self.tree.add_node(kind, parent)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.tree.remove_node(id)
    }

    pub fn toggle_node(&mut self, id: NodeId) -> Result<()> {
        self.tree.toggle_node(id)
    }

    pub fn select_node(&mut self, id: Option<NodeId>) -> Result<()> {
        self.tree.select_node(id)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.tree.set_attribute(id, name, value)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool> {
        self.tree.remove_attribute(id, name)
    }

    /// The editor text changed. Re-parses unless a sync pass is running, in
    /// which case the change is the engine's own write and is ignored.
    pub fn document_changed(&mut self) -> bool {
        if !self.coordinator.is_idle() {
            tracing::trace!(direction = %self.coordinator.direction(), "document change ignored");
            return false;
        }
        self.reparse();
        true
    }

    /// Rebuilds the tree from the full editor text and publishes diagnostics.
    ///
    /// A render still pending from earlier tree edits is dropped: the text
    /// wins.
    pub fn reparse(&mut self) -> &Diagnostics {
        self.changed_at.set(None);
        let tokens = self.editor.tokens();
        self.parse_diagnostics = parse_document(
            &mut self.tree,
            &tokens,
            &EditorText(&self.editor),
            &self.coordinator,
            &self.config,
        );
        self.publish_diagnostics();
        &self.parse_diagnostics
    }

    /// Renders if the tree changed and has been quiet for the debounce window.
    pub fn poll(&mut self) -> Option<Rendered> {
        let changed_at = self.changed_at.get()?;
        if self.clock.now().duration_since(changed_at) < self.config.debounce() {
            return None;
        }
        Some(self.render_now())
    }

    /// Renders immediately and writes the text into the editor.
    ///
    /// The write happens inside a tree-to-text pass, so tokens the editor
    /// produces meanwhile are ignored. Nothing is written when the editor
    /// already shows exactly this text.
    pub fn render_now(&mut self) -> Rendered {
        self.changed_at.set(None);
        let rendered = render(&self.tree, self.config.indent_width);

        if self.editor.text() != rendered.text {
            match self.coordinator.enter(SyncDirection::TreeToText) {
                Ok(_writing) => self.editor.replace_document(&rendered.text),
                Err(err) => {
                    tracing::warn!(%err, "render not written");
                    return rendered;
                }
            }
        }

        for &(id, span) in &rendered.spans {
            self.tree.set_source_span(id, Some(span));
        }
        self.tree.clear_attribute_spans();
        for (id, name, span) in &rendered.attribute_spans {
            self.tree.set_attribute_span(*id, name, Some(*span));
        }
        // The text is now generated, so earlier parse errors no longer apply.
        self.parse_diagnostics = Diagnostics::new();
        self.rendered.set(rendered.text.clone());
        self.publish_diagnostics();

        tracing::debug!(bytes = rendered.text.len(), "document rendered");
        rendered
    }

    /// Parser diagnostics plus failing validations, deduplicated by proximity,
    /// in source order.
    ///
    /// Node-level issues are anchored at the tag name, attribute issues at the
    /// attribute name when it is known and at the tag name otherwise.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = self.parse_diagnostics.clone();
        for node in self.tree.iter() {
            let Some(span) = node.source_span() else {
                continue;
            };
            for issue in node.validators().iter().flat_map(|v| v.issues()) {
                all.push(DiagnosticMessage::new(issue.kind, span, issue.message));
            }
            for attribute in node.attributes() {
                let anchor = attribute.source_span().unwrap_or(span);
                for issue in attribute.issues() {
                    all.push(DiagnosticMessage::new(issue.kind, anchor, issue.message));
                }
            }
        }
        all.deduplicated(self.config.diagnostic_proximity)
    }

    /// Sends the current [`diagnostics`](Self::diagnostics) to the editor.
    pub fn publish_diagnostics(&mut self) {
        let diagnostics = self.diagnostics();
        tracing::trace!(count = diagnostics.len(), "publishing diagnostics");
        self.editor
            .publish_diagnostics(diagnostics.iter().map(DiagnosticMessage::to_editor).collect());
    }
}
