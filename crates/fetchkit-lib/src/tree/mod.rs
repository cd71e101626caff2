//! Query node tree and insertion engine.
//!
//! The tree is an arena of [`QueryNode`]s threaded into one flattened preorder
//! chain through `next`. A node's descendants are exactly the contiguous run
//! after it whose `level` is deeper than its own. Every operation keeps three
//! invariants (checked by [`QueryNodeTree::verify`]):
//!
//! 1. the chain from the root is a valid preorder flattening,
//! 2. siblings are sorted by kind order, ties by insertion,
//! 3. a node is visible iff every ancestor is visible and expanded.

mod invariants;

#[cfg(test)]
mod tree_tests;

use fetchkit_core::NodeKind;

use crate::factory::{AttributeFactory, NodeContext, NodeFactory};
use crate::model::{AttributeSlots, NodeId, QueryNode};
use crate::reactive::Observable;
use crate::validation::StructuralIssue;
use crate::{Error, Result};

pub use invariants::InvariantViolation;

pub struct QueryNodeTree {
    nodes: Vec<Option<QueryNode>>,
    root: Option<NodeId>,
    selection: Observable<Option<NodeId>>,
    revision: Observable<u64>,
    factory: NodeFactory,
}

impl std::fmt::Debug for QueryNodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryNodeTree")
            .field("root", &self.root)
            .field("len", &self.len())
            .field("selection", &self.selection.get())
            .finish()
    }
}

impl Default for QueryNodeTree {
    fn default() -> Self {
        Self::new(NodeFactory::new())
    }
}

impl QueryNodeTree {
    pub fn new(factory: NodeFactory) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            selection: Observable::new(None),
            revision: Observable::new(0),
            factory,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_node(&self) -> Option<&QueryNode> {
        self.root.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: NodeId) -> Option<&QueryNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Result<&QueryNode> {
        self.get(id).ok_or(Error::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut QueryNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Lazily walks the `next` chain from the root. Links are read at each
    /// step, so a fresh iterator always reflects the current structure.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes {
            tree: self,
            cursor: self.root,
        }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(QueryNode::id).collect()
    }

    /// Direct children of `id`, in sibling order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let level = node.level;
        self.run_after(id)
            .filter(|n| n.level == level + 1)
            .map(QueryNode::id)
            .collect()
    }

    /// Descendant run of `id`: the contiguous chain after it that is deeper.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.run_after(id).map(QueryNode::id).collect()
    }

    fn run_after(&self, id: NodeId) -> impl Iterator<Item = &QueryNode> {
        let level = self.get(id).map(|n| n.level);
        let start = self.get(id).and_then(|n| n.next);
        Nodes {
            tree: self,
            cursor: start,
        }
        .take_while(move |n| level.is_some_and(|l| n.level > l))
    }

    /// Nearest ancestor (or the node itself) that is an entity or link-entity.
    pub fn nearest_entity(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            if node.kind.is_entity_like() {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection.get()
    }

    pub fn selection_observable(&self) -> &Observable<Option<NodeId>> {
        &self.selection
    }

    /// Bumped on every change that affects the rendered markup.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn revision_observable(&self) -> &Observable<u64> {
        &self.revision
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn select_node(&mut self, id: Option<NodeId>) -> Result<()> {
        if let Some(id) = id {
            self.node(id)?;
        }
        self.selection.set(id);
        Ok(())
    }

    fn touch(&self) {
        self.revision.update(|r| *r += 1);
    }

    /// Drops every node and the selection.
    pub fn clear(&mut self) {
        tracing::trace!(nodes = self.len(), "clearing tree");
        self.nodes.clear();
        self.root = None;
        self.selection.set(None);
        self.touch();
    }

    /// Replaces the tree with the default document: a root with one empty entity.
    pub fn initialize(&mut self) {
        self.clear();
        let root = self.create(NodeKind::Fetch, "fetch", None);
        self.root = Some(root);
        if let Err(err) = self.add_node(NodeKind::Entity, Some(root)) {
            tracing::warn!(%err, "default entity was not created");
        }
        self.selection.set(None);
        tracing::debug!("tree initialized");
    }

    /// Adds a node of `kind` under `parent` (the selection when `None`) and
    /// selects it. Kinds with a mandatory child get one automatically; the
    /// added node stays selected.
    pub fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> Result<NodeId> {
        let parent = parent
            .or_else(|| self.selection.get())
            .ok_or(Error::MissingParent)?;
        let tag = kind.tag_name().unwrap_or_default();
        let id = self.insert(kind, tag, parent)?;
        if let Some(child) = kind.mandatory_child() {
            self.insert(child, child.tag_name().unwrap_or_default(), id)?;
        }
        self.selection.set(Some(id));
        Ok(id)
    }

    /// Parser entry point. The first node becomes the root regardless of
    /// `parent`; afterwards a parent is required. No mandatory children.
    pub fn add_node_from_parsing(
        &mut self,
        kind: NodeKind,
        tag_name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if self.root.is_none() {
            let id = self.create(kind, tag_name, None);
            self.root = Some(id);
            self.touch();
            return Ok(id);
        }
        let parent = parent.ok_or(Error::MissingParent)?;
        self.insert(kind, tag_name, parent)
    }

    fn create(&mut self, kind: NodeKind, tag_name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let (level, root_slots, entity_slots) = match parent {
            None => (0, None, None),
            Some(parent) => (
                self.get(parent).map_or(0, |p| p.level + 1),
                self.root_node().map(|r| r.slots.clone()),
                self.nearest_entity(parent)
                    .and_then(|e| self.get(e))
                    .map(|e| e.slots.clone()),
            ),
        };
        let ctx = NodeContext {
            level,
            parent,
            root_slots,
            entity_slots,
            revision: self.revision.clone(),
        };
        let node = self.factory.create_node(id, kind, tag_name, ctx);
        self.nodes.push(Some(node));
        id
    }

    fn insert(&mut self, kind: NodeKind, tag_name: &str, parent: NodeId) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.create(kind, tag_name, Some(parent));
        let (level, order) = {
            let node = self.node(id)?;
            (node.level, node.order)
        };

        let after = self.find_insertion_point(parent, level, order);
        let next = self.node(after)?.next;
        self.node_mut(id)?.next = next;
        self.node_mut(after)?.next = Some(id);

        let expand = {
            let p = self.node_mut(parent)?;
            p.expandable = true;
            p.child_count.update(|c| *c += 1);
            !p.is_expanded
        };
        if expand {
            self.node_mut(parent)?.is_expanded = true;
        }
        self.refresh_visibility(parent);

        tracing::debug!(%id, ?kind, %parent, level, "node inserted");
        self.touch();
        Ok(id)
    }

    /// Node after which a new child `(level, order)` of `parent` is spliced.
    ///
    /// Scans forward from `parent`, passing deeper nodes (descendants of
    /// earlier siblings) and same-level siblings with `order <= order`, and
    /// stops on leaving the parent's run or meeting a later-ordered sibling.
    /// Degrades to `parent` if the scan cannot start.
    pub fn find_insertion_point(&self, parent: NodeId, level: u32, order: u32) -> NodeId {
        let Some(mut cursor) = self.get(parent).and_then(|p| p.next) else {
            return parent;
        };
        let mut previous = parent;
        loop {
            let Some(node) = self.get(cursor) else {
                return previous;
            };
            if node.level < level || (node.level == level && node.order > order) {
                return previous;
            }
            previous = cursor;
            match node.next {
                Some(next) => cursor = next,
                None => return previous,
            }
        }
    }

    /// Removes `id` and its descendant run; the predecessor becomes selected.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let (parent, level) = {
            let node = self.node(id)?;
            (node.parent.ok_or(Error::RemoveRoot)?, node.level)
        };

        let predecessor = self
            .iter()
            .find(|n| n.next == Some(id))
            .map(QueryNode::id)
            .ok_or(Error::UnknownNode(id))?;

        let mut doomed = vec![id];
        let mut cursor = self.node(id)?.next;
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if node.level <= level {
                break;
            }
            doomed.push(current);
            cursor = node.next;
        }

        let successor_level = cursor.and_then(|s| self.get(s)).map(|s| s.level);
        {
            let pred = self.node_mut(predecessor)?;
            pred.next = cursor;
            pred.expandable = successor_level.is_some_and(|l| l > pred.level);
        }
        self.node_mut(parent)?
            .child_count
            .update(|c| *c = c.saturating_sub(1));

        for gone in &doomed {
            self.nodes[gone.index()] = None;
        }

        tracing::debug!(%id, removed = doomed.len(), "node removed");
        self.selection.set(Some(predecessor));
        self.touch();
        Ok(())
    }

    /// Flips `is_expanded` and recomputes visibility of the descendant run.
    pub fn toggle_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        if !node.expandable {
            return Ok(());
        }
        node.is_expanded = !node.is_expanded;
        self.refresh_visibility(id);

        if let Some(selected) = self.selection.get()
            && self.get(selected).is_some_and(|n| !n.visible)
        {
            self.selection.set(None);
        }
        Ok(())
    }

    fn refresh_visibility(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let mut stack = vec![(node.level, node.visible && node.is_expanded)];
        let mut cursor = node.next;
        let base = node.level;
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get_mut(current.index()).and_then(Option::as_mut) else {
                break;
            };
            if node.level <= base {
                break;
            }
            while stack.last().is_some_and(|&(level, _)| level >= node.level) {
                stack.pop();
            }
            node.visible = stack.last().is_some_and(|&(_, visible)| visible);
            stack.push((node.level, node.visible && node.is_expanded));
            cursor = node.next;
        }
    }

    /// Sets `name` on `id`, creating the attribute if needed.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.node(id)?;
        if let Some(attribute) = node.attribute(name) {
            attribute.set_value(value);
            return Ok(());
        }
        self.create_attribute(id, name, value, false)?;
        Ok(())
    }

    /// Parser entry point: creates (or overwrites) an attribute with the
    /// one-shot name check enabled.
    pub fn insert_parsed_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<Vec<StructuralIssue>> {
        if let Some(attribute) = self.node(id)?.attribute(name) {
            attribute.set_value(value);
            return Ok(Vec::new());
        }
        self.create_attribute(id, name, value, true)
    }

    fn create_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
        parser_validation: bool,
    ) -> Result<Vec<StructuralIssue>> {
        let node = self.node_mut(id)?;
        let slot = node.slots.slot(name);
        let (attribute, issues) =
            AttributeFactory::for_kind(node.kind).create_attribute(name, value, slot, parser_validation);
        node.insert_attribute(attribute);
        self.touch();
        Ok(issues)
    }

    /// Returns whether the attribute existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool> {
        let removed = self.node_mut(id)?.remove_attribute(name);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub(crate) fn set_source_span(&mut self, id: NodeId, span: Option<rowan::TextRange>) {
        if let Ok(node) = self.node_mut(id) {
            node.source_span = span;
        }
    }

    pub(crate) fn clear_attribute_spans(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            for attribute in node.attributes.values_mut() {
                attribute.source_span = None;
            }
        }
    }

    pub(crate) fn set_attribute_span(
        &mut self,
        id: NodeId,
        name: &str,
        span: Option<rowan::TextRange>,
    ) {
        if let Some(attribute) = self
            .node_mut(id)
            .ok()
            .and_then(|node| node.attributes.get_mut(name))
        {
            attribute.source_span = span;
        }
    }

    pub fn root_slots(&self) -> Option<&AttributeSlots> {
        self.root_node().map(QueryNode::slots)
    }
}

/// Iterator over the flattened preorder chain.
pub struct Nodes<'a> {
    tree: &'a QueryNodeTree,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a QueryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get(self.cursor?)?;
        self.cursor = node.next;
        Some(node)
    }
}

impl<'a> IntoIterator for &'a QueryNodeTree {
    type Item = &'a QueryNode;
    type IntoIter = Nodes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
