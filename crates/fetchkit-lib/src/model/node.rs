use fetchkit_core::{CONTENT_ATTRIBUTE, NodeKind};
use indexmap::IndexMap;
use rowan::TextRange;

use super::{AttributeSlots, NodeAttribute, NodeId};
use crate::reactive::{Observable, Subscriptions, combine_into};
use crate::validation::{ContinuousValidator, ValidationIssue, ValidationResult};

/// One query element.
///
/// Structure is encoded by `level` plus the `next` link of the flattened
/// preorder chain; there is no children list. Everything reactive is owned
/// here and torn down when the node is dropped.
pub struct QueryNode {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) tag_name: String,
    pub(crate) order: u32,
    pub(crate) level: u32,
    pub(crate) expandable: bool,
    pub(crate) is_expanded: bool,
    pub(crate) visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) attributes: IndexMap<String, NodeAttribute>,
    pub(crate) slots: AttributeSlots,
    pub(crate) child_count: Observable<usize>,
    pub(crate) display_value: Observable<String>,
    pub(crate) markup_attributes: Observable<String>,
    pub(crate) validation: Observable<ValidationResult>,
    pub(crate) validators: Vec<ContinuousValidator>,
    pub(crate) source_span: Option<TextRange>,
    pub(crate) revision: Observable<u64>,
    pub(crate) wiring: Subscriptions,
}

impl std::fmt::Debug for QueryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("level", &self.level)
            .field("parent", &self.parent)
            .field("next", &self.next)
            .field("attributes", &self.attributes.values().collect::<Vec<_>>())
            .finish()
    }
}

impl QueryNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether the node currently has children.
    pub fn expandable(&self) -> bool {
        self.expandable
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Attributes in serialization order.
    pub fn attributes(&self) -> impl Iterator<Item = &NodeAttribute> {
        self.attributes.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&NodeAttribute> {
        self.attributes.get(name)
    }

    /// Value of `name`, empty when absent.
    pub fn attribute_value(&self, name: &str) -> String {
        self.slots.value(name)
    }

    /// `(name, value)` pairs of every non-empty attribute, in order.
    pub fn attribute_pairs(&self) -> Vec<(String, String)> {
        self.attributes
            .values()
            .map(|a| (a.editor_name.clone(), a.value.get()))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    pub fn slots(&self) -> &AttributeSlots {
        &self.slots
    }

    pub fn child_count(&self) -> usize {
        self.child_count.get()
    }

    pub fn child_count_observable(&self) -> &Observable<usize> {
        &self.child_count
    }

    pub fn display_value(&self) -> String {
        self.display_value.get()
    }

    pub fn display_observable(&self) -> &Observable<String> {
        &self.display_value
    }

    /// Serialized attribute string: every non-empty, non-content attribute
    /// as ` name="value"`.
    pub fn markup_attributes(&self) -> String {
        self.markup_attributes.get()
    }

    /// Element text, if the node carries a non-empty content attribute.
    pub fn content(&self) -> Option<String> {
        self.attributes
            .get(CONTENT_ATTRIBUTE)
            .map(NodeAttribute::display_value)
            .filter(|text| !text.is_empty())
    }

    pub fn validation(&self) -> ValidationResult {
        self.validation.get()
    }

    pub fn validation_observable(&self) -> &Observable<ValidationResult> {
        &self.validation
    }

    /// Node-level validators (rules and schema checks).
    pub fn validators(&self) -> &[ContinuousValidator] {
        &self.validators
    }

    /// Tag-name range in the text this node was last parsed from or rendered to.
    pub fn source_span(&self) -> Option<TextRange> {
        self.source_span
    }

    pub(crate) fn insert_attribute(&mut self, attribute: NodeAttribute) {
        self.attributes
            .insert(attribute.editor_name.clone(), attribute);
        self.attributes.sort_by(|_, a, _, b| a.order.cmp(&b.order));
        self.rewire();
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
        let Some(attribute) = self.attributes.shift_remove(name) else {
            return false;
        };
        attribute.value.set(String::new());
        drop(attribute);
        self.rewire();
        true
    }

    /// Rebuilds the derived streams after the attribute set changed.
    ///
    /// Previous wiring is disposed first so stale streams never compete with
    /// the new ones.
    pub(crate) fn rewire(&mut self) {
        self.wiring.dispose();

        let displays: Vec<Observable<String>> = self
            .attributes
            .values()
            .filter(|a| a.displayable)
            .map(|a| a.display_value.clone())
            .collect();
        let fallback = match self.kind {
            NodeKind::Unknown => self.tag_name.clone(),
            kind => kind.default_name().to_string(),
        };
        let parts = displays.clone();
        self.wiring
            .extend(combine_into(&displays, &self.display_value, move || {
                let shown: Vec<String> = parts
                    .iter()
                    .map(Observable::get)
                    .filter(|s| !s.is_empty())
                    .collect();
                if shown.is_empty() {
                    fallback.clone()
                } else {
                    shown.join(" ")
                }
            }));

        let fragments: Vec<Observable<String>> = self
            .attributes
            .values()
            .filter(|a| !a.content)
            .map(|a| a.display_value.clone())
            .collect();
        let parts = fragments.clone();
        self.wiring
            .extend(combine_into(&fragments, &self.markup_attributes, move || {
                parts
                    .iter()
                    .map(Observable::get)
                    .filter(|s| !s.is_empty())
                    .fold(String::new(), |mut out, fragment| {
                        out.push(' ');
                        out.push_str(&fragment);
                        out
                    })
            }));

        let results: Vec<Observable<Vec<ValidationIssue>>> = self
            .validators
            .iter()
            .chain(self.attributes.values().flat_map(|a| a.validators.iter()))
            .map(|v| v.result().clone())
            .collect();
        let sources = results.clone();
        self.wiring
            .extend(combine_into(&results, &self.validation, move || {
                ValidationResult::from_issues(sources.iter().flat_map(Observable::get))
            }));

        for attribute in self.attributes.values() {
            let revision = self.revision.clone();
            self.wiring.hold(
                attribute
                    .display_value
                    .subscribe(move |_| revision.update(|r| *r += 1)),
            );
        }
    }
}
