#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Markup vocabulary for the fetchkit query builder.
//!
//! The markup language is closed: a fixed set of element tags (one per
//! [`NodeKind`]) and, per tag, a fixed set of attributes. Everything here is
//! statically allocated lookup data:
//!
//! - **Node kinds**: tag name, sibling order, mandatory child, allowed parents
//! - **Attribute tables**: per-kind [`AttributeSpec`] slices (order, value kind)
//! - **Rules**: per-kind [`NodeRule`] slices consumed by the validation engine
//!
//! Behavior (factories, validators) lives in `fetchkit-lib`.

mod attributes;

#[cfg(test)]
mod lib_tests;

use serde::Serialize;

pub use attributes::{CONDITION_OPERATORS, CONTENT_ATTRIBUTE};

/// Order assigned to attributes that are not part of a kind's table.
pub const UNKNOWN_ATTRIBUTE_ORDER: u32 = 1000;

// ============================================================================
// Node Kinds
// ============================================================================

/// Closed category of a query element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Fetch,
    Entity,
    AllAttributes,
    Attribute,
    Order,
    Filter,
    Condition,
    Value,
    LinkEntity,
    /// Element whose tag is not part of the vocabulary. Kept so malformed
    /// input survives in the tree instead of being dropped.
    Unknown,
}

impl NodeKind {
    /// Every kind with a known tag, in sibling order.
    pub const KNOWN: &'static [NodeKind] = &[
        NodeKind::Fetch,
        NodeKind::Entity,
        NodeKind::AllAttributes,
        NodeKind::Attribute,
        NodeKind::Order,
        NodeKind::Filter,
        NodeKind::Condition,
        NodeKind::Value,
        NodeKind::LinkEntity,
    ];

    /// Serialized element name. `None` for [`NodeKind::Unknown`], whose tag is
    /// whatever the source text said.
    pub fn tag_name(self) -> Option<&'static str> {
        match self {
            NodeKind::Fetch => Some("fetch"),
            NodeKind::Entity => Some("entity"),
            NodeKind::AllAttributes => Some("all-attributes"),
            NodeKind::Attribute => Some("attribute"),
            NodeKind::Order => Some("order"),
            NodeKind::Filter => Some("filter"),
            NodeKind::Condition => Some("condition"),
            NodeKind::Value => Some("value"),
            NodeKind::LinkEntity => Some("link-entity"),
            NodeKind::Unknown => None,
        }
    }

    /// Resolves a tag name. Unknown names map to [`NodeKind::Unknown`].
    pub fn from_tag(tag: &str) -> NodeKind {
        Self::KNOWN
            .iter()
            .copied()
            .find(|kind| kind.tag_name() == Some(tag))
            .unwrap_or(NodeKind::Unknown)
    }

    pub fn is_known_tag(tag: &str) -> bool {
        Self::from_tag(tag) != NodeKind::Unknown
    }

    /// Sibling placement priority. Lower sorts first under the same parent.
    pub fn order(self) -> u32 {
        match self {
            NodeKind::Fetch => 0,
            NodeKind::Entity => 10,
            NodeKind::AllAttributes => 15,
            NodeKind::Attribute => 20,
            NodeKind::Order => 30,
            NodeKind::Filter => 40,
            NodeKind::Condition => 50,
            NodeKind::Value => 60,
            NodeKind::LinkEntity => 70,
            NodeKind::Unknown => 100,
        }
    }

    /// Label used when a node has nothing displayable.
    pub fn default_name(self) -> &'static str {
        match self {
            NodeKind::Fetch => "Fetch",
            NodeKind::Entity => "Entity",
            NodeKind::AllAttributes => "All Attributes",
            NodeKind::Attribute => "Attribute",
            NodeKind::Order => "Order",
            NodeKind::Filter => "Filter",
            NodeKind::Condition => "Condition",
            NodeKind::Value => "Value",
            NodeKind::LinkEntity => "Link Entity",
            NodeKind::Unknown => "Unknown",
        }
    }

    /// Child added automatically when this kind is added interactively.
    pub fn mandatory_child(self) -> Option<NodeKind> {
        match self {
            NodeKind::Fetch => Some(NodeKind::Entity),
            NodeKind::Filter => Some(NodeKind::Condition),
            _ => None,
        }
    }

    /// Parent kinds this kind may be nested under.
    ///
    /// `None` means any parent is accepted; an empty slice means the kind is
    /// only valid as the document root.
    pub fn allowed_parents(self) -> Option<&'static [NodeKind]> {
        const ENTITY_LIKE: &[NodeKind] = &[NodeKind::Entity, NodeKind::LinkEntity];
        match self {
            NodeKind::Fetch => Some(&[]),
            NodeKind::Entity => Some(&[NodeKind::Fetch]),
            NodeKind::AllAttributes
            | NodeKind::Attribute
            | NodeKind::Order
            | NodeKind::LinkEntity => Some(ENTITY_LIKE),
            NodeKind::Filter => Some(&[NodeKind::Entity, NodeKind::LinkEntity, NodeKind::Filter]),
            NodeKind::Condition => Some(&[NodeKind::Filter]),
            NodeKind::Value => Some(&[NodeKind::Condition]),
            NodeKind::Unknown => None,
        }
    }

    pub fn accepts_parent(self, parent: NodeKind) -> bool {
        match self.allowed_parents() {
            None => true,
            Some(parents) => parents.contains(&parent),
        }
    }

    /// Whether this kind names a table (entity or link-entity).
    pub fn is_entity_like(self) -> bool {
        matches!(self, NodeKind::Entity | NodeKind::LinkEntity)
    }

    /// Whether the element carries inline text (`<value>text</value>`).
    pub fn accepts_content(self) -> bool {
        self.attribute(CONTENT_ATTRIBUTE).is_some()
    }

    /// Attribute table in serialization order.
    pub fn attributes(self) -> &'static [AttributeSpec] {
        attributes::table(self)
    }

    pub fn attribute(self, name: &str) -> Option<&'static AttributeSpec> {
        self.attributes().iter().find(|spec| spec.name == name)
    }

    /// Continuous rules the validation engine attaches to every node of this kind.
    pub fn rules(self) -> &'static [NodeRule] {
        attributes::rules(self)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Declared value kind of an attribute. Values are always strings in markup;
/// the kind is a convention enforced by validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "values")]
pub enum ValueKind {
    Text,
    Bool,
    Number,
    Choice(&'static [&'static str]),
}

impl ValueKind {
    /// Checks a non-empty value against this kind.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            ValueKind::Text => true,
            ValueKind::Bool => matches!(value, "true" | "false"),
            ValueKind::Number => value.parse::<i64>().is_ok(),
            ValueKind::Choice(values) => values.contains(&value),
        }
    }

    /// Short description used in validation messages.
    pub fn describe(self) -> String {
        match self {
            ValueKind::Text => "text".to_string(),
            ValueKind::Bool => "`true` or `false`".to_string(),
            ValueKind::Number => "an integer".to_string(),
            ValueKind::Choice(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("`{v}`")).collect();
                format!("one of {}", quoted.join(", "))
            }
        }
    }
}

/// Static description of one attribute of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeSpec {
    pub name: &'static str,
    /// Serialization priority within the element.
    pub order: u32,
    pub value_kind: ValueKind,
    /// Contributes to the node's display value.
    pub displayable: bool,
    /// Serialized as element text instead of `name="value"`.
    pub content: bool,
}

// ============================================================================
// Rules
// ============================================================================

/// Continuous semantic rule attached to every node of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRule {
    /// The attribute must have a non-empty value.
    RequireAttribute(&'static str),
    /// At least one of the attributes must have a non-empty value.
    RequireAnyOf(&'static [&'static str]),
    /// `alias` is mandatory once the attribute or the whole query aggregates.
    AliasWhenAggregated,
    /// The node must have at least one child.
    RequireChild,
}
