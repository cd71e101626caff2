//! Node and attribute factories.
//!
//! The vocabulary in `fetchkit_core` is plain data; this module turns a
//! `(kind, attribute name)` pair into a live [`NodeAttribute`] and a kind into
//! a fully wired [`QueryNode`] with its validators and derived streams.

use std::rc::Rc;

use fetchkit_core::{AttributeSpec, NodeKind, UNKNOWN_ATTRIBUTE_ORDER, ValueKind};
use indexmap::IndexMap;

use crate::diagnostics::DiagnosticKind;
use crate::model::{AttributeSlots, NodeAttribute, NodeId, QueryNode};
use crate::reactive::{Observable, Subscriptions};
use crate::validation::{
    self, SchemaValidator, StructuralIssue, ValidationResult, rule_validator, schema_validator,
    unknown_name_validator, value_kind_validator,
};

/// Produces attributes for one node kind.
#[derive(Debug, Clone, Copy)]
pub struct AttributeFactory {
    kind: NodeKind,
}

impl AttributeFactory {
    pub fn for_kind(kind: NodeKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn spec(&self, name: &str) -> Option<&'static AttributeSpec> {
        self.kind.attribute(name)
    }

    /// Builds an attribute bound to `slot` and stores `value` in it.
    ///
    /// Names outside the vocabulary still produce a usable attribute, flagged
    /// with `is_valid_name = false` and a permanent validation issue. With
    /// `parser_validation` the one-shot name check is also reported as a
    /// structural issue.
    pub fn create_attribute(
        &self,
        name: &str,
        value: &str,
        slot: Observable<String>,
        parser_validation: bool,
    ) -> (NodeAttribute, Vec<StructuralIssue>) {
        let mut issues = Vec::new();
        slot.set(value.to_string());

        let attribute = match self.spec(name) {
            Some(spec) => {
                let mut attribute = NodeAttribute::new(name, spec.order, spec.value_kind, slot);
                if spec.content {
                    attribute = attribute.into_content();
                }
                attribute.displayable = spec.displayable;
                attribute.validators.extend(value_kind_validator(
                    name,
                    spec.value_kind,
                    &attribute.value,
                ));
                attribute
            }
            None => {
                if parser_validation {
                    issues.push(StructuralIssue::new(DiagnosticKind::UnknownAttribute, name));
                }
                let mut attribute =
                    NodeAttribute::new(name, UNKNOWN_ATTRIBUTE_ORDER, ValueKind::Text, slot);
                attribute.is_valid_name = false;
                attribute
                    .validators
                    .push(unknown_name_validator(name, self.kind));
                attribute
            }
        };
        (attribute, issues)
    }
}

/// Where a new node sits and what it can watch outside itself.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub level: u32,
    pub parent: Option<NodeId>,
    /// Attribute slots of the document root; `None` when the node is the root.
    pub root_slots: Option<AttributeSlots>,
    /// Attribute slots of the nearest enclosing entity or link-entity.
    pub entity_slots: Option<AttributeSlots>,
    /// Tree revision counter bumped on every attribute change.
    pub revision: Observable<u64>,
}

/// Produces fully wired nodes.
#[derive(Clone, Default)]
pub struct NodeFactory {
    schema: Option<Rc<dyn SchemaValidator>>,
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFactory")
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: Rc<dyn SchemaValidator>) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    pub fn attribute_factory(&self, kind: NodeKind) -> AttributeFactory {
        AttributeFactory::for_kind(kind)
    }

    pub fn create_node(
        &self,
        id: NodeId,
        kind: NodeKind,
        tag_name: &str,
        ctx: NodeContext,
    ) -> QueryNode {
        let slots = AttributeSlots::new();
        let root_slots = ctx.root_slots.unwrap_or_else(|| slots.clone());
        let child_count = Observable::new(0usize);

        let mut validators: Vec<_> = kind
            .rules()
            .iter()
            .map(|&rule| rule_validator(rule, kind, &slots, &root_slots, &child_count))
            .collect();
        if let Some(schema) = &self.schema {
            let entity = if kind.is_entity_like() {
                None
            } else {
                ctx.entity_slots.as_ref()
            };
            validators.extend(schema_validator(kind, &slots, entity, Rc::clone(schema)));
        }

        let mut node = QueryNode {
            id,
            kind,
            tag_name: tag_name.to_string(),
            order: kind.order(),
            level: ctx.level,
            expandable: false,
            is_expanded: true,
            visible: true,
            parent: ctx.parent,
            next: None,
            attributes: IndexMap::new(),
            slots,
            child_count,
            display_value: Observable::new(kind.default_name().to_string()),
            markup_attributes: Observable::new(String::new()),
            validation: Observable::new(ValidationResult::default()),
            validators,
            source_span: None,
            revision: ctx.revision,
            wiring: Subscriptions::new(),
        };
        node.rewire();
        node
    }

    /// One-shot checks for a node built from markup.
    pub fn check_parsed(
        &self,
        kind: NodeKind,
        tag_name: &str,
        parent: Option<NodeKind>,
    ) -> Vec<StructuralIssue> {
        validation::check_parsed_node(kind, tag_name, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> NodeContext {
        NodeContext {
            level: 1,
            parent: None,
            root_slots: None,
            entity_slots: None,
            revision: Observable::new(0),
        }
    }

    #[test]
    fn known_attribute_takes_spec_order_and_kind() {
        let factory = AttributeFactory::for_kind(NodeKind::Fetch);
        let (attr, issues) =
            factory.create_attribute("top", "50", Observable::new(String::new()), true);
        assert!(issues.is_empty());
        assert_eq!(attr.order(), 4);
        assert_eq!(attr.value_kind(), ValueKind::Number);
        assert!(attr.is_valid_name());
        assert_eq!(attr.display_value(), r#"top="50""#);
    }

    #[test]
    fn unknown_attribute_is_kept_but_flagged() {
        let factory = AttributeFactory::for_kind(NodeKind::Entity);
        let slot = Observable::new(String::new());
        let (attr, issues) = factory.create_attribute("colour", "red", slot.clone(), true);

        assert_eq!(
            issues,
            vec![StructuralIssue::new(DiagnosticKind::UnknownAttribute, "colour")]
        );
        assert!(!attr.is_valid_name());
        assert_eq!(attr.order(), UNKNOWN_ATTRIBUTE_ORDER);
        assert_eq!(slot.get(), "red");
        assert_eq!(attr.issues()[0].kind, DiagnosticKind::UnknownAttribute);
    }

    #[test]
    fn unknown_attribute_outside_parser_has_no_structural_issue() {
        let factory = AttributeFactory::for_kind(NodeKind::Entity);
        let (attr, issues) =
            factory.create_attribute("colour", "red", Observable::new(String::new()), false);
        assert!(issues.is_empty());
        assert!(!attr.is_valid_name());
    }

    #[test]
    fn content_attribute_displays_bare_text() {
        let factory = AttributeFactory::for_kind(NodeKind::Value);
        let (attr, _) =
            factory.create_attribute("#text", "a & b", Observable::new(String::new()), true);
        assert!(attr.is_content());
        assert_eq!(attr.display_value(), "a &amp; b");
    }

    #[test]
    fn value_kind_is_watched() {
        let factory = AttributeFactory::for_kind(NodeKind::Filter);
        let (attr, _) =
            factory.create_attribute("type", "and", Observable::new(String::new()), false);
        assert!(attr.issues().is_empty());
        attr.set_value("xor");
        assert_eq!(attr.issues()[0].kind, DiagnosticKind::InvalidValue);
        attr.set_value("");
        assert!(attr.issues().is_empty());
    }

    #[test]
    fn node_display_falls_back_to_default_name() {
        let factory = NodeFactory::new();
        let mut node = factory.create_node(NodeId::new(0), NodeKind::Entity, "entity", context());
        assert_eq!(node.display_value(), "Entity");

        let (attr, _) = factory.attribute_factory(NodeKind::Entity).create_attribute(
            "name",
            "account",
            node.slots().slot("name"),
            false,
        );
        node.insert_attribute(attr);
        assert_eq!(node.display_value(), r#"name="account""#);

        node.attribute("name").unwrap().set_value("");
        assert_eq!(node.display_value(), "Entity");
    }

    #[test]
    fn node_rules_are_attached() {
        let factory = NodeFactory::new();
        let node = factory.create_node(NodeId::new(0), NodeKind::Condition, "condition", context());
        let result = node.validation();
        assert!(!result.passed());
        assert_eq!(
            result.messages(),
            vec!["`attribute` is required", "`operator` is required"]
        );
    }

    #[test]
    fn parsed_node_checks() {
        let factory = NodeFactory::new();
        assert!(
            factory
                .check_parsed(NodeKind::Entity, "entity", Some(NodeKind::Fetch))
                .is_empty()
        );
        assert_eq!(
            factory.check_parsed(NodeKind::Unknown, "bogus", Some(NodeKind::Fetch))[0].kind,
            DiagnosticKind::UnknownTag
        );
        assert_eq!(
            factory.check_parsed(NodeKind::Condition, "condition", Some(NodeKind::Entity))[0],
            StructuralIssue::new(
                DiagnosticKind::InvalidParent,
                "<condition>` inside `<entity>"
            )
        );
    }
}
