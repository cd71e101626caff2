use fetchkit_core::NodeKind;
use proptest::prelude::*;

use super::QueryNodeTree;
use crate::Error;
use crate::model::NodeId;

fn outline(tree: &QueryNodeTree) -> String {
    tree.iter()
        .map(|n| {
            let mark = if n.visible() { "" } else { " (hidden)" };
            format!("{}{}{}", "  ".repeat(n.level() as usize), n.tag_name(), mark)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn initialized() -> QueryNodeTree {
    let mut tree = QueryNodeTree::default();
    tree.initialize();
    tree
}

fn entity(tree: &QueryNodeTree) -> NodeId {
    tree.children(tree.root().unwrap())[0]
}

#[test]
fn initialize_builds_default_document() {
    let tree = initialized();
    insta::assert_snapshot!(outline(&tree), @r"
    fetch
      entity
    ");
    assert_eq!(tree.selection(), None);
    tree.verify().unwrap();
}

#[test]
fn initialize_discards_previous_tree() {
    let mut tree = initialized();
    let entity = entity(&tree);
    tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    tree.initialize();
    assert_eq!(tree.len(), 2);
    assert!(!tree.contains(NodeId::new(2)));
}

#[test]
fn add_node_requires_parent() {
    let mut tree = initialized();
    assert_eq!(
        tree.add_node(NodeKind::Attribute, None),
        Err(Error::MissingParent)
    );
    tree.verify().unwrap();
}

#[test]
fn add_node_uses_selection_and_selects_result() {
    let mut tree = initialized();
    let entity = entity(&tree);
    tree.select_node(Some(entity)).unwrap();
    let attr = tree.add_node(NodeKind::Attribute, None).unwrap();
    assert_eq!(tree.node(attr).unwrap().parent(), Some(entity));
    assert_eq!(tree.selection(), Some(attr));
}

#[test]
fn filter_gets_mandatory_condition_one_level_deeper() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let filter = tree.add_node(NodeKind::Filter, Some(entity)).unwrap();

    insta::assert_snapshot!(outline(&tree), @r"
    fetch
      entity
        filter
          condition
    ");
    let condition = tree.children(filter)[0];
    assert_eq!(tree.node(condition).unwrap().kind(), NodeKind::Condition);
    assert_eq!(tree.node(condition).unwrap().level(), 3);
    assert_eq!(tree.selection(), Some(filter));
    tree.verify().unwrap();
}

#[test]
fn siblings_are_placed_by_order_not_insertion_time() {
    let mut tree = initialized();
    let entity = entity(&tree);
    tree.add_node(NodeKind::LinkEntity, Some(entity)).unwrap();
    tree.add_node(NodeKind::Filter, Some(entity)).unwrap();
    tree.add_node(NodeKind::Order, Some(entity)).unwrap();
    tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();

    insta::assert_snapshot!(outline(&tree), @r"
    fetch
      entity
        attribute
        attribute
        order
        filter
          condition
        link-entity
    ");
    tree.verify().unwrap();
}

#[test]
fn equal_order_keeps_insertion_sequence() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let first = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    let second = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    assert_eq!(tree.children(entity), vec![first, second]);
}

#[test]
fn insertion_point_skips_descendants_of_earlier_siblings() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let filter = tree.add_node(NodeKind::Filter, Some(entity)).unwrap();
    let condition = tree.children(filter)[0];
    let link = tree.add_node(NodeKind::LinkEntity, Some(entity)).unwrap();

    assert_eq!(
        tree.find_insertion_point(entity, 2, NodeKind::LinkEntity.order()),
        link
    );
    assert_eq!(
        tree.find_insertion_point(entity, 2, NodeKind::Order.order()),
        entity
    );
    assert_eq!(tree.node(condition).unwrap().next(), Some(link));
}

#[test]
fn insertion_point_degrades_to_parent() {
    let tree = QueryNodeTree::default();
    let missing = NodeId::new(7);
    assert_eq!(tree.find_insertion_point(missing, 1, 10), missing);
}

#[test]
fn parsing_insert_makes_first_node_root() {
    let mut tree = QueryNodeTree::default();
    let root = tree
        .add_node_from_parsing(NodeKind::Fetch, "fetch", None)
        .unwrap();
    assert_eq!(tree.root(), Some(root));
    assert_eq!(
        tree.add_node_from_parsing(NodeKind::Entity, "entity", None),
        Err(Error::MissingParent)
    );
    let filter = tree
        .add_node_from_parsing(NodeKind::Filter, "filter", Some(root))
        .unwrap();
    assert!(tree.children(filter).is_empty());
}

#[test]
fn remove_root_is_rejected() {
    let mut tree = initialized();
    let root = tree.root().unwrap();
    assert_eq!(tree.remove_node(root), Err(Error::RemoveRoot));
    assert_eq!(tree.len(), 2);
}

#[test]
fn remove_node_excises_descendant_run() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let attribute = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    let outer = tree.add_node(NodeKind::Filter, Some(entity)).unwrap();
    tree.add_node(NodeKind::Filter, Some(outer)).unwrap();
    let link = tree.add_node(NodeKind::LinkEntity, Some(entity)).unwrap();

    let mut doomed = tree.descendants(outer);
    doomed.push(outer);
    assert_eq!(doomed.len(), 4);
    let expected: Vec<NodeId> = tree
        .ids()
        .into_iter()
        .filter(|id| !doomed.contains(id))
        .collect();

    tree.remove_node(outer).unwrap();

    assert_eq!(tree.ids(), expected);
    assert_eq!(tree.node(attribute).unwrap().next(), Some(link));
    assert_eq!(tree.selection(), Some(attribute));
    assert_eq!(tree.len(), 4);
    assert!(doomed.iter().all(|id| !tree.contains(*id)));
    tree.verify().unwrap();
}

#[test]
fn remove_only_child_clears_expandable() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let attribute = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    assert!(tree.node(entity).unwrap().expandable());

    tree.remove_node(attribute).unwrap();
    let node = tree.node(entity).unwrap();
    assert!(!node.expandable());
    assert_eq!(node.child_count(), 0);
    assert_eq!(tree.selection(), Some(entity));
    tree.verify().unwrap();
}

#[test]
fn removed_node_is_unknown_afterwards() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let attribute = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    tree.remove_node(attribute).unwrap();
    assert_eq!(
        tree.remove_node(attribute),
        Err(Error::UnknownNode(attribute))
    );
}

#[test]
fn toggle_hides_descendant_run_only() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let filter = tree.add_node(NodeKind::Filter, Some(entity)).unwrap();
    tree.add_node(NodeKind::LinkEntity, Some(entity)).unwrap();

    tree.toggle_node(filter).unwrap();
    insta::assert_snapshot!(outline(&tree), @r"
    fetch
      entity
        filter
          condition (hidden)
        link-entity
    ");
    tree.verify().unwrap();
}

#[test]
fn toggle_leaf_is_noop() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let attribute = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    tree.toggle_node(attribute).unwrap();
    assert!(tree.node(attribute).unwrap().is_expanded());
}

#[test]
fn toggle_clears_hidden_selection() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let attribute = tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    assert_eq!(tree.selection(), Some(attribute));

    tree.toggle_node(entity).unwrap();
    assert_eq!(tree.selection(), None);
}

#[test]
fn nested_collapse_survives_outer_toggle() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let filter = tree.add_node(NodeKind::Filter, Some(entity)).unwrap();
    let condition = tree.children(filter)[0];

    tree.toggle_node(filter).unwrap();
    tree.toggle_node(entity).unwrap();
    tree.toggle_node(entity).unwrap();

    assert!(tree.node(filter).unwrap().visible());
    assert!(!tree.node(condition).unwrap().visible());
    tree.verify().unwrap();
}

#[test]
fn add_under_collapsed_parent_expands_it() {
    let mut tree = initialized();
    let entity = entity(&tree);
    tree.add_node(NodeKind::Attribute, Some(entity)).unwrap();
    tree.toggle_node(entity).unwrap();

    let order = tree.add_node(NodeKind::Order, Some(entity)).unwrap();
    assert!(tree.node(entity).unwrap().is_expanded());
    assert!(tree.node(order).unwrap().visible());
    tree.verify().unwrap();
}

#[test]
fn iteration_is_live_and_restartable() {
    let mut tree = initialized();
    let first: Vec<NodeId> = tree.iter().map(|n| n.id()).collect();
    assert_eq!(first, tree.ids());

    let entity = entity(&tree);
    tree.add_node(NodeKind::Order, Some(entity)).unwrap();
    assert_eq!(tree.iter().count(), first.len() + 1);
}

#[test]
fn revision_bumps_on_attribute_changes() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let before = tree.revision();
    tree.set_attribute(entity, "name", "account").unwrap();
    let created = tree.revision();
    assert!(created > before);

    tree.set_attribute(entity, "name", "contact").unwrap();
    assert!(tree.revision() > created);

    let settled = tree.revision();
    tree.set_attribute(entity, "name", "contact").unwrap();
    assert_eq!(tree.revision(), settled);
}

#[test]
fn removed_attribute_resets_watchers() {
    let mut tree = initialized();
    let entity = entity(&tree);
    tree.set_attribute(entity, "name", "account").unwrap();
    assert!(tree.node(entity).unwrap().validation().passed());

    assert!(tree.remove_attribute(entity, "name").unwrap());
    assert!(!tree.remove_attribute(entity, "name").unwrap());
    let node = tree.node(entity).unwrap();
    assert_eq!(node.validation().messages(), vec!["`name` is required"]);
    assert_eq!(node.display_value(), "Entity");
}

#[test]
fn attributes_are_kept_in_declared_order() {
    let mut tree = initialized();
    let entity = entity(&tree);
    let link = tree.add_node(NodeKind::LinkEntity, Some(entity)).unwrap();
    tree.set_attribute(link, "to", "accountid").unwrap();
    tree.set_attribute(link, "colour", "blue").unwrap();
    tree.set_attribute(link, "name", "contact").unwrap();
    tree.set_attribute(link, "from", "parentcustomerid").unwrap();

    let names: Vec<String> = tree
        .node(link)
        .unwrap()
        .attributes()
        .map(|a| a.editor_name().to_string())
        .collect();
    assert_eq!(names, vec!["name", "from", "to", "colour"]);
}

// ── Property tests ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add(usize, NodeKind),
    Remove(usize),
    Toggle(usize),
}

fn kind() -> impl Strategy<Value = NodeKind> {
    prop::sample::select(vec![
        NodeKind::AllAttributes,
        NodeKind::Attribute,
        NodeKind::Order,
        NodeKind::Filter,
        NodeKind::Condition,
        NodeKind::Value,
        NodeKind::LinkEntity,
    ])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), kind()).prop_map(|(i, k)| Op::Add(i, k)),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::Toggle),
    ]
}

fn pick(tree: &QueryNodeTree, index: usize) -> NodeId {
    let ids = tree.ids();
    ids[index % ids.len()]
}

fn visibility(tree: &QueryNodeTree) -> Vec<(NodeId, bool)> {
    tree.iter().map(|n| (n.id(), n.visible())).collect()
}

proptest! {
    #[test]
    fn mutations_preserve_invariants(ops in prop::collection::vec(op(), 0..40)) {
        let mut tree = QueryNodeTree::default();
        tree.initialize();

        for op in ops {
            match op {
                Op::Add(i, kind) => {
                    let parent = pick(&tree, i);
                    tree.add_node(kind, Some(parent)).unwrap();
                }
                Op::Remove(i) => {
                    let node = pick(&tree, i);
                    let result = tree.remove_node(node);
                    if Some(node) == tree.root() {
                        prop_assert_eq!(result, Err(Error::RemoveRoot));
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                Op::Toggle(i) => {
                    let node = pick(&tree, i);
                    tree.toggle_node(node).unwrap();
                }
            }
            if let Err(violation) = tree.verify() {
                prop_assert!(false, "{}\n{}", violation, outline(&tree));
            }
        }
    }

    #[test]
    fn double_toggle_restores_visibility(
        ops in prop::collection::vec(op(), 0..30),
        target in any::<usize>(),
    ) {
        let mut tree = QueryNodeTree::default();
        tree.initialize();
        for op in ops {
            match op {
                Op::Add(i, kind) => {
                    let parent = pick(&tree, i);
                    tree.add_node(kind, Some(parent)).unwrap();
                }
                Op::Toggle(i) => {
                    let node = pick(&tree, i);
                    tree.toggle_node(node).unwrap();
                }
                Op::Remove(_) => {}
            }
        }

        let node = pick(&tree, target);
        let before = visibility(&tree);
        tree.toggle_node(node).unwrap();
        tree.toggle_node(node).unwrap();
        prop_assert_eq!(visibility(&tree), before);
    }
}
