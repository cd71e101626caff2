use crate::{CONTENT_ATTRIBUTE, NodeKind, NodeRule, ValueKind};

#[test]
fn tag_names_round_trip() {
    for &kind in NodeKind::KNOWN {
        let tag = kind.tag_name().expect("known kinds have tags");
        assert_eq!(NodeKind::from_tag(tag), kind);
    }
    assert_eq!(NodeKind::from_tag("bogus"), NodeKind::Unknown);
    assert_eq!(NodeKind::Unknown.tag_name(), None);
}

#[test]
fn known_kinds_are_listed_in_sibling_order() {
    let orders: Vec<u32> = NodeKind::KNOWN.iter().map(|k| k.order()).collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted);
    assert!(NodeKind::Unknown.order() > NodeKind::LinkEntity.order());
}

#[test]
fn attribute_tables_are_sorted_and_unique() {
    for &kind in NodeKind::KNOWN {
        let table = kind.attributes();
        for pair in table.windows(2) {
            assert!(pair[0].order < pair[1].order, "{kind:?} table out of order");
        }
        for (i, spec) in table.iter().enumerate() {
            assert!(
                table[i + 1..].iter().all(|other| other.name != spec.name),
                "{kind:?} declares `{}` twice",
                spec.name
            );
        }
    }
}

#[test]
fn rules_reference_declared_attributes() {
    for &kind in NodeKind::KNOWN {
        for rule in kind.rules() {
            let names: &[&str] = match rule {
                NodeRule::RequireAttribute(name) => std::slice::from_ref(name),
                NodeRule::RequireAnyOf(names) => *names,
                NodeRule::AliasWhenAggregated => &["alias", "aggregate"],
                NodeRule::RequireChild => &[],
            };
            for name in names {
                assert!(kind.attribute(name).is_some(), "{kind:?} rule uses `{name}`");
            }
        }
    }
}

#[test]
fn parents_and_mandatory_children_agree() {
    for &kind in NodeKind::KNOWN {
        if let Some(child) = kind.mandatory_child() {
            assert!(child.accepts_parent(kind), "{child:?} cannot live under {kind:?}");
        }
    }
    assert!(NodeKind::Unknown.accepts_parent(NodeKind::Value));
    assert!(!NodeKind::Condition.accepts_parent(NodeKind::Entity));
    assert_eq!(NodeKind::Fetch.allowed_parents(), Some(&[][..]));
}

#[test]
fn only_value_carries_content() {
    for &kind in NodeKind::KNOWN {
        assert_eq!(kind.accepts_content(), kind == NodeKind::Value);
    }
    let spec = NodeKind::Value.attribute(CONTENT_ATTRIBUTE).unwrap();
    assert!(spec.content && spec.displayable);
}

#[test]
fn value_kinds_accept_values() {
    assert!(ValueKind::Bool.accepts("true"));
    assert!(!ValueKind::Bool.accepts("yes"));
    assert!(ValueKind::Number.accepts("-50"));
    assert!(!ValueKind::Number.accepts("5.5"));
    assert!(ValueKind::Choice(&["and", "or"]).accepts("or"));
    assert!(!ValueKind::Choice(&["and", "or"]).accepts("xor"));
    assert!(ValueKind::Text.accepts("anything"));
    assert_eq!(
        ValueKind::Choice(&["and", "or"]).describe(),
        "one of `and`, `or`"
    );
}

#[test]
fn vocabulary_serializes() {
    let json = serde_json::to_value(NodeKind::Filter.attributes()).unwrap();
    assert_eq!(json[0]["name"], "type");
    assert_eq!(json[0]["value_kind"]["kind"], "choice");
    assert_eq!(json[0]["value_kind"]["values"][1], "or");
    assert_eq!(serde_json::to_value(NodeKind::LinkEntity).unwrap(), "link-entity");
}
