use fetchkit_lib::{EngineConfig, MemoryEditor, Session, SystemClock};

use super::tree::dump_tree;

fn dump(text: &str, spans: bool) -> String {
    let mut session = Session::new(MemoryEditor::new(text), EngineConfig::default(), SystemClock);
    session.reparse();
    dump_tree(session.tree(), spans)
}

#[test]
fn nodes_are_indented_by_level() {
    let text = r#"<fetch><entity name="account"><attribute /></entity></fetch>"#;
    insta::assert_snapshot!(dump(text, false), @r#"
    fetch
      entity name="account"
        attribute
          ! `name` is required
    "#);
}

#[test]
fn spans_point_at_tag_names() {
    let text = r#"<fetch><entity name="account"><attribute /></entity></fetch>"#;
    insta::assert_snapshot!(dump(text, true), @r#"
    fetch @1..6
      entity name="account" @8..14
        attribute @31..40
          ! `name` is required
    "#);
}

#[test]
fn empty_document_shows_default_tree() {
    insta::assert_snapshot!(dump("", false), @r"
    fetch
      entity
        ! `name` is required
    ");
}
