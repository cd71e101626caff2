//! Tests for CLI dispatch logic: argument parsing and params extraction.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{build_cli, check_command, fmt_command, schema_command, tree_command};

#[test]
fn check_extracts_document_and_flags() {
    let m = check_command()
        .try_get_matches_from(["check", "query.xml", "--strict", "--color", "never"])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert_eq!(params.document_path, Some(PathBuf::from("query.xml")));
    assert_eq!(params.document_text, None);
    assert!(params.strict);
    assert!(!params.compact);
    assert_eq!(params.color, ColorChoice::Never);
}

#[test]
fn check_accepts_inline_text() {
    let m = check_command()
        .try_get_matches_from(["check", "-t", "<fetch />"])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert_eq!(params.document_path, None);
    assert_eq!(params.document_text.as_deref(), Some("<fetch />"));
    assert!(!params.strict);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn check_compact_flag() {
    let m = check_command()
        .try_get_matches_from(["check", "query.xml", "--compact"])
        .unwrap();
    assert!(CheckParams::from_matches(&m).compact);
}

#[test]
fn file_and_inline_text_conflict() {
    let result = fmt_command().try_get_matches_from(["fmt", "query.xml", "-t", "<fetch />"]);
    assert!(result.is_err());
}

#[test]
fn stdin_dash_is_a_path() {
    let m = fmt_command().try_get_matches_from(["fmt", "-"]).unwrap();
    let params = FmtParams::from_matches(&m);
    assert_eq!(params.document_path, Some(PathBuf::from("-")));
}

#[test]
fn tree_spans_flag() {
    let m = tree_command()
        .try_get_matches_from(["tree", "query.xml", "--spans"])
        .unwrap();
    let params = TreeParams::from_matches(&m);
    assert!(params.spans);
    assert_eq!(params.document_path, Some(PathBuf::from("query.xml")));
}

#[test]
fn schema_json_flag() {
    let m = schema_command()
        .try_get_matches_from(["schema", "--json"])
        .unwrap();
    assert!(SchemaParams::from_matches(&m).json);

    let m = schema_command().try_get_matches_from(["schema"]).unwrap();
    assert!(!SchemaParams::from_matches(&m).json);
}

#[test]
fn invalid_color_is_rejected() {
    let result = check_command().try_get_matches_from(["check", "q.xml", "--color", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn global_flags_reach_subcommands() {
    let m = build_cli()
        .try_get_matches_from(["fetchkit", "--config", "engine.json", "fmt", "q.xml", "-vv"])
        .unwrap();
    let (name, sub) = m.subcommand().unwrap();
    assert_eq!(name, "fmt");

    let global = GlobalParams::from_matches(sub);
    assert_eq!(global.config, Some(PathBuf::from("engine.json")));
    assert_eq!(global.verbose, 2);
}

#[test]
fn global_flags_default_off() {
    let m = build_cli().try_get_matches_from(["fetchkit", "new"]).unwrap();
    let (_, sub) = m.subcommand().unwrap();

    let global = GlobalParams::from_matches(sub);
    assert_eq!(global.config, None);
    assert_eq!(global.verbose, 0);
}

#[test]
fn subcommand_is_required() {
    assert!(build_cli().try_get_matches_from(["fetchkit"]).is_err());
}

#[test]
fn help_lists_every_command() {
    let help = build_cli().render_help().to_string();
    for name in ["check", "fmt", "tree", "new", "schema"] {
        assert!(help.contains(name), "missing {name} in help:\n{help}");
    }
}
