//! Command builders for the CLI.
//!
//! Each command is built using the shared arg builders from `args.rs`.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("fetchkit")
        .about("Check, format and inspect FetchXML query markup")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(config_arg())
        .arg(verbose_arg())
        .subcommand(check_command())
        .subcommand(fmt_command())
        .subcommand(tree_command())
        .subcommand(new_command())
        .subcommand(schema_command())
}

/// Report parser and validation diagnostics.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Report markup and validation problems")
        .override_usage(
            "\
  fetchkit check <FILE>
  fetchkit check -t <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  fetchkit check query.xml            # diagnostics, exit 1 on errors
  fetchkit check query.xml --strict   # warnings fail too
  fetchkit check query.xml --compact  # one line per diagnostic
  cat query.xml | fetchkit check -    # read stdin
  fetchkit check -t '<fetch />'       # inline markup"#,
        )
        .arg(document_path_arg())
        .arg(document_text_arg())
        .arg(strict_arg())
        .arg(compact_arg())
        .arg(color_arg())
}

/// Print canonical markup.
pub fn fmt_command() -> Command {
    Command::new("fmt")
        .about("Print the canonical rendering of a document")
        .after_help(
            r#"EXAMPLES:
  fetchkit fmt query.xml
  fetchkit fmt -t '<fetch><entity name="account"/></fetch>'
  fetchkit fmt query.xml --config fetchkit.json   # custom indent width"#,
        )
        .arg(document_path_arg())
        .arg(document_text_arg())
        .arg(color_arg())
}

/// Print the node tree.
pub fn tree_command() -> Command {
    Command::new("tree")
        .about("Show the node tree built from a document")
        .after_help(
            r#"EXAMPLES:
  fetchkit tree query.xml
  fetchkit tree query.xml --spans     # tag name positions"#,
        )
        .arg(document_path_arg())
        .arg(document_text_arg())
        .arg(spans_arg())
        .arg(color_arg())
}

/// Print the default document.
pub fn new_command() -> Command {
    Command::new("new").about("Print the default document")
}

/// Print the markup vocabulary.
pub fn schema_command() -> Command {
    Command::new("schema")
        .about("List elements, attributes and value kinds")
        .arg(json_arg())
}
