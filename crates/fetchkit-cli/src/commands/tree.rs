use std::fmt::Write;
use std::path::PathBuf;

use fetchkit_lib::{EngineConfig, MemoryEditor, QueryNodeTree, Session, SystemClock};

use super::document_loader::load_document;

pub struct TreeArgs {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub spans: bool,
    pub color: bool,
}

pub fn run(args: TreeArgs, config: &EngineConfig) {
    let document = match load_document(args.document_path.as_deref(), args.document_text.as_deref())
    {
        Ok(document) => document,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let mut session = Session::new(
        MemoryEditor::new(document.text.as_str()),
        config.clone(),
        SystemClock,
    );
    let parsed = session.reparse();
    if !parsed.is_empty() {
        eprint!(
            "{}",
            parsed
                .printer()
                .source(&document.text)
                .path(&document.name)
                .colored(args.color)
                .render()
        );
    }

    print!("{}", dump_tree(session.tree(), args.spans));
}

/// One line per node, indented by level, followed by its failing checks.
///
/// ```text
/// fetch
///   entity name="account"
///     attribute
///       ! `name` is required
/// ```
pub fn dump_tree(tree: &QueryNodeTree, spans: bool) -> String {
    let mut out = String::new();
    for node in tree.iter() {
        let indent = "  ".repeat(node.level() as usize);
        out.push_str(&indent);
        out.push_str(node.tag_name());

        let display = node.display_value();
        if display != node.kind().default_name() {
            out.push(' ');
            out.push_str(&display);
        }
        if spans {
            if let Some(span) = node.source_span() {
                let _ = write!(out, " @{:?}", span);
            }
        }
        out.push('\n');

        for issue in node.validation().issues() {
            let _ = writeln!(out, "{indent}  ! {}", issue.message);
        }
    }
    out
}
