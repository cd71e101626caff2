use std::path::PathBuf;

use fetchkit_lib::{Diagnostics, EngineConfig, MemoryEditor, Session, SystemClock};

use super::document_loader::load_document;

pub struct FmtArgs {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub color: bool,
}

pub fn run(args: FmtArgs, config: &EngineConfig) {
    let document = match load_document(args.document_path.as_deref(), args.document_text.as_deref())
    {
        Ok(document) => document,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    match format_document(&document.text, config) {
        Ok(text) => println!("{}", text),
        Err(diagnostics) => {
            eprint!(
                "{}",
                diagnostics
                    .printer()
                    .source(&document.text)
                    .path(&document.name)
                    .colored(args.color)
                    .render()
            );
            std::process::exit(1);
        }
    }
}

/// Canonical markup for `text`.
///
/// Markup errors are returned instead: rendering a tree built from broken
/// markup would silently drop whatever the parser skipped. Warnings and
/// failing validations do not block formatting.
pub fn format_document(text: &str, config: &EngineConfig) -> Result<String, Diagnostics> {
    let mut session = Session::new(MemoryEditor::new(text), config.clone(), SystemClock);
    let parsed = session.reparse();
    if parsed.has_errors() {
        return Err(parsed.clone());
    }
    Ok(session.render_now().text)
}
