use std::path::PathBuf;

use fetchkit_lib::{Diagnostics, EngineConfig, MemoryEditor, Session, SystemClock};

use super::document_loader::load_document;

pub struct CheckArgs {
    pub document_path: Option<PathBuf>,
    pub document_text: Option<String>,
    pub strict: bool,
    pub compact: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs, config: &EngineConfig) {
    let document = match load_document(args.document_path.as_deref(), args.document_text.as_deref())
    {
        Ok(document) => document,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let diagnostics = check_document(&document.text, config);
    if !diagnostics.is_empty() {
        eprint!(
            "{}",
            diagnostics
                .printer()
                .source(&document.text)
                .path(&document.name)
                .compact(args.compact)
                .colored(args.color)
                .render()
        );
    }

    if !is_valid(&diagnostics, args.strict) {
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}

/// Parser diagnostics plus failing validations, as an editor would show them.
pub fn check_document(text: &str, config: &EngineConfig) -> Diagnostics {
    let mut session = Session::new(MemoryEditor::new(text), config.clone(), SystemClock);
    session.reparse();
    session.diagnostics()
}

pub fn is_valid(diagnostics: &Diagnostics, strict: bool) -> bool {
    !diagnostics.has_errors() && !(strict && diagnostics.has_warnings())
}
