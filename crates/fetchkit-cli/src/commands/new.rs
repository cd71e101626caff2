use fetchkit_lib::{EngineConfig, MemoryEditor, Session, SystemClock};

pub fn run(config: &EngineConfig) {
    println!("{}", default_document(config));
}

/// Markup of a freshly initialized tree.
pub fn default_document(config: &EngineConfig) -> String {
    let mut session = Session::new(MemoryEditor::default(), config.clone(), SystemClock);
    session.initialize();
    session.render_now().text
}
