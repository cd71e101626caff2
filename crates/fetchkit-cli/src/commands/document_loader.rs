use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use fetchkit_lib::EngineConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("document is required: use a FILE argument, `-` for stdin, or -t/--text")]
    MissingDocument,

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config '{}': {source}", path.display())]
    ConfigSyntax {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        source: fetchkit_lib::Error,
    },
}

/// Markup to operate on, with the name diagnostics refer to it by.
pub struct Document {
    pub name: String,
    pub text: String,
}

pub fn load_document(path: Option<&Path>, text: Option<&str>) -> Result<Document, LoadError> {
    if let Some(text) = text {
        return Ok(Document {
            name: "<text>".to_string(),
            text: text.to_string(),
        });
    }

    match path {
        Some(path) if path.as_os_str() == "-" => load_stdin(),
        Some(path) => Ok(Document {
            name: path.to_string_lossy().into_owned(),
            text: read(path)?,
        }),
        None => Err(LoadError::MissingDocument),
    }
}

/// Reads an [`EngineConfig`] from JSON. Missing fields keep their defaults;
/// no file means the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, LoadError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let content = read(path)?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|source| LoadError::ConfigSyntax {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate().map_err(|source| LoadError::Config {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}

fn load_stdin() -> Result<Document, LoadError> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(LoadError::Stdin)?;
    Ok(Document {
        name: "<stdin>".to_string(),
        text: buf,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fetchkit-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn inline_text_wins_over_path() {
        let document = load_document(Some(Path::new("missing.xml")), Some("<fetch />")).unwrap();
        assert_eq!(document.name, "<text>");
        assert_eq!(document.text, "<fetch />");
    }

    #[test]
    fn document_is_required() {
        let err = load_document(None, None).err().unwrap();
        assert_eq!(
            err.to_string(),
            "document is required: use a FILE argument, `-` for stdin, or -t/--text"
        );
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = load_document(Some(Path::new("/nonexistent/query.xml")), None)
            .err()
            .unwrap();
        assert!(
            err.to_string()
                .starts_with("failed to read '/nonexistent/query.xml'")
        );
    }

    #[test]
    fn file_is_read_with_its_name() {
        let path = scratch_file("query.xml", "<fetch />");
        let document = load_document(Some(&path), None).unwrap();
        assert_eq!(document.text, "<fetch />");
        assert_eq!(document.name, path.to_string_lossy());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn no_config_means_defaults() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let path = scratch_file("partial.json", r#"{ "indent_width": 4 }"#);
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config, EngineConfig::default().with_indent_width(4));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let path = scratch_file("broken.json", r#"{ "indent_width": "wide" }"#);
        assert!(matches!(
            load_config(Some(&path)),
            Err(LoadError::ConfigSyntax { .. })
        ));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn out_of_range_config_is_rejected() {
        let path = scratch_file("zero-fuel.json", r#"{ "recursion_fuel": 0 }"#);
        let err = load_config(Some(&path)).err().unwrap();
        assert!(
            err.to_string()
                .ends_with("invalid configuration: recursion_fuel must be at least 1"),
            "{err}"
        );
        fs::remove_file(path).unwrap();
    }
}
