use rowan::TextRange;
use serde::Serialize;

/// What went wrong, with declaration order doubling as priority (first wins).
///
/// When two diagnostics land close to each other, the higher-priority one
/// wins and the other is suppressed (see [`super::Diagnostics::deduplicated`]).
///
/// Priority rationale:
/// - Token-level garbage makes everything after it suspect
/// - Broken nesting shifts every following element to the wrong parent
/// - Vocabulary errors are local to one element
/// - Semantic issues assume the element itself is well-formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    // Reported by the editor's tokenizer
    SyntaxError,

    // Nesting structure
    UnclosedTag,
    UnexpectedCloseTag,
    MultipleRoots,
    NestingTooDeep,

    // Vocabulary (one-shot, parse time only)
    UnknownTag,
    InvalidParent,
    UnknownAttribute,
    DuplicateAttribute,
    MissingAttributeValue,
    UnexpectedText,

    // Semantic (continuous)
    MissingAttribute,
    AliasRequired,
    InvalidValue,
    MissingChild,
    SchemaMismatch,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::DuplicateAttribute | Self::UnexpectedText => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind wins over `other` when both are reported close together.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// Structural kinds come from the parser; the rest from validators.
    pub fn is_structural(&self) -> bool {
        *self < Self::MissingAttribute
    }

    pub fn default_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnclosedTag => Some("close the element with `</tag>` or use `/>`"),
            Self::MultipleRoots => Some("a document has exactly one `<fetch>` element"),
            Self::AliasRequired => Some("aggregated columns must be named with `alias`"),
            Self::MissingChild => Some("add a `<condition>` to the filter"),
            _ => None,
        }
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax error",

            Self::UnclosedTag => "element is never closed",
            Self::UnexpectedCloseTag => "closing tag has no matching element",
            Self::MultipleRoots => "document already has a root element",
            Self::NestingTooDeep => "elements are nested too deeply",

            Self::UnknownTag => "unknown element",
            Self::InvalidParent => "element is not allowed here",
            Self::UnknownAttribute => "unknown attribute",
            Self::DuplicateAttribute => "duplicate attribute",
            Self::MissingAttributeValue => "attribute has no value",
            Self::UnexpectedText => "text is not allowed here",

            Self::MissingAttribute => "required attribute is missing",
            Self::AliasRequired => "an alias is required when aggregating",
            Self::InvalidValue => "invalid attribute value",
            Self::MissingChild => "element needs at least one child",
            Self::SchemaMismatch => "not found in the schema",
        }
    }

    /// Message template; `{}` is replaced by the detail passed to `report(..).message(..)`.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnclosedTag => "`<{}>` is never closed".to_string(),
            Self::UnknownTag => "`{}` is not a known element".to_string(),
            Self::UnknownAttribute => "`{}` is not a known attribute".to_string(),
            Self::DuplicateAttribute => "`{}` is set more than once".to_string(),
            Self::MissingAttributeValue => "attribute `{}` has no value".to_string(),
            Self::MissingAttribute => "`{}` is required".to_string(),
            Self::InvalidParent => "`{}` is not allowed here".to_string(),
            Self::InvalidValue | Self::SchemaMismatch | Self::MultipleRoots => "{}".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Final message text: the fallback without detail, the filled template with it.
    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub(crate) replacement: String,
    pub(crate) description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) fix: Option<Fix>,
    pub(crate) hints: Vec<String>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
            fix: None,
            hints: kind.default_hint().map(String::from).into_iter().collect(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    pub fn to_editor(&self) -> EditorDiagnostic {
        EditorDiagnostic {
            from: self.range.start().into(),
            to: self.range.end().into(),
            severity: self.severity(),
            message: self.message.clone(),
        }
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        if let Some(fix) = &self.fix {
            write!(f, " (fix: {})", fix.description)?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Diagnostic in the shape the editor consumes: plain offsets, no kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorDiagnostic {
    pub from: u32,
    pub to: u32,
    pub severity: Severity,
    pub message: String,
}
