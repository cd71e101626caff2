use fetchkit_core::ValueKind;
use rowan::TextRange;

use crate::escape;
use crate::reactive::{Observable, Subscriptions, derive};
use crate::validation::{ContinuousValidator, ValidationIssue};

/// One attribute of a node.
///
/// `value` is the node's slot for this name; `display_value` is derived from
/// it and is the exact fragment the renderer writes (`name="value"`, or the
/// bare text for content attributes). An empty value renders as nothing.
pub struct NodeAttribute {
    pub(crate) editor_name: String,
    pub(crate) order: u32,
    pub(crate) value_kind: ValueKind,
    pub(crate) is_valid_name: bool,
    pub(crate) displayable: bool,
    pub(crate) content: bool,
    pub(crate) value: Observable<String>,
    pub(crate) display_value: Observable<String>,
    pub(crate) validators: Vec<ContinuousValidator>,
    pub(crate) source_span: Option<TextRange>,
    pub(crate) subscriptions: Subscriptions,
}

impl std::fmt::Debug for NodeAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeAttribute")
            .field("editor_name", &self.editor_name)
            .field("order", &self.order)
            .field("value", &self.value.get())
            .field("is_valid_name", &self.is_valid_name)
            .finish()
    }
}

impl NodeAttribute {
    pub(crate) fn new(
        editor_name: &str,
        order: u32,
        value_kind: ValueKind,
        value: Observable<String>,
    ) -> Self {
        let name = editor_name.to_string();
        let mut subscriptions = Subscriptions::new();
        let (display_value, sub) = derive(&value, move |v: &String| display(&name, v, false));
        subscriptions.hold(sub);
        Self {
            editor_name: editor_name.to_string(),
            order,
            value_kind,
            is_valid_name: true,
            displayable: false,
            content: false,
            value,
            display_value,
            validators: Vec::new(),
            source_span: None,
            subscriptions,
        }
    }

    /// Marks the attribute as element text instead of `name="value"`.
    pub(crate) fn into_content(mut self) -> Self {
        self.subscriptions.dispose();
        let (display_value, sub) = derive(&self.value, |v: &String| display("", v, true));
        self.display_value = display_value;
        self.subscriptions.hold(sub);
        self.content = true;
        self
    }

    pub fn editor_name(&self) -> &str {
        &self.editor_name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    /// False for names outside the node kind's vocabulary.
    pub fn is_valid_name(&self) -> bool {
        self.is_valid_name
    }

    pub fn is_displayable(&self) -> bool {
        self.displayable
    }

    pub fn is_content(&self) -> bool {
        self.content
    }

    pub fn value(&self) -> String {
        self.value.get()
    }

    pub fn value_observable(&self) -> &Observable<String> {
        &self.value
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.value.set(value.into());
    }

    pub fn display_value(&self) -> String {
        self.display_value.get()
    }

    pub fn display_observable(&self) -> &Observable<String> {
        &self.display_value
    }

    pub fn validators(&self) -> &[ContinuousValidator] {
        &self.validators
    }

    /// Name range in the text this attribute was last parsed from or
    /// rendered to.
    pub fn source_span(&self) -> Option<TextRange> {
        self.source_span
    }

    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.validators.iter().flat_map(|v| v.issues()).collect()
    }
}

fn display(name: &str, value: &str, content: bool) -> String {
    if value.is_empty() {
        String::new()
    } else if content {
        escape::encode(value).into_owned()
    } else {
        format!("{name}=\"{}\"", escape::encode(value))
    }
}
