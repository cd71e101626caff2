//! Validation engine.
//!
//! Two tiers:
//!
//! - **One-shot** checks run once while the parser builds a node from
//!   untrusted markup (known tag, allowed parent, known attribute name). They
//!   produce [`StructuralIssue`]s that the parser turns into diagnostics.
//! - **Continuous** checks ([`ContinuousValidator`]) watch specific reactive
//!   inputs and re-evaluate only when one of them changes. Their results are
//!   distinct-until-changed, so an unrelated re-emission never reaches the
//!   node's combined [`ValidationResult`].

mod schema;


use std::cell::Cell;
use std::rc::Rc;

use fetchkit_core::{NodeKind, NodeRule, ValueKind};

use crate::diagnostics::DiagnosticKind;
use crate::model::AttributeSlots;
use crate::reactive::{Observable, Subscription, Subscriptions};

pub use schema::{SchemaReply, SchemaRequest, SchemaValidator, schema_validator};

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Problem found by a one-shot check. `detail` feeds the kind's message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralIssue {
    pub kind: DiagnosticKind,
    pub detail: String,
}

impl StructuralIssue {
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Combined pass/fail state of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: impl IntoIterator<Item = ValidationIssue>) -> Self {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

type Evaluate = Rc<dyn Fn() -> Vec<ValidationIssue>>;

/// A check that re-runs whenever one of its watched inputs changes.
///
/// The check is evaluated once on construction. Each [`watch`](Self::watch)
/// adds one trigger; dropping the validator tears every trigger down.
pub struct ContinuousValidator {
    name: &'static str,
    result: Observable<Vec<ValidationIssue>>,
    evaluate: Evaluate,
    evaluations: Rc<Cell<u64>>,
    subscriptions: Subscriptions,
}

impl std::fmt::Debug for ContinuousValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuousValidator")
            .field("name", &self.name)
            .field("issues", &self.result.get())
            .field("evaluations", &self.evaluations.get())
            .finish()
    }
}

impl ContinuousValidator {
    pub fn new(name: &'static str, evaluate: impl Fn() -> Vec<ValidationIssue> + 'static) -> Self {
        let evaluate: Evaluate = Rc::new(evaluate);
        let evaluations = Rc::new(Cell::new(1));
        let result = Observable::new(evaluate());
        Self {
            name,
            result,
            evaluate,
            evaluations,
            subscriptions: Subscriptions::new(),
        }
    }

    /// Re-evaluates whenever `source` changes.
    pub fn watch<S: Clone + PartialEq + 'static>(mut self, source: &Observable<S>) -> Self {
        let evaluate = Rc::clone(&self.evaluate);
        let evaluations = Rc::clone(&self.evaluations);
        let result = self.result.clone();
        self.subscriptions.hold(source.subscribe(move |_| {
            evaluations.set(evaluations.get() + 1);
            result.set(evaluate());
        }));
        self
    }

    /// Keeps an auxiliary subscription alive for as long as the validator.
    pub fn hold(mut self, subscription: Subscription) -> Self {
        self.subscriptions.hold(subscription);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn result(&self) -> &Observable<Vec<ValidationIssue>> {
        &self.result
    }

    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.result.get()
    }

    pub fn passed(&self) -> bool {
        self.result.with(|issues| issues.is_empty())
    }

    /// How many times the check has run, including the initial run.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Builds the continuous validator for one node-level rule.
///
/// `own` are the node's attribute slots, `root` the document root's.
pub fn rule_validator(
    rule: NodeRule,
    kind: NodeKind,
    own: &AttributeSlots,
    root: &AttributeSlots,
    child_count: &Observable<usize>,
) -> ContinuousValidator {
    match rule {
        NodeRule::RequireAttribute(name) => {
            let value = own.slot(name);
            let watched = value.clone();
            ContinuousValidator::new("require-attribute", move || {
                if value.with(|v| is_set(v)) {
                    Vec::new()
                } else {
                    vec![ValidationIssue::new(
                        DiagnosticKind::MissingAttribute,
                        DiagnosticKind::MissingAttribute.message(Some(name)),
                    )]
                }
            })
            .watch(&watched)
        }
        NodeRule::RequireAnyOf(names) => {
            let values: Vec<Observable<String>> = names.iter().map(|n| own.slot(n)).collect();
            let watched = values.clone();
            let mut validator = ContinuousValidator::new("require-any-of", move || {
                if values.iter().any(|v| v.with(|v| is_set(v))) {
                    return Vec::new();
                }
                let quoted: Vec<String> = names.iter().map(|n| format!("`{n}`")).collect();
                vec![ValidationIssue::new(
                    DiagnosticKind::MissingAttribute,
                    format!("one of {} is required", quoted.join(" or ")),
                )]
            });
            for value in &watched {
                validator = validator.watch(value);
            }
            validator
        }
        NodeRule::AliasWhenAggregated => {
            let alias = own.slot("alias");
            let aggregate = own.slot("aggregate");
            let root_aggregate = root.slot("aggregate");
            let (a, b, c) = (alias.clone(), aggregate.clone(), root_aggregate.clone());
            ContinuousValidator::new("alias-when-aggregated", move || {
                let own_aggregates = aggregate.with(|v| is_set(v) && v.trim() != "false");
                let root_aggregates = root_aggregate.with(|v| v.trim() == "true");
                if (own_aggregates || root_aggregates) && !alias.with(|v| is_set(v)) {
                    vec![ValidationIssue::new(
                        DiagnosticKind::AliasRequired,
                        "`alias` is required when aggregating",
                    )]
                } else {
                    Vec::new()
                }
            })
            .watch(&a)
            .watch(&b)
            .watch(&c)
        }
        NodeRule::RequireChild => {
            let count = child_count.clone();
            let tag = kind.tag_name().unwrap_or("element");
            let child = kind
                .mandatory_child()
                .and_then(NodeKind::tag_name)
                .unwrap_or("child");
            ContinuousValidator::new("require-child", move || {
                if count.get() > 0 {
                    Vec::new()
                } else {
                    vec![ValidationIssue::new(
                        DiagnosticKind::MissingChild,
                        format!("`<{tag}>` needs at least one `<{child}>`"),
                    )]
                }
            })
            .watch(child_count)
        }
    }
}

/// Checks an attribute's value against its declared kind. Text accepts anything.
pub fn value_kind_validator(
    name: &str,
    value_kind: ValueKind,
    value: &Observable<String>,
) -> Option<ContinuousValidator> {
    if value_kind == ValueKind::Text {
        return None;
    }
    let name = name.to_string();
    let current = value.clone();
    Some(
        ContinuousValidator::new("value-kind", move || {
            current.with(|v| {
                if v.is_empty() || value_kind.accepts(v) {
                    Vec::new()
                } else {
                    vec![ValidationIssue::new(
                        DiagnosticKind::InvalidValue,
                        format!("`{name}` must be {}, found `{v}`", value_kind.describe()),
                    )]
                }
            })
        })
        .watch(value),
    )
}

/// Permanent issue carried by an attribute whose name is not in the vocabulary.
pub fn unknown_name_validator(name: &str, kind: NodeKind) -> ContinuousValidator {
    let message = match kind.tag_name() {
        Some(tag) => format!("`{name}` is not a known attribute of `<{tag}>`"),
        None => DiagnosticKind::UnknownAttribute.message(Some(name)),
    };
    ContinuousValidator::new("known-name", move || {
        vec![ValidationIssue::new(
            DiagnosticKind::UnknownAttribute,
            message.clone(),
        )]
    })
}

/// One-shot checks for an element built from markup.
pub fn check_parsed_node(
    kind: NodeKind,
    tag_name: &str,
    parent: Option<NodeKind>,
) -> Vec<StructuralIssue> {
    let mut issues = Vec::new();
    if kind == NodeKind::Unknown {
        issues.push(StructuralIssue::new(DiagnosticKind::UnknownTag, tag_name));
        return issues;
    }
    let placed = match parent {
        Some(parent) => kind.accepts_parent(parent),
        None => kind.allowed_parents().is_none_or(|p| p.is_empty()),
    };
    if !placed {
        let detail = match parent.and_then(NodeKind::tag_name) {
            Some(parent_tag) => format!("<{tag_name}>` inside `<{parent_tag}>"),
            None => format!("<{tag_name}>` at the top level"),
        };
        issues.push(StructuralIssue::new(DiagnosticKind::InvalidParent, detail));
    }
    issues
}
