//! Pluggable remote schema checks.
//!
//! The engine does not know which tables and columns exist. A host that does
//! (usually by asking a metadata service) implements [`SchemaValidator`]. The
//! engine sends a [`SchemaRequest`] whenever a watched name changes and hands
//! over a [`SchemaReply`] the host resolves now or later. Replies for a name
//! that has since changed again are dropped.

use std::cell::Cell;
use std::rc::Rc;

use fetchkit_core::NodeKind;

use super::{ContinuousValidator, ValidationIssue};
use crate::diagnostics::DiagnosticKind;
use crate::model::AttributeSlots;
use crate::reactive::Observable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRequest {
    /// Does this table exist?
    Entity { name: String },
    /// Does this column exist on `entity`?
    Attribute { entity: String, name: String },
}

/// Completion handle for one [`SchemaRequest`].
pub struct SchemaReply {
    ticket: u64,
    generation: Rc<Cell<u64>>,
    verdict: Observable<Option<String>>,
}

impl std::fmt::Debug for SchemaReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaReply")
            .field("ticket", &self.ticket)
            .field("stale", &self.is_stale())
            .finish()
    }
}

impl SchemaReply {
    /// Whether a newer request superseded this one.
    pub fn is_stale(&self) -> bool {
        self.generation.get() != self.ticket
    }

    /// The name exists.
    pub fn accept(self) {
        self.resolve(None);
    }

    /// The name does not exist; `message` is shown on the node.
    pub fn reject(self, message: impl Into<String>) {
        self.resolve(Some(message.into()));
    }

    fn resolve(self, verdict: Option<String>) {
        if self.is_stale() {
            tracing::trace!(ticket = self.ticket, "dropping stale schema reply");
            return;
        }
        self.verdict.set(verdict);
    }
}

pub trait SchemaValidator {
    fn check(&self, request: SchemaRequest, reply: SchemaReply);
}

/// Wires a remote check for node kinds that reference schema names.
///
/// Entity-like nodes check their `name`; attribute, order and condition nodes
/// check their column name against the nearest enclosing entity.
pub fn schema_validator(
    kind: NodeKind,
    own: &AttributeSlots,
    entity: Option<&AttributeSlots>,
    checker: Rc<dyn SchemaValidator>,
) -> Option<ContinuousValidator> {
    let (column, table) = match kind {
        NodeKind::Entity | NodeKind::LinkEntity => (None, own.slot("name")),
        NodeKind::Attribute => (Some(own.slot("name")), entity?.slot("name")),
        NodeKind::Order | NodeKind::Condition => (Some(own.slot("attribute")), entity?.slot("name")),
        _ => return None,
    };

    let verdict: Observable<Option<String>> = Observable::new(None);
    let generation = Rc::new(Cell::new(0u64));

    let request = {
        let (column, table) = (column.clone(), table.clone());
        let (verdict, generation) = (verdict.clone(), Rc::clone(&generation));
        Rc::new(move || {
            let ticket = generation.get() + 1;
            generation.set(ticket);
            verdict.set(None);

            let table_name = table.get();
            let request = match &column {
                None if !table_name.is_empty() => SchemaRequest::Entity { name: table_name },
                Some(column) if !table_name.is_empty() && !column.with(|c| c.is_empty()) => {
                    SchemaRequest::Attribute {
                        entity: table_name,
                        name: column.get(),
                    }
                }
                _ => return,
            };
            tracing::debug!(?request, ticket, "schema check");
            checker.check(
                request,
                SchemaReply {
                    ticket,
                    generation: Rc::clone(&generation),
                    verdict: verdict.clone(),
                },
            );
        })
    };

    let current = verdict.clone();
    let mut validator = ContinuousValidator::new("schema", move || {
        current.with(|v| match v {
            Some(message) => vec![ValidationIssue::new(
                DiagnosticKind::SchemaMismatch,
                message.clone(),
            )],
            None => Vec::new(),
        })
    })
    .watch(&verdict);

    let on_table = Rc::clone(&request);
    validator = validator.hold(table.subscribe(move |_| on_table()));
    if let Some(column) = &column {
        let on_column = Rc::clone(&request);
        validator = validator.hold(column.subscribe(move |_| on_column()));
    }

    request();
    Some(validator)
}
