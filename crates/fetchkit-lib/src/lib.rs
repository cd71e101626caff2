//! fetchkit: bidirectional markup ⇄ tree synchronization for FetchXML queries.
//!
//! A query exists twice: as a node tree the UI edits, and as markup text the
//! editor shows. [`Session`] keeps the two in step. Edits to the text are
//! tokenized and replayed by the [`parser`] into a fresh tree; edits to the
//! tree are serialized by the [`render`] module back into text. A
//! [`SyncCoordinator`] makes sure neither direction re-triggers the other.
//!
//! # Example
//!
//! ```
//! use fetchkit_lib::{EngineConfig, ManualClock, MemoryEditor, Session};
//!
//! let editor = MemoryEditor::new("<fetch><entity name=\"account\" /></fetch>");
//! let mut session = Session::new(editor, EngineConfig::default(), ManualClock::new());
//! session.reparse();
//!
//! let text = session.render_now().text;
//! assert_eq!(text, "<fetch>\n  <entity name=\"account\" />\n</fetch>");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod diagnostics;
pub mod escape;
pub mod factory;
pub mod model;
pub mod parser;
pub mod reactive;
pub mod render;
pub mod sync;
pub mod syntax;
pub mod tree;
pub mod validation;

pub use config::EngineConfig;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use fetchkit_core::NodeKind;
pub use model::NodeId;
pub use render::Rendered;
pub use sync::{
    Clock, EditorHost, ManualClock, MemoryEditor, Session, SyncCoordinator, SyncDirection,
    SyncGuard, SystemClock,
};
pub use tree::QueryNodeTree;

/// Errors returned by tree mutations and engine setup.
///
/// Malformed markup never produces an `Error`; it produces [`Diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No parent was given and nothing is selected.
    #[error("cannot add a node without a parent")]
    MissingParent,

    /// The root node has no parent to detach from.
    #[error("the root node cannot be removed")]
    RemoveRoot,

    #[error("node {0} is not part of the tree")]
    UnknownNode(NodeId),

    /// A sync pass is already running in some direction.
    #[error("a {0} sync pass is already running")]
    SyncBusy(SyncDirection),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
