use std::cell::Cell;
use std::rc::Rc;

use crate::{Error, Result};

/// Which representation is currently driving the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncDirection {
    #[default]
    Idle,
    /// The parser is rebuilding the tree from text.
    TextToTree,
    /// The renderer is writing text generated from the tree.
    TreeToText,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Idle => write!(f, "idle"),
            SyncDirection::TextToTree => write!(f, "text-to-tree"),
            SyncDirection::TreeToText => write!(f, "tree-to-text"),
        }
    }
}

/// Mutual exclusion between parsing and rendering.
///
/// Cloning yields another handle to the same state. A pass is entered with
/// [`enter`](Self::enter) and lasts as long as the returned guard.
#[derive(Debug, Clone, Default)]
pub struct SyncCoordinator {
    direction: Rc<Cell<SyncDirection>>,
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction.get()
    }

    pub fn is_idle(&self) -> bool {
        self.direction() == SyncDirection::Idle
    }

    /// Whether tokens should currently be applied to the tree.
    pub fn accepts_tokens(&self) -> bool {
        self.direction() != SyncDirection::TreeToText
    }

    /// Whether tree changes should currently schedule a render.
    pub fn accepts_tree_changes(&self) -> bool {
        self.direction() != SyncDirection::TextToTree
    }

    pub fn enter(&self, direction: SyncDirection) -> Result<SyncGuard> {
        let current = self.direction.get();
        if current != SyncDirection::Idle {
            return Err(Error::SyncBusy(current));
        }
        tracing::trace!(%direction, "sync pass started");
        self.direction.set(direction);
        Ok(SyncGuard {
            direction: Rc::clone(&self.direction),
        })
    }
}

/// Restores [`SyncDirection::Idle`] when dropped, on every exit path.
#[must_use = "the sync pass ends when the guard is dropped"]
#[derive(Debug)]
pub struct SyncGuard {
    direction: Rc<Cell<SyncDirection>>,
}

impl SyncGuard {
    pub fn direction(&self) -> SyncDirection {
        self.direction.get()
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        tracing::trace!(direction = %self.direction.get(), "sync pass finished");
        self.direction.set(SyncDirection::Idle);
    }
}
