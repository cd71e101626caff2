//! Node and attribute model.
//!
//! Nodes live in the tree's arena and are addressed by [`NodeId`]. Every
//! attribute value is an [`Observable`] slot, so validators and the renderer
//! can watch values, including values of attributes that do not exist yet.

mod attribute;
mod node;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::reactive::Observable;

pub use attribute::NodeAttribute;
pub use node::QueryNode;

/// Handle into the tree's node arena. Ids are never reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-node map from attribute name to its value slot.
///
/// Slots are created on first access and outlive attribute removal (the value
/// is reset to empty), so a watcher never holds a dangling stream.
#[derive(Clone, Default)]
pub struct AttributeSlots {
    slots: Rc<RefCell<HashMap<String, Observable<String>>>>,
}

impl std::fmt::Debug for AttributeSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.borrow();
        let mut names: Vec<&String> = slots.keys().collect();
        names.sort();
        f.debug_struct("AttributeSlots").field("names", &names).finish()
    }
}

impl AttributeSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, name: &str) -> Observable<String> {
        self.slots
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| Observable::new(String::new()))
            .clone()
    }

    /// Current value, empty when the slot was never created.
    pub fn value(&self, name: &str) -> String {
        self.slots
            .borrow()
            .get(name)
            .map(Observable::get)
            .unwrap_or_default()
    }
}
