//! Arena-wide structural checks.

use super::QueryNodeTree;
use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("chain visits {0} twice")]
    Cycle(NodeId),

    #[error("{reached} of {live} live nodes are reachable from the root")]
    Unreachable { reached: usize, live: usize },

    #[error("{0} is not on level 0")]
    RootLevel(NodeId),

    #[error("{node} jumps from level {from} to {to}")]
    LevelJump { node: NodeId, from: u32, to: u32 },

    #[error("{node} names {recorded:?} as parent but follows {actual:?}")]
    WrongParent {
        node: NodeId,
        recorded: Option<NodeId>,
        actual: Option<NodeId>,
    },

    #[error("{node} (order {order}) comes after a sibling with order {previous}")]
    SiblingOrder { node: NodeId, order: u32, previous: u32 },

    #[error("{node} has expandable={expandable} but {children} children")]
    Expandable {
        node: NodeId,
        expandable: bool,
        children: usize,
    },

    #[error("{node} has visible={visible}, ancestors say {expected}")]
    Visibility {
        node: NodeId,
        visible: bool,
        expected: bool,
    },
}

impl QueryNodeTree {
    /// Checks preorder linkage, sibling order, and visibility for every node.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut seen = vec![false; self.nodes.len()];
        // (level, id, visible-and-expanded, last child order)
        let mut stack: Vec<(u32, NodeId, bool, Option<u32>)> = Vec::new();
        let mut reached = 0;

        for node in self.iter() {
            let id = node.id;
            if std::mem::replace(&mut seen[id.index()], true) {
                return Err(InvariantViolation::Cycle(id));
            }
            reached += 1;

            if stack.is_empty() {
                if node.level != 0 {
                    return Err(InvariantViolation::RootLevel(id));
                }
            } else {
                let top = stack.last().map_or(0, |s| s.0);
                if node.level > top + 1 || node.level == 0 {
                    return Err(InvariantViolation::LevelJump {
                        node: id,
                        from: top,
                        to: node.level,
                    });
                }
            }

            while stack.last().is_some_and(|s| s.0 >= node.level) {
                stack.pop();
            }

            let actual = stack.last().map(|s| s.1);
            if node.parent != actual {
                return Err(InvariantViolation::WrongParent {
                    node: id,
                    recorded: node.parent,
                    actual,
                });
            }

            if let Some(parent) = stack.last_mut() {
                if let Some(previous) = parent.3
                    && previous > node.order
                {
                    return Err(InvariantViolation::SiblingOrder {
                        node: id,
                        order: node.order,
                        previous,
                    });
                }
                parent.3 = Some(node.order);
            }

            let expected = stack.last().is_none_or(|s| s.2);
            if node.visible != expected {
                return Err(InvariantViolation::Visibility {
                    node: id,
                    visible: node.visible,
                    expected,
                });
            }

            let children = self.children(id).len();
            if node.expandable != (children > 0) || node.child_count.get() != children {
                return Err(InvariantViolation::Expandable {
                    node: id,
                    expandable: node.expandable,
                    children,
                });
            }

            stack.push((node.level, id, node.visible && node.is_expanded, None));
        }

        let live = self.len();
        if reached != live {
            return Err(InvariantViolation::Unreachable { reached, live });
        }
        Ok(())
    }
}
