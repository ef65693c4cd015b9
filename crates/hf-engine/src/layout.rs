//! Layout allocation over the categorical and numeric index spaces

use serde::Serialize;
use std::ops::Range;

use crate::descriptor::{Kind, NodeId, Tree};
use crate::{HarnessError, Result};

pub use crate::descriptor::Space;

/// A single slot in one index space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub space: Space,
    pub index: usize,
}

/// Slots owned by a node and the spans its subtree covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSlots {
    pub own: Option<Slot>,
    pub categorical: Range<usize>,
    pub numeric: Range<usize>,
}

/// Allocation result for one tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    nodes: Vec<NodeSlots>,
    pub total_categorical: usize,
    pub total_numeric: usize,
}

impl Layout {
    pub fn slots(&self, id: NodeId) -> &NodeSlots {
        &self.nodes[id.index()]
    }

    pub fn own_slot(&self, id: NodeId) -> Option<Slot> {
        self.nodes[id.index()].own
    }

    /// Slot-owning nodes in allocation order
    pub fn owners(&self, tree: &Tree) -> Vec<(NodeId, Slot)> {
        tree.preorder()
            .into_iter()
            .filter_map(|id| self.own_slot(id).map(|slot| (id, slot)))
            .collect()
    }

    pub fn total_slots(&self) -> usize {
        self.total_categorical + self.total_numeric
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    categorical: usize,
    numeric: usize,
}

/// Assigns slots in pre-order, threading two cursors
#[derive(Debug, Clone)]
pub struct LayoutAllocator {
    max_variable_length: usize,
}

impl LayoutAllocator {
    pub fn new(max_variable_length: usize) -> Self {
        Self { max_variable_length }
    }

    pub fn allocate(&self, tree: &Tree) -> Result<Layout> {
        let mut nodes = vec![NodeSlots::default(); tree.len()];
        let mut cursor = Cursor::default();

        for &root in tree.roots() {
            self.visit(tree, root, &mut cursor, &mut nodes)?;
        }

        Ok(Layout {
            nodes,
            total_categorical: cursor.categorical,
            total_numeric: cursor.numeric,
        })
    }

    fn visit(&self, tree: &Tree, id: NodeId, cursor: &mut Cursor, nodes: &mut [NodeSlots]) -> Result<()> {
        let start = *cursor;
        let mut own = None;

        // Unstable subtrees emit nothing, so they take no slots
        if tree.is_stable(id) {
            if let Kind::Sequence { elements, .. } = &tree[id].kind {
                if elements.len() != self.max_variable_length {
                    return Err(HarnessError::malformed(
                        &tree[id].name,
                        format!(
                            "sequence holds {} element slots, expected {}",
                            elements.len(),
                            self.max_variable_length
                        ),
                    ));
                }
            }

            own = tree[id].kind.own_space().map(|space| {
                let counter = match space {
                    Space::Categorical => &mut cursor.categorical,
                    Space::Numeric => &mut cursor.numeric,
                };
                let index = *counter;
                *counter += 1;
                Slot { space, index }
            });

            for child in tree.children(id) {
                self.visit(tree, child, cursor, nodes)?;
            }
        }

        nodes[id.index()] = NodeSlots {
            own,
            categorical: start.categorical..cursor.categorical,
            numeric: start.numeric..cursor.numeric,
        };
        Ok(())
    }
}
