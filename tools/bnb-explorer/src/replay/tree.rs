use crate::path::DecisionPath;
use crate::types::{Direction, Lineage, NodeStatus, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node of the projected tree. Only meaningful for the cursor it was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub path: DecisionPath,
    pub key: String,
    pub status: NodeStatus,
    /// Kind of the last step at or before the cursor recorded at this node.
    pub last_kind: Option<StepKind>,
    pub lineage: Lineage,
    /// Set on the node the cursor step was recorded at.
    pub is_cursor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEdge {
    pub parent: DecisionPath,
    pub child: DecisionPath,
    pub direction: Direction,
}

/// Nodes keyed by path key, kept in creation order.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<TreeNode>,
    index: HashMap<String, usize>,
    edges: Vec<TreeEdge>,
}

impl NodeArena {
    /// Create every missing node from the root down to `path` with `status`,
    /// adding an edge for each new child. Returns the slot of `path`.
    pub(crate) fn materialize(&mut self, path: &DecisionPath, status: NodeStatus) -> usize {
        let mut slot = 0;
        for prefix in path.prefixes() {
            let key = prefix.key();
            if let Some(&existing) = self.index.get(&key) {
                slot = existing;
                continue;
            }
            if let (Some(parent), Some(direction)) = (prefix.parent(), prefix.direction()) {
                self.edges.push(TreeEdge {
                    parent,
                    child: prefix.clone(),
                    direction,
                });
            }
            slot = self.nodes.len();
            self.index.insert(key.clone(), slot);
            self.nodes.push(TreeNode {
                path: prefix,
                key,
                status,
                last_kind: None,
                lineage: Lineage::None,
                is_cursor: false,
            });
        }
        slot
    }

    pub(crate) fn node_mut(&mut self, slot: usize) -> &mut TreeNode {
        &mut self.nodes[slot]
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut TreeNode> {
        self.nodes.iter_mut()
    }

    pub(crate) fn into_parts(self) -> (Vec<TreeNode>, Vec<TreeEdge>) {
        (self.nodes, self.edges)
    }
}
