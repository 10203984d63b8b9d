//! Encoders turning source entities into store writes.
//!
//! Nodes are written first for the whole document; edges only after
//! [`NodesMaterialized`] has been obtained from the node stage.

pub mod node;
pub mod relationship;

pub use node::{property_value, NodeEncoder};
pub use relationship::{EdgeStats, RelationshipEncoder};

/// Proof that every entity of the document has a node in the store.
///
/// Only the node stage of the engine can produce one, and the relationship
/// encoder cannot be built without it.
#[derive(Debug)]
pub struct NodesMaterialized {
    nodes: usize,
}

impl NodesMaterialized {
    pub(crate) fn reached(nodes: usize) -> Self {
        Self { nodes }
    }

    /// Number of nodes written by the node stage.
    pub fn nodes(&self) -> usize {
        self.nodes
    }
}
