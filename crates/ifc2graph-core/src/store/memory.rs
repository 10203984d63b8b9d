//! In-memory graph store.
//!
//! Backs the dry-run mode and the test suite. Nodes are keyed by
//! (label, p21_id) and edges by their full merge key, so repeated merges
//! collapse exactly like they do in Neo4j.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EdgeMerge, GraphStore, NodeMerge, NodeRef, NodeRole, PropertyMap, PropertyValue, GLOBAL_ID_PROPERTY};
use crate::error::{Ifc2GraphError, Ifc2GraphResult};
use crate::label::ModelLabel;
use crate::policy::{EdgeKey, NodeKey};

/// A node held by the memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub role: NodeRole,
    pub class_name: String,
    pub properties: PropertyMap,
}

#[derive(Default)]
struct MemoryGraph {
    nodes: BTreeMap<NodeKey, StoredNode>,
    edges: BTreeSet<EdgeKey>,
}

fn node_key(label: &ModelLabel, p21_id: u64) -> NodeKey {
    NodeKey {
        label: label.as_str().to_string(),
        p21_id,
    }
}

/// Property graph held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryGraph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self, label: &ModelLabel) -> usize {
        self.inner
            .read()
            .nodes
            .keys()
            .filter(|k| k.label == label.as_str())
            .count()
    }

    pub fn edge_count(&self, label: &ModelLabel) -> usize {
        self.inner
            .read()
            .edges
            .iter()
            .filter(|e| e.label == label.as_str())
            .count()
    }

    pub fn node(&self, label: &ModelLabel, p21_id: u64) -> Option<StoredNode> {
        self.inner
            .read()
            .nodes
            .get(&node_key(label, p21_id))
            .cloned()
    }

    /// Edges under `label`, ordered by their merge key.
    pub fn edges(&self, label: &ModelLabel) -> Vec<EdgeKey> {
        self.inner
            .read()
            .edges
            .iter()
            .filter(|e| e.label == label.as_str())
            .cloned()
            .collect()
    }

    /// Outgoing edges of one node.
    pub fn edges_from(&self, label: &ModelLabel, source: u64) -> Vec<EdgeKey> {
        self.edges(label)
            .into_iter()
            .filter(|e| e.source == source)
            .collect()
    }

    /// Delete a single node and its edges, as an external client would.
    pub fn remove_node(&self, label: &ModelLabel, p21_id: u64) -> bool {
        let mut graph = self.inner.write();
        let removed = graph
            .nodes
            .remove(&node_key(label, p21_id))
            .is_some();
        graph
            .edges
            .retain(|e| !(e.label == label.as_str() && (e.source == p21_id || e.target == p21_id)));
        removed
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn count_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<u64> {
        Ok(self.node_count(label) as u64)
    }

    async fn delete_all_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<()> {
        let mut graph = self.inner.write();
        graph.nodes.retain(|k, _| k.label != label.as_str());
        graph.edges.retain(|e| e.label != label.as_str());
        Ok(())
    }

    async fn merge_node(&self, node: &NodeMerge) -> Ifc2GraphResult<NodeRef> {
        let mut graph = self.inner.write();
        let stored = graph.nodes.entry(NodeKey::from(node)).or_insert_with(|| StoredNode {
            role: node.role,
            class_name: node.class_name.clone(),
            properties: PropertyMap::new(),
        });
        stored.role = node.role;
        stored.class_name = node.class_name.clone();
        for (k, v) in &node.properties {
            stored.properties.insert(k.clone(), v.clone());
        }

        Ok(NodeRef {
            label: node.label.clone(),
            p21_id: node.p21_id,
        })
    }

    async fn merge_edge(&self, edge: &EdgeMerge) -> Ifc2GraphResult<()> {
        let mut graph = self.inner.write();
        for endpoint in [edge.source, edge.target] {
            if !graph.nodes.contains_key(&node_key(&edge.label, endpoint)) {
                return Err(Ifc2GraphError::store(format!(
                    "edge '{}' references #{} which has no node under {}",
                    edge.relation, endpoint, edge.label
                )));
            }
        }
        graph.edges.insert(EdgeKey::from(edge));
        Ok(())
    }

    async fn find_node_by_alternate_id(
        &self,
        label: &ModelLabel,
        global_id: &str,
    ) -> Ifc2GraphResult<Option<NodeRef>> {
        let graph = self.inner.read();
        let found = graph.nodes.iter().find(|(key, node)| {
            key.label == label.as_str()
                && matches!(node.properties.get(GLOBAL_ID_PROPERTY), Some(PropertyValue::String(g)) if g == global_id)
        });
        Ok(found.map(|(key, _)| NodeRef {
            label: label.clone(),
            p21_id: key.p21_id,
        }))
    }
}
