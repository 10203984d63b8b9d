//! Overwrite and merge policy.
//!
//! A label holds exactly one generation: staging a model under a label that
//! already has nodes first removes them. Merge keys make every write a pure
//! function of its identity.

use tracing::{info, warn};

use crate::error::Ifc2GraphResult;
use crate::label::ModelLabel;
use crate::store::{EdgeMerge, GraphStore, NodeMerge, WriteCommand, WriteLog};

/// Identity of a node: (label, p21_id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub label: String,
    pub p21_id: u64,
}

impl From<&NodeMerge> for NodeKey {
    fn from(node: &NodeMerge) -> Self {
        Self {
            label: node.label.as_str().to_string(),
            p21_id: node.p21_id,
        }
    }
}

/// Identity of an edge: endpoints, relation name and optional position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub label: String,
    pub source: u64,
    pub target: u64,
    pub relation: String,
    pub sequence: Option<usize>,
}

impl From<&EdgeMerge> for EdgeKey {
    fn from(edge: &EdgeMerge) -> Self {
        Self {
            label: edge.label.as_str().to_string(),
            source: edge.source,
            target: edge.target,
            relation: edge.relation.clone(),
            sequence: edge.sequence,
        }
    }
}

/// Clear `label` before a new generation. Returns the number of nodes that
/// were removed.
pub async fn prepare_label<S>(store: &S, label: &ModelLabel, log: &mut WriteLog) -> Ifc2GraphResult<u64>
where
    S: GraphStore + ?Sized,
{
    let existing = store.count_nodes(label).await?;
    if existing == 0 {
        info!(%label, "Label is empty, nothing to overwrite");
        return Ok(0);
    }

    warn!(%label, existing, "Entire graph under this label gets overwritten by the staged model");
    store.delete_all_nodes(label).await?;
    log.push(WriteCommand::PurgeLabel { label: label.clone() });
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NodeRole, PropertyMap};

    fn node(label: &ModelLabel, p21_id: u64) -> NodeMerge {
        NodeMerge {
            label: label.clone(),
            role: NodeRole::SecondaryNode,
            class_name: "IfcThing".into(),
            p21_id,
            properties: PropertyMap::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_label_is_untouched() {
        let store = MemoryStore::new();
        let mut log = WriteLog::new();
        let purged = prepare_label(&store, &ModelLabel::new("tsA"), &mut log).await.unwrap();
        assert_eq!(purged, 0);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_existing_label_is_purged() {
        let store = MemoryStore::new();
        let label = ModelLabel::new("tsA");
        let other = ModelLabel::new("tsB");
        store.merge_node(&node(&label, 1)).await.unwrap();
        store.merge_node(&node(&label, 2)).await.unwrap();
        store.merge_node(&node(&other, 1)).await.unwrap();

        let mut log = WriteLog::new();
        let purged = prepare_label(&store, &label, &mut log).await.unwrap();

        assert_eq!(purged, 2);
        assert_eq!(store.node_count(&label), 0);
        assert_eq!(store.node_count(&other), 1);
        assert_eq!(log.commands(), &[WriteCommand::PurgeLabel { label }]);
    }

    #[test]
    fn test_keys_ignore_properties() {
        let label = ModelLabel::new("tsA");
        let mut a = node(&label, 5);
        let b = node(&label, 5);
        a.properties.insert("Name".into(), crate::store::PropertyValue::String("x".into()));
        assert_eq!(NodeKey::from(&a), NodeKey::from(&b));
    }
}
