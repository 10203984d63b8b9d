//! [`GraphStore`] backed by Neo4j.

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltString, BoltType, Query};
use tracing::debug;

use ifc2graph_core::store::{cypher, EdgeMerge, NodeMerge, NodeRef, PropertyMap, PropertyValue};
use ifc2graph_core::{GraphStore, Ifc2GraphError, Ifc2GraphResult, ModelLabel};

use crate::client::{GraphClient, GraphConfig};

/// Graph store issuing parameterized Cypher over a [`GraphClient`].
#[derive(Clone)]
pub struct Neo4jStore {
    client: GraphClient,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Connect and ping the server described by `config`.
    pub async fn connect(config: &GraphConfig) -> Ifc2GraphResult<Self> {
        let client = GraphClient::connect(config)
            .await
            .map_err(|e| Ifc2GraphError::connection(format!("{e:#}")))?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }
}

fn store_error(e: anyhow::Error) -> Ifc2GraphError {
    Ifc2GraphError::store(format!("{e:#}"))
}

fn bolt_id(id: u64) -> Ifc2GraphResult<i64> {
    i64::try_from(id).map_err(|_| Ifc2GraphError::store(format!("entity id {id} exceeds the Bolt integer range")))
}

/// A merge that matched no endpoint pair wrote nothing.
fn check_edge_written(edge: &EdgeMerge, written: Option<i64>) -> Ifc2GraphResult<()> {
    match written {
        Some(count) if count > 0 => Ok(()),
        _ => Err(Ifc2GraphError::store(format!(
            "edge '{}' from #{} to #{} was not written: an endpoint has no node under {}",
            edge.relation, edge.source, edge.target, edge.label
        ))),
    }
}

/// Convert a node property into its Bolt representation.
pub fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Bool(b) => BoltType::from(*b),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Float(x) => BoltType::from(*x),
        PropertyValue::String(s) => BoltType::from(s.as_str()),
        PropertyValue::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
    }
}

/// Convert a property bag into a Bolt map for `n += $props`.
pub fn to_bolt_map(properties: &PropertyMap) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in properties {
        map.put(BoltString::from(key.as_str()), to_bolt(value));
    }
    BoltType::Map(map)
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn count_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<u64> {
        let count: i64 = self
            .client
            .query_scalar(Query::new(cypher::count_nodes(label)), "count")
            .await
            .map_err(store_error)?
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    async fn delete_all_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<()> {
        debug!(label = %label, "Deleting labelled nodes");
        self.client
            .execute(Query::new(cypher::delete_label(label)))
            .await
            .map_err(store_error)
    }

    async fn merge_node(&self, node: &NodeMerge) -> Ifc2GraphResult<NodeRef> {
        let query = Query::new(cypher::merge_node(node))
            .param("p21_id", bolt_id(node.p21_id)?)
            .param("props", to_bolt_map(&node.properties));
        self.client.execute(query).await.map_err(store_error)?;

        Ok(NodeRef {
            label: node.label.clone(),
            p21_id: node.p21_id,
        })
    }

    async fn merge_edge(&self, edge: &EdgeMerge) -> Ifc2GraphResult<()> {
        let mut query = Query::new(cypher::merge_edge(edge))
            .param("source", bolt_id(edge.source)?)
            .param("target", bolt_id(edge.target)?)
            .param("rel_type", edge.relation.as_str());
        if let Some(sequence) = edge.sequence {
            query = query.param("list_item", sequence as i64);
        }
        let written: Option<i64> = self.client.query_scalar(query, "count").await.map_err(store_error)?;
        check_edge_written(edge, written)
    }

    async fn find_node_by_alternate_id(
        &self,
        label: &ModelLabel,
        global_id: &str,
    ) -> Ifc2GraphResult<Option<NodeRef>> {
        let query = Query::new(cypher::find_by_global_id(label)).param("global_id", global_id);
        let found: Option<i64> = self
            .client
            .query_scalar(query, "p21_id")
            .await
            .map_err(store_error)?;

        Ok(found.map(|p21_id| NodeRef {
            label: label.clone(),
            p21_id: p21_id as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{BoltFloat, BoltInteger};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(to_bolt(&PropertyValue::Integer(17)), BoltType::Integer(BoltInteger::new(17)));
        assert_eq!(to_bolt(&PropertyValue::Float(1.5)), BoltType::Float(BoltFloat::new(1.5)));
        assert_eq!(
            to_bolt(&PropertyValue::String("West Wall".into())),
            BoltType::String(BoltString::from("West Wall"))
        );
    }

    #[test]
    fn test_list_and_map_conversion() {
        let mut properties = PropertyMap::new();
        properties.insert(
            "Coordinates".into(),
            PropertyValue::List(vec![PropertyValue::Float(0.0), PropertyValue::Float(1.5)]),
        );
        properties.insert("p21_id".into(), PropertyValue::Integer(50));

        let BoltType::Map(map) = to_bolt_map(&properties) else {
            panic!("expected a map");
        };
        assert_eq!(map.value.len(), 2);
        assert_eq!(
            map.value.get(&BoltString::from("Coordinates")),
            Some(&BoltType::List(BoltList {
                value: vec![
                    BoltType::Float(BoltFloat::new(0.0)),
                    BoltType::Float(BoltFloat::new(1.5)),
                ]
            }))
        );
    }

    #[test]
    fn test_unmatched_edge_is_an_error() {
        let edge = EdgeMerge {
            label: ModelLabel::new("ts20230112T142005"),
            source: 40,
            target: 99,
            relation: "RelatedObjects".into(),
            sequence: Some(0),
        };

        assert!(check_edge_written(&edge, Some(1)).is_ok());
        let err = check_edge_written(&edge, Some(0)).unwrap_err();
        assert!(matches!(err, Ifc2GraphError::Store(ref msg) if msg.contains("#99")));
        assert!(check_edge_written(&edge, None).is_err());
    }

    #[test]
    fn test_bolt_id_range() {
        assert_eq!(bolt_id(42).unwrap(), 42);
        assert!(matches!(bolt_id(u64::MAX), Err(Ifc2GraphError::Store(_))));
    }
}
