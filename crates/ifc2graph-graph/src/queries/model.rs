//! Model inspection queries.
//!
//! Summaries of the labelled models present in the database and
//! traversal of the `rel` edges leaving a node.

use anyhow::Result;
use neo4rs::Query;
use serde::Serialize;

use ifc2graph_core::store::cypher::identifier;
use ifc2graph_core::store::{
    EDGE_TYPE, ENTITY_TYPE_PROPERTY, LIST_ITEM_PROPERTY, P21_ID_PROPERTY, REL_TYPE_PROPERTY,
};
use ifc2graph_core::{ModelLabel, NodeRole};

use crate::GraphClient;

/// A model label and how many nodes carry it.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub label: String,
    pub nodes: i64,
}

/// Node counts per role plus the edge count for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleCounts {
    pub primary: i64,
    pub connection: i64,
    pub secondary: i64,
    pub edges: i64,
}

impl RoleCounts {
    pub fn nodes(&self) -> i64 {
        self.primary + self.connection + self.secondary
    }
}

/// A node reached over one outgoing edge.
#[derive(Debug, Clone, Serialize)]
pub struct ChildNode {
    pub p21_id: i64,
    pub entity_type: String,
    pub rel_type: String,
    pub list_item: Option<i64>,
}

/// Every `ts*` label with its node count.
pub async fn list_models(client: &GraphClient) -> Result<Vec<ModelSummary>> {
    let query = Query::new(
        "MATCH (n)
         UNWIND labels(n) AS label
         WITH label WHERE label STARTS WITH 'ts'
         RETURN label, count(*) AS nodes
         ORDER BY label"
            .to_string(),
    );

    let rows = client.query(query).await?;
    Ok(rows
        .into_iter()
        .map(|row| ModelSummary {
            label: row.get("label").unwrap_or_default(),
            nodes: row.get("nodes").unwrap_or_default(),
        })
        .collect())
}

fn role_count_statement(label: &ModelLabel, role: NodeRole) -> String {
    format!(
        "MATCH (n:{}:{}) RETURN count(n) AS count",
        identifier(label.as_str()),
        identifier(role.label())
    )
}

fn edge_count_statement(label: &ModelLabel) -> String {
    let label = identifier(label.as_str());
    format!("MATCH (:{label})-[r:{EDGE_TYPE}]->(:{label}) RETURN count(r) AS count")
}

pub async fn role_counts(client: &GraphClient, label: &ModelLabel) -> Result<RoleCounts> {
    let mut counts = RoleCounts::default();
    for role in [NodeRole::PrimaryNode, NodeRole::ConnectionNode, NodeRole::SecondaryNode] {
        let count: i64 = client
            .query_scalar(Query::new(role_count_statement(label, role)), "count")
            .await?
            .unwrap_or(0);
        match role {
            NodeRole::PrimaryNode => counts.primary = count,
            NodeRole::ConnectionNode => counts.connection = count,
            NodeRole::SecondaryNode => counts.secondary = count,
        }
    }

    counts.edges = client
        .query_scalar(Query::new(edge_count_statement(label)), "count")
        .await?
        .unwrap_or(0);
    Ok(counts)
}

fn child_statement(label: &ModelLabel) -> String {
    let label = identifier(label.as_str());
    format!(
        "MATCH (parent:{label} {{{P21_ID_PROPERTY}: $p21_id}})-[r:{EDGE_TYPE}]->(child:{label})
         RETURN child.{P21_ID_PROPERTY} AS p21_id, child.{ENTITY_TYPE_PROPERTY} AS entity_type,
                r.{REL_TYPE_PROPERTY} AS rel_type, r.{LIST_ITEM_PROPERTY} AS list_item
         ORDER BY rel_type, list_item, p21_id"
    )
}

/// Nodes reachable from `p21_id` over one outgoing edge, grouped by attribute.
pub async fn child_nodes(client: &GraphClient, label: &ModelLabel, p21_id: u64) -> Result<Vec<ChildNode>> {
    let query = Query::new(child_statement(label)).param("p21_id", p21_id as i64);

    let rows = client.query(query).await?;
    Ok(rows
        .into_iter()
        .map(|row| ChildNode {
            p21_id: row.get("p21_id").unwrap_or_default(),
            entity_type: row.get("entity_type").unwrap_or_default(),
            rel_type: row.get("rel_type").unwrap_or_default(),
            list_item: row.get("list_item").unwrap_or_default(),
        })
        .collect())
}
