//! Neo4j index initialization.
//!
//! Every generated node carries its model label, so identity lookups
//! (`p21_id`) and recovery lookups (`GlobalId`) are indexed per label.

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use ifc2graph_core::store::cypher::identifier;
use ifc2graph_core::store::{GLOBAL_ID_PROPERTY, P21_ID_PROPERTY};
use ifc2graph_core::ModelLabel;

use crate::GraphClient;

/// Statements creating the indexes for one model label.
pub fn index_statements(label: &ModelLabel) -> Vec<String> {
    [P21_ID_PROPERTY, GLOBAL_ID_PROPERTY]
        .iter()
        .map(|property| {
            format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
                identifier(&format!("{}_{}", label.as_str(), property)),
                identifier(label.as_str()),
                property
            )
        })
        .collect()
}

/// Initialize the indexes for `label`.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient, label: &ModelLabel) -> Result<()> {
    let statements = index_statements(label);
    for statement in &statements {
        client.execute(Query::new(statement.clone())).await?;
    }

    info!(label = %label, statements = statements.len(), "Neo4j indexes initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_statements() {
        let statements = index_statements(&ModelLabel::new("ts20220504T080830"));
        assert_eq!(
            statements,
            vec![
                "CREATE INDEX `ts20220504T080830_p21_id` IF NOT EXISTS FOR (n:`ts20220504T080830`) ON (n.p21_id)",
                "CREATE INDEX `ts20220504T080830_GlobalId` IF NOT EXISTS FOR (n:`ts20220504T080830`) ON (n.GlobalId)",
            ]
        );
    }
}
