//! Post-generation count check.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Ifc2GraphResult;
use crate::label::ModelLabel;
use crate::source::ModelDocument;
use crate::store::GraphStore;

/// Outcome of comparing the source entity count with the stored node count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub label: ModelLabel,
    pub entity_count: u64,
    pub node_count: u64,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.entity_count == self.node_count
    }

    /// Absolute difference between the two counts.
    pub fn difference(&self) -> u64 {
        self.entity_count.abs_diff(self.node_count)
    }
}

/// Compare the number of entities in `document` with the number of nodes
/// stored under `label`. A mismatch is reported, not raised.
pub async fn validate<S>(document: &dyn ModelDocument, store: &S, label: &ModelLabel) -> Ifc2GraphResult<ValidationReport>
where
    S: GraphStore + ?Sized,
{
    let report = ValidationReport {
        label: label.clone(),
        entity_count: document.entity_count() as u64,
        node_count: store.count_nodes(label).await?,
    };

    if report.passed() {
        info!(%label, nodes = report.node_count, "Validation passed: every entity has a node");
    } else {
        warn!(
            %label,
            entities = report.entity_count,
            nodes = report.node_count,
            difference = report.difference(),
            "Validation failed: node count differs from entity count"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_is_absolute() {
        let report = ValidationReport {
            label: ModelLabel::new("tsA"),
            entity_count: 3,
            node_count: 5,
        };
        assert!(!report.passed());
        assert_eq!(report.difference(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_fails() {
        let document = crate::testing::FixtureDocument::wall_document();
        let store = crate::store::MemoryStore::new();
        let report = validate(&document, &store, &ModelLabel::new("tsA")).await.unwrap();
        assert!(!report.passed());
        assert_eq!(report.difference(), 4);
    }
}
