//! Two-pass generation engine.
//!
//! prepare label -> nodes for every entity -> barrier -> edges for every
//! entity -> optional validation. Store calls are awaited one at a time.

use serde::Serialize;
use tracing::info;

use crate::encode::{EdgeStats, NodeEncoder, NodesMaterialized, RelationshipEncoder};
use crate::error::Ifc2GraphResult;
use crate::label::ModelLabel;
use crate::policy::prepare_label;
use crate::source::ModelDocument;
use crate::store::{GraphStore, WriteLog};
use crate::validate::{validate, ValidationReport};

/// Generation stage reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Nodes,
    Edges,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Nodes => write!(f, "nodes"),
            Stage::Edges => write!(f, "edges"),
        }
    }
}

/// Receives progress updates while a model is generated.
pub trait ProgressSink: Send + Sync {
    fn start(&self, _stage: Stage, _total: usize) {}
    fn advance(&self, _stage: Stage, _done: usize) {}
    fn finish(&self, _stage: Stage) {}
}

/// Sink that ignores every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Result of one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub label: ModelLabel,
    pub nodes: usize,
    pub edges: usize,
    pub recovered_edges: usize,
    /// Aggregated list elements holding values rather than references.
    pub skipped_elements: usize,
    /// Nodes removed from the label before generation.
    pub purged_nodes: u64,
    pub validation: Option<ValidationReport>,
    #[serde(skip)]
    pub log: WriteLog,
}

pub struct GraphGenerator<'a, S: GraphStore + ?Sized> {
    document: &'a dyn ModelDocument,
    store: &'a S,
    label: ModelLabel,
    progress: &'a dyn ProgressSink,
}

impl<'a, S: GraphStore + ?Sized> GraphGenerator<'a, S> {
    pub fn new(document: &'a dyn ModelDocument, store: &'a S) -> Self {
        Self {
            document,
            store,
            label: ModelLabel::from_time_stamp(document.time_stamp()),
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn label(&self) -> &ModelLabel {
        &self.label
    }

    /// Translate the whole document into the store under its label.
    pub async fn generate(&self, validate_counts: bool) -> Ifc2GraphResult<GenerationReport> {
        info!(label = %self.label, entities = self.document.entity_count(), schema = self.document.schema().name(), "Starting graph generation");

        let mut log = WriteLog::new();
        let purged_nodes = prepare_label(self.store, &self.label, &mut log).await?;

        let barrier = self.materialize_nodes(&mut log).await?;
        info!(nodes = barrier.nodes(), "All nodes materialized");

        let stats = self.emit_edges(&barrier, &mut log).await?;
        info!(edges = stats.edges, recovered = stats.recovered, skipped = stats.skipped, "All edges emitted");

        let validation = if validate_counts {
            Some(validate(self.document, self.store, &self.label).await?)
        } else {
            None
        };

        info!(label = %self.label, writes = log.len(), "Graph generation complete");

        Ok(GenerationReport {
            label: self.label.clone(),
            nodes: barrier.nodes(),
            edges: stats.edges,
            recovered_edges: stats.recovered,
            skipped_elements: stats.skipped,
            purged_nodes,
            validation,
            log,
        })
    }

    async fn materialize_nodes(&self, log: &mut WriteLog) -> Ifc2GraphResult<NodesMaterialized> {
        let encoder = NodeEncoder::new(self.document.schema(), &self.label);
        let total = self.document.entity_count();
        self.progress.start(Stage::Nodes, total);

        let mut nodes = 0;
        for entity in self.document.entities() {
            encoder.emit(self.store, entity, log).await?;
            nodes += 1;
            self.progress.advance(Stage::Nodes, nodes);
        }

        self.progress.finish(Stage::Nodes);
        Ok(NodesMaterialized::reached(nodes))
    }

    async fn emit_edges(&self, barrier: &NodesMaterialized, log: &mut WriteLog) -> Ifc2GraphResult<EdgeStats> {
        let encoder = RelationshipEncoder::new(self.document, &self.label, barrier);
        self.progress.start(Stage::Edges, barrier.nodes());

        let mut stats = EdgeStats::default();
        for (done, entity) in self.document.entities().enumerate() {
            stats += encoder.emit(self.store, entity, log).await?;
            self.progress.advance(Stage::Edges, done + 1);
        }

        self.progress.finish(Stage::Edges);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{AttributeValue, MetaKind};
    use crate::store::{MemoryStore, NodeRole, PropertyMap, PropertyValue, WriteCommand};
    use crate::testing::{entity, FixtureDocument};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn label() -> ModelLabel {
        ModelLabel::new("ts20220504T080830")
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(Stage, usize)>>,
    }

    impl ProgressSink for Recorder {
        fn advance(&self, stage: Stage, done: usize) {
            self.events.lock().push((stage, done));
        }
    }

    #[tokio::test]
    async fn test_wall_scenario() {
        let document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        let report = GraphGenerator::new(&document, &store).generate(true).await.unwrap();

        assert_eq!(report.label, label());
        assert_eq!(report.nodes, 4);
        assert_eq!(report.edges, 3);
        assert_eq!(report.recovered_edges, 0);
        assert_eq!(report.skipped_elements, 0);
        assert!(report.validation.unwrap().passed());

        let wall = store.node(&label(), 17).unwrap();
        let mut expected = PropertyMap::new();
        expected.insert("p21_id".into(), PropertyValue::Integer(17));
        expected.insert("EntityType".into(), PropertyValue::String("Wall".into()));
        expected.insert("Name".into(), PropertyValue::String("West Wall".into()));
        assert_eq!(wall.properties, expected);
        assert_eq!(wall.role, NodeRole::PrimaryNode);
        assert_eq!(store.node(&label(), 20).unwrap().role, NodeRole::ConnectionNode);
        assert_eq!(store.node(&label(), 1).unwrap().role, NodeRole::SecondaryNode);
    }

    #[tokio::test]
    async fn test_nodes_precede_edges_in_log() {
        let document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        let report = GraphGenerator::new(&document, &store).generate(false).await.unwrap();

        let first_edge = report
            .log
            .commands()
            .iter()
            .position(|c| matches!(c, WriteCommand::MergeEdge(_)))
            .unwrap();
        let last_node = report
            .log
            .commands()
            .iter()
            .rposition(|c| matches!(c, WriteCommand::MergeNode(_)))
            .unwrap();
        assert!(last_node < first_edge);
        assert!(report.validation.is_none());
    }

    #[tokio::test]
    async fn test_generation_is_idempotent() {
        let document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        GraphGenerator::new(&document, &store).generate(false).await.unwrap();
        let nodes: Vec<_> = [1, 17, 20, 21].iter().map(|id| store.node(&label(), *id)).collect();
        let edges = store.edges(&label());

        let second = GraphGenerator::new(&document, &store).generate(false).await.unwrap();

        assert_eq!(second.purged_nodes, 4);
        assert_eq!(store.node_count(&label()), 4);
        assert_eq!(store.edges(&label()), edges);
        let again: Vec<_> = [1, 17, 20, 21].iter().map(|id| store.node(&label(), *id)).collect();
        assert_eq!(again, nodes);
    }

    #[tokio::test]
    async fn test_rerun_with_null_owner_history_drops_edge() {
        let mut document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        GraphGenerator::new(&document, &store).generate(false).await.unwrap();
        assert!(store.edges_from(&label(), 17).iter().any(|e| e.relation == "OwnerHistory"));

        document.set_attribute(17, "OwnerHistory", AttributeValue::Null);
        let report = GraphGenerator::new(&document, &store).generate(false).await.unwrap();

        assert_eq!(report.log.commands()[0], WriteCommand::PurgeLabel { label: label() });
        let relations: Vec<String> = store
            .edges_from(&label(), 17)
            .into_iter()
            .map(|e| e.relation)
            .collect();
        assert_eq!(relations, vec!["IsDefinedBy", "IsDefinedBy"]);
    }

    #[tokio::test]
    async fn test_validation_detects_deleted_node() {
        let document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        let report = GraphGenerator::new(&document, &store).generate(true).await.unwrap();
        assert!(report.validation.unwrap().passed());

        store.remove_node(&label(), 21);
        let after = validate(&document, &store, &label()).await.unwrap();
        assert!(!after.passed());
        assert_eq!(after.difference(), 1);
    }

    #[tokio::test]
    async fn test_every_entity_gets_one_role() {
        let document = FixtureDocument::wall_document()
            .with(entity(50, "OwnerHistory", MetaKind::Other, vec![]));
        let store = MemoryStore::new();
        GraphGenerator::new(&document, &store).generate(false).await.unwrap();

        for e in document.entities() {
            let node = store.node(&label(), e.id).unwrap();
            assert_eq!(node.role, NodeEncoder::role_of(e));
        }
    }

    #[tokio::test]
    async fn test_schema_errors_abort_before_edges() {
        let document = FixtureDocument::wall_document()
            .with(entity(60, "Door", MetaKind::ObjectDefinition, vec![]));
        let store = MemoryStore::new();
        let err = GraphGenerator::new(&document, &store).generate(false).await.unwrap_err();

        assert!(matches!(err, crate::error::Ifc2GraphError::SchemaResolution { .. }));
        assert_eq!(store.edge_count(&label()), 0);
    }

    #[tokio::test]
    async fn test_progress_is_reported() {
        let document = FixtureDocument::wall_document();
        let store = MemoryStore::new();
        let recorder = Recorder::default();
        GraphGenerator::new(&document, &store)
            .with_progress(&recorder)
            .generate(false)
            .await
            .unwrap();

        let events = recorder.events.lock();
        assert_eq!(events.len(), 8);
        assert_eq!(events[3], (Stage::Nodes, 4));
        assert_eq!(events[7], (Stage::Edges, 4));
    }
}
