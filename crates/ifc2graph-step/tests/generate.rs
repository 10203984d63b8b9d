use std::path::PathBuf;

use pretty_assertions::assert_eq;

use ifc2graph_core::export::{export_arrows, ArrowsOptions};
use ifc2graph_core::store::{PropertyValue, WriteCommand};
use ifc2graph_core::{GraphGenerator, MemoryStore, ModelDocument, ModelLabel, NodeRole};
use ifc2graph_step::{IfcDocument, SchemaSource};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn open_wall() -> IfcDocument {
    IfcDocument::open(&fixtures().join("wall.ifc"), &SchemaSource::Directory(fixtures())).unwrap()
}

fn label() -> ModelLabel {
    ModelLabel::new("ts20230112T142005")
}

#[tokio::test]
async fn test_generate_wall_model() {
    let document = open_wall();
    let store = MemoryStore::new();

    let report = GraphGenerator::new(&document, &store).generate(true).await.unwrap();

    assert_eq!(report.label, label());
    assert_eq!(report.nodes, 6);
    assert_eq!(report.edges, 6);
    assert_eq!(report.recovered_edges, 1);
    assert_eq!(report.skipped_elements, 0);
    assert_eq!(report.purged_nodes, 0);
    assert!(report.validation.as_ref().unwrap().passed());

    let wall = store.node(&label(), 10).unwrap();
    assert_eq!(wall.role, NodeRole::PrimaryNode);
    assert_eq!(wall.class_name, "IfcWall");
    assert_eq!(wall.properties["Name"], PropertyValue::String("West Wall".into()));
    assert_eq!(wall.properties["PredefinedType"], PropertyValue::String("STANDARD".into()));
    assert_eq!(wall.properties["EntityType"], PropertyValue::String("IfcWall".into()));
    assert!(!wall.properties.contains_key("Description"));

    assert_eq!(store.node(&label(), 40).unwrap().role, NodeRole::ConnectionNode);
    assert_eq!(store.node(&label(), 30).unwrap().role, NodeRole::SecondaryNode);
}

#[tokio::test]
async fn test_scalar_wrappers_and_tuples() {
    let document = open_wall();
    let store = MemoryStore::new();
    GraphGenerator::new(&document, &store).generate(false).await.unwrap();

    let property = store.node(&label(), 20).unwrap();
    assert_eq!(
        property.properties["NominalValue"],
        PropertyValue::String("IfcLabel(EI 90)".into())
    );

    let point = store.node(&label(), 50).unwrap();
    assert_eq!(
        point.properties["Coordinates"],
        PropertyValue::List(vec![
            PropertyValue::Float(0.0),
            PropertyValue::Float(1.5),
            PropertyValue::Float(0.0),
        ])
    );
    assert!(store.edges_from(&label(), 50).is_empty());
}

#[tokio::test]
async fn test_property_set_is_recovered_without_sequence() {
    let document = open_wall();
    let store = MemoryStore::new();
    GraphGenerator::new(&document, &store).generate(false).await.unwrap();

    let edges: Vec<(u64, String, Option<usize>)> = store
        .edges_from(&label(), 40)
        .into_iter()
        .map(|e| (e.target, e.relation, e.sequence))
        .collect();
    assert_eq!(
        edges,
        vec![
            (1, "OwnerHistory".to_string(), None),
            (10, "RelatedObjects".to_string(), Some(0)),
            (30, "RelatingPropertyDefinition".to_string(), None),
        ]
    );

    let pset: Vec<(u64, String, Option<usize>)> = store
        .edges_from(&label(), 30)
        .into_iter()
        .map(|e| (e.target, e.relation, e.sequence))
        .collect();
    assert_eq!(
        pset,
        vec![
            (1, "OwnerHistory".to_string(), None),
            (20, "HasProperties".to_string(), Some(0)),
        ]
    );
}

#[tokio::test]
async fn test_second_run_purges_and_matches() {
    let document = open_wall();
    let store = MemoryStore::new();

    let first = GraphGenerator::new(&document, &store).generate(false).await.unwrap();
    let edges = store.edges(&label());
    let second = GraphGenerator::new(&document, &store).generate(true).await.unwrap();

    assert_eq!(second.purged_nodes, 6);
    assert_eq!(store.edges(&label()), edges);
    assert_eq!(second.log.len(), first.log.len() + 1);
    assert!(matches!(second.log.commands()[0], WriteCommand::PurgeLabel { .. }));
    assert!(second.validation.unwrap().passed());
}

#[tokio::test]
async fn test_write_log_script() {
    let document = open_wall();
    let store = MemoryStore::new();
    let report = GraphGenerator::new(&document, &store).generate(false).await.unwrap();

    let script = report.log.to_cypher_script();
    assert_eq!(script.lines().count(), 12);
    assert!(script.starts_with("MERGE (n:`ts20230112T142005` {p21_id: 1}) SET n:`SecondaryNode`:`IfcOwnerHistory`"));
    assert!(script.contains("MERGE (source)-[r:rel {rel_type: \"RelatingPropertyDefinition\"}]->(target)"));
}

#[tokio::test]
async fn test_enumerated_values_are_skipped() {
    let document =
        IfcDocument::open(&fixtures().join("enumerated.ifc"), &SchemaSource::Directory(fixtures())).unwrap();
    let store = MemoryStore::new();

    let report = GraphGenerator::new(&document, &store).generate(true).await.unwrap();

    let label = ModelLabel::new("ts20230203T091500");
    assert_eq!(report.label, label);
    assert_eq!(report.nodes, 4);
    assert_eq!(report.edges, 3);
    assert_eq!(report.skipped_elements, 2);
    assert_eq!(report.recovered_edges, 0);
    assert!(report.validation.unwrap().passed());

    assert!(store.edges_from(&label, 20).is_empty());
    assert!(store.edges_from(&label, 21).is_empty());
    let status = store.node(&label, 20).unwrap();
    assert_eq!(status.properties["Name"], PropertyValue::String("Status".into()));
    assert!(!status.properties.contains_key("EnumerationValues"));

    let pset: Vec<(u64, String, Option<usize>)> = store
        .edges_from(&label, 30)
        .into_iter()
        .map(|e| (e.target, e.relation, e.sequence))
        .collect();
    assert_eq!(
        pset,
        vec![
            (1, "OwnerHistory".to_string(), None),
            (20, "HasProperties".to_string(), Some(0)),
            (21, "HasProperties".to_string(), Some(1)),
        ]
    );
}

#[test]
fn test_arrows_export() {
    let document = open_wall();
    let arrows = export_arrows(&document, ArrowsOptions { ignore_null_values: true }).unwrap();

    let ids: Vec<&str> = arrows.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n10", "n40"]);
    assert_eq!(arrows.relationships.len(), 1);
    assert_eq!(arrows.relationships[0].from_id, "n40");
    assert_eq!(arrows.relationships[0].to_id, "n10");
    assert!(!arrows.nodes[0].properties.contains_key("Description"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall_arrowsVis.json");
    arrows.write_to(&path).unwrap();
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["nodes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_header_and_lookup() {
    let document = open_wall();
    assert_eq!(document.time_stamp(), "2023-01-12T14:20:05");
    assert_eq!(document.header().schema_identifiers, vec!["IFCMINI"]);
    assert_eq!(document.entity(30).unwrap().global_id(), Some("0fB2ugKKz1HwK3w2yV9Jk0"));
    assert_eq!(document.entity_count(), 6);
}
