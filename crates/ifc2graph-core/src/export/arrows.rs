//! Arrows.app drawing of a model.
//!
//! Produces the JSON accepted by arrows.app: one node per object definition
//! and relationship entity, laid out on a single row, and the edges between
//! them. Secondary nodes are not drawn.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::classify::{classify, ID_ATTRIBUTE, TYPE_ATTRIBUTE};
use crate::encode::{property_value, NodeEncoder};
use crate::error::Ifc2GraphResult;
use crate::source::{AttributeValue, ModelDocument, SourceEntity};
use crate::store::{NodeRole, PropertyValue, ENTITY_TYPE_PROPERTY, LIST_ITEM_PROPERTY};

const X_STEP: i64 = 100;
const NODE_RADIUS: u32 = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowsOptions {
    /// Leave null attributes out of node properties.
    pub ignore_null_values: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowsPosition {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowsNode {
    pub id: String,
    pub position: ArrowsPosition,
    pub caption: String,
    pub style: Map<String, Value>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowsRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub relation: String,
    pub style: Map<String, Value>,
    pub properties: Map<String, Value>,
    #[serde(rename = "fromId")]
    pub from_id: String,
    #[serde(rename = "toId")]
    pub to_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowsDocument {
    pub nodes: Vec<ArrowsNode>,
    pub relationships: Vec<ArrowsRelationship>,
    pub style: Map<String, Value>,
}

impl ArrowsDocument {
    pub fn to_json(&self) -> Ifc2GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to `path`.
    pub fn write_to(&self, path: &Path) -> Ifc2GraphResult<()> {
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), nodes = self.nodes.len(), relationships = self.relationships.len(), "Arrows drawing written");
        Ok(())
    }
}

/// `<stem>_arrowsVis.json` next to the model file.
pub fn default_output_path(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    model_path.with_file_name(format!("{stem}_arrowsVis.json"))
}

fn border_color(role: NodeRole) -> &'static str {
    match role {
        NodeRole::PrimaryNode => "#0062b1",
        NodeRole::SecondaryNode => "#fcc400",
        NodeRole::ConnectionNode => "#68bc00",
    }
}

fn node_id(p21_id: u64) -> String {
    format!("n{p21_id}")
}

fn is_drawn(entity: &SourceEntity) -> bool {
    NodeEncoder::role_of(entity) != NodeRole::SecondaryNode
}

fn default_style() -> Map<String, Value> {
    let style = json!({
        "node-color": "#ffffff",
        "border-width": 4,
        "radius": 50,
        "arrow-width": 5,
        "font-size": 20,
        "caption-position": "inside",
        "property-position": "outside",
    });
    match style {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// JSON form of one node attribute. Lists are drawn as their text.
fn json_value(value: &AttributeValue) -> Value {
    match property_value(value) {
        None => Value::Null,
        Some(PropertyValue::Bool(b)) => Value::Bool(b),
        Some(PropertyValue::Integer(i)) => Value::from(i),
        Some(PropertyValue::Float(x)) => Value::from(x),
        Some(PropertyValue::String(s)) => Value::String(s),
        Some(list @ PropertyValue::List(_)) => Value::String(list.to_string()),
    }
}

struct RelationshipWriter<'a> {
    drawn: &'a HashSet<u64>,
    relationships: Vec<ArrowsRelationship>,
}

impl RelationshipWriter<'_> {
    fn push(&mut self, source: u64, target: u64, relation: &str, list_item: Option<usize>) {
        if !self.drawn.contains(&target) {
            debug!(source, target, relation, "Skipping relationship to undrawn node");
            return;
        }
        let mut properties = Map::new();
        if let Some(i) = list_item {
            properties.insert(LIST_ITEM_PROPERTY.to_string(), Value::String(i.to_string()));
        }
        self.relationships.push(ArrowsRelationship {
            id: format!("r{}", self.relationships.len()),
            relation: relation.to_string(),
            style: Map::new(),
            properties,
            from_id: node_id(source),
            to_id: node_id(target),
        });
    }
}

/// Build the arrows drawing of `document`.
pub fn export_arrows(document: &dyn ModelDocument, options: ArrowsOptions) -> Ifc2GraphResult<ArrowsDocument> {
    let schema = document.schema();
    let drawn: HashSet<u64> = document
        .entities()
        .filter(|e| is_drawn(e))
        .map(|e| e.id)
        .collect();

    let mut nodes = Vec::new();
    let mut writer = RelationshipWriter {
        drawn: &drawn,
        relationships: Vec::new(),
    };
    let mut x = 0;

    for entity in document.entities().filter(|e| is_drawn(e)) {
        let classified = classify(schema, &entity.class_name)?;

        let mut properties = Map::new();
        for name in &classified.node_attributes {
            let (key, value) = match name.as_str() {
                ID_ATTRIBUTE => continue,
                TYPE_ATTRIBUTE => (ENTITY_TYPE_PROPERTY.to_string(), Value::String(entity.class_name.clone())),
                _ => (name.clone(), json_value(entity.attribute(name))),
            };
            if options.ignore_null_values && value.is_null() {
                continue;
            }
            properties.insert(key, value);
        }

        let mut style = Map::new();
        style.insert(
            "border-color".into(),
            Value::String(border_color(NodeEncoder::role_of(entity)).into()),
        );
        style.insert("radius".into(), Value::from(NODE_RADIUS));

        nodes.push(ArrowsNode {
            id: node_id(entity.id),
            position: ArrowsPosition { x, y: 0 },
            caption: entity.id.to_string(),
            style,
            properties,
        });
        x += X_STEP;

        for name in &classified.single_associations {
            if let Some(target) = entity.attribute(name).as_entity() {
                writer.push(entity.id, target.id, name, None);
            }
        }
        for name in &classified.aggregated_associations {
            match entity.attribute(name) {
                AttributeValue::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if let Some(target) = item.as_entity() {
                            writer.push(entity.id, target.id, name, Some(i));
                        }
                    }
                }
                AttributeValue::Entity(target) => writer.push(entity.id, target.id, name, None),
                _ => {}
            }
        }
    }

    Ok(ArrowsDocument {
        nodes,
        relationships: writer.relationships,
        style: default_style(),
    })
}
