//! Node encoder.

use std::mem::discriminant;

use tracing::debug;

use crate::classify::{classify, ID_ATTRIBUTE, TYPE_ATTRIBUTE};
use crate::error::Ifc2GraphResult;
use crate::label::ModelLabel;
use crate::schema::SchemaReflection;
use crate::source::{AttributeValue, MetaKind, SourceEntity};
use crate::store::{
    GraphStore, NodeMerge, NodeRef, NodeRole, PropertyMap, PropertyValue, WriteCommand, WriteLog,
    ENTITY_TYPE_PROPERTY, P21_ID_PROPERTY,
};

/// Encodes entities as role-labelled nodes under one model label.
pub struct NodeEncoder<'a> {
    schema: &'a dyn SchemaReflection,
    label: &'a ModelLabel,
}

impl<'a> NodeEncoder<'a> {
    pub fn new(schema: &'a dyn SchemaReflection, label: &'a ModelLabel) -> Self {
        Self { schema, label }
    }

    /// Role of an entity's node, decided by its class ancestry alone.
    pub fn role_of(entity: &SourceEntity) -> NodeRole {
        match entity.meta_kind {
            MetaKind::ObjectDefinition => NodeRole::PrimaryNode,
            MetaKind::Relationship => NodeRole::ConnectionNode,
            MetaKind::Other => NodeRole::SecondaryNode,
        }
    }

    /// Build the node write for `entity` without touching a store.
    pub fn encode(&self, entity: &SourceEntity) -> Ifc2GraphResult<NodeMerge> {
        let classified = classify(self.schema, &entity.class_name)?;
        let mut properties = PropertyMap::new();

        for name in &classified.node_attributes {
            match name.as_str() {
                ID_ATTRIBUTE => {
                    properties.insert(P21_ID_PROPERTY.to_string(), PropertyValue::Integer(entity.id as i64));
                }
                TYPE_ATTRIBUTE => {
                    properties.insert(
                        ENTITY_TYPE_PROPERTY.to_string(),
                        PropertyValue::String(entity.class_name.clone()),
                    );
                }
                _ => {
                    if let Some(value) = property_value(entity.attribute(name)) {
                        properties.insert(name.clone(), value);
                    }
                }
            }
        }

        Ok(NodeMerge {
            label: self.label.clone(),
            role: Self::role_of(entity),
            class_name: entity.class_name.clone(),
            p21_id: entity.id,
            properties,
        })
    }

    /// Encode `entity` and merge it into `store`, recording the write.
    pub async fn emit<S>(&self, store: &S, entity: &SourceEntity, log: &mut WriteLog) -> Ifc2GraphResult<NodeRef>
    where
        S: GraphStore + ?Sized,
    {
        let node = self.encode(entity)?;
        debug!(
            p21_id = node.p21_id,
            class_name = %node.class_name,
            role = %node.role,
            properties = node.properties.len(),
            "Merging node"
        );
        let node_ref = store.merge_node(&node).await?;
        log.push(WriteCommand::MergeNode(node));
        Ok(node_ref)
    }
}

/// Convert an attribute value into something a node can carry.
///
/// Nulls yield `None`. Typed scalars become `TypeName(raw)` with quote
/// characters removed, entity references become `#id`, and lists that are
/// not a flat run of one scalar kind are stringified element-wise.
pub fn property_value(value: &AttributeValue) -> Option<PropertyValue> {
    match value {
        AttributeValue::Null => None,
        AttributeValue::Boolean(b) => Some(PropertyValue::Bool(*b)),
        AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
        AttributeValue::Real(x) => Some(PropertyValue::Float(*x)),
        AttributeValue::String(s) | AttributeValue::Enumeration(s) | AttributeValue::Binary(s) => {
            Some(PropertyValue::String(s.clone()))
        }
        AttributeValue::Typed { type_name, value } => {
            let raw = value.to_string().replace('\'', "");
            Some(PropertyValue::String(format!("{type_name}({raw})")))
        }
        AttributeValue::Entity(r) => Some(PropertyValue::String(format!("#{}", r.id))),
        AttributeValue::List(items) => Some(list_value(items)),
    }
}

fn list_value(items: &[AttributeValue]) -> PropertyValue {
    let converted: Vec<Option<PropertyValue>> = items.iter().map(property_value).collect();

    let homogeneous = match converted.first() {
        Some(Some(first)) if !matches!(first, PropertyValue::List(_)) => converted
            .iter()
            .all(|v| matches!(v, Some(v) if discriminant(v) == discriminant(first))),
        _ => converted.is_empty(),
    };

    if homogeneous {
        return PropertyValue::List(converted.into_iter().flatten().collect());
    }

    PropertyValue::List(
        converted
            .into_iter()
            .map(|v| PropertyValue::String(v.map(|v| v.to_string()).unwrap_or_default()))
            .collect(),
    )
}
