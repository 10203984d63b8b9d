//! Attribute classification.
//!
//! Partitions the declared attributes of an entity class into node
//! properties, single associations and aggregated associations. The result
//! depends only on the schema, the class name and the attribute name.

pub mod exceptions;
pub mod quirks;

use serde::Serialize;
use tracing::trace;

use crate::error::{Ifc2GraphError, Ifc2GraphResult};
use crate::schema::{AttributeDeclaration, SchemaReflection, SelectAlternative, TypeShape};

/// Reserved attribute carrying the entity identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// Reserved attribute carrying the entity class name.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Where an attribute ends up in the property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeCategory {
    /// A property on the entity's node.
    Node,
    /// One edge to the referenced entity.
    SingleAssociation,
    /// One edge per element, carrying the element's position.
    AggregatedAssociation,
}

/// The three disjoint attribute name lists of one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedAttributes {
    pub node_attributes: Vec<String>,
    pub single_associations: Vec<String>,
    pub aggregated_associations: Vec<String>,
}

impl ClassifiedAttributes {
    /// Category of `attribute`, if the class declares it.
    pub fn category_of(&self, attribute: &str) -> Option<AttributeCategory> {
        if self.node_attributes.iter().any(|a| a == attribute) {
            Some(AttributeCategory::Node)
        } else if self.single_associations.iter().any(|a| a == attribute) {
            Some(AttributeCategory::SingleAssociation)
        } else if self.aggregated_associations.iter().any(|a| a == attribute) {
            Some(AttributeCategory::AggregatedAssociation)
        } else {
            None
        }
    }
}

/// Classify every declared attribute of `class_name`.
///
/// The reserved `id` and `type` names are appended to the node attributes.
pub fn classify(schema: &dyn SchemaReflection, class_name: &str) -> Ifc2GraphResult<ClassifiedAttributes> {
    let declarations = schema.declaration_for(class_name)?;
    let mut classified = ClassifiedAttributes::default();

    for declaration in &declarations {
        let category = classify_attribute(class_name, declaration)?;
        trace!(class_name, attribute = %declaration.name, ?category, "Classified attribute");

        let target = match category {
            AttributeCategory::Node => &mut classified.node_attributes,
            AttributeCategory::SingleAssociation => &mut classified.single_associations,
            AttributeCategory::AggregatedAssociation => &mut classified.aggregated_associations,
        };
        target.push(declaration.name.clone());
    }

    classified.node_attributes.push(ID_ATTRIBUTE.to_string());
    classified.node_attributes.push(TYPE_ATTRIBUTE.to_string());
    Ok(classified)
}

/// Classify one attribute declaration. Rules apply in precedence order.
pub fn classify_attribute(
    class_name: &str,
    declaration: &AttributeDeclaration,
) -> Ifc2GraphResult<AttributeCategory> {
    let name = declaration.name.as_str();

    if exceptions::is_scalar_exception(name) {
        return Ok(AttributeCategory::Node);
    }

    let shape = &declaration.shape;
    if is_value_like(shape) {
        return Ok(AttributeCategory::Node);
    }
    if is_entity_like(shape) {
        return Ok(AttributeCategory::SingleAssociation);
    }
    if is_collection_like(shape) {
        if exceptions::is_tuple_exception(name) {
            return Ok(AttributeCategory::Node);
        }
        return Ok(AttributeCategory::AggregatedAssociation);
    }

    Err(Ifc2GraphError::UnclassifiableAttribute {
        class_name: class_name.to_string(),
        attribute: name.to_string(),
        shape: shape.to_string(),
    })
}

/// Value type, enumeration, or a select of value types and nested selects.
fn is_value_like(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::ValueType(_) | TypeShape::Enumeration(_) => true,
        TypeShape::Select { alternatives, .. } => {
            !alternatives.is_empty()
                && alternatives.iter().all(|a| {
                    matches!(a, SelectAlternative::ValueType(_) | SelectAlternative::Select(_))
                })
        }
        _ => false,
    }
}

/// Entity reference, or a select of entities only.
fn is_entity_like(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Entity(_) => true,
        TypeShape::Select { alternatives, .. } => {
            !alternatives.is_empty() && alternatives.iter().all(SelectAlternative::is_entity)
        }
        _ => false,
    }
}

/// Inline aggregation, or a select the mixed-select quirk turns into one.
fn is_collection_like(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Aggregation(_) => true,
        TypeShape::Select { alternatives, .. } => quirks::mixed_select_is_aggregation(alternatives),
        _ => false,
    }
}
