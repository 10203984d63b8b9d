//! Schema reflection seam: declared attributes and their type shapes.

use std::fmt;

use crate::error::Ifc2GraphResult;

/// One alternative of a SELECT type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectAlternative {
    Entity(String),
    ValueType(String),
    Enumeration(String),
    Select(String),
}

impl SelectAlternative {
    pub fn is_entity(&self) -> bool {
        matches!(self, SelectAlternative::Entity(_))
    }
}

/// Shape of an attribute's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// An inline primitive such as `INTEGER` or `BOOLEAN`.
    Simple(String),
    /// A named defined type (`TYPE IfcLabel = STRING;`).
    ValueType(String),
    Enumeration(String),
    Entity(String),
    Select {
        name: String,
        alternatives: Vec<SelectAlternative>,
    },
    /// An inline LIST/SET/BAG/ARRAY.
    Aggregation(Box<TypeShape>),
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Simple(name) => write!(f, "simple {name}"),
            TypeShape::ValueType(name) => write!(f, "type {name}"),
            TypeShape::Enumeration(name) => write!(f, "enumeration {name}"),
            TypeShape::Entity(name) => write!(f, "entity {name}"),
            TypeShape::Select { name, .. } => write!(f, "select {name}"),
            TypeShape::Aggregation(inner) => write!(f, "aggregation of {inner}"),
        }
    }
}

/// A declared (explicit) attribute of an entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDeclaration {
    pub name: String,
    pub shape: TypeShape,
}

impl AttributeDeclaration {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// Ask a schema about the attributes of its entity classes.
pub trait SchemaReflection: Send + Sync {
    /// Schema identifier, e.g. `IFC4`.
    fn name(&self) -> &str;

    /// All explicit attributes of `class_name`, inherited ones first.
    ///
    /// Fails with `SchemaResolution` when the class is unknown.
    fn declaration_for(&self, class_name: &str) -> Ifc2GraphResult<Vec<AttributeDeclaration>>;
}
