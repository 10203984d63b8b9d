//! Source model: entities, attribute values and the document seam.
//!
//! The engine never parses files itself. Anything that can hand out
//! [`SourceEntity`] records together with a [`SchemaReflection`] can be
//! translated; `ifc2graph-step` provides the P21 implementation.

use std::fmt;

use crate::schema::SchemaReflection;

/// Structural category of an entity class, as answered by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    /// Subtype of `IfcObjectDefinition`.
    ObjectDefinition,
    /// Subtype of `IfcRelationship`.
    Relationship,
    /// Anything else (geometry, units, owner history, ...).
    Other,
}

/// A reference from one entity to another.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub id: u64,
    pub class_name: String,
    /// GlobalId of the target, for rooted entities.
    pub global_id: Option<String>,
}

/// One attribute value as read from the source document.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Enumeration(String),
    Binary(String),
    /// A scalar wrapped in its defined type, e.g. `IFCLABEL('Steel')`.
    Typed {
        type_name: String,
        value: Box<AttributeValue>,
    },
    Entity(EntityRef),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            AttributeValue::Entity(r) => Some(r),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Boolean(_) => "a boolean",
            AttributeValue::Integer(_) => "an integer",
            AttributeValue::Real(_) => "a real",
            AttributeValue::String(_) => "a string",
            AttributeValue::Enumeration(_) => "an enumeration",
            AttributeValue::Binary(_) => "a binary",
            AttributeValue::Typed { .. } => "a typed value",
            AttributeValue::Entity(_) => "an entity reference",
            AttributeValue::List(_) => "a list",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "$"),
            AttributeValue::Boolean(b) => write!(f, "{}", if *b { ".T." } else { ".F." }),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Real(r) => write!(f, "{r:?}"),
            AttributeValue::String(s) => write!(f, "'{s}'"),
            AttributeValue::Enumeration(e) => write!(f, ".{e}."),
            AttributeValue::Binary(b) => write!(f, "\"{b}\""),
            AttributeValue::Typed { type_name, value } => write!(f, "{type_name}({value})"),
            AttributeValue::Entity(r) => write!(f, "#{}", r.id),
            AttributeValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// One instance record of the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntity {
    pub id: u64,
    pub class_name: String,
    pub meta_kind: MetaKind,
    /// Attribute values in declaration order, supertype attributes first.
    pub attributes: Vec<(String, AttributeValue)>,
}

impl SourceEntity {
    /// Value of a declared attribute. Attributes the record does not carry
    /// read as null.
    pub fn attribute(&self, name: &str) -> &AttributeValue {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or(&AttributeValue::Null)
    }

    /// The entity's GlobalId, if it is a rooted entity.
    pub fn global_id(&self) -> Option<&str> {
        match self.attribute("GlobalId") {
            AttributeValue::String(s) => Some(s),
            AttributeValue::Typed { value, .. } => match value.as_ref() {
                AttributeValue::String(s) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An opened source document.
pub trait ModelDocument: Send + Sync {
    /// Schema reflection for the document's schema.
    fn schema(&self) -> &dyn SchemaReflection;

    /// Time stamp from the document header; the model label derives from it.
    fn time_stamp(&self) -> &str;

    /// Every entity of the document, in file order.
    fn entities(&self) -> Box<dyn Iterator<Item = &SourceEntity> + '_>;

    /// Look up one entity by identifier.
    fn entity(&self, id: u64) -> Option<&SourceEntity>;

    fn entity_count(&self) -> usize;
}
