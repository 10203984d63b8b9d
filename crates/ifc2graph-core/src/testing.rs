//! In-memory schema and document fixtures for unit tests.

use std::collections::HashMap;

use crate::error::{Ifc2GraphError, Ifc2GraphResult};
use crate::schema::{AttributeDeclaration, SchemaReflection, SelectAlternative, TypeShape};
use crate::source::{AttributeValue, EntityRef, MetaKind, ModelDocument, SourceEntity};

pub const TIME_STAMP: &str = "2022-05-04T08:08:30";

pub struct FixtureSchema {
    name: String,
    classes: HashMap<String, Vec<AttributeDeclaration>>,
}

impl FixtureSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            classes: HashMap::new(),
        }
    }

    pub fn with_class(mut self, class_name: &str, attributes: Vec<AttributeDeclaration>) -> Self {
        self.classes.insert(class_name.to_string(), attributes);
        self
    }

    /// `Wall`, `OwnerHistory` and `RelDefines`.
    pub fn wall_schema() -> Self {
        Self::new("FIXTURE")
            .with_class(
                "Wall",
                vec![
                    AttributeDeclaration::new("Name", value("IfcLabel")),
                    AttributeDeclaration::new("OwnerHistory", TypeShape::Entity("OwnerHistory".into())),
                    AttributeDeclaration::new(
                        "IsDefinedBy",
                        TypeShape::Aggregation(Box::new(TypeShape::Entity("RelDefines".into()))),
                    ),
                ],
            )
            .with_class(
                "OwnerHistory",
                vec![AttributeDeclaration::new("CreationDate", value("IfcTimeStamp"))],
            )
            .with_class(
                "RelDefines",
                vec![
                    AttributeDeclaration::new("GlobalId", value("IfcGloballyUniqueId")),
                    AttributeDeclaration::new("Name", value("IfcLabel")),
                ],
            )
    }

    /// Property-set classes reached through the mixed-select quirk.
    pub fn property_schema() -> Self {
        let mixed = TypeShape::Select {
            name: "IfcPropertySetDefinitionSelect".into(),
            alternatives: vec![
                SelectAlternative::Entity("IfcPropertySetDefinition".into()),
                SelectAlternative::ValueType("IfcPropertySetDefinitionSet".into()),
            ],
        };
        let rooted = |extra: Vec<AttributeDeclaration>| {
            let mut attrs = vec![
                AttributeDeclaration::new("GlobalId", value("IfcGloballyUniqueId")),
                AttributeDeclaration::new("OwnerHistory", TypeShape::Entity("OwnerHistory".into())),
                AttributeDeclaration::new("Name", value("IfcLabel")),
            ];
            attrs.extend(extra);
            attrs
        };

        Self::wall_schema()
            .with_class(
                "IfcRelDefinesByProperties",
                rooted(vec![
                    AttributeDeclaration::new(
                        "RelatedObjects",
                        TypeShape::Aggregation(Box::new(TypeShape::Entity("Wall".into()))),
                    ),
                    AttributeDeclaration::new("RelatingPropertyDefinition", mixed),
                ]),
            )
            .with_class(
                "IfcPropertySet",
                rooted(vec![AttributeDeclaration::new(
                    "HasProperties",
                    TypeShape::Aggregation(Box::new(TypeShape::Entity("IfcProperty".into()))),
                )]),
            )
            .with_class(
                "IfcElementQuantity",
                rooted(vec![AttributeDeclaration::new(
                    "Quantities",
                    TypeShape::Aggregation(Box::new(TypeShape::Entity("IfcPhysicalQuantity".into()))),
                )]),
            )
            .with_class(
                "IfcPropertySingleValue",
                vec![
                    AttributeDeclaration::new("Name", value("IfcIdentifier")),
                    AttributeDeclaration::new(
                        "NominalValue",
                        TypeShape::Select {
                            name: "IfcValue".into(),
                            alternatives: vec![
                                SelectAlternative::ValueType("IfcLabel".into()),
                                SelectAlternative::Select("IfcMeasureValue".into()),
                            ],
                        },
                    ),
                ],
            )
    }
}

impl SchemaReflection for FixtureSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaration_for(&self, class_name: &str) -> Ifc2GraphResult<Vec<AttributeDeclaration>> {
        self.classes
            .get(class_name)
            .cloned()
            .ok_or_else(|| Ifc2GraphError::SchemaResolution {
                schema: self.name.clone(),
                class_name: class_name.to_string(),
            })
    }
}

pub struct FixtureDocument {
    schema: FixtureSchema,
    time_stamp: String,
    entities: Vec<SourceEntity>,
}

impl FixtureDocument {
    pub fn new(schema: FixtureSchema) -> Self {
        Self {
            schema,
            time_stamp: TIME_STAMP.to_string(),
            entities: Vec::new(),
        }
    }

    pub fn with(mut self, entity: SourceEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn set_attribute(&mut self, id: u64, name: &str, value: AttributeValue) {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| e.id == id)
            .expect("fixture entity exists");
        match entity.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => entity.attributes.push((name.to_string(), value)),
        }
    }

    /// One wall (#17) with an owner history (#1) and two definitions (#20, #21).
    pub fn wall_document() -> Self {
        Self::new(FixtureSchema::wall_schema())
            .with(entity(
                1,
                "OwnerHistory",
                MetaKind::Other,
                vec![("CreationDate", AttributeValue::Integer(1651651710))],
            ))
            .with(entity(
                17,
                "Wall",
                MetaKind::ObjectDefinition,
                vec![
                    ("Name", AttributeValue::String("West Wall".into())),
                    ("OwnerHistory", reference(1, "OwnerHistory", None)),
                    (
                        "IsDefinedBy",
                        AttributeValue::List(vec![
                            reference(20, "RelDefines", Some("guid-a")),
                            reference(21, "RelDefines", Some("guid-b")),
                        ]),
                    ),
                ],
            ))
            .with(entity(
                20,
                "RelDefines",
                MetaKind::Relationship,
                vec![
                    ("GlobalId", AttributeValue::String("guid-a".into())),
                    ("Name", AttributeValue::Null),
                ],
            ))
            .with(entity(
                21,
                "RelDefines",
                MetaKind::Relationship,
                vec![
                    ("GlobalId", AttributeValue::String("guid-b".into())),
                    ("Name", AttributeValue::Null),
                ],
            ))
    }
}

impl ModelDocument for FixtureDocument {
    fn schema(&self) -> &dyn SchemaReflection {
        &self.schema
    }

    fn time_stamp(&self) -> &str {
        &self.time_stamp
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &SourceEntity> + '_> {
        Box::new(self.entities.iter())
    }

    fn entity(&self, id: u64) -> Option<&SourceEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

pub fn value(name: &str) -> TypeShape {
    TypeShape::ValueType(name.to_string())
}

pub fn reference(id: u64, class_name: &str, global_id: Option<&str>) -> AttributeValue {
    AttributeValue::Entity(EntityRef {
        id,
        class_name: class_name.to_string(),
        global_id: global_id.map(str::to_string),
    })
}

pub fn entity(id: u64, class_name: &str, meta_kind: MetaKind, attributes: Vec<(&str, AttributeValue)>) -> SourceEntity {
    SourceEntity {
        id,
        class_name: class_name.to_string(),
        meta_kind,
        attributes: attributes
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect(),
    }
}
