//! An opened IFC model: P21 instances resolved against an EXPRESS schema.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ifc2graph_core::error::{Ifc2GraphError, Ifc2GraphResult};
use ifc2graph_core::schema::SchemaReflection;
use ifc2graph_core::source::{AttributeValue, EntityRef, ModelDocument, SourceEntity};

use crate::express::ExpressSchema;
use crate::p21::{self, Header, RawRecord, RawValue};

const GLOBAL_ID: &str = "GlobalId";

/// Where the EXPRESS schema for a model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// One schema file, used whatever the model declares.
    File(PathBuf),
    /// A directory holding `<FILE_SCHEMA>.exp` files.
    Directory(PathBuf),
}

impl SchemaSource {
    /// Load the schema for a model declaring `identifier` in its header.
    pub fn load(&self, identifier: &str) -> Ifc2GraphResult<ExpressSchema> {
        match self {
            SchemaSource::File(path) => ExpressSchema::load(path),
            SchemaSource::Directory(dir) => {
                if identifier.is_empty() {
                    return Err(Ifc2GraphError::open("model header declares no FILE_SCHEMA"));
                }
                let exact = dir.join(format!("{identifier}.exp"));
                let path = if exact.exists() {
                    exact
                } else {
                    dir.join(format!("{}.exp", identifier.to_ascii_uppercase()))
                };
                if !path.exists() {
                    return Err(Ifc2GraphError::open(format!(
                        "no schema file for {identifier} in {}",
                        dir.display()
                    )));
                }
                ExpressSchema::load(&path)
            }
        }
    }
}

#[derive(Debug)]
pub struct IfcDocument {
    schema: ExpressSchema,
    header: Header,
    entities: Vec<SourceEntity>,
    index: HashMap<u64, usize>,
}

impl IfcDocument {
    /// Read and resolve the model at `path`.
    pub fn open(path: &Path, schema: &SchemaSource) -> Ifc2GraphResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Ifc2GraphError::open(format!("cannot read {}: {e}", path.display())))?;
        let file = p21::parse(&text)?;
        let identifier = file.header.schema_identifiers.first().cloned().unwrap_or_default();
        let schema = schema.load(&identifier)?;

        let document = Self::resolve(file, schema)?;
        info!(
            path = %path.display(),
            schema = document.schema.name(),
            entities = document.entities.len(),
            time_stamp = %document.header.time_stamp,
            "Opened IFC model"
        );
        Ok(document)
    }

    /// Resolve P21 text against an already loaded schema.
    pub fn parse(text: &str, schema: ExpressSchema) -> Ifc2GraphResult<Self> {
        Self::resolve(p21::parse(text)?, schema)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn resolve(file: p21::P21File, schema: ExpressSchema) -> Ifc2GraphResult<Self> {
        // id -> (declared class name, parameters)
        let mut records: HashMap<u64, (String, &[RawValue])> = HashMap::with_capacity(file.instances.len());
        for instance in &file.instances {
            let (class_name, parameters) = match &instance.record {
                RawRecord::Simple { class_name, parameters } => (class_name, parameters),
                RawRecord::Complex(_) => {
                    return Err(Ifc2GraphError::open(format!(
                        "#{}: complex entity instances are not supported",
                        instance.id
                    )))
                }
            };
            let canonical = schema.canonical_entity(class_name).ok_or_else(|| {
                Ifc2GraphError::open(format!(
                    "#{}: entity class {class_name} is not declared in schema {}",
                    instance.id,
                    schema.name()
                ))
            })?;
            if records
                .insert(instance.id, (canonical.to_string(), parameters.as_slice()))
                .is_some()
            {
                return Err(Ifc2GraphError::open(format!("#{} is defined twice", instance.id)));
            }
        }

        let mut attribute_names: HashMap<String, Vec<String>> = HashMap::new();
        for (class_name, _) in records.values() {
            if !attribute_names.contains_key(class_name) {
                let names = schema
                    .declaration_for(class_name)?
                    .into_iter()
                    .map(|d| d.name)
                    .collect();
                attribute_names.insert(class_name.clone(), names);
            }
        }

        let mut global_ids: HashMap<u64, String> = HashMap::new();
        for (id, (class_name, parameters)) in &records {
            let position = attribute_names[class_name].iter().position(|n| n == GLOBAL_ID);
            if let Some(global_id) = position.and_then(|i| parameters.get(i)).and_then(raw_string) {
                global_ids.insert(*id, global_id);
            }
        }

        let resolver = Resolver {
            schema: &schema,
            records: &records,
            global_ids: &global_ids,
        };

        let mut entities = Vec::with_capacity(file.instances.len());
        let mut index = HashMap::with_capacity(file.instances.len());
        for instance in &file.instances {
            let (class_name, parameters) = &records[&instance.id];
            let names = &attribute_names[class_name];
            if names.len() != parameters.len() {
                return Err(Ifc2GraphError::open(format!(
                    "#{} ({class_name}) has {} parameters, schema {} declares {}",
                    instance.id,
                    parameters.len(),
                    schema.name(),
                    names.len()
                )));
            }

            let attributes = names
                .iter()
                .zip(parameters.iter())
                .map(|(name, raw)| Ok((name.clone(), resolver.value(instance.id, raw)?)))
                .collect::<Ifc2GraphResult<Vec<_>>>()?;

            index.insert(instance.id, entities.len());
            entities.push(SourceEntity {
                id: instance.id,
                class_name: class_name.clone(),
                meta_kind: schema.meta_kind(class_name),
                attributes,
            });
        }
        debug!(entities = entities.len(), rooted = global_ids.len(), "Resolved P21 instances");

        Ok(Self {
            schema,
            header: file.header,
            entities,
            index,
        })
    }
}

fn raw_string(value: &RawValue) -> Option<String> {
    match value {
        RawValue::String(s) => Some(s.clone()),
        RawValue::Typed(_, inner) => raw_string(inner),
        _ => None,
    }
}

struct Resolver<'a> {
    schema: &'a ExpressSchema,
    records: &'a HashMap<u64, (String, &'a [RawValue])>,
    global_ids: &'a HashMap<u64, String>,
}

impl Resolver<'_> {
    fn value(&self, owner: u64, raw: &RawValue) -> Ifc2GraphResult<AttributeValue> {
        Ok(match raw {
            RawValue::Null | RawValue::Derived => AttributeValue::Null,
            RawValue::Integer(i) => AttributeValue::Integer(*i),
            RawValue::Real(x) => AttributeValue::Real(*x),
            RawValue::String(s) => AttributeValue::String(s.clone()),
            RawValue::Binary(b) => AttributeValue::Binary(b.clone()),
            RawValue::Enumeration(e) => match e.as_str() {
                "T" => AttributeValue::Boolean(true),
                "F" => AttributeValue::Boolean(false),
                _ => AttributeValue::Enumeration(e.clone()),
            },
            RawValue::Reference(id) => {
                let (class_name, _) = self.records.get(id).ok_or_else(|| {
                    Ifc2GraphError::open(format!("#{owner} references #{id}, which is not defined"))
                })?;
                AttributeValue::Entity(EntityRef {
                    id: *id,
                    class_name: class_name.clone(),
                    global_id: self.global_ids.get(id).cloned(),
                })
            }
            RawValue::List(items) => AttributeValue::List(
                items
                    .iter()
                    .map(|item| self.value(owner, item))
                    .collect::<Ifc2GraphResult<_>>()?,
            ),
            RawValue::Typed(type_name, inner) => AttributeValue::Typed {
                type_name: self
                    .schema
                    .canonical_type(type_name)
                    .map(str::to_string)
                    .unwrap_or_else(|| type_name.clone()),
                value: Box::new(self.value(owner, inner)?),
            },
        })
    }
}

impl ModelDocument for IfcDocument {
    fn schema(&self) -> &dyn SchemaReflection {
        &self.schema
    }

    fn time_stamp(&self) -> &str {
        &self.header.time_stamp
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &SourceEntity> + '_> {
        Box::new(self.entities.iter())
    }

    fn entity(&self, id: u64) -> Option<&SourceEntity> {
        self.index.get(&id).map(|i| &self.entities[*i])
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc2graph_core::source::MetaKind;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = "SCHEMA IFCTEST;
TYPE IfcLabel = STRING;
END_TYPE;
TYPE IfcGloballyUniqueId = STRING;
END_TYPE;
ENTITY IfcRoot;
  GlobalId : IfcGloballyUniqueId;
  Name : OPTIONAL IfcLabel;
END_ENTITY;
ENTITY IfcObjectDefinition SUBTYPE OF (IfcRoot);
END_ENTITY;
ENTITY IfcRelationship SUBTYPE OF (IfcRoot);
  RelatedObjects : SET [1:?] OF IfcObjectDefinition;
END_ENTITY;
ENTITY IfcPerson;
  FamilyName : OPTIONAL IfcLabel;
  Active : BOOLEAN;
END_ENTITY;
END_SCHEMA;
";

    fn model(data: &str) -> String {
        format!(
            "ISO-10303-21;
HEADER;
FILE_DESCRIPTION((''),'2;1');
FILE_NAME('t.ifc','2022-05-04T08:08:30',(''),(''),'','','');
FILE_SCHEMA(('IFCTEST'));
ENDSEC;
DATA;
{data}
ENDSEC;
END-ISO-10303-21;
"
        )
    }

    fn open(data: &str) -> Ifc2GraphResult<IfcDocument> {
        IfcDocument::parse(&model(data), ExpressSchema::parse(SCHEMA).unwrap())
    }

    #[test]
    fn test_resolves_references_and_names() {
        let document = open(
            "#1=IFCOBJECTDEFINITION('obj-guid',IFCLABEL('Slab'));
#2=IFCRELATIONSHIP('rel-guid',$,(#1));
#3=IFCPERSON('Doe',.F.);",
        )
        .unwrap();

        assert_eq!(document.entity_count(), 3);
        assert_eq!(document.time_stamp(), "2022-05-04T08:08:30");

        let obj = document.entity(1).unwrap();
        assert_eq!(obj.class_name, "IfcObjectDefinition");
        assert_eq!(obj.meta_kind, MetaKind::ObjectDefinition);
        assert_eq!(obj.global_id(), Some("obj-guid"));
        assert_eq!(
            obj.attribute("Name"),
            &AttributeValue::Typed {
                type_name: "IfcLabel".into(),
                value: Box::new(AttributeValue::String("Slab".into())),
            }
        );

        let rel = document.entity(2).unwrap();
        assert_eq!(rel.meta_kind, MetaKind::Relationship);
        assert_eq!(
            rel.attribute("RelatedObjects"),
            &AttributeValue::List(vec![AttributeValue::Entity(EntityRef {
                id: 1,
                class_name: "IfcObjectDefinition".into(),
                global_id: Some("obj-guid".into()),
            })])
        );

        let person = document.entity(3).unwrap();
        assert_eq!(person.meta_kind, MetaKind::Other);
        assert_eq!(person.attribute("Active"), &AttributeValue::Boolean(false));
    }

    #[test]
    fn test_entities_keep_file_order() {
        let document = open("#9=IFCPERSON($,.T.);\n#4=IFCPERSON($,.U.);").unwrap();
        let ids: Vec<u64> = document.entities().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 4]);
        assert_eq!(
            document.entity(4).unwrap().attribute("Active"),
            &AttributeValue::Enumeration("U".into())
        );
    }

    #[test]
    fn test_dangling_reference() {
        let err = open("#2=IFCRELATIONSHIP('rel-guid',$,(#7));").unwrap_err();
        assert!(err.to_string().contains("#7"), "{err}");
    }

    #[test]
    fn test_unknown_class() {
        let err = open("#1=IFCDOOR('x');").unwrap_err();
        assert!(matches!(err, Ifc2GraphError::Open(ref m) if m.contains("IFCDOOR")));
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let err = open("#1=IFCPERSON('Doe');").unwrap_err();
        assert!(err.to_string().contains("has 1 parameters"), "{err}");
    }

    #[test]
    fn test_complex_instances_are_rejected() {
        let err = open("#1=(IFCPERSON($,.T.) IFCROOT('g',$));").unwrap_err();
        assert!(err.to_string().contains("complex"), "{err}");
    }

    #[test]
    fn test_schema_directory_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("IFCTEST.exp"), SCHEMA).unwrap();
        let model_path = dir.path().join("t.ifc");
        std::fs::write(&model_path, model("#1=IFCPERSON($,.T.);")).unwrap();

        let document = IfcDocument::open(&model_path, &SchemaSource::Directory(dir.path().to_path_buf())).unwrap();
        assert_eq!(document.schema().name(), "IFCTEST");

        let missing = SchemaSource::Directory(dir.path().join("nowhere"));
        assert!(IfcDocument::open(&model_path, &missing).is_err());
    }
}
