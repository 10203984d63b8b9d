//! Relationship encoder.
//!
//! Single associations become one edge each. Aggregated associations become
//! one edge per element carrying the element's position, except for
//! objectified collections, whose non-entity members are resolved through
//! the store by GlobalId (the recovery path).

use tracing::{debug, warn};

use super::NodesMaterialized;
use crate::classify::{classify, quirks};
use crate::error::{Ifc2GraphError, Ifc2GraphResult};
use crate::label::ModelLabel;
use crate::source::{AttributeValue, EntityRef, ModelDocument, SourceEntity};
use crate::store::{EdgeMerge, GraphStore, WriteCommand, WriteLog};

/// Edges issued for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeStats {
    pub edges: usize,
    /// Edges whose target was found through the recovery path.
    pub recovered: usize,
    /// List elements that held a value instead of a reference.
    pub skipped: usize,
}

impl std::ops::AddAssign for EdgeStats {
    fn add_assign(&mut self, other: Self) {
        self.edges += other.edges;
        self.recovered += other.recovered;
        self.skipped += other.skipped;
    }
}

pub struct RelationshipEncoder<'a> {
    document: &'a dyn ModelDocument,
    label: &'a ModelLabel,
}

impl<'a> RelationshipEncoder<'a> {
    /// Edges may only be written once the node stage has completed.
    pub fn new(document: &'a dyn ModelDocument, label: &'a ModelLabel, _barrier: &NodesMaterialized) -> Self {
        Self { document, label }
    }

    /// Emit every outgoing edge of `entity`.
    pub async fn emit<S>(&self, store: &S, entity: &SourceEntity, log: &mut WriteLog) -> Ifc2GraphResult<EdgeStats>
    where
        S: GraphStore + ?Sized,
    {
        let classified = classify(self.document.schema(), &entity.class_name)?;
        let mut stats = EdgeStats::default();

        for name in &classified.single_associations {
            match entity.attribute(name) {
                AttributeValue::Null => continue,
                AttributeValue::Entity(target) => {
                    self.merge(store, log, entity.id, target.id, name, None).await?;
                    stats.edges += 1;
                }
                other => {
                    return Err(Ifc2GraphError::UnexpectedAssociationValue {
                        entity_id: entity.id,
                        attribute: name.clone(),
                        found: other.kind().to_string(),
                    })
                }
            }
        }

        for name in &classified.aggregated_associations {
            match entity.attribute(name) {
                AttributeValue::Null => {
                    debug!(p21_id = entity.id, attribute = %name, "Aggregated association holds nothing referenced");
                }
                AttributeValue::List(items) => {
                    stats += self.walk_list(store, log, entity.id, name, items).await?;
                }
                AttributeValue::Entity(collection) => {
                    stats += self.walk_objectified(store, log, entity.id, name, collection).await?;
                }
                other => {
                    return Err(Ifc2GraphError::UnresolvedAggregateElement {
                        entity_id: entity.id,
                        attribute: name.clone(),
                        index: 0,
                        found: other.kind().to_string(),
                    })
                }
            }
        }

        Ok(stats)
    }

    async fn walk_list<S>(
        &self,
        store: &S,
        log: &mut WriteLog,
        source: u64,
        attribute: &str,
        items: &[AttributeValue],
    ) -> Ifc2GraphResult<EdgeStats>
    where
        S: GraphStore + ?Sized,
    {
        let mut stats = EdgeStats::default();
        for (i, item) in items.iter().enumerate() {
            if quirks::skips_list_element(item) {
                warn!(p21_id = source, attribute, index = i, found = item.kind(), "Skipping non-reference list element");
                stats.skipped += 1;
                continue;
            }
            let target = item.as_entity().ok_or_else(|| Ifc2GraphError::UnresolvedAggregateElement {
                entity_id: source,
                attribute: attribute.to_string(),
                index: i,
                found: item.kind().to_string(),
            })?;
            self.merge(store, log, source, target.id, attribute, Some(i)).await?;
            stats.edges += 1;
        }
        Ok(stats)
    }

    /// Walk a collection that arrived as a single entity reference. Its
    /// members are the referenced entity's attribute values.
    async fn walk_objectified<S>(
        &self,
        store: &S,
        log: &mut WriteLog,
        source: u64,
        attribute: &str,
        collection: &EntityRef,
    ) -> Ifc2GraphResult<EdgeStats>
    where
        S: GraphStore + ?Sized,
    {
        let members: Vec<&AttributeValue> = self
            .document
            .entity(collection.id)
            .map(|e| e.attributes.iter().map(|(_, v)| v).collect())
            .unwrap_or_default();

        let mut stats = EdgeStats::default();
        if members.is_empty() {
            let target = self.recover(store, source, attribute, collection).await?;
            self.merge(store, log, source, target, attribute, None).await?;
            stats.edges += 1;
            stats.recovered += 1;
            return Ok(stats);
        }

        for (i, member) in members.into_iter().enumerate() {
            if let Some(target) = member.as_entity() {
                self.merge(store, log, source, target.id, attribute, Some(i)).await?;
                stats.edges += 1;
                continue;
            }

            let target = self.recover(store, source, attribute, collection).await?;
            self.merge(store, log, source, target, attribute, None).await?;
            stats.edges += 1;
            stats.recovered += 1;

            if quirks::aborts_after_recovery(&collection.class_name) {
                debug!(
                    p21_id = source,
                    collection = collection.id,
                    class_name = %collection.class_name,
                    "Stopping collection walk after recovery"
                );
                break;
            }
        }
        Ok(stats)
    }

    /// Resolve the collection itself by its GlobalId under the same label.
    async fn recover<S>(&self, store: &S, source: u64, attribute: &str, collection: &EntityRef) -> Ifc2GraphResult<u64>
    where
        S: GraphStore + ?Sized,
    {
        let global_id = collection
            .global_id
            .clone()
            .or_else(|| {
                self.document
                    .entity(collection.id)
                    .and_then(|e| e.global_id().map(str::to_string))
            })
            .ok_or_else(|| Ifc2GraphError::RecoveryUnavailable {
                entity_id: source,
                attribute: attribute.to_string(),
                collection_id: collection.id,
                class_name: collection.class_name.clone(),
            })?;

        let found = store
            .find_node_by_alternate_id(self.label, &global_id)
            .await?
            .ok_or_else(|| Ifc2GraphError::RecoveryLookupFailed {
                entity_id: source,
                attribute: attribute.to_string(),
                global_id: global_id.clone(),
                label: self.label.to_string(),
            })?;

        warn!(
            p21_id = source,
            attribute,
            collection = collection.id,
            %global_id,
            target = found.p21_id,
            "Recovered objectified collection member through GlobalId lookup"
        );
        Ok(found.p21_id)
    }

    async fn merge<S>(
        &self,
        store: &S,
        log: &mut WriteLog,
        source: u64,
        target: u64,
        relation: &str,
        sequence: Option<usize>,
    ) -> Ifc2GraphResult<()>
    where
        S: GraphStore + ?Sized,
    {
        let edge = EdgeMerge {
            label: self.label.clone(),
            source,
            target,
            relation: relation.to_string(),
            sequence,
        };
        debug!(source, target, relation, ?sequence, "Merging edge");
        store.merge_edge(&edge).await?;
        log.push(WriteCommand::MergeEdge(edge));
        Ok(())
    }
}
