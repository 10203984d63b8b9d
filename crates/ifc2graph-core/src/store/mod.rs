//! Graph store seam and the write commands the engine issues.
//!
//! Every write is a merge keyed by the identity of what it writes, so
//! issuing the same command twice leaves the store unchanged.

pub mod cypher;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Ifc2GraphResult;
use crate::label::ModelLabel;

pub use memory::MemoryStore;

/// Structural role of a node, assigned once per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeRole {
    PrimaryNode,
    ConnectionNode,
    SecondaryNode,
}

impl NodeRole {
    /// The Neo4j node label for this role.
    pub fn label(&self) -> &'static str {
        match self {
            NodeRole::PrimaryNode => "PrimaryNode",
            NodeRole::ConnectionNode => "ConnectionNode",
            NodeRole::SecondaryNode => "SecondaryNode",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scalar (or list of scalars) stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x:?}"),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Node properties, ordered by key so rendered commands are deterministic.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Property key exposing the source entity identifier.
pub const P21_ID_PROPERTY: &str = "p21_id";

/// Property key exposing the source entity class name.
pub const ENTITY_TYPE_PROPERTY: &str = "EntityType";

/// Property key used to find nodes on the recovery path.
pub const GLOBAL_ID_PROPERTY: &str = "GlobalId";

/// Relationship type shared by every generated edge.
pub const EDGE_TYPE: &str = "rel";

/// Edge property holding the originating attribute name.
pub const REL_TYPE_PROPERTY: &str = "rel_type";

/// Edge property holding the position within an aggregated association.
pub const LIST_ITEM_PROPERTY: &str = "listItem";

/// A node as known to the store: its label and source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub label: ModelLabel,
    pub p21_id: u64,
}

/// Idempotent node write keyed by (label, p21_id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMerge {
    pub label: ModelLabel,
    pub role: NodeRole,
    pub class_name: String,
    pub p21_id: u64,
    pub properties: PropertyMap,
}

/// Idempotent edge write keyed by its endpoints, relation and position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeMerge {
    pub label: ModelLabel,
    pub source: u64,
    pub target: u64,
    pub relation: String,
    /// Position within an aggregated association; absent for single
    /// associations and recovered elements.
    pub sequence: Option<usize>,
}

/// One write issued during generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WriteCommand {
    PurgeLabel { label: ModelLabel },
    MergeNode(NodeMerge),
    MergeEdge(EdgeMerge),
}

impl WriteCommand {
    /// Self-contained Cypher statement for offline replay.
    pub fn to_cypher(&self) -> String {
        match self {
            WriteCommand::PurgeLabel { label } => cypher::delete_label(label),
            WriteCommand::MergeNode(node) => cypher::render_merge_node(node),
            WriteCommand::MergeEdge(edge) => cypher::render_merge_edge(edge),
        }
    }
}

/// Ordered log of every write issued by one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteLog {
    commands: Vec<WriteCommand>,
}

impl WriteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: WriteCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteCommand> {
        self.commands.iter()
    }

    pub fn commands(&self) -> &[WriteCommand] {
        &self.commands
    }

    /// The whole log as a Cypher script, one statement per line.
    pub fn to_cypher_script(&self) -> String {
        let mut script = String::new();
        for command in &self.commands {
            script.push_str(&command.to_cypher());
            script.push_str(";\n");
        }
        script
    }
}

/// Backend holding generated graphs.
///
/// Calls are awaited one at a time by the engine. Implementations must make
/// `merge_node` and `merge_edge` idempotent under identical inputs.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Number of nodes carrying `label`.
    async fn count_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<u64>;

    /// Remove every node carrying `label`, together with its edges.
    async fn delete_all_nodes(&self, label: &ModelLabel) -> Ifc2GraphResult<()>;

    async fn merge_node(&self, node: &NodeMerge) -> Ifc2GraphResult<NodeRef>;

    async fn merge_edge(&self, edge: &EdgeMerge) -> Ifc2GraphResult<()>;

    /// Find a node under `label` by its GlobalId.
    async fn find_node_by_alternate_id(
        &self,
        label: &ModelLabel,
        global_id: &str,
    ) -> Ifc2GraphResult<Option<NodeRef>>;
}
