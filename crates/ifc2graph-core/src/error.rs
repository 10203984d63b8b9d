//! Centralized error types for the translation engine.

use thiserror::Error;

/// Main error type for ifc2graph operations.
#[derive(Error, Debug)]
pub enum Ifc2GraphError {
    #[error("Unable to open IFC model: {0}")]
    Open(String),

    #[error("Schema {schema} has no declaration for entity class '{class_name}'")]
    SchemaResolution { schema: String, class_name: String },

    #[error("Cannot classify attribute '{attribute}' of class '{class_name}' (declared type: {shape})")]
    UnclassifiableAttribute {
        class_name: String,
        attribute: String,
        shape: String,
    },

    #[error("Attribute '{attribute}' of #{entity_id} is declared as an association but holds {found}")]
    UnexpectedAssociationValue {
        entity_id: u64,
        attribute: String,
        found: String,
    },

    #[error("Element {index} of '{attribute}' on #{entity_id} is not an entity reference ({found})")]
    UnresolvedAggregateElement {
        entity_id: u64,
        attribute: String,
        index: usize,
        found: String,
    },

    #[error("Cannot recover '{attribute}' on #{entity_id}: collection #{collection_id} ({class_name}) has no GlobalId")]
    RecoveryUnavailable {
        entity_id: u64,
        attribute: String,
        collection_id: u64,
        class_name: String,
    },

    #[error("No node with GlobalId '{global_id}' under label {label} (recovering '{attribute}' on #{entity_id})")]
    RecoveryLookupFailed {
        entity_id: u64,
        attribute: String,
        global_id: String,
        label: String,
    },

    #[error("Graph store connection error: {0}")]
    StoreConnection(String),

    #[error("Graph store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ifc2graph operations.
pub type Ifc2GraphResult<T> = Result<T, Ifc2GraphError>;

impl Ifc2GraphError {
    /// Create an open error.
    pub fn open(msg: impl Into<String>) -> Self {
        Self::Open(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a store connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::StoreConnection(msg.into())
    }
}
