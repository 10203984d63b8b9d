//! ifc2graph Core Library
//!
//! Translation of IFC entity models into labelled property graphs:
//! attribute classification, node and relationship encoding, the
//! overwrite policy, validation and the two-pass generation engine.

pub mod classify;
pub mod encode;
pub mod engine;
pub mod error;
pub mod export;
pub mod label;
pub mod policy;
pub mod schema;
pub mod source;
pub mod store;
pub mod validate;

#[cfg(test)]
mod testing;

pub use classify::{classify, AttributeCategory, ClassifiedAttributes};
pub use engine::{GenerationReport, GraphGenerator, NoProgress, ProgressSink, Stage};
pub use error::{Ifc2GraphError, Ifc2GraphResult};
pub use label::ModelLabel;
pub use source::{AttributeValue, EntityRef, MetaKind, ModelDocument, SourceEntity};
pub use store::{GraphStore, MemoryStore, NodeRole, WriteLog};
pub use validate::{validate, ValidationReport};
