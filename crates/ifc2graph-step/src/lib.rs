//! # ifc2graph STEP
//!
//! Readers for the two ISO 10303 text formats an IFC model needs: P21
//! instance files and EXPRESS schemas. [`IfcDocument`] combines both into
//! a [`ifc2graph_core::ModelDocument`].

pub mod document;
pub mod express;
pub mod p21;

pub use document::{IfcDocument, SchemaSource};
pub use express::ExpressSchema;
