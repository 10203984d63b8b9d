//! # ifc2graph Graph
//!
//! Neo4j backend for generated models.
//!
//! Provides the Bolt connection client, per-model indexes, the
//! [`Neo4jStore`] implementation of the core graph store and read-only
//! queries over generated models.

pub mod client;
pub mod queries;
pub mod schema;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use store::Neo4jStore;
