//! Read-only queries over generated models.

pub mod model;

pub use model::{child_nodes, list_models, role_counts, ChildNode, ModelSummary, RoleCounts};
