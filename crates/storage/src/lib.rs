//! Data-source layer: the contract scans consume, an in-memory implementation
//! and a catalog of named sources.

pub mod catalog;
pub mod memory;
pub mod provider;

pub use catalog::Catalog;
pub use memory::{MemTable, IN_MEMORY};
pub use provider::{projection_indices, schemas_match, select_fields, BatchStream, DataSource};
