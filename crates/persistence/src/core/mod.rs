//! Core storage traits and abstractions.
//!
//! - [`Backend`] - Database driver lifecycle (schema, health)
//! - [`NodeStore`] - Node and property persistence used by repositories
//!
//! # Example: Implementing a Store
//!
//! ```ignore
//! use async_trait::async_trait;
//! use model_registry_persistence::core::{NodeQuery, NodeStore};
//! use model_registry_persistence::RequestContext;
//! use model_registry_persistence::error::StorageResult;
//! use model_registry_persistence::types::{Node, PropertyRow};
//!
//! struct MyStore {
//!     // ... backend-specific fields
//! }
//!
//! #[async_trait]
//! impl NodeStore for MyStore {
//!     fn backend_name(&self) -> &'static str {
//!         "my-store"
//!     }
//!
//!     async fn save_node(
//!         &self,
//!         ctx: &RequestContext,
//!         node: Node,
//!         properties: Vec<PropertyRow>,
//!     ) -> StorageResult<i64> {
//!         // Write node + properties in one transaction
//!         todo!()
//!     }
//!
//!     // ... remaining operations
//! }
//! ```

mod backend;
mod store;

pub use backend::{Backend, BackendKind};
pub use store::{NodeQuery, NodeStore};
