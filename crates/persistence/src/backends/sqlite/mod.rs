//! SQLite backend implementation.
//!
//! Stores every entity kind in one generic node table plus an
//! entity-attribute-value property table. Supports in-memory databases (one
//! pooled connection, useful for tests) and file-based databases in WAL mode.
//!
//! # Example
//!
//! ```no_run
//! use model_registry_persistence::backends::sqlite::SqliteBackend;
//! use model_registry_persistence::core::NodeStore;
//! use model_registry_persistence::RequestContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! let type_id = backend
//!     .ensure_type(&RequestContext::new(), "kf.RegisteredModel")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE types (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT NOT NULL UNIQUE
//! );
//!
//! CREATE TABLE nodes (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     type_id INTEGER NOT NULL REFERENCES types(id),
//!     name TEXT NOT NULL,               -- unique per type_id
//!     external_id TEXT,                 -- unique per type_id when set
//!     create_time_since_epoch INTEGER NOT NULL,
//!     last_update_time_since_epoch INTEGER NOT NULL
//! );
//!
//! CREATE TABLE node_properties (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     node_id INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
//!     name TEXT NOT NULL,
//!     is_custom INTEGER NOT NULL,
//!     value_kind TEXT NOT NULL,         -- selects the populated column
//!     string_value TEXT, int_value INTEGER, double_value REAL,
//!     bool_value INTEGER, byte_value BLOB, struct_value TEXT
//! );
//! ```

mod backend;
mod query;
mod schema;
mod store;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use query::{SqlFragment, SqlParam, build_scan, render_predicate};
