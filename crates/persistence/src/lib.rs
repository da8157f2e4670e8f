//! Model Registry Persistence Layer
//!
//! This crate stores model-registry entities (registered models, versions,
//! experiments, runs, artifacts and serving resources) in one generic schema:
//! a node table holding identity, name, external id and timestamps, and an
//! entity-attribute-value property table holding every other field.
//!
//! # Architecture
//!
//! - [`types`] - Entities, generic node rows, list options and page tokens
//! - [`kinds`] - Per-kind mapping functions and declared fields
//! - [`filter`] - Filter query parser and compiler to backend-neutral predicates
//! - [`repository`] - The generic repository and keyset pagination
//! - [`core`] - The [`NodeStore`](core::NodeStore) trait implemented by backends
//! - [`backends`] - Backend implementations (SQLite)
//! - [`context`] - Per-request cancellation and deadlines
//! - [`config`] - Serde configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use model_registry_persistence::backends::sqlite::SqliteBackend;
//! use model_registry_persistence::kinds::{MODEL_VERSION, REGISTERED_MODEL};
//! use model_registry_persistence::repository::GenericRepository;
//! use model_registry_persistence::types::{ContextAttributes, Entity, ListOptions, OrderBy};
//! use model_registry_persistence::{RepositoryConfig, RequestContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RequestContext::new();
//! let store = Arc::new(SqliteBackend::open("./registry.db")?);
//! let config = RepositoryConfig::default();
//!
//! let models = GenericRepository::new(&ctx, store.clone(), &REGISTERED_MODEL, config.clone()).await?;
//! let versions = GenericRepository::new(&ctx, store, &MODEL_VERSION, config).await?;
//!
//! let model = models
//!     .save(&ctx, Entity::new(ContextAttributes::named("churn")))
//!     .await?;
//! let model_id = model.id.unwrap_or_default();
//!
//! versions
//!     .save(
//!         &ctx,
//!         Entity::new(ContextAttributes::named("v1"))
//!             .with_property("registered_model_id", model_id)
//!             .with_property("author", "alice"),
//!     )
//!     .await?;
//!
//! let page = versions
//!     .list(
//!         &ctx,
//!         &ListOptions::new()
//!             .with_parent(model_id)
//!             .with_order_by(OrderBy::CreateTime)
//!             .with_page_size(20),
//!     )
//!     .await?;
//! println!("{} versions, more: {}", page.size, page.has_next());
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Every operation takes a [`RequestContext`]. Cancelling it, or letting its
//! deadline pass, interrupts the running statement and rolls back an open
//! save:
//!
//! ```
//! use model_registry_persistence::RequestContext;
//!
//! let (ctx, handle) = RequestContext::cancellable();
//! handle.cancel();
//! assert!(ctx.check().unwrap_err().is_cancelled());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod filter;
pub mod kinds;
pub mod repository;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{PersistenceConfig, RepositoryConfig};
pub use context::{CancelHandle, RequestContext};
pub use error::{StorageError, StorageResult};
pub use types::{Entity, ListOptions, ListWrapper, OrderBy, PageToken, SortOrder};

// Re-export core traits
pub use core::{Backend, BackendKind, NodeQuery, NodeStore};

pub use repository::GenericRepository;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
